//! Gesture orchestrator
//!
//! Runs on the UI thread. Consumes monitor events in the order they were
//! posted, owns every overlay instance, tracks the pointer while the radial
//! menu is open and hands the selected action to the executor.

use tracing::{debug, info, warn};

use crate::app::state::{
    MenuCommand, MenuPhase, PanelCommand, PanelInput, PanelPhase, StateMachine,
};
use crate::config::{MenuSettings, SharedConfig};
use crate::domain::action::WindowAction;
use crate::domain::core::Point;
use crate::domain::keys::KeySide;
use crate::domain::radial::SectorIndex;
use crate::input::events::{AppEvent, EventSender, MouseEvent, PanelId};
use crate::ui::{InfoPanel, MenuOverlay, MenuPresenter, PanelPresenter};

/// Applies window actions; failures are handled inside the executor
pub trait ActionExecutor {
    fn execute(&mut self, action: WindowAction);
}

struct ActiveMenu<O> {
    overlay: O,
    center: Point,
    highlight: Option<SectorIndex>,
}

pub struct Orchestrator<M: MenuPresenter, P: PanelPresenter, E: ActionExecutor> {
    config: SharedConfig,
    last_good: MenuSettings,
    config_degraded: bool,
    menus: M,
    panels: P,
    executor: E,
    events: EventSender,
    menu_phase: MenuPhase,
    menu: Option<ActiveMenu<M::Overlay>>,
    panel_phase: PanelPhase,
    live_panels: Vec<(PanelId, P::Panel)>,
    next_panel: u64,
}

impl<M: MenuPresenter, P: PanelPresenter, E: ActionExecutor> Orchestrator<M, P, E> {
    /// `events` is used to report hide-animation completion back to the queue
    pub fn new(
        config: SharedConfig,
        menus: M,
        panels: P,
        executor: E,
        events: EventSender,
    ) -> Self {
        let last_good = config.try_menu_settings().unwrap_or_default();
        Self {
            config,
            last_good,
            config_degraded: false,
            menus,
            panels,
            executor,
            events,
            menu_phase: MenuPhase::Idle,
            menu: None,
            panel_phase: PanelPhase::Hidden,
            live_panels: Vec::new(),
            next_panel: 1,
        }
    }

    pub fn handle(&mut self, event: AppEvent) {
        match event {
            AppEvent::Mouse(event) => self.handle_mouse(event),
            AppEvent::Keyboard(event) => self.handle_panel(PanelInput::Key(event)),
            AppEvent::PanelHidden(id) => self.handle_panel(PanelInput::HideCompleted(id)),
        }
    }

    /// Re-evaluates the highlighted sector; a no-op while no menu is open
    pub fn pointer_moved(&mut self, point: Point) {
        if self.menu.is_none() {
            return;
        }

        let geometry = self.menu_settings().shape().geometry();
        let Some(menu) = self.menu.as_mut() else {
            return;
        };

        let sector = geometry.sector_at(point, menu.center);
        if sector != menu.highlight {
            debug!(?sector, "Highlight changed");
            menu.highlight = sector;
            menu.overlay.update_highlight(sector);
        }
    }

    pub fn menu_visible(&self) -> bool {
        self.menu.is_some()
    }

    pub fn panel_phase(&self) -> PanelPhase {
        self.panel_phase
    }

    /// Closes every overlay; used when the application exits
    pub fn shutdown(&mut self) {
        if let Some(mut menu) = self.menu.take() {
            menu.overlay.close();
        }
        for (_, mut panel) in self.live_panels.drain(..) {
            panel.close();
        }
        self.menu_phase = MenuPhase::Idle;
        self.panel_phase = PanelPhase::Hidden;
        info!("Overlays closed");
    }

    /// Live menu settings, falling back to the last good copy
    fn menu_settings(&mut self) -> MenuSettings {
        match self.config.try_menu_settings() {
            Ok(settings) => {
                self.last_good = settings;
                self.config_degraded = false;
            }
            Err(err) => {
                if !self.config_degraded {
                    warn!(%err, "Using last known menu settings");
                    self.config_degraded = true;
                }
            }
        }
        self.last_good
    }

    fn handle_mouse(&mut self, event: MouseEvent) {
        let (next, command) = StateMachine::process_menu_event(self.menu_phase, event);
        self.menu_phase = next;

        match command {
            MenuCommand::Open {
                center,
                replace_stale,
            } => self.open_menu(center, replace_stale),
            MenuCommand::Resolve => self.resolve_menu(),
            MenuCommand::Ignore => {}
        }
    }

    fn open_menu(&mut self, center: Point, replace_stale: bool) {
        if let Some(mut stale) = self.menu.take() {
            if !replace_stale {
                warn!("Menu instance outlived its gesture");
            }
            stale.overlay.close();
        }

        let shape = self.menu_settings().shape();
        let created = self.menus.create(&shape).and_then(|mut overlay| {
            overlay.show_at(center)?;
            Ok(overlay)
        });

        match created {
            Ok(overlay) => {
                debug!(x = center.x, y = center.y, style = %shape.style, "Menu shown");
                self.menu = Some(ActiveMenu {
                    overlay,
                    center,
                    highlight: None,
                });
            }
            Err(err) => {
                warn!(%err, "Could not show radial menu");
                self.menu_phase = MenuPhase::Idle;
            }
        }
    }

    fn resolve_menu(&mut self) {
        let Some(mut menu) = self.menu.take() else {
            return;
        };

        // Close first so the action targets the real foreground window
        menu.overlay.close();

        let Some(sector) = menu.highlight else {
            debug!("Released outside the ring, no action");
            return;
        };

        let mapping = self.menu_settings().action_mapping;
        match mapping.get(sector) {
            Some(action) => {
                info!(%sector, %action, "Running window action");
                self.executor.execute(action);
            }
            None => debug!(%sector, "Sector has no action"),
        }
    }

    fn handle_panel(&mut self, input: PanelInput) {
        let enabled = self.menu_settings().panel_enabled;
        let fresh = PanelId(self.next_panel);
        let (next, command) =
            StateMachine::process_panel_event(self.panel_phase, input, enabled, fresh);
        self.panel_phase = next;

        match command {
            PanelCommand::Show { id, edge, discard } => {
                self.next_panel += 1;
                if let Some(old) = discard {
                    self.close_panel(old);
                }
                self.show_panel(id, edge);
            }
            PanelCommand::BeginHide(id) => self.begin_hide(id),
            PanelCommand::Forget(id) => self.close_panel(id),
            PanelCommand::Ignore => {}
        }
    }

    fn show_panel(&mut self, id: PanelId, side: KeySide) {
        let created = self.panels.create().and_then(|mut panel| {
            panel.show(side.into())?;
            Ok(panel)
        });

        match created {
            Ok(panel) => {
                debug!(?id, ?side, "Panel shown");
                self.live_panels.push((id, panel));
            }
            Err(err) => {
                warn!(%err, "Could not show panel");
                self.panel_phase = PanelPhase::Hidden;
            }
        }
    }

    fn begin_hide(&mut self, id: PanelId) {
        let Some((_, panel)) = self.live_panels.iter_mut().find(|(live, _)| *live == id) else {
            self.panel_phase = PanelPhase::Hidden;
            return;
        };

        let events = self.events.clone();
        panel.hide_animated(Box::new(move || {
            events.post(AppEvent::PanelHidden(id));
        }));
    }

    fn close_panel(&mut self, id: PanelId) {
        if let Some(index) = self.live_panels.iter().position(|(live, _)| *live == id) {
            let (_, mut panel) = self.live_panels.remove(index);
            panel.close();
            debug!(?id, "Panel released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GestureConfig;
    use crate::domain::radial::MenuShape;
    use crate::input::events::KeyboardEvent;
    use crate::ui::{OverlayError, PanelEdge};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::mpsc;

    type Log = Rc<RefCell<Vec<String>>>;
    type PendingHides = Rc<RefCell<Vec<Box<dyn FnOnce()>>>>;

    struct FakeMenus {
        log: Log,
        created: usize,
    }

    struct FakeMenu {
        log: Log,
        n: usize,
    }

    impl MenuPresenter for FakeMenus {
        type Overlay = FakeMenu;

        fn create(&mut self, shape: &MenuShape) -> Result<FakeMenu, OverlayError> {
            self.created += 1;
            self.log
                .borrow_mut()
                .push(format!("menu{}.create {}", self.created, shape.style));
            Ok(FakeMenu {
                log: Rc::clone(&self.log),
                n: self.created,
            })
        }
    }

    impl MenuOverlay for FakeMenu {
        fn show_at(&mut self, center: Point) -> Result<(), OverlayError> {
            self.log
                .borrow_mut()
                .push(format!("menu{}.show {},{}", self.n, center.x, center.y));
            Ok(())
        }

        fn update_highlight(&mut self, sector: Option<SectorIndex>) {
            self.log.borrow_mut().push(format!(
                "menu{}.highlight {:?}",
                self.n,
                sector.map(SectorIndex::get)
            ));
        }

        fn close(&mut self) {
            self.log.borrow_mut().push(format!("menu{}.close", self.n));
        }
    }

    struct FakePanels {
        log: Log,
        hides: PendingHides,
        created: usize,
    }

    struct FakePanel {
        log: Log,
        hides: PendingHides,
        n: usize,
    }

    impl PanelPresenter for FakePanels {
        type Panel = FakePanel;

        fn create(&mut self) -> Result<FakePanel, OverlayError> {
            self.created += 1;
            Ok(FakePanel {
                log: Rc::clone(&self.log),
                hides: Rc::clone(&self.hides),
                n: self.created,
            })
        }
    }

    impl InfoPanel for FakePanel {
        fn show(&mut self, edge: PanelEdge) -> Result<(), OverlayError> {
            self.log
                .borrow_mut()
                .push(format!("panel{}.show {:?}", self.n, edge));
            Ok(())
        }

        fn hide_animated(&mut self, on_complete: Box<dyn FnOnce()>) {
            self.log.borrow_mut().push(format!("panel{}.hide", self.n));
            self.hides.borrow_mut().push(on_complete);
        }

        fn close(&mut self) {
            self.log.borrow_mut().push(format!("panel{}.close", self.n));
        }
    }

    struct FakeExecutor {
        log: Log,
    }

    impl ActionExecutor for FakeExecutor {
        fn execute(&mut self, action: WindowAction) {
            self.log.borrow_mut().push(format!("execute {action}"));
        }
    }

    struct Harness {
        orchestrator: Orchestrator<FakeMenus, FakePanels, FakeExecutor>,
        config: SharedConfig,
        log: Log,
        hides: PendingHides,
        rx: mpsc::Receiver<AppEvent>,
    }

    impl Harness {
        fn new() -> Self {
            let log: Log = Rc::default();
            let hides: PendingHides = Rc::default();
            let (tx, rx) = mpsc::channel();
            let config = SharedConfig::new(GestureConfig::default());
            let orchestrator = Orchestrator::new(
                config.clone(),
                FakeMenus {
                    log: Rc::clone(&log),
                    created: 0,
                },
                FakePanels {
                    log: Rc::clone(&log),
                    hides: Rc::clone(&hides),
                    created: 0,
                },
                FakeExecutor {
                    log: Rc::clone(&log),
                },
                EventSender::new(tx),
            );
            Self {
                orchestrator,
                config,
                log,
                hides,
                rx,
            }
        }

        fn take_log(&self) -> Vec<String> {
            self.log.borrow_mut().drain(..).collect()
        }

        /// Completes every pending hide animation and feeds the results back
        fn finish_hides(&mut self) {
            let pending: Vec<_> = self.hides.borrow_mut().drain(..).collect();
            for done in pending {
                done();
            }
            let events: Vec<AppEvent> = self.rx.try_iter().collect();
            for event in events {
                self.orchestrator.handle(event);
            }
        }
    }

    const CENTER: Point = Point { x: 500, y: 500 };

    #[test]
    fn hold_drag_release_runs_highlighted_action() {
        let mut h = Harness::new();
        h.orchestrator.handle(AppEvent::Mouse(MouseEvent::Trigger(CENTER)));
        assert!(h.orchestrator.menu_visible());

        // Straight up is sector 0, mapped to Maximize by default
        h.orchestrator.pointer_moved(Point::new(500, 460));
        h.orchestrator.handle(AppEvent::Mouse(MouseEvent::Release));

        assert_eq!(
            h.take_log(),
            vec![
                "menu1.create basic-radial",
                "menu1.show 500,500",
                "menu1.highlight Some(0)",
                "menu1.close",
                "execute maximize",
            ]
        );
        assert!(!h.orchestrator.menu_visible());
    }

    #[test]
    fn highlight_is_only_updated_on_sector_change() {
        let mut h = Harness::new();
        h.orchestrator.handle(AppEvent::Mouse(MouseEvent::Trigger(CENTER)));
        h.take_log();

        h.orchestrator.pointer_moved(Point::new(500, 460));
        h.orchestrator.pointer_moved(Point::new(501, 461));
        h.orchestrator.pointer_moved(Point::new(540, 500));
        h.orchestrator.pointer_moved(Point::new(501, 501));

        assert_eq!(
            h.take_log(),
            vec![
                "menu1.highlight Some(0)",
                "menu1.highlight Some(2)",
                "menu1.highlight None",
            ]
        );
    }

    #[test]
    fn release_in_dead_zone_runs_nothing() {
        let mut h = Harness::new();
        h.orchestrator.handle(AppEvent::Mouse(MouseEvent::Trigger(CENTER)));
        h.orchestrator.pointer_moved(Point::new(505, 505));
        h.orchestrator.handle(AppEvent::Mouse(MouseEvent::Release));

        let log = h.take_log();
        assert!(log.contains(&"menu1.close".to_string()));
        assert!(!log.iter().any(|line| line.starts_with("execute")));
    }

    #[test]
    fn unmapped_sector_runs_nothing() {
        let mut h = Harness::new();
        let mut menu = MenuSettings::default();
        menu.action_mapping
            .set(SectorIndex::new(0).expect("in range"), None);
        h.config.set_menu(menu).expect("lock healthy");

        h.orchestrator.handle(AppEvent::Mouse(MouseEvent::Trigger(CENTER)));
        h.orchestrator.pointer_moved(Point::new(500, 460));
        h.orchestrator.handle(AppEvent::Mouse(MouseEvent::Release));

        assert!(!h.take_log().iter().any(|line| line.starts_with("execute")));
    }

    #[test]
    fn release_without_trigger_is_ignored() {
        let mut h = Harness::new();
        h.orchestrator.handle(AppEvent::Mouse(MouseEvent::Release));
        assert!(h.take_log().is_empty());
    }

    #[test]
    fn stale_menu_is_closed_before_a_new_one_opens() {
        let mut h = Harness::new();
        h.orchestrator.handle(AppEvent::Mouse(MouseEvent::Trigger(CENTER)));
        h.orchestrator
            .handle(AppEvent::Mouse(MouseEvent::Trigger(Point::new(10, 10))));

        assert_eq!(
            h.take_log(),
            vec![
                "menu1.create basic-radial",
                "menu1.show 500,500",
                "menu1.close",
                "menu2.create basic-radial",
                "menu2.show 10,10",
            ]
        );
    }

    #[test]
    fn pointer_tracking_uses_live_radii() {
        let mut h = Harness::new();
        h.orchestrator.handle(AppEvent::Mouse(MouseEvent::Trigger(CENTER)));
        h.take_log();

        // 70px out is beyond the default 50px ring
        h.orchestrator.pointer_moved(Point::new(500, 430));
        assert!(h.take_log().is_empty());

        let mut menu = MenuSettings::default();
        menu.outer_radius = 100.0;
        h.config.set_menu(menu).expect("lock healthy");
        h.orchestrator.pointer_moved(Point::new(500, 430));
        assert_eq!(h.take_log(), vec!["menu1.highlight Some(0)"]);
    }

    #[test]
    fn panel_double_tap_show_and_escape_hide() {
        let mut h = Harness::new();
        h.orchestrator
            .handle(AppEvent::Keyboard(KeyboardEvent::Trigger(KeySide::Right)));
        h.orchestrator
            .handle(AppEvent::Keyboard(KeyboardEvent::Trigger(KeySide::Right)));
        h.orchestrator
            .handle(AppEvent::Keyboard(KeyboardEvent::EscapePressed));
        assert_eq!(h.orchestrator.panel_phase(), PanelPhase::Hiding(PanelId(1)));

        h.finish_hides();
        assert_eq!(h.orchestrator.panel_phase(), PanelPhase::Hidden);

        assert_eq!(
            h.take_log(),
            vec!["panel1.show Right", "panel1.hide", "panel1.close"]
        );
    }

    #[test]
    fn trigger_during_hide_creates_a_fresh_panel() {
        let mut h = Harness::new();
        h.orchestrator
            .handle(AppEvent::Keyboard(KeyboardEvent::Trigger(KeySide::Left)));
        h.orchestrator
            .handle(AppEvent::Keyboard(KeyboardEvent::EscapePressed));
        h.orchestrator
            .handle(AppEvent::Keyboard(KeyboardEvent::Trigger(KeySide::Right)));

        // The first panel's animation completes late
        h.finish_hides();

        assert_eq!(h.orchestrator.panel_phase(), PanelPhase::Visible(PanelId(2)));
        assert_eq!(
            h.take_log(),
            vec![
                "panel1.show Left",
                "panel1.hide",
                "panel1.close",
                "panel2.show Right",
            ]
        );
    }

    #[test]
    fn disabled_panel_never_shows() {
        let mut h = Harness::new();
        let mut menu = MenuSettings::default();
        menu.panel_enabled = false;
        h.config.set_menu(menu).expect("lock healthy");

        h.orchestrator
            .handle(AppEvent::Keyboard(KeyboardEvent::Trigger(KeySide::Left)));
        assert_eq!(h.orchestrator.panel_phase(), PanelPhase::Hidden);
        assert!(h.take_log().is_empty());
    }

    #[test]
    fn shutdown_closes_everything() {
        let mut h = Harness::new();
        h.orchestrator.handle(AppEvent::Mouse(MouseEvent::Trigger(CENTER)));
        h.orchestrator
            .handle(AppEvent::Keyboard(KeyboardEvent::Trigger(KeySide::Left)));
        h.take_log();

        h.orchestrator.shutdown();
        assert_eq!(h.take_log(), vec!["menu1.close", "panel1.close"]);
        assert!(!h.orchestrator.menu_visible());
        assert_eq!(h.orchestrator.panel_phase(), PanelPhase::Hidden);
    }
}
