//! Informational side panel
//!
//! Shown at the left or right edge of the primary work area. Hiding slides
//! the panel off its edge while fading it out, driven by a window timer on
//! the UI thread; the completion callback runs once the panel is invisible.

use std::panic::{self, AssertUnwindSafe};

use tiny_skia::Pixmap;
use tracing::{debug, error, warn};
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    DefWindowProcW, GWLP_USERDATA, GetWindowLongPtrW, KillTimer, SW_HIDE, SetTimer,
    SetWindowLongPtrW, ShowWindow, WM_TIMER,
};
use windows::core::{PCWSTR, w};

use crate::config::SharedConfig;
use crate::domain::core::{Point, Rect};
use crate::platform::monitors;
use crate::ui::overlay::{self, LayeredWindow};
use crate::ui::renderer::{RadialLayout, RadialRenderer};
use crate::ui::{InfoPanel, OverlayError, PanelEdge, PanelPresenter};

const PANEL_CLASS: PCWSTR = w!("RadialSnapPanelWindow");

const HIDE_TIMER_ID: usize = 1;
const HIDE_FRAME_MS: u32 = 15;
const HIDE_FRAMES: u32 = 12;

const PANEL_WIDTH: i32 = 260;
const PANEL_MAX_HEIGHT: i32 = 360;
const EDGE_MARGIN: i32 = 12;

/// Scale of the menu miniature drawn on the card
const LEGEND_SCALE: f32 = 1.6;

/// Hide animation state, owned by the window through `GWLP_USERDATA`
struct HideAnimation {
    frame: u32,
    origin: Point,
    /// Horizontal distance covered by the slide, signed towards the edge
    travel: i32,
    on_complete: Option<Box<dyn FnOnce()>>,
}

impl HideAnimation {
    fn new(origin: Point, edge: PanelEdge, on_complete: Box<dyn FnOnce()>) -> Self {
        let distance = PANEL_WIDTH + EDGE_MARGIN;
        Self {
            frame: 0,
            origin,
            travel: match edge {
                PanelEdge::Left => -distance,
                PanelEdge::Right => distance,
            },
            on_complete: Some(on_complete),
        }
    }

    /// Position and opacity for the current frame
    fn frame_state(&self) -> (Point, u8) {
        let frame = self.frame.min(HIDE_FRAMES);
        let offset = self.travel * frame as i32 / HIDE_FRAMES as i32;
        let alpha = 255 * (HIDE_FRAMES - frame) / HIDE_FRAMES;
        (
            Point::new(self.origin.x + offset, self.origin.y),
            alpha as u8,
        )
    }

    fn finished(&self) -> bool {
        self.frame >= HIDE_FRAMES
    }
}

fn take_animation(hwnd: HWND) -> Option<Box<HideAnimation>> {
    let ptr = unsafe { SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0) } as *mut HideAnimation;
    // Only ever set from Box::into_raw below
    (!ptr.is_null()).then(|| unsafe { Box::from_raw(ptr) })
}

fn advance_hide(hwnd: HWND) {
    let ptr = unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) } as *mut HideAnimation;
    if ptr.is_null() {
        let _ = unsafe { KillTimer(hwnd, HIDE_TIMER_ID) };
        return;
    }

    let finished = {
        let animation = unsafe { &mut *ptr };
        animation.frame += 1;
        let (origin, alpha) = animation.frame_state();
        if let Err(err) = overlay::reposition(hwnd, origin, alpha) {
            debug!(%err, "Panel frame skipped");
        }
        animation.finished()
    };

    if finished {
        let _ = unsafe { KillTimer(hwnd, HIDE_TIMER_ID) };
        unsafe {
            let _ = ShowWindow(hwnd, SW_HIDE);
        }
        if let Some(on_complete) = take_animation(hwnd).and_then(|mut a| a.on_complete.take()) {
            on_complete();
        }
    }
}

unsafe extern "system" fn panel_window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if msg == WM_TIMER && wparam.0 == HIDE_TIMER_ID {
        if panic::catch_unwind(AssertUnwindSafe(|| advance_hide(hwnd))).is_err() {
            error!("Panel animation panicked");
        }
        return LRESULT(0);
    }
    unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
}

/// Screen rectangle of a panel docked to `edge`
fn panel_rect(work_area: Rect, edge: PanelEdge) -> Rect {
    let height = (work_area.h - 2 * EDGE_MARGIN).clamp(1, PANEL_MAX_HEIGHT);
    let y = work_area.y + (work_area.h - height) / 2;
    let x = match edge {
        PanelEdge::Left => work_area.x + EDGE_MARGIN,
        PanelEdge::Right => work_area.right() - PANEL_WIDTH - EDGE_MARGIN,
    };
    Rect::new(x, y, PANEL_WIDTH, height)
}

/// Creates side panels showing the configured menu
#[derive(Debug)]
pub struct SlidePanelPresenter {
    config: SharedConfig,
}

impl SlidePanelPresenter {
    pub fn new(config: SharedConfig) -> Self {
        Self { config }
    }
}

impl PanelPresenter for SlidePanelPresenter {
    type Panel = SlidePanel;

    fn create(&mut self) -> Result<SlidePanel, OverlayError> {
        overlay::register_window_class(PANEL_CLASS, Some(panel_window_proc))?;
        let window = LayeredWindow::create(PANEL_CLASS)?;

        let settings = self.config.try_menu_settings().unwrap_or_default();
        let legend = RadialLayout::from_shape(&settings.shape(), LEGEND_SCALE);

        Ok(SlidePanel {
            window: Some(window),
            legend,
            renderer: RadialRenderer::new(),
            placed: None,
        })
    }
}

/// One side panel window
pub struct SlidePanel {
    window: Option<LayeredWindow>,
    legend: RadialLayout,
    renderer: RadialRenderer,
    placed: Option<(Point, PanelEdge)>,
}

impl SlidePanel {
    fn card(&self, rect: Rect) -> Result<Pixmap, OverlayError> {
        Ok(self
            .renderer
            .render_panel(rect.w as u32, rect.h as u32, &self.legend)?)
    }
}

impl InfoPanel for SlidePanel {
    fn show(&mut self, edge: PanelEdge) -> Result<(), OverlayError> {
        let rect = panel_rect(monitors::primary_work_area()?, edge);
        let pixmap = self.card(rect)?;
        let origin = Point::new(rect.x, rect.y);

        if let Some(window) = &self.window {
            window.present(&pixmap, origin, u8::MAX)?;
            window.show();
        }
        self.placed = Some((origin, edge));
        Ok(())
    }

    fn hide_animated(&mut self, on_complete: Box<dyn FnOnce()>) {
        let (Some(window), Some((origin, edge))) = (&self.window, self.placed) else {
            on_complete();
            return;
        };
        let hwnd = window.hwnd();

        // A second request replaces the pending callback
        drop(take_animation(hwnd));
        let animation = Box::new(HideAnimation::new(origin, edge, on_complete));
        unsafe {
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, Box::into_raw(animation) as isize);
        }

        if unsafe { SetTimer(hwnd, HIDE_TIMER_ID, HIDE_FRAME_MS, None) } == 0 {
            warn!("Hide animation timer unavailable, hiding at once");
            window.hide();
            if let Some(on_complete) = take_animation(hwnd).and_then(|mut a| a.on_complete.take()) {
                on_complete();
            }
        }
    }

    fn close(&mut self) {
        if let Some(window) = self.window.take() {
            let hwnd = window.hwnd();
            let _ = unsafe { KillTimer(hwnd, HIDE_TIMER_ID) };
            // Cancelled animations never report completion
            drop(take_animation(hwnd));
        }
    }
}

impl Drop for SlidePanel {
    fn drop(&mut self) {
        self.close();
    }
}
