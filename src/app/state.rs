//! Gesture state machines
//!
//! Two independent machines: the radial menu driven by the mouse monitor,
//! and the informational panel driven by the keyboard monitor. Transitions
//! are pure; the orchestrator carries out the returned commands.

use tracing::debug;

use crate::domain::core::Point;
use crate::domain::keys::KeySide;
use crate::input::events::{KeyboardEvent, MouseEvent, PanelId};

/// Radial menu lifecycle
///
/// There is no armed phase here: the monitor only emits `Trigger` once the
/// hold delay has elapsed, so the menu goes straight from idle to visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuPhase {
    #[default]
    Idle,
    /// Menu shown, centred on the press position
    Visible { center: Point },
}

/// What the orchestrator must do after a menu transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    /// Create and show a menu; `replace_stale` means one is still open
    Open { center: Point, replace_stale: bool },
    /// Close the menu, then run the highlighted action if any
    Resolve,
    Ignore,
}

/// Informational panel lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelPhase {
    #[default]
    Hidden,
    Visible(PanelId),
    /// Hide animation in flight
    Hiding(PanelId),
}

/// What the orchestrator must do after a panel transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    /// Create a fresh panel; `discard` is a closing instance to drop first
    Show {
        id: PanelId,
        edge: KeySide,
        discard: Option<PanelId>,
    },
    BeginHide(PanelId),
    /// Hide finished; release the instance
    Forget(PanelId),
    Ignore,
}

/// Inputs the panel machine reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelInput {
    Key(KeyboardEvent),
    HideCompleted(PanelId),
}

/// State machine for gesture transitions
pub struct StateMachine;

impl StateMachine {
    /// Processes a mouse event and returns the new menu phase
    pub fn process_menu_event(current: MenuPhase, event: MouseEvent) -> (MenuPhase, MenuCommand) {
        let (next, command) = match (current, event) {
            (MenuPhase::Idle, MouseEvent::Trigger(center)) => (
                MenuPhase::Visible { center },
                MenuCommand::Open {
                    center,
                    replace_stale: false,
                },
            ),
            // Double invocation: the stale menu is torn down and replaced
            (MenuPhase::Visible { .. }, MouseEvent::Trigger(center)) => (
                MenuPhase::Visible { center },
                MenuCommand::Open {
                    center,
                    replace_stale: true,
                },
            ),
            (MenuPhase::Visible { .. }, MouseEvent::Release) => {
                (MenuPhase::Idle, MenuCommand::Resolve)
            }
            (MenuPhase::Idle, MouseEvent::Release) => (MenuPhase::Idle, MenuCommand::Ignore),
        };

        if next != current {
            debug!(from = ?current, to = ?next, "Menu transition");
        }
        (next, command)
    }

    /// Processes a keyboard or animation event and returns the new panel phase
    ///
    /// `fresh` is the id a newly shown panel will take.
    pub fn process_panel_event(
        current: PanelPhase,
        input: PanelInput,
        enabled: bool,
        fresh: PanelId,
    ) -> (PanelPhase, PanelCommand) {
        let (next, command) = match (current, input) {
            (_, PanelInput::Key(KeyboardEvent::Trigger(_))) if !enabled => {
                (current, PanelCommand::Ignore)
            }
            (PanelPhase::Hidden, PanelInput::Key(KeyboardEvent::Trigger(edge))) => (
                PanelPhase::Visible(fresh),
                PanelCommand::Show {
                    id: fresh,
                    edge,
                    discard: None,
                },
            ),
            // Never resurrect a closing panel
            (PanelPhase::Hiding(closing), PanelInput::Key(KeyboardEvent::Trigger(edge))) => (
                PanelPhase::Visible(fresh),
                PanelCommand::Show {
                    id: fresh,
                    edge,
                    discard: Some(closing),
                },
            ),
            // Escape is the only way to close an open panel
            (PanelPhase::Visible(_), PanelInput::Key(KeyboardEvent::Trigger(_))) => {
                (current, PanelCommand::Ignore)
            }
            (PanelPhase::Visible(id), PanelInput::Key(KeyboardEvent::EscapePressed)) => {
                (PanelPhase::Hiding(id), PanelCommand::BeginHide(id))
            }
            (PanelPhase::Hiding(id), PanelInput::HideCompleted(done)) if id == done => {
                (PanelPhase::Hidden, PanelCommand::Forget(done))
            }
            _ => (current, PanelCommand::Ignore),
        };

        if next != current {
            debug!(from = ?current, to = ?next, "Panel transition");
        }
        (next, command)
    }
}
