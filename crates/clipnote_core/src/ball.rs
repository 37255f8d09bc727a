use serde::{Deserialize, Serialize};

/// Pointer displacement (per axis) beyond which a press is a genuine drag.
pub const DRAG_THRESHOLD_PX: f64 = 5.0;

/// How long the success phase is shown before reverting to idle.
pub const SUCCESS_REVERT_MS: u64 = 3000;

/// A pointer location in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Persisted affordance position, anchored to the bottom-right corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallPosition {
    pub right: f64,
    pub bottom: f64,
}

impl Default for BallPosition {
    fn default() -> Self {
        Self {
            right: 20.0,
            bottom: 20.0,
        }
    }
}

/// Visual/interaction phase of the on-page affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BallPhase {
    #[default]
    Idle,
    Dragging,
    Processing,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragOrigin {
    cursor: Point,
    position: BallPosition,
}

/// Per-page-load interaction machine disambiguating drag from click.
///
/// The pointer-up of a drag always precedes the click event the browser
/// synthesizes for the same gesture, so drag completion must not trigger the
/// click action. `was_dragging` is the sticky flag bridging the two handler
/// paths: set once displacement passes the threshold, consumed (and only
/// then reset) by the next click.
#[derive(Debug, Clone, PartialEq)]
pub struct BallMachine {
    phase: BallPhase,
    position: BallPosition,
    drag: Option<DragOrigin>,
    press_point: Option<Point>,
    was_dragging: bool,
}

/// Inputs to the machine: pointer events, the synthesized click, and
/// externally delivered operation outcomes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BallEvent {
    PressStart { cursor: Point },
    PointerMove { cursor: Point },
    PointerUp,
    Clicked { extract_only: bool },
    OutcomeArrived { success: bool },
    RevertElapsed,
}

/// Effects requested by a transition, executed by the hosting page agent.
#[derive(Debug, Clone, PartialEq)]
pub enum BallAction {
    /// Live visual reposition while dragging.
    Reposition(BallPosition),
    /// Drag finished: persist the new position.
    PersistPosition(BallPosition),
    /// Genuine click: start a capture run, extract-only for the
    /// secondary-button variant (which shows a reversed loading indicator).
    BeginCapture { extract_only: bool },
    /// Entered the success phase: arrange a [`BallEvent::RevertElapsed`]
    /// after [`SUCCESS_REVERT_MS`].
    ScheduleRevert,
}

impl Default for BallMachine {
    fn default() -> Self {
        Self::with_position(BallPosition::default())
    }
}

impl BallMachine {
    pub fn with_position(position: BallPosition) -> Self {
        Self {
            phase: BallPhase::Idle,
            position,
            drag: None,
            press_point: None,
            was_dragging: false,
        }
    }

    pub fn phase(&self) -> BallPhase {
        self.phase
    }

    pub fn position(&self) -> BallPosition {
        self.position
    }
}

/// Pure transition function: applies an event and returns any actions.
pub fn step(mut ball: BallMachine, event: BallEvent) -> (BallMachine, Vec<BallAction>) {
    let actions = match event {
        BallEvent::PressStart { cursor } => {
            if ball.phase != BallPhase::Idle {
                return (ball, Vec::new());
            }
            ball.phase = BallPhase::Dragging;
            ball.drag = Some(DragOrigin {
                cursor,
                position: ball.position,
            });
            // Immutable for the rest of the gesture; only the drag origin
            // above is used for position deltas.
            ball.press_point = Some(cursor);
            ball.was_dragging = false;
            Vec::new()
        }
        BallEvent::PointerMove { cursor } => {
            if ball.phase != BallPhase::Dragging {
                return (ball, Vec::new());
            }
            let Some(drag) = ball.drag else {
                return (ball, Vec::new());
            };
            ball.position = BallPosition {
                right: drag.position.right + (drag.cursor.x - cursor.x),
                bottom: drag.position.bottom + (drag.cursor.y - cursor.y),
            };
            if let Some(press) = ball.press_point {
                let moved_x = (cursor.x - press.x).abs();
                let moved_y = (cursor.y - press.y).abs();
                if moved_x > DRAG_THRESHOLD_PX || moved_y > DRAG_THRESHOLD_PX {
                    ball.was_dragging = true;
                }
            }
            vec![BallAction::Reposition(ball.position)]
        }
        BallEvent::PointerUp => {
            if ball.phase != BallPhase::Dragging {
                return (ball, Vec::new());
            }
            ball.phase = BallPhase::Idle;
            ball.drag = None;
            vec![BallAction::PersistPosition(ball.position)]
        }
        BallEvent::Clicked { extract_only } => {
            if ball.was_dragging {
                // The gesture was a drag; consume the flag and suppress the
                // click it produced.
                ball.was_dragging = false;
                return (ball, Vec::new());
            }
            if ball.phase != BallPhase::Idle {
                return (ball, Vec::new());
            }
            ball.phase = BallPhase::Processing;
            vec![BallAction::BeginCapture { extract_only }]
        }
        BallEvent::OutcomeArrived { success } => {
            if ball.phase != BallPhase::Processing {
                return (ball, Vec::new());
            }
            if success {
                ball.phase = BallPhase::Success;
                vec![BallAction::ScheduleRevert]
            } else {
                ball.phase = BallPhase::Idle;
                Vec::new()
            }
        }
        BallEvent::RevertElapsed => {
            if ball.phase == BallPhase::Success {
                ball.phase = BallPhase::Idle;
            }
            Vec::new()
        }
    };

    (ball, actions)
}
