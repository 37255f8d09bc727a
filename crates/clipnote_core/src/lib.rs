//! Clipnote core: pure rule resolution, state machines and protocol types.
mod ball;
mod msg;
mod op_state;
mod rules;
mod settings;
mod text;

pub use ball::{
    step, BallAction, BallEvent, BallMachine, BallPhase, BallPosition, Point, DRAG_THRESHOLD_PX,
    SUCCESS_REVERT_MS,
};
pub use msg::{
    Ack, Attachment, CaptureRequest, NoteKind, PageContent, PageNote, PanelNote, SaveOutcome,
    SaveRequest,
};
pub use op_state::{OperationPatch, OperationState, OperationStatus};
pub use rules::{
    hostname_of, resolve_instruction, DomainRule, InstructionTemplate, CONTENT_MARKER,
    FALLBACK_INSTRUCTION,
};
pub use settings::{builtin_templates, BallSize, Settings, Theme, DEFAULT_TEMPLATE_ID};
pub use text::{clean_page_text, source_link_line, strip_source_links};
