use serde::{Deserialize, Serialize};

use crate::settings::BallSize;

/// Immediate reply to a request whose real outcome arrives later as a
/// notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// The coordinator started working on it (`processing: true`).
    Processing,
    /// The request was taken over (`success: true`).
    Accepted,
}

/// Category tag attached to saved notes; drives link/tag composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    Summary,
    Extract,
    QuickNote,
    Image,
}

/// Page text and metadata as returned by a page agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub content: String,
    pub url: String,
    pub title: String,
}

/// Capture request sent to the coordinator by a page agent or the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub content: String,
    pub url: String,
    pub title: String,
    /// Skip summarization; fetch a readability rendition of the page instead.
    pub extract_only: bool,
    /// Persist straight to the note service, signaling by system
    /// notification only.
    pub direct_save: bool,
}

/// A staged attachment. `local_url` is a process-local, revocable preview
/// handle derived from `original_url`; whoever created it must release it
/// before the entry is discarded or replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_url: Option<String>,
}

/// Save request from the panel.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub content: String,
    pub kind: NoteKind,
    pub url: Option<String>,
    pub title: Option<String>,
    pub attachments: Vec<Attachment>,
}

/// Final outcome of a save, delivered as a best-effort notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl SaveOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Notifications addressed to the panel. Best-effort: the panel may already
/// be closed when one is sent.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelNote {
    /// Result of a panel-initiated capture run.
    SummaryResponse {
        success: bool,
        summary: Option<String>,
        url: Option<String>,
        title: Option<String>,
        extract_only: bool,
        error: Option<String>,
    },
    /// Outcome of a `saveSummary` request.
    SaveSummaryResponse { response: SaveOutcome },
    /// A `clearSummary` request finished.
    ClearSummaryResponse { success: bool },
}

/// Notifications addressed to a page agent.
#[derive(Debug, Clone, PartialEq)]
pub enum PageNote {
    /// Enable/disable the affordance and/or deliver a capture outcome.
    UpdateBallState {
        enabled: Option<bool>,
        success: Option<bool>,
        error: Option<String>,
    },
    /// The configured affordance size changed.
    UpdateBallSize { size: BallSize },
}
