use serde::{Deserialize, Serialize};

/// Lifecycle of the current capture-summarize-save operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    #[default]
    None,
    Processing,
    Completed,
    Error,
}

/// The shared operation record. Owned and mutated by the coordinator; every
/// other context only ever sees point-in-time snapshots of it.
///
/// Invariants: `Completed` implies `summary` is set, `Error` implies `error`
/// is set. Transitions happen only through [`OperationState::apply`] or
/// [`OperationState::cleared`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperationState {
    pub status: OperationStatus,
    pub url: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub error: Option<String>,
}

/// Partial update merged into [`OperationState`]: fields that are `Some` win,
/// absent fields are left untouched. There is no way to null a field through
/// a patch; only a clear resets them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OperationPatch {
    pub status: Option<OperationStatus>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub error: Option<String>,
}

impl OperationPatch {
    /// Patch marking the start of an operation for the given page.
    pub fn processing(url: &str, title: &str) -> Self {
        Self {
            status: Some(OperationStatus::Processing),
            url: Some(url.to_string()),
            title: Some(title.to_string()),
            ..Self::default()
        }
    }

    /// Patch recording a successful result.
    pub fn completed(summary: &str) -> Self {
        Self {
            status: Some(OperationStatus::Completed),
            summary: Some(summary.to_string()),
            ..Self::default()
        }
    }

    /// Patch recording a failure.
    pub fn failed(error: &str) -> Self {
        Self {
            status: Some(OperationStatus::Error),
            error: Some(error.to_string()),
            ..Self::default()
        }
    }
}

impl OperationState {
    /// Merges a patch, last write wins per field, and returns the new state.
    pub fn apply(mut self, patch: OperationPatch) -> Self {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(url) = patch.url {
            self.url = Some(url);
        }
        if let Some(title) = patch.title {
            self.title = Some(title);
        }
        if let Some(summary) = patch.summary {
            self.summary = Some(summary);
        }
        if let Some(error) = patch.error {
            self.error = Some(error);
        }
        self
    }

    /// The reset state: status `None`, every field cleared.
    pub fn cleared() -> Self {
        Self::default()
    }

    /// Checks the status/field invariants; used by tests and debug asserts.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            OperationStatus::Completed => self.summary.is_some(),
            OperationStatus::Error => self.error.is_some(),
            OperationStatus::None | OperationStatus::Processing => true,
        }
    }
}
