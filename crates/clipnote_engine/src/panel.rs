use clip_logging::clip_warn;
use clipnote_core::{
    Ack, CaptureRequest, NoteKind, OperationState, PanelNote, SaveOutcome, SaveRequest,
};
use tokio::sync::mpsc;

use crate::attachments::AttachmentStaging;
use crate::bus::{note_channel, ContextGone, CoordinatorHandle, NoteSender};
use crate::page_agent::PageAgentHandle;

/// One open panel: a notification mailbox plus the request helpers the
/// panel surface drives. Dropping the session models closing the panel;
/// notifications sent afterwards report [`ContextGone`] to the sender.
pub struct PanelSession {
    coordinator: CoordinatorHandle,
    note_tx: NoteSender<PanelNote>,
    notes: mpsc::UnboundedReceiver<PanelNote>,
}

impl PanelSession {
    pub fn open(coordinator: CoordinatorHandle) -> Self {
        let (note_tx, notes) = note_channel();
        Self {
            coordinator,
            note_tx,
            notes,
        }
    }

    /// The channel the coordinator uses to reach this panel.
    pub fn note_sender(&self) -> NoteSender<PanelNote> {
        self.note_tx.clone()
    }

    /// Next notification addressed to this panel.
    pub async fn next_note(&mut self) -> Option<PanelNote> {
        self.notes.recv().await
    }

    /// Asks the page agent for its content, then hands it to the
    /// coordinator for summarization or extraction. The outcome arrives
    /// later as a [`PanelNote::SummaryResponse`].
    pub async fn request_summary(
        &self,
        page: &PageAgentHandle,
        extract_only: bool,
        direct_save: bool,
    ) -> Result<Ack, String> {
        let content = page
            .get_content()
            .await
            .map_err(|ContextGone| "the page agent is gone".to_string())?
            .map_err(|err| format!("content extraction failed: {err}"))?;

        let req = CaptureRequest {
            content: content.content,
            url: content.url,
            title: content.title,
            extract_only,
            direct_save,
        };
        self.coordinator
            .process_content(req, self.note_sender())
            .await
            .map_err(|ContextGone| "the coordinator is gone".to_string())
    }

    /// Forwards an edited summary/extract for saving.
    pub async fn save_summary(&self, req: SaveRequest) -> Result<Ack, ContextGone> {
        self.coordinator.save_summary(req, self.note_sender()).await
    }

    /// Snapshot of the coordinator's operation state.
    pub async fn summary_state(&self) -> Result<OperationState, ContextGone> {
        self.coordinator.summary_state().await
    }

    /// Discards the pending result (state plus durable mirror).
    pub async fn clear_summary(&self) -> Result<Ack, ContextGone> {
        self.coordinator.clear_summary(self.note_sender()).await
    }

    /// Sends a quick note with the currently staged attachments and waits
    /// for its outcome. A successful save releases the staged previews and
    /// empties the list.
    pub async fn send_quick_note(
        &mut self,
        content: impl Into<String>,
        url: Option<String>,
        title: Option<String>,
        staging: &AttachmentStaging,
    ) -> SaveOutcome {
        let attachments = match staging.list().await {
            Ok(attachments) => attachments,
            Err(err) => {
                clip_warn!("staged attachments unavailable: {err}");
                Vec::new()
            }
        };

        let req = SaveRequest {
            content: content.into(),
            kind: NoteKind::QuickNote,
            url,
            title,
            attachments,
        };
        if self.save_summary(req).await.is_err() {
            return SaveOutcome::failed("the coordinator is gone");
        }

        while let Some(note) = self.next_note().await {
            if let PanelNote::SaveSummaryResponse { response } = note {
                if response.success {
                    if let Err(err) = staging.clear().await {
                        clip_warn!("staged attachments not cleared: {err}");
                    }
                }
                return response;
            }
        }
        SaveOutcome::failed("the coordinator is gone")
    }
}
