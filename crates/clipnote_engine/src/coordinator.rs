use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use clip_logging::{clip_debug, clip_info, clip_warn};
use clipnote_core::{
    hostname_of, resolve_instruction, strip_source_links, Ack, CaptureRequest, NoteKind,
    OperationPatch, OperationState, PageNote, PanelNote, SaveOutcome, SaveRequest, Settings,
    CONTENT_MARKER,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::bus::{CoordinatorHandle, CoordinatorMsg, DeliveryExt, NoteSender};
use crate::notebook::{NoteDraft, NoteSink};
use crate::notify::Notifier;
use crate::reader::ContentReader;
use crate::store::{keys, KeyValueStore, SettingsStore};
use crate::types::OrchestrationError;

/// The durable mirror of the last completed result, readable by a panel
/// opened after the originating one closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultMirror {
    pub summary: String,
    pub url: String,
    pub title: String,
    pub extract_only: bool,
    pub timestamp_ms: u64,
}

/// The operation record, owned by the coordinator's top-level task and
/// handed to the runs it spawns. Other contexts never hold a reference;
/// they receive snapshots through the message protocol.
#[derive(Clone, Default)]
pub struct SharedOperationState {
    inner: Arc<Mutex<OperationState>>,
}

impl SharedOperationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous snapshot, no side effect.
    pub fn read(&self) -> OperationState {
        self.inner.lock().expect("lock operation state").clone()
    }

    /// Merges a patch, last write wins per field, and returns the snapshot.
    pub fn update(&self, patch: OperationPatch) -> OperationState {
        let mut guard = self.inner.lock().expect("lock operation state");
        let next = std::mem::take(&mut *guard).apply(patch);
        debug_assert!(next.is_consistent());
        *guard = next.clone();
        next
    }

    /// Resets the record and evicts the durable result mirror. The eviction
    /// completes before this returns, so callers may ack afterwards.
    pub async fn clear(&self, store: &dyn KeyValueStore) -> OperationState {
        if let Err(err) = store.remove(keys::RESULT_MIRROR).await {
            clip_warn!("result mirror eviction failed: {err}");
        }
        let mut guard = self.inner.lock().expect("lock operation state");
        *guard = OperationState::cleared();
        guard.clone()
    }
}

/// The coordinator's external collaborators, all consumed through traits.
pub struct Collaborators {
    pub settings: Arc<dyn SettingsStore>,
    pub store: Arc<dyn KeyValueStore>,
    pub reader: Arc<dyn ContentReader>,
    pub summarizer: Arc<dyn crate::model::Summarizer>,
    pub notes: Arc<dyn NoteSink>,
    pub notifier: Arc<dyn Notifier>,
}

/// Starts the long-lived coordinator context and returns its handle.
pub fn spawn_coordinator(collab: Collaborators) -> CoordinatorHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(run_coordinator(collab, rx));
    CoordinatorHandle::new(tx)
}

async fn run_coordinator(collab: Collaborators, mut rx: mpsc::UnboundedReceiver<CoordinatorMsg>) {
    let coordinator = Arc::new(Coordinator {
        state: SharedOperationState::new(),
        collab,
    });
    while let Some(msg) = rx.recv().await {
        coordinator.clone().dispatch(msg);
    }
    clip_info!("coordinator mailbox closed, shutting down");
}

struct Coordinator {
    state: SharedOperationState,
    collab: Collaborators,
}

impl Coordinator {
    /// Exhaustive mailbox dispatch. Long-running work is spawned so the
    /// mailbox keeps draining (snapshot requests stay responsive while a
    /// capture run is in flight).
    fn dispatch(self: Arc<Self>, msg: CoordinatorMsg) {
        match msg {
            CoordinatorMsg::ProcessAndSendContent { req, ack, page } => {
                let _ = ack.send(Ack::Processing);
                tokio::spawn(async move { self.handle_ball_capture(req, page).await });
            }
            CoordinatorMsg::ProcessContent { req, ack, panel } => {
                let _ = ack.send(Ack::Accepted);
                tokio::spawn(async move { self.handle_panel_capture(req, panel).await });
            }
            CoordinatorMsg::SaveSummary { req, ack, panel } => {
                let _ = ack.send(Ack::Accepted);
                tokio::spawn(async move { self.handle_save(req, panel).await });
            }
            CoordinatorMsg::GetSummaryState { reply } => {
                let _ = reply.send(self.state.read());
            }
            CoordinatorMsg::ClearSummary { ack, panel } => {
                let _ = ack.send(Ack::Processing);
                tokio::spawn(async move {
                    self.state.clear(self.collab.store.as_ref()).await;
                    panel
                        .send(PanelNote::ClearSummaryResponse { success: true })
                        .on_gone(|| clip_debug!("panel closed before clear response"));
                });
            }
            CoordinatorMsg::ShowNotification { title, message } => {
                self.collab.notifier.notify(&title, &message);
            }
        }
    }

    /// Shared capture pipeline: settings, then extraction or rule-resolved
    /// summarization, then idempotent source-link cleanup.
    async fn produce_summary(
        &self,
        req: &CaptureRequest,
    ) -> Result<(String, Settings), OrchestrationError> {
        if req.content.trim().is_empty() {
            return Err(OrchestrationError::content("capture request carries no content"));
        }

        let settings = self.collab.settings.load().await.map_err(|err| {
            OrchestrationError::configuration(format!("settings unavailable: {err}"))
        })?;

        let raw = if req.extract_only {
            self.collab.reader.read(&req.url, &settings).await?.content
        } else {
            if settings.model_url.is_empty()
                || settings.api_key.is_empty()
                || settings.model_name.is_empty()
            {
                return Err(OrchestrationError::configuration(
                    "model endpoint, API key and model name",
                ));
            }
            let hostname = hostname_of(&req.url);
            let instruction = resolve_instruction(
                hostname.as_deref(),
                &settings.domain_rules,
                &settings.templates,
                &settings.active_template_id,
            );
            let prompt = instruction.replace(CONTENT_MARKER, &req.content);
            self.collab.summarizer.summarize(&prompt, &settings).await?
        };

        Ok((strip_source_links(&raw), settings))
    }

    /// Capture triggered by the on-page affordance: the result is always
    /// persisted to the note service, then reported back to the page.
    async fn handle_ball_capture(&self, req: CaptureRequest, page: NoteSender<PageNote>) {
        self.state
            .update(OperationPatch::processing(&req.url, &req.title));

        let outcome = match self.produce_summary(&req).await {
            Ok((summary, settings)) => {
                let draft = NoteDraft::new(&summary, capture_kind(&req))
                    .with_page(Some(req.url.clone()), Some(req.title.clone()));
                self.collab
                    .notes
                    .save_note(draft, &settings)
                    .await
                    .map(|()| summary)
            }
            Err(err) => Err(err),
        };

        match outcome {
            Ok(summary) => {
                self.state.update(OperationPatch::completed(&summary));
                self.mirror_result(&summary, &req).await;
                page.send(PageNote::UpdateBallState {
                    enabled: None,
                    success: Some(true),
                    error: None,
                })
                .on_gone(|| {
                    self.collab
                        .notifier
                        .notify(&success_title(&req), &success_message(&req));
                });
            }
            Err(err) => {
                self.state.update(OperationPatch::failed(&err.to_string()));
                page.send(PageNote::UpdateBallState {
                    enabled: None,
                    success: Some(false),
                    error: Some(err.to_string()),
                })
                .on_gone(|| {
                    self.collab
                        .notifier
                        .notify(&failure_title(&req), &err.to_string());
                });
            }
        }
    }

    /// Capture triggered from the panel. Without direct-save the result is
    /// mirrored durably and offered back for review; with direct-save it
    /// goes straight to the note service and the system notification is the
    /// one user-visible signal.
    async fn handle_panel_capture(&self, req: CaptureRequest, panel: NoteSender<PanelNote>) {
        self.state
            .update(OperationPatch::processing(&req.url, &req.title));

        let produced = self.produce_summary(&req).await;
        let result = match produced {
            Ok((summary, settings)) if req.direct_save => {
                let draft = NoteDraft::new(&summary, capture_kind(&req))
                    .with_page(Some(req.url.clone()), Some(req.title.clone()));
                match self.collab.notes.save_note(draft, &settings).await {
                    Ok(()) => {
                        self.state.update(OperationPatch::completed(&summary));
                        self.collab
                            .notifier
                            .notify(&success_title(&req), &success_message(&req));
                        return;
                    }
                    Err(err) => Err(err),
                }
            }
            Ok((summary, _)) => Ok(summary),
            Err(err) => Err(err),
        };

        match result {
            Ok(summary) => {
                self.state.update(OperationPatch::completed(&summary));
                self.mirror_result(&summary, &req).await;
                panel
                    .send(PanelNote::SummaryResponse {
                        success: true,
                        summary: Some(summary),
                        url: Some(req.url.clone()),
                        title: Some(req.title.clone()),
                        extract_only: req.extract_only,
                        error: None,
                    })
                    .on_gone(|| {
                        self.collab
                            .notifier
                            .notify(&success_title(&req), &success_message(&req));
                    });
            }
            Err(err) => {
                self.state.update(OperationPatch::failed(&err.to_string()));
                panel
                    .send(PanelNote::SummaryResponse {
                        success: false,
                        summary: None,
                        url: Some(req.url.clone()),
                        title: Some(req.title.clone()),
                        extract_only: req.extract_only,
                        error: Some(err.to_string()),
                    })
                    .on_gone(|| {
                        self.collab
                            .notifier
                            .notify(&failure_title(&req), &err.to_string());
                    });
            }
        }
    }

    async fn handle_save(&self, req: SaveRequest, panel: NoteSender<PanelNote>) {
        let response = match self.run_save(&req).await {
            Ok(()) => SaveOutcome::ok(),
            Err(err) => SaveOutcome::failed(err.to_string()),
        };

        let fallback = if response.success {
            ("Save succeeded".to_string(), "the note was stored".to_string())
        } else {
            (
                "Save failed".to_string(),
                response.error.clone().unwrap_or_default(),
            )
        };
        panel
            .send(PanelNote::SaveSummaryResponse { response })
            .on_gone(|| self.collab.notifier.notify(&fallback.0, &fallback.1));
    }

    async fn run_save(&self, req: &SaveRequest) -> Result<(), OrchestrationError> {
        let content = req.content.trim();
        if content.is_empty() {
            return Err(OrchestrationError::content(match req.kind {
                NoteKind::QuickNote => "the quick note is empty",
                _ => "there is nothing to save",
            }));
        }

        let settings = self.collab.settings.load().await.map_err(|err| {
            OrchestrationError::configuration(format!("settings unavailable: {err}"))
        })?;

        let mut url = req.url.clone();
        let mut title = req.title.clone();
        if req.kind != NoteKind::QuickNote && (url.is_none() || title.is_none()) {
            // Backfill page metadata from the pending result.
            if let Some(mirror) = self.read_mirror().await {
                url = url.or(Some(mirror.url));
                title = title.or(Some(mirror.title));
            }
        }

        let draft = NoteDraft::new(content, req.kind)
            .with_page(url, title)
            .with_attachments(req.attachments.clone());
        self.collab.notes.save_note(draft, &settings).await?;

        if req.kind != NoteKind::QuickNote {
            // Saving the pending summary/extract consumes it.
            self.state.clear(self.collab.store.as_ref()).await;
        }
        Ok(())
    }

    async fn mirror_result(&self, summary: &str, req: &CaptureRequest) {
        let mirror = ResultMirror {
            summary: summary.to_string(),
            url: req.url.clone(),
            title: req.title.clone(),
            extract_only: req.extract_only,
            timestamp_ms: unix_millis(),
        };
        match serde_json::to_value(&mirror) {
            Ok(value) => {
                if let Err(err) = self.collab.store.set(keys::RESULT_MIRROR, value).await {
                    clip_warn!("result mirror write failed: {err}");
                }
            }
            Err(err) => clip_warn!("result mirror serialization failed: {err}"),
        }
    }

    async fn read_mirror(&self) -> Option<ResultMirror> {
        let value = self.collab.store.get(keys::RESULT_MIRROR).await.ok()??;
        serde_json::from_value(value).ok()
    }
}

fn capture_kind(req: &CaptureRequest) -> NoteKind {
    if req.extract_only {
        NoteKind::Extract
    } else {
        NoteKind::Summary
    }
}

fn page_label(req: &CaptureRequest) -> &str {
    if req.title.is_empty() {
        if req.url.is_empty() {
            "the page"
        } else {
            &req.url
        }
    } else {
        &req.title
    }
}

fn success_title(req: &CaptureRequest) -> String {
    if req.extract_only {
        "Extraction finished".to_string()
    } else {
        "Summary finished".to_string()
    }
}

fn success_message(req: &CaptureRequest) -> String {
    format!("\"{}\" was processed and stored", page_label(req))
}

fn failure_title(req: &CaptureRequest) -> String {
    if req.extract_only {
        "Extraction failed".to_string()
    } else {
        "Summary failed".to_string()
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
