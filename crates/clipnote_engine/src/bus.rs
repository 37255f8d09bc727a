use std::sync::Arc;

use clipnote_core::{Ack, CaptureRequest, OperationState, PageNote, PanelNote, SaveRequest};
use tokio::sync::{mpsc, oneshot};

/// The receiving context no longer exists (panel closed, tab gone, or the
/// coordinator torn down). Never shown to the user directly; it only
/// triggers the system-notification fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("receiving context no longer exists")]
pub struct ContextGone;

/// Best-effort, directional notification channel into one context.
///
/// Delivery is explicit: `send` reports [`ContextGone`] instead of
/// swallowing the failure, and the fallback lives in
/// [`DeliveryExt::on_gone`].
pub struct NoteSender<T> {
    send: Arc<dyn Fn(T) -> Result<(), ContextGone> + Send + Sync>,
}

impl<T> std::fmt::Debug for NoteSender<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NoteSender")
    }
}

impl<T> Clone for NoteSender<T> {
    fn clone(&self) -> Self {
        Self {
            send: self.send.clone(),
        }
    }
}

impl<T: Send + 'static> NoteSender<T> {
    /// Wraps a raw channel sender.
    pub fn from_unbounded(tx: mpsc::UnboundedSender<T>) -> Self {
        Self {
            send: Arc::new(move |note| tx.send(note).map_err(|_| ContextGone)),
        }
    }

    /// Wraps a channel whose message type embeds `T`, e.g. a mailbox with a
    /// dedicated notification variant.
    pub fn mapped<M: Send + 'static>(
        tx: mpsc::UnboundedSender<M>,
        wrap: impl Fn(T) -> M + Send + Sync + 'static,
    ) -> Self {
        Self {
            send: Arc::new(move |note| tx.send(wrap(note)).map_err(|_| ContextGone)),
        }
    }

    /// A sender whose context is already gone; useful in tests.
    pub fn closed() -> Self {
        Self {
            send: Arc::new(|_| Err(ContextGone)),
        }
    }

    pub fn send(&self, note: T) -> Result<(), ContextGone> {
        (self.send)(note)
    }
}

/// Creates a notification channel for one context.
pub fn note_channel<T: Send + 'static>() -> (NoteSender<T>, mpsc::UnboundedReceiver<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NoteSender::from_unbounded(tx), rx)
}

/// Fallback combinator for best-effort deliveries.
pub trait DeliveryExt {
    /// Runs `fallback` when the receiving context was gone.
    fn on_gone(self, fallback: impl FnOnce());
}

impl DeliveryExt for Result<(), ContextGone> {
    fn on_gone(self, fallback: impl FnOnce()) {
        if self.is_err() {
            fallback();
        }
    }
}

/// The coordinator mailbox: every message the coordinator context handles.
#[derive(Debug)]
pub enum CoordinatorMsg {
    /// Capture initiated by the on-page affordance. Acked with
    /// `processing` immediately; the outcome arrives later as a best-effort
    /// [`PageNote::UpdateBallState`].
    ProcessAndSendContent {
        req: CaptureRequest,
        ack: oneshot::Sender<Ack>,
        page: NoteSender<PageNote>,
    },
    /// Capture initiated by the panel. Acked immediately; the outcome
    /// arrives later as a best-effort [`PanelNote::SummaryResponse`].
    ProcessContent {
        req: CaptureRequest,
        ack: oneshot::Sender<Ack>,
        panel: NoteSender<PanelNote>,
    },
    /// Save edited/quick-note content. Acked immediately; outcome via
    /// best-effort [`PanelNote::SaveSummaryResponse`].
    SaveSummary {
        req: SaveRequest,
        ack: oneshot::Sender<Ack>,
        panel: NoteSender<PanelNote>,
    },
    /// Synchronous snapshot of the operation state.
    GetSummaryState {
        reply: oneshot::Sender<OperationState>,
    },
    /// Reset the operation state and evict the durable result mirror.
    ClearSummary {
        ack: oneshot::Sender<Ack>,
        panel: NoteSender<PanelNote>,
    },
    /// Fire-and-forget system notification.
    ShowNotification { title: String, message: String },
}

/// Sender half of the coordinator mailbox, with the awaited
/// request/response pattern baked in.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::UnboundedSender<CoordinatorMsg>,
}

impl CoordinatorHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<CoordinatorMsg>) -> Self {
        Self { tx }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(oneshot::Sender<R>) -> CoordinatorMsg,
    ) -> Result<R, ContextGone> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx.send(build(reply_tx)).map_err(|_| ContextGone)?;
        reply_rx.await.map_err(|_| ContextGone)
    }

    pub async fn process_and_send_content(
        &self,
        req: CaptureRequest,
        page: NoteSender<PageNote>,
    ) -> Result<Ack, ContextGone> {
        self.request(|ack| CoordinatorMsg::ProcessAndSendContent { req, ack, page })
            .await
    }

    pub async fn process_content(
        &self,
        req: CaptureRequest,
        panel: NoteSender<PanelNote>,
    ) -> Result<Ack, ContextGone> {
        self.request(|ack| CoordinatorMsg::ProcessContent { req, ack, panel })
            .await
    }

    pub async fn save_summary(
        &self,
        req: SaveRequest,
        panel: NoteSender<PanelNote>,
    ) -> Result<Ack, ContextGone> {
        self.request(|ack| CoordinatorMsg::SaveSummary { req, ack, panel })
            .await
    }

    pub async fn summary_state(&self) -> Result<OperationState, ContextGone> {
        self.request(|reply| CoordinatorMsg::GetSummaryState { reply })
            .await
    }

    pub async fn clear_summary(
        &self,
        panel: NoteSender<PanelNote>,
    ) -> Result<Ack, ContextGone> {
        self.request(|ack| CoordinatorMsg::ClearSummary { ack, panel })
            .await
    }

    /// Fire-and-forget; a gone coordinator is silently tolerated.
    pub fn show_notification(&self, title: impl Into<String>, message: impl Into<String>) {
        let _ = self.tx.send(CoordinatorMsg::ShowNotification {
            title: title.into(),
            message: message.into(),
        });
    }
}
