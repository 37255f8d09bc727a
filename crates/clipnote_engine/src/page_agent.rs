use std::sync::Arc;
use std::time::Duration;

use clip_logging::{clip_trace, clip_warn};
use clipnote_core::{
    clean_page_text, step, Ack, BallAction, BallEvent, BallMachine, BallPosition, CaptureRequest,
    PageContent, PageNote, Settings, SUCCESS_REVERT_MS,
};
use tokio::sync::{mpsc, oneshot};

use crate::bus::{ContextGone, CoordinatorHandle, NoteSender};
use crate::store::{keys, KeyValueStore};

/// Read-only page access: visible text plus URL and title. Implementations
/// wrap whatever renders the page; the engine only cleans the text.
pub trait PageAccessor: Send + Sync {
    fn read(&self) -> Result<RawPage, String>;
}

/// Uncleaned page text and metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub text: String,
    pub url: String,
    pub title: String,
}

/// Fixed page content, used in tests and embedding hosts that extract
/// upfront.
#[derive(Debug, Clone)]
pub struct StaticPage {
    pub page: RawPage,
}

impl PageAccessor for StaticPage {
    fn read(&self) -> Result<RawPage, String> {
        Ok(self.page.clone())
    }
}

/// The page agent mailbox.
#[derive(Debug)]
pub enum PageAgentMsg {
    /// Awaited content extraction (`getContent`).
    GetContent {
        reply: oneshot::Sender<Result<PageContent, String>>,
    },
    /// Pointer/click input for the on-page affordance.
    Pointer(BallEvent),
    /// Notification from the coordinator.
    Note(PageNote),
}

/// Sender half of a page agent's mailbox.
#[derive(Debug, Clone)]
pub struct PageAgentHandle {
    tx: mpsc::UnboundedSender<PageAgentMsg>,
}

impl PageAgentHandle {
    /// Awaited request/response extraction of the page content.
    pub async fn get_content(&self) -> Result<Result<PageContent, String>, ContextGone> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(PageAgentMsg::GetContent { reply: reply_tx })
            .map_err(|_| ContextGone)?;
        reply_rx.await.map_err(|_| ContextGone)
    }

    /// Feeds a pointer event into the affordance machine.
    pub fn pointer(&self, event: BallEvent) -> Result<(), ContextGone> {
        self.tx
            .send(PageAgentMsg::Pointer(event))
            .map_err(|_| ContextGone)
    }

    /// Best-effort notification channel into this page.
    pub fn note_sender(&self) -> NoteSender<PageNote> {
        NoteSender::mapped(self.tx.clone(), PageAgentMsg::Note)
    }
}

/// Starts a page agent for one page load and returns its handle. The
/// persisted affordance position is restored from the shared store.
pub fn spawn_page_agent(
    accessor: Arc<dyn PageAccessor>,
    store: Arc<dyn KeyValueStore>,
    coordinator: CoordinatorHandle,
    settings: &Settings,
) -> PageAgentHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let agent = PageAgent {
        accessor,
        store,
        coordinator,
        ball: BallMachine::default(),
        enabled: settings.enable_floating_ball,
        self_tx: tx.clone(),
    };
    tokio::spawn(agent.run(rx));
    PageAgentHandle { tx }
}

struct PageAgent {
    accessor: Arc<dyn PageAccessor>,
    store: Arc<dyn KeyValueStore>,
    coordinator: CoordinatorHandle,
    ball: BallMachine,
    enabled: bool,
    self_tx: mpsc::UnboundedSender<PageAgentMsg>,
}

impl PageAgent {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<PageAgentMsg>) {
        self.restore_position().await;
        while let Some(msg) = rx.recv().await {
            match msg {
                PageAgentMsg::GetContent { reply } => {
                    let _ = reply.send(self.read_page());
                }
                PageAgentMsg::Pointer(event) => {
                    if self.enabled {
                        self.step_ball(event).await;
                    }
                }
                PageAgentMsg::Note(PageNote::UpdateBallState {
                    enabled,
                    success,
                    error,
                }) => {
                    if let Some(enabled) = enabled {
                        self.enabled = enabled;
                        if !enabled {
                            self.ball = BallMachine::with_position(self.ball.position());
                        }
                    }
                    if let Some(success) = success {
                        if let Some(error) = error.as_deref() {
                            clip_warn!("capture reported failure: {error}");
                        }
                        self.step_ball(BallEvent::OutcomeArrived { success }).await;
                    }
                }
                PageAgentMsg::Note(PageNote::UpdateBallSize { size }) => {
                    // Rendering concern; the agent only records it happened.
                    clip_trace!("affordance size set to {size:?}");
                }
            }
        }
        clip_trace!("page agent mailbox closed");
    }

    async fn restore_position(&mut self) {
        let position = match self.store.get(keys::BALL_POSITION).await {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_default(),
            Ok(None) => BallPosition::default(),
            Err(err) => {
                clip_warn!("affordance position unavailable, using default: {err}");
                BallPosition::default()
            }
        };
        self.ball = BallMachine::with_position(position);
    }

    fn read_page(&self) -> Result<PageContent, String> {
        let raw = self.accessor.read()?;
        Ok(PageContent {
            content: clean_page_text(&raw.text),
            url: raw.url,
            title: raw.title,
        })
    }

    async fn step_ball(&mut self, event: BallEvent) {
        let (ball, actions) = step(std::mem::take(&mut self.ball), event);
        self.ball = ball;
        for action in actions {
            self.run_action(action).await;
        }
    }

    async fn run_action(&mut self, action: BallAction) {
        match action {
            BallAction::Reposition(position) => {
                clip_trace!("affordance at right={} bottom={}", position.right, position.bottom);
            }
            BallAction::PersistPosition(position) => match serde_json::to_value(position) {
                Ok(value) => {
                    if let Err(err) = self.store.set(keys::BALL_POSITION, value).await {
                        clip_warn!("affordance position not persisted: {err}");
                    }
                }
                Err(err) => clip_warn!("affordance position not serializable: {err}"),
            },
            BallAction::BeginCapture { extract_only } => {
                self.begin_capture(extract_only).await;
            }
            BallAction::ScheduleRevert => {
                let tx = self.self_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(SUCCESS_REVERT_MS)).await;
                    let _ = tx.send(PageAgentMsg::Pointer(BallEvent::RevertElapsed));
                });
            }
        }
    }

    async fn begin_capture(&mut self, extract_only: bool) {
        let page = match self.read_page() {
            Ok(page) => page,
            Err(err) => {
                self.coordinator.show_notification("Operation failed", err);
                self.abort_capture();
                return;
            }
        };

        let req = CaptureRequest {
            content: page.content,
            url: page.url,
            title: page.title,
            extract_only,
            direct_save: false,
        };
        match self
            .coordinator
            .process_and_send_content(req, self.note_sender())
            .await
        {
            Ok(Ack::Processing) => {
                // The outcome arrives later as an UpdateBallState note.
            }
            Ok(_) | Err(ContextGone) => {
                self.coordinator
                    .show_notification("Operation failed", "the request was not accepted");
                self.abort_capture();
            }
        }
    }

    /// Drops the machine back to idle after a capture that never started.
    /// An error outcome produces no follow-up actions, so this needs no
    /// action loop.
    fn abort_capture(&mut self) {
        let (ball, _) = step(
            std::mem::take(&mut self.ball),
            BallEvent::OutcomeArrived { success: false },
        );
        self.ball = ball;
    }

    fn note_sender(&self) -> NoteSender<PageNote> {
        NoteSender::mapped(self.self_tx.clone(), PageAgentMsg::Note)
    }
}
