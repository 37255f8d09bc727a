//! Clipnote engine: cross-context message bus, the coordinator task and the
//! collaborator clients it drives.
mod attachments;
mod bus;
mod coordinator;
mod endpoints;
mod model;
mod notebook;
mod notify;
mod page_agent;
mod panel;
mod reader;
mod store;
mod types;

pub use attachments::{AttachmentStaging, PreviewStore, TempFilePreviews};
pub use bus::{
    note_channel, ContextGone, CoordinatorHandle, CoordinatorMsg, DeliveryExt, NoteSender,
};
pub use coordinator::{
    spawn_coordinator, Collaborators, ResultMirror, SharedOperationState,
};
pub use endpoints::{clean_domain, completions_url, normalize_api_base, normalize_auth_token};
pub use model::{ChatModelClient, Summarizer};
pub use notebook::{compose_note_content, NoteDraft, NoteSink, NotebookClient};
pub use notify::{LogNotifier, Notifier, RecordingNotifier};
pub use page_agent::{
    spawn_page_agent, PageAccessor, PageAgentHandle, PageAgentMsg, RawPage, StaticPage,
};
pub use panel::PanelSession;
pub use reader::{ContentReader, ReadOutput, RemoteReader};
pub use store::{keys, FileStore, KeyValueStore, KvSettingsStore, MemoryStore, SettingsStore};
pub use types::{OrchestrationError, StoreError};
