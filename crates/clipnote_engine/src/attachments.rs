use std::fs;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use clip_logging::{clip_debug, clip_warn};
use clipnote_core::Attachment;

use crate::store::{keys, KeyValueStore};
use crate::types::StoreError;

/// Owner of process-local, revocable preview handles. The underlying binary
/// is only reclaimed on an explicit `revoke`; dropping the list entry alone
/// leaks it.
pub trait PreviewStore: Send + Sync {
    /// Materializes bytes under a fresh handle and returns it.
    fn create(&self, bytes: &[u8]) -> Result<String, StoreError>;
    /// Releases a handle. Unknown handles are tolerated.
    fn revoke(&self, handle: &str);
}

/// Previews backed by files in a private temp directory; the handle is the
/// file path.
pub struct TempFilePreviews {
    dir: tempfile::TempDir,
    next_id: AtomicU64,
}

impl TempFilePreviews {
    pub fn new() -> Result<Self, StoreError> {
        Ok(Self {
            dir: tempfile::tempdir()?,
            next_id: AtomicU64::new(1),
        })
    }
}

impl PreviewStore for TempFilePreviews {
    fn create(&self, bytes: &[u8]) -> Result<String, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let path = self.dir.path().join(format!("preview-{id}"));
        let mut file = fs::File::create(&path)?;
        file.write_all(bytes)?;
        Ok(path.to_string_lossy().into_owned())
    }

    fn revoke(&self, handle: &str) {
        if let Err(err) = fs::remove_file(handle) {
            clip_debug!("preview {handle} already gone: {err}");
        }
    }
}

/// The panel's staged-attachment list, persisted under
/// [`keys::ATTACHMENTS`]. Entries are removed handle-first so no preview
/// outlives its list entry.
pub struct AttachmentStaging {
    store: Arc<dyn KeyValueStore>,
    previews: Arc<dyn PreviewStore>,
}

impl AttachmentStaging {
    pub fn new(store: Arc<dyn KeyValueStore>, previews: Arc<dyn PreviewStore>) -> Self {
        Self { store, previews }
    }

    pub async fn list(&self) -> Result<Vec<Attachment>, StoreError> {
        match self.store.get(keys::ATTACHMENTS).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    async fn persist(&self, attachments: &[Attachment]) -> Result<(), StoreError> {
        if attachments.is_empty() {
            self.store.remove(keys::ATTACHMENTS).await
        } else {
            self.store
                .set(keys::ATTACHMENTS, serde_json::to_value(attachments)?)
                .await
        }
    }

    /// Appends an attachment to the staged list.
    pub async fn stage(&self, attachment: Attachment) -> Result<(), StoreError> {
        let mut attachments = self.list().await?;
        attachments.push(attachment);
        self.persist(&attachments).await
    }

    /// Creates missing local previews from `original_url` using `fetch` and
    /// persists the updated list.
    pub async fn hydrate_previews<F, Fut>(&self, fetch: F) -> Result<Vec<Attachment>, StoreError>
    where
        F: Fn(String) -> Fut,
        Fut: std::future::Future<Output = Option<Vec<u8>>>,
    {
        let mut attachments = self.list().await?;
        let mut changed = false;
        for attachment in &mut attachments {
            if attachment.local_url.is_some() {
                continue;
            }
            let Some(original) = attachment.original_url.clone() else {
                continue;
            };
            match fetch(original).await {
                Some(bytes) => match self.previews.create(&bytes) {
                    Ok(handle) => {
                        attachment.local_url = Some(handle);
                        changed = true;
                    }
                    Err(err) => clip_warn!("preview creation failed: {err}"),
                },
                None => clip_warn!("could not fetch original for {}", attachment.name),
            }
        }
        if changed {
            self.persist(&attachments).await?;
        }
        Ok(attachments)
    }

    /// Removes one staged attachment, releasing its preview handle first.
    pub async fn remove(&self, index: usize) -> Result<(), StoreError> {
        let mut attachments = self.list().await?;
        if index >= attachments.len() {
            return Ok(());
        }
        let removed = attachments.remove(index);
        if let Some(handle) = removed.local_url.as_deref() {
            self.previews.revoke(handle);
        }
        self.persist(&attachments).await
    }

    /// Drops the whole staged list, releasing every preview handle.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let attachments = self.list().await?;
        self.release_previews(&attachments);
        self.store.remove(keys::ATTACHMENTS).await
    }

    /// Releases the preview handles of already-consumed attachments (e.g.
    /// after a successful quick-note save).
    pub fn release_previews(&self, attachments: &[Attachment]) {
        for attachment in attachments {
            if let Some(handle) = attachment.local_url.as_deref() {
                self.previews.revoke(handle);
            }
        }
    }
}
