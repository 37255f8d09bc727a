use async_trait::async_trait;
use clipnote_core::{source_link_line, Attachment, NoteKind, Settings};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::endpoints::{clean_domain, normalize_api_base, normalize_auth_token};
use crate::types::OrchestrationError;

/// A note ready to be persisted, before link/tag composition.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDraft {
    pub content: String,
    pub url: Option<String>,
    pub title: Option<String>,
    pub attachments: Vec<Attachment>,
    pub kind: NoteKind,
}

impl NoteDraft {
    pub fn new(content: impl Into<String>, kind: NoteKind) -> Self {
        Self {
            content: content.into(),
            url: None,
            title: None,
            attachments: Vec::new(),
            kind,
        }
    }

    pub fn with_page(mut self, url: Option<String>, title: Option<String>) -> Self {
        self.url = url;
        self.title = title;
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// Persistence collaborator ("save").
#[async_trait]
pub trait NoteSink: Send + Sync {
    async fn save_note(
        &self,
        draft: NoteDraft,
        settings: &Settings,
    ) -> Result<(), OrchestrationError>;

    /// Uploads a binary attachment and returns its stored descriptor.
    async fn upload_attachment(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
        settings: &Settings,
    ) -> Result<Attachment, OrchestrationError>;
}

/// Appends the source link and category tag a saved note carries, driven by
/// the per-kind settings toggles.
pub fn compose_note_content(draft: &NoteDraft, settings: &Settings) -> String {
    let mut content = draft.content.clone();
    let title = draft.title.as_deref();

    if let Some(url) = draft.url.as_deref() {
        let include = match draft.kind {
            NoteKind::Summary => settings.include_summary_url,
            NoteKind::Extract => settings.include_selection_url,
            NoteKind::Image => settings.include_image_url,
            // Quick notes only gain a link when the text does not already
            // carry this exact one.
            NoteKind::QuickNote => {
                settings.include_quick_note_url
                    && !content.contains(&source_link_line(title, url))
            }
        };
        if include {
            if draft.kind == NoteKind::Image {
                let label = title.filter(|t| !t.is_empty()).unwrap_or(url);
                let sep = if content.is_empty() { "" } else { "\n\n" };
                content = format!("{content}{sep}> 来源：[{label}]({url})");
            } else {
                content = format!("{content}\n\n{}", source_link_line(title, url));
            }
        }
    }

    let tag = match draft.kind {
        NoteKind::Summary => settings.summary_tag.as_str(),
        NoteKind::Extract => settings.extract_tag.as_str(),
        NoteKind::Image => settings.image_tag.as_str(),
        NoteKind::QuickNote => "",
    };
    if !tag.is_empty() {
        content = if content.is_empty() {
            tag.to_string()
        } else {
            format!("{content}\n\n{tag}")
        };
    }

    content
}

/// Note service client.
#[derive(Debug, Clone, Default)]
pub struct NotebookClient {
    client: reqwest::Client,
}

impl NotebookClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn credentials<'a>(
        settings: &'a Settings,
    ) -> Result<(&'a str, &'a str), OrchestrationError> {
        if settings.target_url.is_empty() || settings.auth_key.is_empty() {
            return Err(OrchestrationError::configuration(
                "note service URL and auth key",
            ));
        }
        Ok((&settings.target_url, &settings.auth_key))
    }
}

/// The attachment shape sent on the wire; local preview handles stay local.
#[derive(Debug, Serialize)]
struct AttachmentRef<'a> {
    name: &'a str,
    path: &'a str,
    size: u64,
    #[serde(rename = "type")]
    content_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct UpsertBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadBody {
    status: Option<i64>,
    #[serde(rename = "filePath")]
    file_path: Option<String>,
    #[serde(rename = "fileName")]
    file_name: Option<String>,
    size: Option<u64>,
    #[serde(rename = "type")]
    content_type: Option<String>,
}

#[async_trait]
impl NoteSink for NotebookClient {
    async fn save_note(
        &self,
        draft: NoteDraft,
        settings: &Settings,
    ) -> Result<(), OrchestrationError> {
        let (target_url, auth_key) = Self::credentials(settings)?;
        let request_url = format!("{}/note/upsert", normalize_api_base(target_url));

        let content = compose_note_content(&draft, settings);
        let mut body = json!({ "content": content, "type": 0 });
        if !draft.attachments.is_empty() {
            let refs: Vec<AttachmentRef<'_>> = draft
                .attachments
                .iter()
                .map(|a| AttachmentRef {
                    name: &a.name,
                    path: &a.path,
                    size: a.size,
                    content_type: &a.content_type,
                })
                .collect();
            body["attachments"] = serde_json::to_value(refs)
                .map_err(|err| OrchestrationError::response_format(err.to_string()))?;
        }

        let response = self
            .client
            .post(request_url)
            .header(reqwest::header::AUTHORIZATION, normalize_auth_token(auth_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<UpsertBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| status.to_string());
            return Err(OrchestrationError::transport(
                Some(status.as_u16()),
                format!("note save failed: {detail}"),
            ));
        }

        Ok(())
    }

    async fn upload_attachment(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
        settings: &Settings,
    ) -> Result<Attachment, OrchestrationError> {
        let (target_url, auth_key) = Self::credentials(settings)?;
        let upload_url = format!("{}/api/file/upload", clean_domain(target_url));

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|err| OrchestrationError::content(err.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(upload_url)
            .header(reqwest::header::AUTHORIZATION, normalize_auth_token(auth_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OrchestrationError::transport(
                Some(status.as_u16()),
                format!("attachment upload failed: {status}"),
            ));
        }

        let body: UploadBody = response
            .json()
            .await
            .map_err(|err| OrchestrationError::response_format(err.to_string()))?;
        let (path, size) = match (body.status, body.file_path, body.size) {
            (Some(200), Some(path), size) => (path, size.unwrap_or(0)),
            _ => {
                return Err(OrchestrationError::response_format(
                    "upload response misses status or file path",
                ))
            }
        };

        Ok(Attachment {
            name: body.file_name.unwrap_or_else(|| file_name.to_string()),
            path,
            size,
            content_type: body.content_type.unwrap_or_else(|| content_type.to_string()),
            original_url: None,
            local_url: None,
        })
    }
}
