use async_trait::async_trait;
use clipnote_core::Settings;
use serde::Deserialize;

use crate::endpoints::normalize_auth_token;
use crate::types::OrchestrationError;

const DEFAULT_READER_ENDPOINT: &str = "https://r.jina.ai";

/// A readability rendition of a page, fetched from the reader service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOutput {
    pub content: String,
    pub title: String,
    pub url: String,
}

/// Content acquisition collaborator used by the extraction path.
#[async_trait]
pub trait ContentReader: Send + Sync {
    async fn read(&self, url: &str, settings: &Settings) -> Result<ReadOutput, OrchestrationError>;
}

/// Reader-service client. The service is addressed as `{endpoint}/{page-url}`
/// and answers JSON `{code, data: {title, content, url}}`.
#[derive(Debug, Clone)]
pub struct RemoteReader {
    endpoint: String,
    client: reqwest::Client,
}

impl RemoteReader {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_READER_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

impl Default for RemoteReader {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ReaderEnvelope {
    code: i64,
    data: Option<ReaderData>,
}

#[derive(Debug, Deserialize)]
struct ReaderData {
    title: String,
    content: String,
    url: String,
}

#[async_trait]
impl ContentReader for RemoteReader {
    async fn read(&self, url: &str, settings: &Settings) -> Result<ReadOutput, OrchestrationError> {
        let mut request = self
            .client
            .get(format!("{}/{url}", self.endpoint))
            .header(reqwest::header::ACCEPT, "application/json");

        if !settings.save_web_images {
            request = request.header("X-Retain-Images", "none");
        }
        if settings.use_reader_api_key && !settings.reader_api_key.is_empty() {
            request = request.header(
                reqwest::header::AUTHORIZATION,
                normalize_auth_token(&settings.reader_api_key),
            );
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(OrchestrationError::transport(
                Some(status.as_u16()),
                format!("reader request failed: {status}"),
            ));
        }

        let envelope: ReaderEnvelope = response
            .json()
            .await
            .map_err(|err| OrchestrationError::response_format(err.to_string()))?;
        let data = match envelope {
            ReaderEnvelope {
                code: 200,
                data: Some(data),
            } => data,
            ReaderEnvelope { code, .. } => {
                return Err(OrchestrationError::response_format(format!(
                    "reader answered code {code} without data"
                )))
            }
        };

        Ok(ReadOutput {
            content: format!("# {}\n\n{}", data.title, data.content),
            title: data.title,
            url: data.url,
        })
    }
}
