use std::env;
use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tokio::fs;

use crate::config::Config;
use crate::types::ClientError;

use super::api_types::{
    DocType, ExtractTextResponse, SearchRequest, SearchResponse, SimilarRequest, SimilarResponse,
    UploadReceipt,
};
use super::executor::{self, RequestPolicy};
use super::probe::ReadinessProbe;

const ENV_API_URL: &str = "INKDEX_API_URL";

const HEALTH_PATH: &str = "/api/py/health";
const EXTRACT_PATH: &str = "/api/py/extract-text";
const UPLOAD_PATH: &str = "/api/py/upload";
const SEARCH_PATH: &str = "/api/py/search";
const SIMILAR_PATH: &str = "/api/py/similar";

/// HTTP client for the Inkdex backend.
#[derive(Clone)]
pub struct NotesClient {
    http: Client,
    base_url: String,
}

impl NotesClient {
    /// Resolve the backend base URL from env/config and prepare an HTTP
    /// client. `INKDEX_API_URL` wins over the config file.
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        let mut base_url = config.api_base_url.trim().to_string();
        if let Ok(custom) = env::var(ENV_API_URL) {
            let trimmed = custom.trim();
            if !trimmed.is_empty() {
                base_url = trimmed.to_string();
            }
        }
        Self::new(&base_url)
    }

    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        // Per-attempt deadlines live in RequestPolicy, so the shared
        // client carries no global timeout.
        let http = Client::builder().build().map_err(ClientError::Http)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Readiness probe bound to this client's health endpoint.
    pub fn readiness_probe(&self) -> ReadinessProbe {
        ReadinessProbe::new(self.http.clone(), self.endpoint(HEALTH_PATH))
    }

    pub async fn search(
        &self,
        request: &SearchRequest,
        policy: &RequestPolicy,
    ) -> Result<SearchResponse, ClientError> {
        let url = self.endpoint(SEARCH_PATH);
        let response = executor::execute(policy, || self.http.post(&url).json(request)).await?;
        response.json().await.map_err(ClientError::Http)
    }

    pub async fn similar(
        &self,
        request: &SimilarRequest,
        policy: &RequestPolicy,
    ) -> Result<SimilarResponse, ClientError> {
        let url = self.endpoint(SIMILAR_PATH);
        let response = executor::execute(policy, || self.http.post(&url).json(request)).await?;
        response.json().await.map_err(ClientError::Http)
    }

    /// Submit a file for OCR, embedding and indexing.
    pub async fn upload(
        &self,
        file: &Path,
        doc_type: DocType,
        title: Option<&str>,
        policy: &RequestPolicy,
    ) -> Result<UploadReceipt, ClientError> {
        let payload = FilePayload::read(file).await?;
        let url = self.endpoint(UPLOAD_PATH);
        let response = executor::execute(policy, || {
            let mut form = payload.to_form().text("doc_type", doc_type.as_str());
            if let Some(title) = title {
                form = form.text("title", title.to_string());
            }
            self.http.post(&url).multipart(form)
        })
        .await?;
        response.json().await.map_err(ClientError::Http)
    }

    /// Extract text from a file without storing it (search-by-image).
    pub async fn extract_text(
        &self,
        file: &Path,
        doc_type: DocType,
    ) -> Result<ExtractTextResponse, ClientError> {
        let payload = FilePayload::read(file).await?;
        let url = self.endpoint(EXTRACT_PATH);
        let policy = RequestPolicy::extract();
        let response = executor::execute(&policy, || {
            self.http
                .post(&url)
                .multipart(payload.to_form().text("doc_type", doc_type.as_str()))
        })
        .await?;
        response.json().await.map_err(ClientError::Http)
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// A file read once and re-attachable per retry attempt (multipart
/// forms are single-use).
struct FilePayload {
    file_name: String,
    bytes: Vec<u8>,
}

impl FilePayload {
    async fn read(path: &Path) -> Result<Self, ClientError> {
        let bytes = fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self { file_name, bytes })
    }

    fn to_form(&self) -> Form {
        Form::new().part(
            "file",
            Part::bytes(self.bytes.clone()).file_name(self.file_name.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use wiremock::matchers::{body_json, header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::super::api_types::SearchTarget;
    use super::super::executor::STEADY_STATE_RETRIES;
    use super::*;

    #[tokio::test]
    async fn search_posts_json_and_parses_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/py/search"))
            .and(body_json(serde_json::json!({
                "query": "photosynthesis",
                "search_target": "notes",
                "limit": 10,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    { "id": "1", "doc_type": "note", "text": "light reactions", "score": 0.92 }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        // Trailing slash on the base URL must not produce a double slash.
        let client = NotesClient::new(&format!("{}/", server.uri())).expect("client builds");
        let response = client
            .search(
                &SearchRequest {
                    query: "photosynthesis".to_string(),
                    search_target: SearchTarget::Notes,
                    limit: 10,
                },
                &RequestPolicy::search(STEADY_STATE_RETRIES),
            )
            .await
            .expect("search should succeed");
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].id, "1");
    }

    #[tokio::test]
    async fn upload_sends_multipart_and_parses_receipt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/py/upload"))
            .and(header_regex("content-type", "^multipart/form-data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "abc123",
                "doc_type": "note",
                "message": "Note processed and stored successfully"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"scanned page bytes").expect("write fixture");

        let client = NotesClient::new(&server.uri()).expect("client builds");
        let receipt = client
            .upload(
                file.path(),
                DocType::Note,
                Some("Biology"),
                &RequestPolicy::upload(STEADY_STATE_RETRIES),
            )
            .await
            .expect("upload should succeed");
        assert_eq!(receipt.id.as_deref(), Some("abc123"));
        assert_eq!(
            receipt.message.as_deref(),
            Some("Note processed and stored successfully")
        );
    }

    #[tokio::test]
    async fn readiness_probe_targets_the_health_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/py/health"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = NotesClient::new(&server.uri()).expect("client builds");
        assert!(client.readiness_probe().check_now().await);
    }
}
