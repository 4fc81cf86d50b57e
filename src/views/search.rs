use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::notes_client::{
    DocType, NotesClient, ReadinessProbe, RequestPolicy, ScoredDocument, SearchRequest,
    SearchTarget, FIRST_OPERATION_RETRIES, STEADY_STATE_RETRIES,
};
use crate::types::ClientError;

use super::ensure_within_size_limit;
use super::format::{result_row, truncate_text, DISPLAY_TEXT_LIMIT, QUERY_SEED_LIMIT};
use super::phase::ViewPhase;

pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// Query submission view: a text query (typed or seeded from a photo
/// via OCR-assist), a target filter and a ranked result list.
pub struct SearchView {
    client: NotesClient,
    probe: ReadinessProbe,
    phase: ViewPhase,
    first_search: bool,
    query: String,
    target: SearchTarget,
    limit: u32,
    attached_file: Option<PathBuf>,
    results: Vec<ScoredDocument>,
    error: Option<String>,
}

impl SearchView {
    pub fn new(client: NotesClient, probe: ReadinessProbe) -> Self {
        Self {
            client,
            probe,
            phase: ViewPhase::Idle,
            first_search: true,
            query: String::new(),
            target: SearchTarget::Both,
            limit: DEFAULT_SEARCH_LIMIT,
            attached_file: None,
            results: Vec::new(),
            error: None,
        }
    }

    pub fn phase(&self) -> ViewPhase {
        self.phase
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: String) {
        self.query = query;
    }

    pub fn set_target(&mut self, target: SearchTarget) {
        self.target = target;
    }

    pub fn set_limit(&mut self, limit: u32) {
        self.limit = limit;
    }

    /// OCR-assist: when a file is attached and no query was typed, the
    /// file goes to the extraction endpoint and the (truncated)
    /// extracted text seeds the query field.
    pub async fn attach_file(&mut self, path: PathBuf) {
        if !self.phase.accepts_submission() {
            debug!("Search busy, ignoring file attachment");
            return;
        }
        self.attached_file = Some(path.clone());
        if !self.query.trim().is_empty() {
            // Manually entered text wins over extraction.
            return;
        }

        self.phase = ViewPhase::Submitting;
        self.error = None;
        match self.extract_query_seed(&path).await {
            Ok(seed) => {
                self.query = seed;
                self.phase = ViewPhase::Idle;
            }
            Err(err) => {
                if !err.is_validation() {
                    warn!(error = ?err, "Text extraction failed");
                }
                self.error = Some(describe_extract_failure(&err));
                self.phase = ViewPhase::Failed;
            }
        }
    }

    async fn extract_query_seed(&self, path: &Path) -> Result<String, ClientError> {
        ensure_within_size_limit(path).await?;
        // Extraction runs against the generic document pipeline; the
        // file is not stored.
        let extracted = self.client.extract_text(path, DocType::Document).await?;
        if extracted.text.trim().is_empty() {
            return Err(ClientError::NoExtractedText);
        }
        Ok(truncate_text(&extracted.text, QUERY_SEED_LIMIT))
    }

    pub async fn submit(&mut self) {
        if !self.phase.accepts_submission() {
            debug!("Search already in flight, ignoring submission");
            return;
        }
        if self.query.trim().is_empty() {
            self.error = Some("Please enter a search query or attach a file".to_string());
            self.phase = ViewPhase::Failed;
            return;
        }

        self.phase = ViewPhase::Submitting;
        self.error = None;
        self.results.clear();

        if self.first_search {
            self.probe.check_now().await;
        }

        let retries = if self.first_search {
            FIRST_OPERATION_RETRIES
        } else {
            STEADY_STATE_RETRIES
        };
        let request = SearchRequest {
            query: self.query.trim().to_string(),
            search_target: self.target,
            limit: self.limit,
        };
        match self
            .client
            .search(&request, &RequestPolicy::search(retries))
            .await
        {
            Ok(response) => {
                self.first_search = false;
                self.results = response.results;
                self.phase = ViewPhase::Success;
            }
            Err(err) => {
                warn!(error = ?err, "Search failed");
                self.results.clear();
                self.error = Some(describe_failure(&err));
                self.phase = ViewPhase::Failed;
            }
        }
    }

    pub fn results(&self) -> &[ScoredDocument] {
        &self.results
    }

    pub fn render(&self) -> String {
        match self.phase {
            ViewPhase::Success => {
                if self.results.is_empty() {
                    return "No matching results found".to_string();
                }
                let mut out = format!(
                    "{} result{} found\n",
                    self.results.len(),
                    if self.results.len() == 1 { "" } else { "s" }
                );
                for doc in &self.results {
                    out.push_str(&result_row(doc));
                    out.push('\n');
                    out.push_str(&format!(
                        "    {}\n",
                        truncate_text(&doc.text, DISPLAY_TEXT_LIMIT)
                    ));
                    out.push_str(&format!("    id: {}\n", doc.id));
                }
                out.trim_end().to_string()
            }
            ViewPhase::Failed => self
                .error
                .clone()
                .unwrap_or_else(|| "Search failed".to_string()),
            ViewPhase::Idle | ViewPhase::Submitting => String::new(),
        }
    }

    #[cfg(test)]
    fn force_submitting(&mut self) {
        self.phase = ViewPhase::Submitting;
    }
}

fn describe_failure(err: &ClientError) -> String {
    match err {
        ClientError::Timeout { .. } => "Search request timed out. Please try again.".to_string(),
        ClientError::Gateway { .. } => {
            "Server unavailable (502 Bad Gateway). Please try again in a few minutes as the server might be restarting."
                .to_string()
        }
        ClientError::Api { message, .. } => format!("Search failed: {message}"),
        other => format!("Search failed: {other}"),
    }
}

fn describe_extract_failure(err: &ClientError) -> String {
    match err {
        ClientError::Timeout { .. } => {
            "Text extraction timed out. Please try again with a simpler image.".to_string()
        }
        ClientError::FileTooLarge { .. } => {
            "File too large. Please upload a file smaller than 10 MiB.".to_string()
        }
        ClientError::NoExtractedText => "No text was extracted from the image".to_string(),
        ClientError::Api { message, .. } => message.clone(),
        other => format!("An error occurred while processing the image: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::types::MAX_UPLOAD_BYTES;

    use super::*;

    async fn view_for(server: &MockServer) -> SearchView {
        let client = NotesClient::new(&server.uri()).expect("client builds");
        let probe = client.readiness_probe();
        SearchView::new(client, probe)
    }

    async fn mount_health(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/py/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn renders_one_labeled_row_per_result() {
        let server = MockServer::start().await;
        mount_health(&server).await;
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

        let mut view = view_for(&server).await;
        view.set_query("photosynthesis".to_string());
        view.set_target(SearchTarget::Notes);
        view.submit().await;

        assert_eq!(view.phase(), ViewPhase::Success);
        let rendering = view.render();
        let rows: Vec<&str> = rendering
            .lines()
            .filter(|line| line.starts_with('['))
            .collect();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].starts_with("[Note]"));
        assert!(rows[0].contains("92%"));
    }

    #[tokio::test]
    async fn zero_results_render_the_no_results_message() {
        let server = MockServer::start().await;
        mount_health(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/py/search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "results": [] })),
            )
            .mount(&server)
            .await;

        let mut view = view_for(&server).await;
        view.set_query("unmatched".to_string());
        view.submit().await;

        assert_eq!(view.phase(), ViewPhase::Success);
        assert_eq!(view.render(), "No matching results found");
    }

    #[tokio::test]
    async fn response_without_results_field_is_treated_as_empty() {
        let server = MockServer::start().await;
        mount_health(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/py/search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "query": "x" })),
            )
            .mount(&server)
            .await;

        let mut view = view_for(&server).await;
        view.set_query("x".to_string());
        view.submit().await;
        assert_eq!(view.render(), "No matching results found");
    }

    #[tokio::test]
    async fn empty_query_never_reaches_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut view = view_for(&server).await;
        view.set_query("   ".to_string());
        view.submit().await;

        assert_eq!(view.phase(), ViewPhase::Failed);
        assert_eq!(view.render(), "Please enter a search query or attach a file");
    }

    #[tokio::test]
    async fn ocr_assist_seeds_and_truncates_the_query() {
        let server = MockServer::start().await;
        let long_text = "a".repeat(1500);
        Mock::given(method("POST"))
            .and(path("/api/py/extract-text"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "text": long_text })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"photo bytes").expect("write fixture");

        let mut view = view_for(&server).await;
        view.attach_file(file.path().to_path_buf()).await;

        assert_eq!(view.phase(), ViewPhase::Idle);
        assert_eq!(view.query().chars().count(), 1003);
        assert!(view.query().ends_with("..."));
    }

    #[tokio::test]
    async fn typed_text_suppresses_ocr_assist() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/py/extract-text"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"photo bytes").expect("write fixture");

        let mut view = view_for(&server).await;
        view.set_query("typed query".to_string());
        view.attach_file(file.path().to_path_buf()).await;
        assert_eq!(view.query(), "typed query");
    }

    #[tokio::test]
    async fn empty_extraction_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/py/extract-text"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "text": "  " })),
            )
            .mount(&server)
            .await;

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"photo bytes").expect("write fixture");

        let mut view = view_for(&server).await;
        view.attach_file(file.path().to_path_buf()).await;
        assert_eq!(view.phase(), ViewPhase::Failed);
        assert_eq!(view.render(), "No text was extracted from the image");
    }

    #[tokio::test]
    async fn oversized_attachment_is_rejected_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(&vec![0u8; MAX_UPLOAD_BYTES as usize + 1])
            .expect("write fixture");

        let mut view = view_for(&server).await;
        view.attach_file(file.path().to_path_buf()).await;
        assert_eq!(view.phase(), ViewPhase::Failed);
        assert_eq!(
            view.render(),
            "File too large. Please upload a file smaller than 10 MiB."
        );
    }

    #[tokio::test]
    async fn busy_view_ignores_a_second_submission() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut view = view_for(&server).await;
        view.set_query("anything".to_string());
        view.force_submitting();
        view.submit().await;
        assert_eq!(view.phase(), ViewPhase::Submitting);
    }
}
