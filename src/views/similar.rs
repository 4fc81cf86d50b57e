use tracing::{debug, warn};

use crate::notes_client::{
    NotesClient, ReadinessProbe, RequestPolicy, ScoredDocument, SearchTarget, SimilarRequest,
    SourceDocument, FIRST_OPERATION_RETRIES, STEADY_STATE_RETRIES,
};
use crate::types::ClientError;

use super::format::{result_row, truncate_text, DISPLAY_TEXT_LIMIT};
use super::phase::ViewPhase;

pub const DEFAULT_SIMILAR_LIMIT: u32 = 5;

/// Similar-document lookup view. There is no explicit submit: the
/// lookup fires when the view opens and again whenever the target
/// filter changes.
pub struct SimilarView {
    client: NotesClient,
    probe: ReadinessProbe,
    phase: ViewPhase,
    first_lookup: bool,
    document_id: String,
    target: SearchTarget,
    limit: u32,
    source: Option<SourceDocument>,
    results: Vec<ScoredDocument>,
    error: Option<String>,
}

impl SimilarView {
    /// Create the view and run the initial lookup immediately.
    pub async fn open(
        client: NotesClient,
        probe: ReadinessProbe,
        document_id: String,
        target: SearchTarget,
        limit: u32,
    ) -> Self {
        let mut view = Self {
            client,
            probe,
            phase: ViewPhase::Idle,
            first_lookup: true,
            document_id,
            target,
            limit,
            source: None,
            results: Vec::new(),
            error: None,
        };
        view.fetch().await;
        view
    }

    pub fn phase(&self) -> ViewPhase {
        self.phase
    }

    pub fn target(&self) -> SearchTarget {
        self.target
    }

    /// Changing the similarity-scope filter refetches; setting the
    /// same value again does nothing.
    pub async fn set_target(&mut self, target: SearchTarget) {
        if self.target == target {
            return;
        }
        self.target = target;
        self.fetch().await;
    }

    async fn fetch(&mut self) {
        if !self.phase.accepts_submission() {
            debug!("Similar lookup already in flight, ignoring refetch");
            return;
        }

        self.phase = ViewPhase::Submitting;
        self.error = None;
        self.results.clear();

        if self.first_lookup {
            self.probe.check_now().await;
        }

        let retries = if self.first_lookup {
            FIRST_OPERATION_RETRIES
        } else {
            STEADY_STATE_RETRIES
        };
        let request = SimilarRequest {
            document_id: self.document_id.clone(),
            search_target: self.target,
            limit: self.limit,
        };
        match self
            .client
            .similar(&request, &RequestPolicy::search(retries))
            .await
        {
            Ok(response) => {
                self.first_lookup = false;
                self.source = response.source_document;
                self.results = response.results;
                self.phase = ViewPhase::Success;
            }
            Err(err) => {
                warn!(error = ?err, "Similar lookup failed");
                self.source = None;
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
                let mut out = String::new();
                if let Some(source) = &self.source {
                    let title = source.title.as_deref().unwrap_or("Untitled");
                    out.push_str(&format!(
                        "Source: [{}] {} (id: {})\n",
                        source.doc_type.label(),
                        title,
                        source.id
                    ));
                    out.push_str(&format!(
                        "    {}\n\n",
                        truncate_text(&source.text, DISPLAY_TEXT_LIMIT)
                    ));
                }
                if self.results.is_empty() {
                    out.push_str("No similar documents found");
                    return out;
                }
                out.push_str(&format!(
                    "{} similar ({})\n",
                    self.results.len(),
                    self.target.label()
                ));
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
                .unwrap_or_else(|| "An error occurred while finding similar documents".to_string()),
            ViewPhase::Idle | ViewPhase::Submitting => String::new(),
        }
    }
}

fn describe_failure(err: &ClientError) -> String {
    match err {
        ClientError::Timeout { .. } => {
            "Similar lookup timed out. Please try again.".to_string()
        }
        ClientError::Gateway { .. } => {
            "Server unavailable (502 Bad Gateway). Please try again in a few minutes as the server might be restarting."
                .to_string()
        }
        ClientError::Api { message, .. } => message.clone(),
        other => format!("An error occurred while finding similar documents: {other}"),
    }
}
