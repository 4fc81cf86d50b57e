use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::notes_client::{
    DocType, NotesClient, ReadinessProbe, RequestPolicy, UploadReceipt, FIRST_OPERATION_RETRIES,
    STEADY_STATE_RETRIES,
};
use crate::types::ClientError;

use super::ensure_within_size_limit;
use super::phase::ViewPhase;

/// Document submission view: collects a file, a document type and an
/// optional title, then submits them for OCR and indexing.
pub struct UploadView {
    client: NotesClient,
    probe: ReadinessProbe,
    phase: ViewPhase,
    first_upload: bool,
    file: Option<PathBuf>,
    title: Option<String>,
    doc_type: DocType,
    receipt: Option<UploadReceipt>,
    error: Option<String>,
}

impl UploadView {
    pub fn new(client: NotesClient, probe: ReadinessProbe) -> Self {
        Self {
            client,
            probe,
            phase: ViewPhase::Idle,
            first_upload: true,
            file: None,
            title: None,
            doc_type: DocType::Note,
            receipt: None,
            error: None,
        }
    }

    pub fn phase(&self) -> ViewPhase {
        self.phase
    }

    /// Selecting a new file clears the previous outcome.
    pub fn set_file(&mut self, path: PathBuf) {
        self.file = Some(path);
        self.receipt = None;
        self.error = None;
    }

    pub fn set_title(&mut self, title: String) {
        self.title = Some(title);
    }

    pub fn set_doc_type(&mut self, doc_type: DocType) {
        self.doc_type = doc_type;
    }

    pub async fn submit(&mut self) {
        if !self.phase.accepts_submission() {
            debug!("Upload already in flight, ignoring submission");
            return;
        }
        let Some(file) = self.file.clone() else {
            self.error = Some("Please select a file to upload".to_string());
            self.phase = ViewPhase::Failed;
            return;
        };

        self.phase = ViewPhase::Submitting;
        self.receipt = None;
        self.error = None;

        if self.first_upload {
            // Best-effort warm-up; the upload proceeds either way.
            self.probe.check_now().await;
        }

        match self.perform(&file).await {
            Ok(receipt) => {
                self.first_upload = false;
                self.receipt = Some(receipt);
                // Form resets for the next document.
                self.file = None;
                self.title = None;
                self.phase = ViewPhase::Success;
            }
            Err(err) => {
                if !err.is_validation() {
                    warn!(error = ?err, "Upload failed");
                }
                self.error = Some(describe_failure(&err));
                self.phase = ViewPhase::Failed;
            }
        }
    }

    async fn perform(&self, file: &Path) -> Result<UploadReceipt, ClientError> {
        ensure_within_size_limit(file).await?;
        let retries = if self.first_upload {
            FIRST_OPERATION_RETRIES
        } else {
            STEADY_STATE_RETRIES
        };
        let policy = RequestPolicy::upload(retries);
        self.client
            .upload(file, self.doc_type, self.title.as_deref(), &policy)
            .await
    }

    pub fn render(&self) -> String {
        match self.phase {
            ViewPhase::Success => {
                let mut lines = vec!["Document uploaded successfully.".to_string()];
                if let Some(receipt) = &self.receipt {
                    if let Some(message) = &receipt.message {
                        lines.push(message.clone());
                    }
                    if let Some(id) = &receipt.id {
                        lines.push(format!("id: {id}"));
                    }
                }
                lines.join("\n")
            }
            ViewPhase::Failed => self
                .error
                .clone()
                .unwrap_or_else(|| "Upload failed".to_string()),
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
        ClientError::Timeout { .. } => {
            "Upload request timed out. Your file might be too large or the connection is slow."
                .to_string()
        }
        ClientError::Gateway { .. } => {
            "Server unavailable (502 Bad Gateway). Please try again in a few minutes as the server might be restarting."
                .to_string()
        }
        ClientError::FileTooLarge { .. } => {
            "File too large. Please upload a file smaller than 10 MiB.".to_string()
        }
        ClientError::Api { message, .. } => format!("Upload failed: {message}"),
        other => format!("Upload failed: {other}"),
    }
}
