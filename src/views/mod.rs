mod format;
mod phase;
mod search;
mod similar;
mod upload;

use std::path::Path;

use crate::types::{ClientError, MAX_UPLOAD_BYTES};

pub use phase::ViewPhase;
pub use search::{SearchView, DEFAULT_SEARCH_LIMIT};
pub use similar::{SimilarView, DEFAULT_SIMILAR_LIMIT};
pub use upload::UploadView;

/// Reject oversized files from metadata alone, before any bytes are
/// read or transmitted.
async fn ensure_within_size_limit(path: &Path) -> Result<(), ClientError> {
    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_UPLOAD_BYTES {
        return Err(ClientError::FileTooLarge {
            bytes: metadata.len(),
        });
    }
    Ok(())
}
