mod api_types;
mod client;
mod executor;
mod probe;

pub use api_types::{
    DocType, ExtractTextResponse, ScoredDocument, SearchRequest, SearchResponse, SearchTarget,
    SimilarRequest, SimilarResponse, SourceDocument, UploadReceipt,
};
pub use client::NotesClient;
pub use executor::{RequestPolicy, FIRST_OPERATION_RETRIES, STEADY_STATE_RETRIES};
pub use probe::ReadinessProbe;
