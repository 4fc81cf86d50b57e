use crate::notes_client::ScoredDocument;

/// Result text shown per row before cutting off.
pub const DISPLAY_TEXT_LIMIT: usize = 200;
/// Extracted OCR text seeded into the query field before cutting off.
pub const QUERY_SEED_LIMIT: usize = 1000;

/// Truncate to `max_chars` characters, appending an ellipsis when text
/// was actually cut.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}...")
}

/// Cosine score rendered the way users read it: "92%".
pub fn format_match(score: f64) -> String {
    format!("{:.0}%", score * 100.0)
}

/// Header line for one ranked hit.
pub fn result_row(doc: &ScoredDocument) -> String {
    match &doc.title {
        Some(title) => format!(
            "[{}] {} ({} match)",
            doc.doc_type.label(),
            title,
            format_match(doc.score)
        ),
        None => format!("[{}] ({} match)", doc.doc_type.label(), format_match(doc.score)),
    }
}
