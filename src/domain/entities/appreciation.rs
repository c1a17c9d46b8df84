use serde::Serialize;

// ───── Display Projection ───────────────────────────────────────────

/// Structured view of an appreciation for display purposes.
///
/// The storage shape is plain text (one `"text"` field per document);
/// this projection never round-trips back to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Appreciation {
    pub id: i64,
    pub title: String,
    pub from_person: String,
    pub description: String,
}

impl Appreciation {
    /// Projects stored text into the structured display form: first line
    /// becomes the title, the remainder the description.
    pub fn from_text(id: i64, text: &str) -> Self {
        let (title, description) = match text.split_once('\n') {
            Some((title, rest)) => (title.trim(), rest.trim()),
            None => (text.trim(), ""),
        };

        Appreciation {
            id,
            title: title.to_string(),
            from_person: String::new(),
            description: description.to_string(),
        }
    }
}
