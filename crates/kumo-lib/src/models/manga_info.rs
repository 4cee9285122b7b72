use serde::{Deserialize, Serialize};

/// A type represent manga details, normalized across source
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct MangaInfo {
    pub source_id: i64,
    pub title: String,
    pub author: Vec<String>,
    pub artist: Vec<String>,
    pub genre: Vec<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    /// Source specific locator, an opaque value the source can resolve back
    /// to the manga, not necessarily a URL
    pub path: String,
    pub cover_url: Option<String>,
}
