//! Construction of the Drive `files.list` filter string, the `q` parameter.

pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// MIME types Drive reports for uploaded comic archives. Uploads without a
/// registered type land as octet-stream, so that one has to be queried too.
pub const ARCHIVE_MIMES: &[&str] = &[
    "application/zip",
    "application/x-cbz",
    "application/octet-stream",
];

/// Escape a value for interpolation into the Drive query language.
///
/// Drive string literals are single quoted; a stray quote in a folder ID or
/// search term would otherwise terminate the literal early.
pub fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Builder for the `q` filter of a `files.list` call.
pub struct Query {
    clauses: Vec<String>,
}

impl Query {
    pub fn children_of(folder_id: &str) -> Self {
        Self {
            clauses: vec![format!("'{}' in parents", escape(folder_id))],
        }
    }

    /// Restrict to Drive folders.
    pub fn folders(mut self) -> Self {
        self.clauses.push(format!("mimeType = '{FOLDER_MIME}'"));
        self
    }

    /// Restrict to anything that can be a chapter, folders and archive files.
    pub fn chapter_candidates(mut self) -> Self {
        let mut alternatives = vec![format!("mimeType = '{FOLDER_MIME}'")];
        alternatives.extend(ARCHIVE_MIMES.iter().map(|mime| format!("mimeType = '{mime}'")));
        self.clauses.push(format!("({})", alternatives.join(" or ")));
        self
    }

    /// Restrict to page media, images and videos.
    pub fn media(mut self) -> Self {
        self.clauses
            .push("(mimeType contains 'image/' or mimeType contains 'video/')".to_string());
        self
    }

    pub fn name_contains(mut self, needle: &str) -> Self {
        self.clauses
            .push(format!("name contains '{}'", escape(needle)));
        self
    }

    pub fn build(self) -> String {
        self.clauses.join(" and ")
    }
}
