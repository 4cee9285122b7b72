use fancy_regex::Regex;

/// Pull the folder ID out of a shared Google Drive link.
///
/// Handles the usual shapes:
/// `https://drive.google.com/drive/folders/{id}`,
/// `https://drive.google.com/drive/folders/{id}?usp=sharing`,
/// `https://drive.google.com/drive/u/0/folders/{id}`.
///
/// Input without a `folders/` segment is assumed to already be a bare ID and
/// passed through unchanged. Blank input yields an empty string, never an
/// error.
pub fn extract_folder_id(input: &str) -> String {
    let input = input.trim();
    if input.is_empty() {
        return String::new();
    }

    let re = match Regex::new(r"folders/([a-zA-Z0-9_-]+)") {
        Ok(re) => re,
        Err(_) => return input.to_string(),
    };

    match re.captures(input) {
        Ok(Some(caps)) => caps
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| input.to_string()),
        _ => input.to_string(),
    }
}
