use std::io::{Cursor, Read};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use zip::ZipArchive;

use crate::error::{Error, Result};

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

fn mime_for(lowercase_name: &str) -> &'static str {
    match lowercase_name.rsplit('.').next().unwrap_or_default() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

/// Unpack a ZIP/CBZ blob into pages, one inline `data:` URI per image entry,
/// ordered by entry name. The whole archive and every decoded image are held
/// in memory at once, which is acceptable for chapter sized archives.
pub fn extract_pages(data: &[u8]) -> Result<Vec<String>> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;

    let mut entries: Vec<(String, String)> = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_lowercase();
        if !IMAGE_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
            continue;
        }

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;

        let uri = format!("data:{};base64,{}", mime_for(&name), BASE64.encode(&bytes));
        entries.push((name, uri));
    }

    if entries.is_empty() {
        return Err(Error::EmptyArchive);
    }

    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries.into_iter().map(|(_, uri)| uri).collect())
}
