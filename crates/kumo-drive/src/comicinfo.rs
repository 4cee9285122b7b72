//! Metadata from a `ComicInfo.xml` sidecar.
//!
//! Extraction is literal tag matching, not XML parsing; a malformed document
//! just yields empty fields and must never fail a details fetch.

use fancy_regex::Regex;

/// Publishing status from the `<ty:PublishingStatusTachiyomi>` extension tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SeriesStatus {
    Ongoing,
    Completed,
    Hiatus,
    Cancelled,
    #[default]
    Unknown,
}

impl SeriesStatus {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "ongoing" => Self::Ongoing,
            "completed" | "ended" => Self::Completed,
            "hiatus" => Self::Hiatus,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Hiatus => "hiatus",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComicInfo {
    pub series: Option<String>,
    pub summary: Option<String>,
    pub writer: Option<String>,
    pub penciller: Option<String>,
    pub genre: Option<String>,
    pub status: SeriesStatus,
}

fn extract_tag(xml: &str, tag: &str) -> Option<String> {
    let re = Regex::new(&format!("(?s)<{tag}>(.*?)</{tag}>")).ok()?;
    let caps = re.captures(xml).ok()??;
    let value = caps.get(1)?.as_str().trim();
    (!value.is_empty()).then(|| value.to_string())
}

pub fn parse(xml: &str) -> ComicInfo {
    ComicInfo {
        series: extract_tag(xml, "Series"),
        summary: extract_tag(xml, "Summary"),
        writer: extract_tag(xml, "Writer"),
        penciller: extract_tag(xml, "Penciller"),
        genre: extract_tag(xml, "Genre"),
        status: extract_tag(xml, "ty:PublishingStatusTachiyomi")
            .map(|value| SeriesStatus::parse(&value))
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_writer() {
        let info = parse("<ComicInfo><Writer>Jane Doe</Writer></ComicInfo>");
        assert_eq!(info.writer.as_deref(), Some("Jane Doe"));
        assert_eq!(info.series, None);
    }

    #[test]
    fn test_missing_tag_is_absent_not_empty() {
        let info = parse("<ComicInfo><Series>Title</Series></ComicInfo>");
        assert_eq!(info.series.as_deref(), Some("Title"));
        assert!(info.summary.is_none());
        assert!(info.genre.is_none());
    }

    #[test]
    fn test_empty_tag_is_absent() {
        let info = parse("<ComicInfo><Summary>   </Summary></ComicInfo>");
        assert!(info.summary.is_none());
    }

    #[test]
    fn test_multiline_summary() {
        let info = parse("<ComicInfo><Summary>line one\nline two</Summary></ComicInfo>");
        assert_eq!(info.summary.as_deref(), Some("line one\nline two"));
    }

    #[test]
    fn test_status_mapping() {
        for (value, expected) in [
            ("Ongoing", SeriesStatus::Ongoing),
            ("Completed", SeriesStatus::Completed),
            ("ENDED", SeriesStatus::Completed),
            ("Hiatus", SeriesStatus::Hiatus),
            ("Cancelled", SeriesStatus::Cancelled),
            ("canceled", SeriesStatus::Cancelled),
            ("whatever", SeriesStatus::Unknown),
        ] {
            let xml = format!(
                "<ComicInfo><ty:PublishingStatusTachiyomi>{value}</ty:PublishingStatusTachiyomi></ComicInfo>"
            );
            assert_eq!(parse(&xml).status, expected, "status value {value}");
        }
    }

    #[test]
    fn test_status_defaults_to_unknown() {
        assert_eq!(parse("<ComicInfo/>").status, SeriesStatus::Unknown);
    }

    #[test]
    fn test_malformed_document_yields_defaults() {
        assert_eq!(parse("not xml at all <<<"), ComicInfo::default());
    }
}
