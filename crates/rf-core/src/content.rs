//! Source content and the metadata derived from it for publishing.

use serde::{Deserialize, Serialize};

/// Promotional suffix appended to every published title.
pub const TITLE_SUFFIX: &str = " #shorts";
/// Hashtag suffix appended to every published description.
pub const DESCRIPTION_SUFFIX: &str = " #aitah #aita #shorts";

/// One text post pulled from the content source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub title: String,
    pub body: String,
}

impl ContentItem {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Title and description handed to the publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishMetadata {
    pub title: String,
    pub description: String,
}

impl PublishMetadata {
    /// Derive publish metadata from a content item: the title and body with
    /// the promotional suffixes appended. Platform limits are the
    /// publisher's concern.
    pub fn from_content(item: &ContentItem) -> Self {
        Self {
            title: format!("{}{TITLE_SUFFIX}", item.title),
            description: format!("{}{DESCRIPTION_SUFFIX}", item.body),
        }
    }
}

/// Confirmation returned by a publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    /// Platform identifier of the published video.
    pub video_id: String,
    /// Public URL, when the platform provides one.
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_suffixes() {
        let meta = PublishMetadata::from_content(&ContentItem::new("T", "B"));
        assert_eq!(meta.title, "T #shorts");
        assert_eq!(meta.description, "B #aitah #aita #shorts");
    }

    #[test]
    fn long_title_keeps_suffix_unchanged() {
        let title = "AITA for refusing to let my brother bring his new girlfriend to the family reunion after what he did last year?";
        assert_eq!(title.chars().count(), 111);
        let meta = PublishMetadata::from_content(&ContentItem::new(title, "B"));
        assert_eq!(meta.title, format!("{title} #shorts"));
    }

    #[test]
    fn long_body_is_not_shortened() {
        let body = "ü".repeat(4000);
        let meta = PublishMetadata::from_content(&ContentItem::new("t", body.clone()));
        assert_eq!(meta.description, format!("{body} #aitah #aita #shorts"));
    }

    #[test]
    fn short_text_is_untouched() {
        let item = ContentItem::new("AITA for leaving early?", "So yesterday I...");
        let meta = PublishMetadata::from_content(&item);
        assert_eq!(meta.title, "AITA for leaving early? #shorts");
        assert_eq!(meta.description, "So yesterday I... #aitah #aita #shorts");
    }
}
