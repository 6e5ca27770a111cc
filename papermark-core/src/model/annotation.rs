use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AnnotationKind, Rect, RelativeRect};

/// A classified rectangular region on one PDF page.
///
/// `relative_rectangle` is authoritative across zoom changes; `rectangle` is
/// the cached pixel projection at the scale active when it was last computed.
/// Parent/child image links are not stored here; they live in the store's
/// relation table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: String,
    pub page_number: u32,
    pub rectangle: Rect,
    pub relative_rectangle: RelativeRect,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

impl Annotation {
    /// Create an annotation for a freshly drawn region.
    ///
    /// The label defaults to the kind name plus the creation time; callers
    /// overwrite it with OCR or user-provided text.
    pub fn new(
        page_number: u32,
        rectangle: Rect,
        relative_rectangle: RelativeRect,
        kind: AnnotationKind,
    ) -> Self {
        let created_at = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            page_number,
            rectangle,
            relative_rectangle,
            created_at,
            thumbnail: None,
            kind,
            label: format!("{} {}", kind.as_str(), created_at.format("%H:%M:%S")),
            group_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageViewport;

    #[test]
    fn test_new_defaults() {
        let viewport = PageViewport::new(800.0, 1000.0);
        let rect = Rect::new(40.0, 50.0, 160.0, 30.0);
        let annotation =
            Annotation::new(2, rect, rect.to_relative(viewport), AnnotationKind::Answer);

        assert_eq!(annotation.page_number, 2);
        assert!(annotation.label.starts_with("答案 "));
        assert!(annotation.group_id.is_none());
        assert!(annotation.thumbnail.is_none());
        assert!(!annotation.id.is_empty());
    }

    #[test]
    fn test_serde_shape() {
        let viewport = PageViewport::new(800.0, 1000.0);
        let rect = Rect::new(40.0, 50.0, 160.0, 30.0);
        let annotation =
            Annotation::new(1, rect, rect.to_relative(viewport), AnnotationKind::Question);

        let json = serde_json::to_string(&annotation).unwrap();
        assert!(json.contains("\"pageNumber\":1"));
        assert!(json.contains("\"type\":\"问题\""));
        assert!(json.contains("\"relativeRectangle\""));
        // Unset optionals stay off the wire
        assert!(!json.contains("groupId"));
        assert!(!json.contains("thumbnail"));
    }
}
