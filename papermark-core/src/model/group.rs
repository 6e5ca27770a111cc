use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named bundle of annotation ids representing one logical exam question.
///
/// Holds ids only; members are re-resolved against the store on every use and
/// dangling ids are tolerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationGroup {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub annotation_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl AnnotationGroup {
    pub fn new(name: impl Into<String>) -> Self {
        let id = Uuid::new_v4().to_string();
        let color = Some(color_for_id(&id));
        Self {
            id,
            name: name.into(),
            created_at: Utc::now(),
            annotation_ids: Vec::new(),
            color,
        }
    }
}

/// Display color for a group, with the hue derived from its id so no random
/// source is needed. Not semantically load-bearing.
pub(crate) fn color_for_id(id: &str) -> String {
    let hue = id
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)))
        % 360;
    format!("hsl({hue}, 70%, 80%)")
}
