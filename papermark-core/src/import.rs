//! Import half of the question-bank transformer.
//!
//! Two recognized document shapes, resolved once at the JSON boundary into a
//! tagged variant instead of branch-by-branch shape sniffing. The wire
//! structs here are far more lenient than what export emits; the two sides
//! are intentionally asymmetric.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::model::{color_for_id, Annotation, AnnotationGroup, AnnotationKind, Rect, RelativeRect};
use crate::store::AnnotationStore;

/// Recognized import document shapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImportDocument {
    QuestionBank(BankDocument),
    Flat(FlatDocument),
}

/// The hierarchical question-bank shape (`{questions: [...]}`).
#[derive(Debug, Clone, Deserialize)]
pub struct BankDocument {
    pub questions: Vec<ImportQuestion>,
}

/// The flat shape (`{annotations: [...], groups: [...]}`).
#[derive(Debug, Clone, Deserialize)]
pub struct FlatDocument {
    pub annotations: Vec<ImportAnnotation>,
    #[serde(default)]
    pub groups: Vec<ImportGroup>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportQuestion {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub questions: Vec<ImportItem>,
    #[serde(default)]
    pub options: Vec<ImportItem>,
    #[serde(default)]
    pub answers: Vec<ImportItem>,
    #[serde(default)]
    pub others: Vec<ImportItem>,
    #[serde(default)]
    pub parses: Vec<ImportItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub page_number: Option<u32>,
    #[serde(default)]
    pub rectangle: Option<Rect>,
    #[serde(default)]
    pub relative_rectangle: Option<RelativeRect>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub images: Vec<ImportImage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportImage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub page_number: Option<u32>,
    #[serde(default)]
    pub rectangle: Option<Rect>,
    #[serde(default)]
    pub relative_rectangle: Option<RelativeRect>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportAnnotation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub page_number: Option<u32>,
    #[serde(default)]
    pub rectangle: Option<Rect>,
    #[serde(default)]
    pub relative_rectangle: Option<RelativeRect>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "type", default)]
    pub kind: Option<AnnotationKind>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub child_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportGroup {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub annotation_ids: Vec<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Outcome of a structural pre-flight check. Never mutates anything.
#[derive(Debug, Clone)]
pub struct Validation {
    pub valid: bool,
    pub message: String,
}

impl Validation {
    fn ok(message: &str) -> Self {
        Self {
            valid: true,
            message: message.to_string(),
        }
    }

    fn invalid(message: String) -> Self {
        Self {
            valid: false,
            message,
        }
    }
}

/// Result of an import, reported instead of raised.
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub success: bool,
    pub imported_count: usize,
    pub imported_group_count: usize,
    pub message: String,
}

impl ImportReport {
    fn failure(message: String) -> Self {
        Self {
            success: false,
            imported_count: 0,
            imported_group_count: 0,
            message,
        }
    }
}

/// Structural pre-flight check on raw JSON: the document shape must be
/// recognized and every item in every typed array must carry both
/// `rectangle` and `relativeRectangle`.
pub fn validate_import(data: &Value) -> Validation {
    match serde_json::from_value::<ImportDocument>(data.clone()) {
        Ok(document) => validate_document(&document),
        Err(_) => Validation::invalid("unrecognized import document shape".to_string()),
    }
}

/// Same check on an already-resolved document.
pub fn validate_document(document: &ImportDocument) -> Validation {
    match document {
        ImportDocument::QuestionBank(bank) => {
            for question in &bank.questions {
                let arrays = [
                    ("questions", &question.questions),
                    ("options", &question.options),
                    ("answers", &question.answers),
                    ("others", &question.others),
                    ("parses", &question.parses),
                ];
                for (name, items) in arrays {
                    for item in items {
                        if item.rectangle.is_none() || item.relative_rectangle.is_none() {
                            return Validation::invalid(format!(
                                "item in \"{name}\" is missing rectangle coordinates"
                            ));
                        }
                    }
                }
            }
            Validation::ok("question-bank document is valid")
        }
        ImportDocument::Flat(flat) => {
            for item in &flat.annotations {
                if item.rectangle.is_none() || item.relative_rectangle.is_none() {
                    return Validation::invalid(
                        "annotation is missing rectangle coordinates".to_string(),
                    );
                }
            }
            Validation::ok("annotation document is valid")
        }
    }
}

impl AnnotationStore {
    /// Parse, validate, and import a raw JSON document.
    ///
    /// The shape is resolved once; invalid documents are rejected before any
    /// mutation, so a failed import never leaves partial state behind.
    pub fn import_json(&mut self, data: &Value, clear_existing: bool) -> ImportReport {
        let document: ImportDocument = match serde_json::from_value(data.clone()) {
            Ok(document) => document,
            Err(error) => {
                warn!(%error, "rejected import document");
                return ImportReport::failure("unrecognized import document shape".to_string());
            }
        };

        let validation = validate_document(&document);
        if !validation.valid {
            return ImportReport::failure(validation.message);
        }

        self.import_document(&document, clear_existing)
    }

    /// Import an already-resolved document. Items missing geometry are
    /// skipped rather than failing the batch.
    pub fn import_document(
        &mut self,
        document: &ImportDocument,
        clear_existing: bool,
    ) -> ImportReport {
        if clear_existing {
            self.clear();
        }

        let (imported_count, imported_group_count) = match document {
            ImportDocument::QuestionBank(bank) => self.import_bank(bank),
            ImportDocument::Flat(flat) => self.import_flat(flat),
        };

        debug!(imported_count, imported_group_count, "import finished");
        ImportReport {
            success: true,
            imported_count,
            imported_group_count,
            message: format!(
                "imported {imported_count} annotations in {imported_group_count} groups"
            ),
        }
    }

    fn import_bank(&mut self, bank: &BankDocument) -> (usize, usize) {
        let mut imported_count = 0;
        let mut imported_group_count = 0;

        for question in &bank.questions {
            let group_id = question
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            let mut group = AnnotationGroup {
                id: group_id.clone(),
                name: question
                    .group_name
                    .clone()
                    .unwrap_or_else(|| format!("导入组_{}", imported_group_count + 1)),
                created_at: Utc::now(),
                annotation_ids: Vec::new(),
                color: Some(color_for_id(&group_id)),
            };

            let arrays = [
                (AnnotationKind::Question, &question.questions),
                (AnnotationKind::Option, &question.options),
                (AnnotationKind::Answer, &question.answers),
                (AnnotationKind::Other, &question.others),
                (AnnotationKind::Explanation, &question.parses),
            ];
            for (kind, items) in arrays {
                for item in items {
                    let (Some(rectangle), Some(relative_rectangle)) =
                        (item.rectangle, item.relative_rectangle)
                    else {
                        continue;
                    };

                    let annotation = Annotation {
                        id: item
                            .id
                            .clone()
                            .unwrap_or_else(|| Uuid::new_v4().to_string()),
                        page_number: item.page_number.unwrap_or(1),
                        rectangle,
                        relative_rectangle,
                        created_at: item.created_at.unwrap_or_else(Utc::now),
                        thumbnail: None,
                        kind,
                        label: item
                            .text
                            .clone()
                            .unwrap_or_else(|| format!("{} - 导入", kind.as_str())),
                        group_id: Some(group_id.clone()),
                    };
                    let parent_id = annotation.id.clone();
                    group.annotation_ids.push(parent_id.clone());
                    self.add_annotation(annotation);
                    imported_count += 1;

                    let Some(image_kind) = kind.image_variant() else {
                        continue;
                    };
                    for image in &item.images {
                        let (Some(rectangle), Some(relative_rectangle)) =
                            (image.rectangle, image.relative_rectangle)
                        else {
                            continue;
                        };

                        let child = Annotation {
                            id: image
                                .id
                                .clone()
                                .unwrap_or_else(|| Uuid::new_v4().to_string()),
                            page_number: image
                                .page_number
                                .or(item.page_number)
                                .unwrap_or(1),
                            rectangle,
                            relative_rectangle,
                            created_at: image.created_at.unwrap_or_else(Utc::now),
                            thumbnail: None,
                            kind: image_kind,
                            label: image
                                .text
                                .clone()
                                .unwrap_or_else(|| format!("{} - 导入", image_kind.as_str())),
                            group_id: Some(group_id.clone()),
                        };
                        let child_id = child.id.clone();
                        group.annotation_ids.push(child_id.clone());
                        self.add_annotation(child);
                        self.insert_link(&parent_id, &child_id);
                        imported_count += 1;
                    }
                }
            }

            // A question that contributed nothing leaves no group behind
            if !group.annotation_ids.is_empty() {
                self.insert_group(group);
                imported_group_count += 1;
            }
        }

        (imported_count, imported_group_count)
    }

    /// Flat import trusts wire links verbatim: `groupId`, `parentId`, and
    /// `childIds` are recorded without re-checking the kind-matching rule.
    fn import_flat(&mut self, flat: &FlatDocument) -> (usize, usize) {
        let mut imported_count = 0;
        let mut imported_group_count = 0;

        for item in &flat.annotations {
            let (Some(rectangle), Some(relative_rectangle)) =
                (item.rectangle, item.relative_rectangle)
            else {
                continue;
            };

            let annotation = Annotation {
                id: item
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string()),
                page_number: item.page_number.unwrap_or(1),
                rectangle,
                relative_rectangle,
                created_at: item.created_at.unwrap_or_else(Utc::now),
                thumbnail: item.thumbnail.clone(),
                kind: item.kind.unwrap_or(AnnotationKind::Other),
                label: item
                    .label
                    .clone()
                    .or_else(|| item.text.clone())
                    .unwrap_or_else(|| "导入标注".to_string()),
                group_id: item.group_id.clone(),
            };
            let annotation_id = annotation.id.clone();
            self.add_annotation(annotation);
            imported_count += 1;

            if let Some(parent_id) = &item.parent_id {
                self.insert_link(parent_id, &annotation_id);
            }
            if let Some(child_ids) = &item.child_ids {
                for child_id in child_ids {
                    self.insert_link(&annotation_id, child_id);
                }
            }
        }

        for group in &flat.groups {
            let group_id = group
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            self.insert_group(AnnotationGroup {
                id: group_id.clone(),
                name: group
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("导入组_{}", imported_group_count + 1)),
                created_at: group.created_at.unwrap_or_else(Utc::now),
                annotation_ids: group.annotation_ids.clone(),
                color: group.color.clone().or_else(|| Some(color_for_id(&group_id))),
            });
            imported_group_count += 1;
        }

        (imported_count, imported_group_count)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::AnnotationKind;
    use crate::store::test_support::annotation;

    fn bank_item(id: &str, page: u32) -> Value {
        json!({
            "id": id,
            "text": format!("{id} 的文本"),
            "pageNumber": page,
            "rectangle": {"x": 10.0, "y": 20.0, "width": 100.0, "height": 40.0},
            "relativeRectangle": {"x": 0.0125, "y": 0.02, "width": 0.125, "height": 0.04},
        })
    }

    #[test]
    fn test_question_bank_import_builds_groups_and_links() {
        let mut question = bank_item("q1", 2);
        question["images"] = json!([bank_item("q1-img", 2)]);
        let data = json!({
            "questions": [{
                "id": "group-1",
                "groupName": "第一题",
                "questions": [question],
                "answers": [bank_item("a1", 2)],
            }]
        });

        let mut store = AnnotationStore::new();
        let report = store.import_json(&data, false);

        assert!(report.success);
        assert_eq!(report.imported_count, 3);
        assert_eq!(report.imported_group_count, 1);

        let group = store.group("group-1").unwrap();
        assert_eq!(group.name, "第一题");
        assert_eq!(group.annotation_ids, vec!["q1", "q1-img", "a1"]);

        let parent = store.annotation("q1").unwrap();
        assert_eq!(parent.kind, AnnotationKind::Question);
        assert_eq!(parent.label, "q1 的文本");
        assert_eq!(parent.group_id.as_deref(), Some("group-1"));

        let child = store.annotation("q1-img").unwrap();
        assert_eq!(child.kind, AnnotationKind::QuestionImage);
        assert_eq!(store.parent_of("q1-img"), Some("q1"));
        assert_eq!(store.child_ids("q1"), &["q1-img".to_string()]);

        assert_eq!(store.annotation("a1").unwrap().kind, AnnotationKind::Answer);
    }

    #[test]
    fn test_import_defaults() {
        let data = json!({
            "questions": [{
                "parses": [{
                    "rectangle": {"x": 1.0, "y": 2.0, "width": 3.0, "height": 4.0},
                    "relativeRectangle": {"x": 0.1, "y": 0.2, "width": 0.3, "height": 0.4},
                }],
            }]
        });

        let mut store = AnnotationStore::new();
        let report = store.import_json(&data, false);
        assert!(report.success);
        assert_eq!(report.imported_count, 1);

        let imported = &store.annotations()[0];
        assert_eq!(imported.kind, AnnotationKind::Explanation);
        assert_eq!(imported.page_number, 1);
        assert_eq!(imported.label, "解析 - 导入");

        let group = &store.groups()[0];
        assert_eq!(group.name, "导入组_1");
        assert!(!group.id.is_empty());
    }

    #[test]
    fn test_items_without_geometry_are_skipped_by_document_import() {
        let document = ImportDocument::QuestionBank(BankDocument {
            questions: vec![ImportQuestion {
                id: Some("group-1".to_string()),
                questions: vec![ImportItem {
                    id: Some("no-geometry".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            }],
        });

        let mut store = AnnotationStore::new();
        let report = store.import_document(&document, false);

        assert!(report.success);
        assert_eq!(report.imported_count, 0);
        // The group collected nothing and is discarded
        assert_eq!(report.imported_group_count, 0);
        assert!(store.groups().is_empty());
    }

    #[test]
    fn test_flat_import_trusts_links_verbatim() {
        let data = json!({
            "annotations": [
                {
                    "id": "text-1",
                    "type": "问题",
                    "label": "问题文本",
                    "rectangle": {"x": 1.0, "y": 2.0, "width": 3.0, "height": 4.0},
                    "relativeRectangle": {"x": 0.1, "y": 0.2, "width": 0.3, "height": 0.4},
                    "groupId": "g1",
                    "childIds": ["img-1"],
                },
                {
                    "id": "img-1",
                    "type": "问题的图片",
                    "rectangle": {"x": 1.0, "y": 2.0, "width": 3.0, "height": 4.0},
                    "relativeRectangle": {"x": 0.1, "y": 0.2, "width": 0.3, "height": 0.4},
                    "groupId": "g1",
                    "parentId": "text-1",
                },
            ],
            "groups": [
                {"id": "g1", "name": "第一题", "annotationIds": ["text-1", "img-1"]},
            ],
        });

        let mut store = AnnotationStore::new();
        let report = store.import_json(&data, false);

        assert!(report.success);
        assert_eq!(report.imported_count, 2);
        assert_eq!(report.imported_group_count, 1);
        assert_eq!(store.parent_of("img-1"), Some("text-1"));
        assert_eq!(store.child_ids("text-1"), &["img-1".to_string()]);
        assert_eq!(store.group("g1").unwrap().annotation_ids.len(), 2);
        assert_eq!(
            store.annotation("text-1").unwrap().group_id.as_deref(),
            Some("g1")
        );
    }

    #[test]
    fn test_flat_import_defaults_kind_and_label() {
        let data = json!({
            "annotations": [{
                "rectangle": {"x": 1.0, "y": 2.0, "width": 3.0, "height": 4.0},
                "relativeRectangle": {"x": 0.1, "y": 0.2, "width": 0.3, "height": 0.4},
            }],
        });

        let mut store = AnnotationStore::new();
        let report = store.import_json(&data, false);
        assert!(report.success);

        let imported = &store.annotations()[0];
        assert_eq!(imported.kind, AnnotationKind::Other);
        assert_eq!(imported.label, "导入标注");
    }

    #[test]
    fn test_clear_existing_wipes_previous_state() {
        let mut store = AnnotationStore::new();
        let stale = annotation(1, AnnotationKind::Question);
        let stale_id = stale.id.clone();
        store.add_annotation(stale);
        store.toggle_annotation_selection(&stale_id);
        store.create_group("旧组").unwrap();

        let data = json!({
            "annotations": [{
                "id": "fresh",
                "rectangle": {"x": 1.0, "y": 2.0, "width": 3.0, "height": 4.0},
                "relativeRectangle": {"x": 0.1, "y": 0.2, "width": 0.3, "height": 0.4},
            }],
        });
        let report = store.import_json(&data, true);

        assert!(report.success);
        assert_eq!(store.annotations().len(), 1);
        assert_eq!(store.annotations()[0].id, "fresh");
        assert!(store.groups().is_empty());
    }

    #[test]
    fn test_validate_rejects_missing_rectangle() {
        let data = json!({"annotations": [{"type": "其他"}]});
        let validation = validate_import(&data);
        assert!(!validation.valid);

        // import_json refuses to mutate on the same document
        let mut store = AnnotationStore::new();
        let report = store.import_json(&data, false);
        assert!(!report.success);
        assert_eq!(report.imported_count, 0);
        assert!(store.annotations().is_empty());
    }

    #[test]
    fn test_validate_rejects_unrecognized_shape() {
        assert!(!validate_import(&json!({"documents": []})).valid);
        assert!(!validate_import(&json!("plain string")).valid);
    }

    #[test]
    fn test_validate_reports_offending_array() {
        let data = json!({
            "questions": [{
                "answers": [{"text": "缺坐标"}],
            }]
        });
        let validation = validate_import(&data);
        assert!(!validation.valid);
        assert!(validation.message.contains("answers"));
    }

    #[test]
    fn test_round_trip_preserves_counts() {
        let mut store = AnnotationStore::new();
        let question = annotation(1, AnnotationKind::Question);
        let image = annotation(1, AnnotationKind::QuestionImage);
        let answer = annotation(3, AnnotationKind::Answer);
        let question_id = question.id.clone();
        let image_id = image.id.clone();
        store.add_annotation(question);
        store.add_annotation(image);
        store.add_annotation(answer);
        assert!(store.link_annotations(&question_id, &image_id));
        store.toggle_annotation_selection(&question_id);
        store.toggle_annotation_selection(&image_id);
        store.create_group("第一题").unwrap();

        let bank = store.to_question_bank();
        let data = serde_json::to_value(&bank).unwrap();

        let mut fresh = AnnotationStore::new();
        let report = fresh.import_json(&data, true);

        assert!(report.success);
        assert_eq!(report.imported_count, bank.total_annotations);
        assert_eq!(report.imported_group_count, bank.total_questions);
        assert_eq!(fresh.annotations().len(), 3);
        assert_eq!(fresh.parent_of(&image_id), Some(question_id.as_str()));
    }
}
