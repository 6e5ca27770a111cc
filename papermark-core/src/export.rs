//! Export half of the question-bank transformer.
//!
//! Walks groups, links, and the annotation registry to build the external
//! hierarchical document: one record per group, members bucketed by base
//! kind with their linked images nested, plus synthetic records for
//! annotations left outside any group.

use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::model::{Annotation, AnnotationKind, Rect, RelativeRect};
use crate::store::AnnotationStore;

/// The external question-bank document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBank {
    pub title: String,
    pub total_questions: usize,
    pub total_annotations: usize,
    pub questions: Vec<QuestionRecord>,
}

/// One logical question: a group's members bucketed by base kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: String,
    pub group_name: String,
    pub questions: Vec<QuestionItem>,
    pub options: Vec<QuestionItem>,
    pub answers: Vec<QuestionItem>,
    pub others: Vec<QuestionItem>,
    pub parses: Vec<QuestionItem>,
}

/// A text annotation with its linked images nested underneath.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionItem {
    pub id: String,
    pub text: String,
    pub page_number: u32,
    pub rectangle: Rect,
    pub relative_rectangle: RelativeRect,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    pub images: Vec<QuestionImage>,
}

/// A nested image region; same shape as an item minus further nesting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionImage {
    pub id: String,
    pub text: String,
    pub page_number: u32,
    pub rectangle: Rect,
    pub relative_rectangle: RelativeRect,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
}

impl QuestionItem {
    fn from_annotation(annotation: &Annotation, images: &[&Annotation]) -> Self {
        Self {
            id: annotation.id.clone(),
            text: annotation.label.clone(),
            page_number: annotation.page_number,
            rectangle: annotation.rectangle,
            relative_rectangle: annotation.relative_rectangle,
            created_at: annotation.created_at,
            kind: annotation.kind,
            images: images.iter().map(|img| QuestionImage::from_annotation(img)).collect(),
        }
    }
}

impl QuestionImage {
    fn from_annotation(annotation: &Annotation) -> Self {
        Self {
            id: annotation.id.clone(),
            text: annotation.label.clone(),
            page_number: annotation.page_number,
            rectangle: annotation.rectangle,
            relative_rectangle: annotation.relative_rectangle,
            created_at: annotation.created_at,
            kind: annotation.kind,
        }
    }
}

/// Serialize a question bank as pretty-printed JSON.
pub fn to_json(bank: &QuestionBank) -> Result<String> {
    serde_json::to_string_pretty(bank).context("Failed to serialize question bank")
}

impl AnnotationStore {
    /// Build the external question-bank document.
    ///
    /// Explicit groups come first; annotations outside every group are then
    /// bundled into one synthetic record per (page, base kind) bucket and
    /// counted on top of `total_questions`.
    pub fn to_question_bank(&self) -> QuestionBank {
        let mut bank = QuestionBank {
            title: format!("PDF标注题库_{}", Local::now().format("%Y-%m-%d")),
            total_questions: self.groups().len(),
            total_annotations: self.annotations().len(),
            questions: Vec::new(),
        };

        for group in self.groups() {
            let members: Vec<&Annotation> = group
                .annotation_ids
                .iter()
                .filter_map(|id| self.annotation(id))
                .collect();
            if members.is_empty() {
                continue;
            }
            bank.questions
                .push(self.question_record(group.id.clone(), group.name.clone(), &members));
        }

        let auto_records = self.auto_grouped_records();
        bank.total_questions += auto_records.len();
        bank.questions.extend(auto_records);

        debug!(
            questions = bank.total_questions,
            annotations = bank.total_annotations,
            "built question bank"
        );
        bank
    }

    /// Bucket a set of annotations into the five typed arrays.
    ///
    /// Image annotations never appear at top level: they are attached to
    /// their text parent via the link table, or dropped if unlinked.
    fn question_record(
        &self,
        id: String,
        group_name: String,
        annotations: &[&Annotation],
    ) -> QuestionRecord {
        let mut record = QuestionRecord {
            id,
            group_name,
            questions: Vec::new(),
            options: Vec::new(),
            answers: Vec::new(),
            others: Vec::new(),
            parses: Vec::new(),
        };

        let mut processed: HashSet<&str> = HashSet::new();
        for annotation in annotations {
            if !processed.insert(annotation.id.as_str()) {
                continue;
            }
            if annotation.kind.is_image() {
                continue;
            }

            let images = self.get_child_annotations(&annotation.id);
            for image in &images {
                processed.insert(image.id.as_str());
            }

            let item = QuestionItem::from_annotation(annotation, &images);
            match annotation.kind.base() {
                AnnotationKind::Question => record.questions.push(item),
                AnnotationKind::Option => record.options.push(item),
                AnnotationKind::Answer => record.answers.push(item),
                AnnotationKind::Other => record.others.push(item),
                AnnotationKind::Explanation => record.parses.push(item),
                _ => {}
            }
        }

        record
    }

    /// Synthetic records for annotations outside every group, partitioned by
    /// page and then by base kind, in first-seen order.
    fn auto_grouped_records(&self) -> Vec<QuestionRecord> {
        let ungrouped = self.ungrouped_annotations();
        if ungrouped.is_empty() {
            return Vec::new();
        }

        let mut by_page: Vec<(u32, Vec<&Annotation>)> = Vec::new();
        for annotation in ungrouped {
            let index = match by_page.iter().position(|(page, _)| *page == annotation.page_number) {
                Some(index) => index,
                None => {
                    by_page.push((annotation.page_number, Vec::new()));
                    by_page.len() - 1
                }
            };
            by_page[index].1.push(annotation);
        }

        let mut records = Vec::new();
        for (page_number, page_annotations) in by_page {
            let mut by_kind: Vec<(AnnotationKind, Vec<&Annotation>)> = Vec::new();
            let mut processed: HashSet<&str> = HashSet::new();

            for annotation in page_annotations {
                if !processed.insert(annotation.id.as_str()) {
                    continue;
                }
                if annotation.kind.is_image() {
                    continue;
                }

                let base = annotation.kind.base();
                let children = self.get_child_annotations(&annotation.id);
                for child in &children {
                    processed.insert(child.id.as_str());
                }

                let index = match by_kind.iter().position(|(kind, _)| *kind == base) {
                    Some(index) => index,
                    None => {
                        by_kind.push((base, Vec::new()));
                        by_kind.len() - 1
                    }
                };
                by_kind[index].1.push(annotation);
                by_kind[index].1.extend(children);
            }

            for (base, annotations) in by_kind {
                if annotations.is_empty() {
                    continue;
                }
                let tag = auto_group_tag();
                records.push(self.question_record(
                    format!("auto_group_{}_{}_{}", page_number, base.as_str(), tag),
                    format!("第{}页_{}_{}", page_number, base.as_str(), tag),
                    &annotations,
                ));
            }
        }

        records
    }

    /// Annotations outside the union of group members and their linked
    /// children, the set the auto-grouping fallback covers.
    fn ungrouped_annotations(&self) -> Vec<&Annotation> {
        let mut grouped_ids: HashSet<String> = HashSet::new();
        for group in self.groups() {
            for member_id in &group.annotation_ids {
                grouped_ids.insert(member_id.clone());
                for child in self.get_child_annotations(member_id) {
                    grouped_ids.insert(child.id.clone());
                }
            }
        }

        self.annotations()
            .iter()
            .filter(|a| !grouped_ids.contains(&a.id))
            .collect()
    }
}

/// 1..=1000 disambiguator for auto-generated record names, derived from a
/// fresh uuid instead of a random source.
fn auto_group_tag() -> u32 {
    let bytes = Uuid::new_v4().into_bytes();
    ((u32::from(bytes[0]) << 8) | u32::from(bytes[1])) % 1000 + 1
}
