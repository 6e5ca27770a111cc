//! In-memory repository for annotations, groups, links, and selection state.
//!
//! All mutation goes through store methods. Group membership and
//! parent/child links are cross-record state and are never written directly.

mod groups;
mod links;

use std::collections::HashMap;

use crate::model::{Annotation, AnnotationGroup, PageViewport};

pub use groups::GroupedAnnotations;

#[derive(Debug, Default)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    groups: Vec<AnnotationGroup>,
    /// child id -> parent id; the single source of truth for image links.
    links: HashMap<String, String>,
    /// parent id -> child ids in link order; derived index kept in step
    /// with `links` by the link/unlink methods.
    link_index: HashMap<String, Vec<String>>,
    selected_annotation: Option<String>,
    selected_annotations: Vec<String>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn groups(&self) -> &[AnnotationGroup] {
        &self.groups
    }

    pub fn annotation(&self, id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub(crate) fn annotation_mut(&mut self, id: &str) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.id == id)
    }

    /// Append an annotation. Id uniqueness is caller discipline.
    pub fn add_annotation(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    /// Remove an annotation along with every reference to it: group
    /// membership, image links in both directions, and selection state.
    pub fn remove_annotation(&mut self, id: &str) -> Option<Annotation> {
        let position = self.annotations.iter().position(|a| a.id == id)?;

        self.remove_from_group(id);
        self.remove_links_for(id);

        if self.selected_annotation.as_deref() == Some(id) {
            self.selected_annotation = None;
        }
        self.selected_annotations.retain(|selected| selected != id);

        Some(self.annotations.remove(position))
    }

    /// Set the single selection used by the detail view. No side effects on
    /// group or link state.
    pub fn select_annotation(&mut self, id: Option<&str>) {
        self.selected_annotation = id.map(str::to_string);
    }

    pub fn selected_annotation(&self) -> Option<&str> {
        self.selected_annotation.as_deref()
    }

    /// Toggle membership in the multi-selection used for group creation.
    pub fn toggle_annotation_selection(&mut self, id: &str) {
        if let Some(position) = self.selected_annotations.iter().position(|s| s == id) {
            self.selected_annotations.remove(position);
        } else {
            self.selected_annotations.push(id.to_string());
        }
    }

    pub fn clear_annotation_selection(&mut self) {
        self.selected_annotations.clear();
    }

    pub fn selected_annotations(&self) -> &[String] {
        &self.selected_annotations
    }

    /// Annotations not yet in any group, for "add to group" pickers.
    pub fn get_available_annotations_for_group(&self) -> Vec<&Annotation> {
        self.annotations
            .iter()
            .filter(|a| a.group_id.is_none())
            .collect()
    }

    /// Store an externally produced thumbnail snapshot.
    pub fn set_thumbnail(&mut self, id: &str, thumbnail: impl Into<String>) -> bool {
        match self.annotation_mut(id) {
            Some(annotation) => {
                annotation.thumbnail = Some(thumbnail.into());
                true
            }
            None => false,
        }
    }

    /// Re-project cached pixel rectangles for one page after a zoom change.
    /// The relative rectangle is authoritative.
    pub fn refresh_page_rectangles(&mut self, page_number: u32, viewport: PageViewport) {
        for annotation in &mut self.annotations {
            if annotation.page_number == page_number {
                annotation.rectangle = annotation.relative_rectangle.to_pixels(viewport);
            }
        }
    }

    /// Wipe all annotations, groups, links, and selection state.
    pub fn clear(&mut self) {
        self.annotations.clear();
        self.groups.clear();
        self.links.clear();
        self.link_index.clear();
        self.selected_annotation = None;
        self.selected_annotations.clear();
    }

    pub(crate) fn insert_group(&mut self, group: AnnotationGroup) {
        self.groups.push(group);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::model::{Annotation, AnnotationKind, PageViewport, Rect};

    /// A drawn annotation on the given page, with a fixed geometry.
    pub fn annotation(page_number: u32, kind: AnnotationKind) -> Annotation {
        let viewport = PageViewport::new(800.0, 1000.0);
        let rect = Rect::new(40.0, 60.0, 200.0, 50.0);
        Annotation::new(page_number, rect, rect.to_relative(viewport), kind)
    }
}
