//! Parent/child image links, kept as a relation table.
//!
//! `links` maps each child to its single parent and is the source of truth;
//! `link_index` is the derived parent -> ordered children view. Both are
//! mutated only by the methods here and must stay in step: reassigning a
//! child's parent is one atomic update, never two separate field writes.

use crate::model::Annotation;

use super::AnnotationStore;

impl AnnotationStore {
    /// Link an image annotation under a text annotation.
    ///
    /// Fails if either id does not resolve or the child's kind is not the
    /// parent kind's image variant. Idempotent; a child already linked
    /// elsewhere is moved to the new parent.
    pub fn link_annotations(&mut self, parent_id: &str, child_id: &str) -> bool {
        let Some(parent) = self.annotation(parent_id) else {
            return false;
        };
        let Some(child) = self.annotation(child_id) else {
            return false;
        };
        let Some(expected) = parent.kind.image_variant() else {
            return false;
        };
        if child.kind != expected {
            return false;
        }

        self.insert_link(parent_id, child_id);
        true
    }

    /// Remove the link between the two annotations. Fails only if either id
    /// does not resolve; unlinking an unlinked pair is a no-op success.
    pub fn unlink_annotations(&mut self, parent_id: &str, child_id: &str) -> bool {
        if self.annotation(parent_id).is_none() || self.annotation(child_id).is_none() {
            return false;
        }

        if let Some(children) = self.link_index.get_mut(parent_id) {
            children.retain(|c| c != child_id);
            if children.is_empty() {
                self.link_index.remove(parent_id);
            }
        }
        if self.links.get(child_id).is_some_and(|p| p == parent_id) {
            self.links.remove(child_id);
        }
        true
    }

    /// The parent this annotation is linked under, if any.
    pub fn parent_of(&self, child_id: &str) -> Option<&str> {
        self.links.get(child_id).map(String::as_str)
    }

    /// Child ids in link order. Empty for unlinked annotations.
    pub fn child_ids(&self, parent_id: &str) -> &[String] {
        self.link_index
            .get(parent_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Resolve this annotation's children to live records, silently dropping
    /// ids that no longer resolve.
    pub fn get_child_annotations(&self, parent_id: &str) -> Vec<&Annotation> {
        self.child_ids(parent_id)
            .iter()
            .filter_map(|id| self.annotation(id))
            .collect()
    }

    /// Link candidates for a picker: annotations of the exact expected image
    /// kind that have no parent yet. Page-independent; cross-page linking
    /// is intentional.
    pub fn get_available_child_annotations(&self, parent_id: &str) -> Vec<&Annotation> {
        let Some(parent) = self.annotation(parent_id) else {
            return Vec::new();
        };
        let Some(expected) = parent.kind.image_variant() else {
            return Vec::new();
        };

        self.annotations()
            .iter()
            .filter(|a| a.id != parent_id && a.kind == expected && !self.links.contains_key(&a.id))
            .collect()
    }

    /// Record a link without the type check, moving the child away from any
    /// previous parent. Used by the import paths, which trust wire links
    /// verbatim.
    pub(crate) fn insert_link(&mut self, parent_id: &str, child_id: &str) {
        if let Some(previous) = self
            .links
            .insert(child_id.to_string(), parent_id.to_string())
        {
            if previous != parent_id {
                if let Some(children) = self.link_index.get_mut(&previous) {
                    children.retain(|c| c != child_id);
                    if children.is_empty() {
                        self.link_index.remove(&previous);
                    }
                }
            }
        }

        let children = self.link_index.entry(parent_id.to_string()).or_default();
        if !children.iter().any(|c| c == child_id) {
            children.push(child_id.to_string());
        }
    }

    /// Drop every link touching this id, in either role.
    pub(crate) fn remove_links_for(&mut self, id: &str) {
        if let Some(parent) = self.links.remove(id) {
            if let Some(children) = self.link_index.get_mut(&parent) {
                children.retain(|c| c != id);
                if children.is_empty() {
                    self.link_index.remove(&parent);
                }
            }
        }
        if let Some(children) = self.link_index.remove(id) {
            for child in children {
                self.links.remove(&child);
            }
        }
    }
}
