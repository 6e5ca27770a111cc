//! Group management: named bundles of annotation ids with referential
//! cleanup when members or groups go away.

use std::collections::HashMap;

use crate::model::{Annotation, AnnotationGroup};

use super::AnnotationStore;

/// Partition of the store by group membership.
#[derive(Debug, Default)]
pub struct GroupedAnnotations<'a> {
    pub grouped: HashMap<String, Vec<&'a Annotation>>,
    pub ungrouped: Vec<&'a Annotation>,
}

impl AnnotationStore {
    pub fn group(&self, id: &str) -> Option<&AnnotationGroup> {
        self.groups().iter().find(|g| g.id == id)
    }

    /// Create a group from the current multi-selection, in selection order.
    ///
    /// Returns `None` without creating anything when the selection is empty.
    /// Members are stamped with the group id and the selection is cleared.
    pub fn create_group(&mut self, name: &str) -> Option<AnnotationGroup> {
        if self.selected_annotations().is_empty() {
            return None;
        }

        let mut group = AnnotationGroup::new(name);
        group.annotation_ids = self.selected_annotations().to_vec();

        let group_id = group.id.clone();
        for member_id in group.annotation_ids.clone() {
            if let Some(annotation) = self.annotation_mut(&member_id) {
                annotation.group_id = Some(group_id.clone());
            }
        }

        self.insert_group(group.clone());
        self.clear_annotation_selection();
        Some(group)
    }

    /// Take one annotation out of its group. A group left empty is deleted
    /// outright; the annotation's back-reference is cleared either way.
    pub fn remove_from_group(&mut self, annotation_id: &str) {
        let Some(group_id) = self
            .annotation(annotation_id)
            .and_then(|a| a.group_id.clone())
        else {
            return;
        };

        let mut now_empty = false;
        if let Some(group) = self.group_mut(&group_id) {
            group.annotation_ids.retain(|id| id != annotation_id);
            now_empty = group.annotation_ids.is_empty();
        }
        if now_empty {
            self.delete_group_record(&group_id);
        }

        if let Some(annotation) = self.annotation_mut(annotation_id) {
            annotation.group_id = None;
        }
    }

    /// Delete a group, clearing the back-reference on every annotation that
    /// claims membership.
    pub fn delete_group(&mut self, group_id: &str) {
        for annotation in &mut self.annotations {
            if annotation.group_id.as_deref() == Some(group_id) {
                annotation.group_id = None;
            }
        }
        self.delete_group_record(group_id);
    }

    /// Add annotations to an existing group. Unresolved ids are skipped;
    /// members of another group are reassigned, not rejected.
    pub fn add_to_group(&mut self, group_id: &str, annotation_ids: &[String]) -> bool {
        if self.group(group_id).is_none() {
            return false;
        }

        for annotation_id in annotation_ids {
            let Some(current) = self.annotation(annotation_id).map(|a| a.group_id.clone()) else {
                continue;
            };

            if current.as_deref().is_some_and(|g| g != group_id) {
                self.remove_from_group(annotation_id);
            }

            if let Some(group) = self.group_mut(group_id) {
                if !group.annotation_ids.iter().any(|id| id == annotation_id) {
                    group.annotation_ids.push(annotation_id.clone());
                }
            }
            if let Some(annotation) = self.annotation_mut(annotation_id) {
                annotation.group_id = Some(group_id.to_string());
            }
        }

        true
    }

    /// Partition all annotations by their group back-reference.
    pub fn get_grouped_annotations(&self) -> GroupedAnnotations<'_> {
        let mut partition = GroupedAnnotations::default();
        for annotation in self.annotations() {
            match &annotation.group_id {
                Some(group_id) => partition
                    .grouped
                    .entry(group_id.clone())
                    .or_default()
                    .push(annotation),
                None => partition.ungrouped.push(annotation),
            }
        }
        partition
    }

    fn group_mut(&mut self, id: &str) -> Option<&mut AnnotationGroup> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    fn delete_group_record(&mut self, group_id: &str) {
        self.groups.retain(|g| g.id != group_id);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::annotation;
    use super::super::AnnotationStore;
    use crate::model::AnnotationKind;

    fn store_with(kinds: &[AnnotationKind]) -> (AnnotationStore, Vec<String>) {
        let mut store = AnnotationStore::new();
        let mut ids = Vec::new();
        for kind in kinds {
            let a = annotation(1, *kind);
            ids.push(a.id.clone());
            store.add_annotation(a);
        }
        (store, ids)
    }

    #[test]
    fn test_create_group_with_empty_selection_is_none() {
        let (mut store, _) = store_with(&[AnnotationKind::Question]);
        assert!(store.create_group("第一题").is_none());
        assert!(store.groups().is_empty());
    }

    #[test]
    fn test_create_group_snapshots_selection_order() {
        let (mut store, ids) = store_with(&[AnnotationKind::Question, AnnotationKind::Answer]);
        store.toggle_annotation_selection(&ids[1]);
        store.toggle_annotation_selection(&ids[0]);

        let group = store.create_group("第一题").unwrap();
        assert_eq!(group.annotation_ids, vec![ids[1].clone(), ids[0].clone()]);
        assert_eq!(group.name, "第一题");

        // Members stamped, selection cleared
        for id in &ids {
            assert_eq!(
                store.annotation(id).unwrap().group_id.as_deref(),
                Some(group.id.as_str())
            );
        }
        assert!(store.selected_annotations().is_empty());
    }

    #[test]
    fn test_remove_last_member_deletes_group() {
        let (mut store, ids) = store_with(&[AnnotationKind::Question]);
        store.toggle_annotation_selection(&ids[0]);
        let group = store.create_group("第一题").unwrap();

        store.remove_from_group(&ids[0]);
        assert!(store.group(&group.id).is_none());
        assert!(store.annotation(&ids[0]).unwrap().group_id.is_none());
    }

    #[test]
    fn test_remove_from_group_without_group_is_noop() {
        let (mut store, ids) = store_with(&[AnnotationKind::Question]);
        store.remove_from_group(&ids[0]);
        assert!(store.annotation(&ids[0]).unwrap().group_id.is_none());
    }

    #[test]
    fn test_delete_group_clears_members() {
        let (mut store, ids) = store_with(&[AnnotationKind::Question, AnnotationKind::Answer]);
        store.toggle_annotation_selection(&ids[0]);
        store.toggle_annotation_selection(&ids[1]);
        let group = store.create_group("第一题").unwrap();

        store.delete_group(&group.id);
        assert!(store.groups().is_empty());
        for id in &ids {
            assert!(store.annotation(id).unwrap().group_id.is_none());
        }
    }

    #[test]
    fn test_add_to_group_reassigns_from_other_group() {
        let (mut store, ids) = store_with(&[AnnotationKind::Question, AnnotationKind::Answer]);
        store.toggle_annotation_selection(&ids[0]);
        let first = store.create_group("第一题").unwrap();
        store.toggle_annotation_selection(&ids[1]);
        let second = store.create_group("第二题").unwrap();

        assert!(store.add_to_group(&second.id, &[ids[0].clone()]));

        // First group emptied out and deleted; both members in the second
        assert!(store.group(&first.id).is_none());
        let second = store.group(&second.id).unwrap();
        assert_eq!(second.annotation_ids, vec![ids[1].clone(), ids[0].clone()]);
        assert_eq!(
            store.annotation(&ids[0]).unwrap().group_id.as_deref(),
            Some(second.id.as_str())
        );
    }

    #[test]
    fn test_add_to_group_unknown_group_fails() {
        let (mut store, ids) = store_with(&[AnnotationKind::Question]);
        assert!(!store.add_to_group("missing", &[ids[0].clone()]));
    }

    #[test]
    fn test_add_to_group_skips_unknown_ids_and_is_idempotent() {
        let (mut store, ids) = store_with(&[AnnotationKind::Question]);
        store.toggle_annotation_selection(&ids[0]);
        let group = store.create_group("第一题").unwrap();

        assert!(store.add_to_group(
            &group.id,
            &[ids[0].clone(), ids[0].clone(), "missing".to_string()]
        ));
        assert_eq!(store.group(&group.id).unwrap().annotation_ids.len(), 1);
    }

    #[test]
    fn test_grouped_partition() {
        let (mut store, ids) = store_with(&[
            AnnotationKind::Question,
            AnnotationKind::Answer,
            AnnotationKind::Other,
        ]);
        store.toggle_annotation_selection(&ids[0]);
        store.toggle_annotation_selection(&ids[1]);
        let group = store.create_group("第一题").unwrap();

        let partition = store.get_grouped_annotations();
        assert_eq!(partition.grouped[&group.id].len(), 2);
        assert_eq!(partition.ungrouped.len(), 1);
        assert_eq!(partition.ungrouped[0].id, ids[2]);
    }
}
