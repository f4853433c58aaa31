use std::collections::BTreeSet;
use std::sync::Arc;

use revise_core::model::{StudyItem, SubjectId};
use storage::content::ContentStore;

use crate::error::ContentServiceError;

/// Read and author study content per subject.
///
/// Content is presentation-side data: it never touches the remote store
/// and carries no per-user state.
pub struct ContentService {
    content: Arc<dyn ContentStore>,
}

impl ContentService {
    #[must_use]
    pub fn new(content: Arc<dyn ContentStore>) -> Self {
        Self { content }
    }

    /// All items for a subject, in authored order.
    ///
    /// # Errors
    ///
    /// Returns `ContentServiceError` if the content cannot be loaded.
    pub fn items(&self, subject: &SubjectId) -> Result<Vec<StudyItem>, ContentServiceError> {
        Ok(self.content.load(subject)?)
    }

    /// Distinct chapters for a subject, sorted.
    ///
    /// # Errors
    ///
    /// Returns `ContentServiceError` if the content cannot be loaded.
    pub fn chapters(&self, subject: &SubjectId) -> Result<Vec<String>, ContentServiceError> {
        let chapters: BTreeSet<String> = self
            .content
            .load(subject)?
            .into_iter()
            .map(|item| item.chapter)
            .collect();
        Ok(chapters.into_iter().collect())
    }

    /// Items for a subject, optionally narrowed to one chapter.
    ///
    /// # Errors
    ///
    /// Returns `ContentServiceError` if the content cannot be loaded.
    pub fn items_in_chapter(
        &self,
        subject: &SubjectId,
        chapter: Option<&str>,
    ) -> Result<Vec<StudyItem>, ContentServiceError> {
        let mut items = self.content.load(subject)?;
        if let Some(chapter) = chapter {
            items.retain(|item| item.chapter == chapter);
        }
        Ok(items)
    }

    /// Validate and append one item to a subject's sequence.
    ///
    /// # Errors
    ///
    /// Returns `ContentServiceError::Item` on validation failure, or a
    /// content error if the sequence cannot be persisted.
    pub fn add_item(
        &self,
        subject: &SubjectId,
        title: &str,
        chapter: &str,
        content: &str,
        formula: Option<String>,
        image: Option<String>,
    ) -> Result<StudyItem, ContentServiceError> {
        let item = StudyItem::new(title, chapter, content, formula, image)?;
        let mut items = self.content.load(subject)?;
        items.push(item.clone());
        self.content.save(subject, &items)?;
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revise_core::model::StudyItemError;
    use storage::content::MemoryContentStore;

    fn subject(id: &str) -> SubjectId {
        SubjectId::new(id).unwrap()
    }

    fn service() -> ContentService {
        ContentService::new(Arc::new(MemoryContentStore::new()))
    }

    #[test]
    fn add_item_appends_in_order() {
        let content = service();
        let math = subject("math");
        content
            .add_item(&math, "A", "c1", "first", None, None)
            .unwrap();
        content
            .add_item(&math, "B", "c2", "second", None, None)
            .unwrap();

        let items = content.items(&math).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "A");
        assert_eq!(items[1].title, "B");
    }

    #[test]
    fn chapters_are_distinct_and_sorted() {
        let content = service();
        let math = subject("math");
        for (title, chapter) in [("A", "c2"), ("B", "c1"), ("C", "c2")] {
            content
                .add_item(&math, title, chapter, "body", None, None)
                .unwrap();
        }

        assert_eq!(content.chapters(&math).unwrap(), vec!["c1", "c2"]);
    }

    #[test]
    fn chapter_filter_narrows_items() {
        let content = service();
        let math = subject("math");
        content
            .add_item(&math, "A", "c1", "body", None, None)
            .unwrap();
        content
            .add_item(&math, "B", "c2", "body", None, None)
            .unwrap();

        let narrowed = content.items_in_chapter(&math, Some("c1")).unwrap();
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].title, "A");

        let all = content.items_in_chapter(&math, None).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn invalid_items_are_rejected() {
        let content = service();
        let err = content
            .add_item(&subject("math"), "", "c", "body", None, None)
            .unwrap_err();
        assert!(matches!(
            err,
            ContentServiceError::Item(StudyItemError::EmptyTitle)
        ));
    }
}
