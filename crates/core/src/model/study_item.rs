use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chapter assigned to items entered without one.
pub const DEFAULT_CHAPTER: &str = "General";

/// One study item inside a subject's content file.
///
/// `formula` and `image` are optional presentation extras; empty strings in
/// the source files are treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyItem {
    pub title: String,
    #[serde(default = "default_chapter")]
    pub chapter: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

fn default_chapter() -> String {
    DEFAULT_CHAPTER.to_string()
}

impl StudyItem {
    /// Build a validated item, normalizing blank optional fields to `None`
    /// and a blank chapter to [`DEFAULT_CHAPTER`].
    ///
    /// # Errors
    ///
    /// Returns `StudyItemError` if the title or content is blank.
    pub fn new(
        title: impl Into<String>,
        chapter: impl Into<String>,
        content: impl Into<String>,
        formula: Option<String>,
        image: Option<String>,
    ) -> Result<Self, StudyItemError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(StudyItemError::EmptyTitle);
        }
        let content = content.into();
        if content.trim().is_empty() {
            return Err(StudyItemError::EmptyContent);
        }
        let chapter = chapter.into();
        let chapter = if chapter.trim().is_empty() {
            default_chapter()
        } else {
            chapter
        };

        Ok(Self {
            title,
            chapter,
            content,
            formula: formula.filter(|f| !f.trim().is_empty()),
            image: image.filter(|i| !i.trim().is_empty()),
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudyItemError {
    #[error("item title cannot be empty")]
    EmptyTitle,

    #[error("item content cannot be empty")]
    EmptyContent,
}
