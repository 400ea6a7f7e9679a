//! Unsaved candidate entry held by the controller.

use super::image::ImageSelection;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub description: String,
    pub images: Vec<ImageSelection>,
}

impl Draft {
    /// True when nothing has been typed or attached yet.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.title.is_empty() && self.description.is_empty() && self.images.is_empty()
    }
}
