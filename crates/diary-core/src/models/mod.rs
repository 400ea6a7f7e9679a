//! Data models for Daily Diary

mod draft;
mod entry;
mod image;
mod user;

pub use draft::Draft;
pub use entry::{DiaryEntry, EntryFields, EntryId};
pub use image::ImageSelection;
pub use user::UserProfile;
