//! diary-core - Core library for Daily Diary
//!
//! This crate contains the session handling, entry synchronization, image
//! upload pipeline and view controller shared by every Daily Diary front-end.

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod media;
pub mod models;
pub mod search;
pub mod session;
pub mod store;
pub mod util;

#[cfg(test)]
mod testing;

pub use error::{Error, ErrorKind, Result};
pub use models::{DiaryEntry, EntryId};
