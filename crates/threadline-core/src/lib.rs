//! threadline-core - Core library for Threadline
//!
//! This crate keeps a chat-thread screen in sync with a local reactive store
//! and coordinates attachment downloads, independent of any UI toolkit.

pub mod attachment;
pub mod config;
pub mod download;
pub mod error;
pub mod identity;
pub mod layout;
pub mod models;
pub mod screen;
pub mod services;
pub mod store;
pub mod util;
pub mod visibility;

pub use error::{Error, Result};
pub use identity::{extract_resource_id, ResourceId, RouteParams};
pub use store::Store;
