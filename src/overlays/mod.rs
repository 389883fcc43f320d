//! Overlay records and their persistence
//!
//! An overlay is an image being registered against the map. The page shell
//! seeds the client collection with the JSON form of these records.

pub mod model;
pub mod iss;
pub mod store;

pub use iss::IssImageRef;
pub use model::{ImageSizeType, Overlay, OverlayUrls};
pub use store::{MemoryOverlayStore, OverlayStore, SqliteOverlayStore};
