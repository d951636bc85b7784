//! Database layer.
//!
//! `Repository` is the storage-adapter boundary; `FirestoreDb` talks to
//! Firestore and `MemoryDb` keeps everything in process.

pub mod firestore;
pub mod memory;
pub mod repository;

pub use self::firestore::FirestoreDb;
pub use memory::MemoryDb;
pub use repository::{chunk_ids, Repository};

/// Collection names as constants.
pub mod collections {
    pub const FIGURES: &str = "figures";
    pub const QUOTES: &str = "quotes";
    pub const USERS: &str = "users";
    pub const SUGGESTIONS: &str = "suggestions";
    /// Subcollection of `users/{uid}`, keyed by quote ID
    pub const SAVED_QUOTES: &str = "savedQuotes";
    /// Subcollection of `users/{uid}`, keyed by quote ID
    pub const LIKES: &str = "likes";
    /// Subcollection of `users/{uid}`
    pub const LISTS: &str = "lists";
}
