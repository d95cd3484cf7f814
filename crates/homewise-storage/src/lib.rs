//! Persistent document stores for the Homewise engine.
//!
//! Backed by the redb embedded database. One database file carries both the
//! recommendation records and the user preference profiles, each in its own
//! table. Values are stored as JSON bytes.

pub mod db;
pub mod error;
pub mod preferences;
pub mod recommendations;

pub use db::HomewiseDb;
pub use error::{Result, StorageError};
pub use preferences::RedbPreferenceStore;
pub use recommendations::RedbRecommendationStore;
