#![forbid(unsafe_code)]

//! Core domain model and business logic for the ControlMed medication
//! tracker.
//!
//! This crate provides:
//! - Domain types (medications, dose occurrences, next-dose labels)
//! - The dose scheduler (pure schedule computations)
//! - The medication store (CRUD, queries, archive lifecycle)
//! - Persistence (single-blob port with file and in-memory backends)
//! - Configuration and logging setup

pub mod types;
pub mod error;
pub mod scheduler;
pub mod blob;
pub mod seed;
pub mod store;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore, BLOB_FILE_NAME};
pub use scheduler::{doses_on_date, next_dose, occurrences_in_range, times_of_day};
pub use store::MedicationStore;
pub use config::Config;
