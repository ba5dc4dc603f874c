//! File actions module.
//!
//! # Deletion
//!
//! The delete module removes redundant copies of confirmed duplicates:
//! - Permanent deletion (default) or move to system trash
//! - TOCTOU verification to detect modified files
//! - Optional byte comparison with the retained copy
//! - Dry-run reporting
//!
//! ```no_run
//! use photodedup::actions::delete::permanent_delete;
//! use std::path::Path;
//!
//! let result = permanent_delete(Path::new("/path/to/duplicate.jpg"));
//! ```

pub mod delete;

// Re-export commonly used types
pub use delete::{
    apply, contents_equal, delete_to_trash, permanent_delete, remove_copy, DeleteConfig,
    DeleteError, DeleteProgressCallback, DeleteResult, FileSnapshot, NoopDeleteCallback,
    RemovalOutcome,
};
