//! Patch engine: structural diff, ordered application and validation of
//! RFC 6902 style patches over `serde_json::Value` trees.
//!
//! The engine is pure. It shares no state between calls and never reorders
//! operations.
//!
//! ```
//! use dossier::patch::{PatchSet, apply};
//! use serde_json::json;
//!
//! let old = json!({"a": 1});
//! let new = json!({"a": 2, "b": 3});
//! let patch = PatchSet::from_diff(0, &old, &new);
//! assert_eq!(patch.len(), 2);
//! assert_eq!(apply(&old, &patch.operations).unwrap(), new);
//! ```

mod apply;
mod diff;
pub mod errors;
mod operation;
mod pointer;
mod validate;

pub use apply::{apply, check};
pub use diff::{DiffOptions, diff, diff_with};
pub use errors::PatchError;
pub use operation::{PatchOperation, PatchSet};
pub use pointer::{APPEND_TOKEN, Pointer, parse_index};
pub use validate::{validate, validate_against};
