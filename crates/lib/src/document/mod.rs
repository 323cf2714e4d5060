//! Document data model: identifiers, versions and immutable revisions.

pub mod errors;
mod id;
mod revision;

pub use errors::DocumentError;
pub use id::{DocumentId, Version};
pub use revision::{Etag, Revision};
