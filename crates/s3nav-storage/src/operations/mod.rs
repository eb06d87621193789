//! Bucket and object operations.
//!
//! Every call is instrumented, timed and logged under the crate's tracing
//! targets. Errors are returned as [`crate::Error`] and converted to the
//! navigator's storage error at the `StorageClient` boundary.

mod bucket_operations;
mod object_operations;

pub use bucket_operations::BucketOperations;
pub use object_operations::{ObjectOperations, ObjectStat};
