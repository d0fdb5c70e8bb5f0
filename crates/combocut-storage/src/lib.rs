//! S3-compatible object storage for rendered combinations.
//!
//! This crate provides:
//! - The [`ObjectStore`] capability used by the render pipeline
//! - An aws-sdk-s3 backed client that works with S3, R2 and MinIO

pub mod client;
pub mod error;
pub mod store;

pub use client::{StorageClient, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use store::{content_type_for, validate_key, ObjectStore};
