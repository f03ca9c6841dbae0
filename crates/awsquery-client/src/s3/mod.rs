//! S3 object access: references, the REST client, and byte-range streams.

mod client;
mod object;
mod stream;

pub use client::{ObjectInfo, S3Client};
pub use object::{ObjectRef, validate_bucket_name};
pub use stream::{ObjectStream, RangeSource};
