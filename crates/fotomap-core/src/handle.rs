//! Display handle allocation seam.
//!
//! A display handle is a transient, revocable reference to renderable bytes
//! (the blob-URL analog). The allocator owns the underlying registry;
//! holders must release each handle exactly once over its lifetime.

use bytes::Bytes;
use uuid::Uuid;

/// Revocable preview reference. Cheap to clone; the allocator tracks
/// liveness by `id`, not by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayHandle {
    pub id: Uuid,
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum HandleError {
    #[error("display handle {0} is not live (double release?)")]
    NotLive(Uuid),
}

/// Allocates and revokes display handles.
///
/// Implementations must tolerate release being called from teardown paths;
/// a failed release is reported through the error, never by panicking.
pub trait HandleAllocator: Send + Sync {
    fn allocate(&self, bytes: &Bytes) -> DisplayHandle;

    fn release(&self, handle: &DisplayHandle) -> Result<(), HandleError>;
}
