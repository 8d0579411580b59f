//! The failure conditions shared by every container role.

use thiserror::Error;

/// Failure conditions surfaced by the container operations.
///
/// Exhaustion of a source and fullness of a sink are ordinary run-time
/// conditions here, not panics. The one failure mode with no runtime
/// representation is an unsupported source type: if a value satisfies none of
/// the selection rules for a role, the corresponding `Into*` conversion trait
/// is simply not implemented for it and construction fails to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// A bounded sink (slice, fixed array, `heapless` collection) has no room
    /// left. The sink's existing contents are untouched; recovery means
    /// binding a larger or growth-capable sink.
    #[error("sink capacity exceeded")]
    CapacityExceeded,

    /// The container is default-constructed or has been taken from and is not
    /// bound to any source or sink.
    #[error("container is not bound to a source")]
    EmptyContainer,

    /// A non-blocking lock policy found the container busy and skipped the
    /// operation without forwarding it to the adapter.
    #[error("operation skipped: lock contended")]
    Contended,
}
