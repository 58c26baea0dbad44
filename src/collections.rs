use std::{error::Error, fmt};

pub mod rb_tree;

pub use rb_tree::RbTree;

/// The error type for `try_` methods that allocate node storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryReserveError {
    pub(crate) kind: TryReserveErrorKind,
}

impl TryReserveError {
    /// Details about the allocation that caused the error
    #[must_use]
    pub fn kind(&self) -> TryReserveErrorKind {
        self.kind.clone()
    }
}

impl fmt::Display for TryReserveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("memory allocation failed")?;
        match self.kind {
            TryReserveErrorKind::CapacityOverflow => {
                f.write_str(" because the computed capacity exceeded the collection's maximum")
            }
            TryReserveErrorKind::AllocError { .. } => {
                f.write_str(" because the memory allocator returned an error")
            }
        }
    }
}

impl Error for TryReserveError {}

/// Details of the allocation that caused a `TryReserveError`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TryReserveErrorKind {
    /// Error due to the computed capacity exceeding the collection's maximum
    /// (usually `isize::MAX` bytes).
    CapacityOverflow,

    /// The memory allocator returned an error
    AllocError {
        /// The layout of allocation request that failed
        layout: std::alloc::Layout,
    },
}

impl TryReserveError {
    /// Reports the failure the way infallible std collections do.
    pub(crate) fn handle(self) -> ! {
        match self.kind {
            TryReserveErrorKind::CapacityOverflow => panic!("capacity overflow"),
            TryReserveErrorKind::AllocError { layout } => std::alloc::handle_alloc_error(layout),
        }
    }
}
