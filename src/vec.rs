use crate::alloc::{Allocator, Global};
use crate::collections::{TryReserveError, TryReserveErrorKind};

use std::{
    alloc::Layout,
    mem,
    ops::{Deref, DerefMut},
    ptr,
    ptr::NonNull,
};

/// Growable vector whose storage comes from an [`Allocator`] and whose growth is fallible.
///
/// This is the backing store of the node pool: every block of tree storage is
/// obtained here, and an allocation failure is reported instead of aborting.
pub(crate) struct Vec<T, A: Allocator = Global> {
    len: usize,
    resvd: usize,
    p: NonNull<T>,
    alloc: A,
}

unsafe impl<T: Send, A: Allocator + Send> Send for Vec<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for Vec<T, A> {}

impl<T, A: Allocator> Vec<T, A> {
    /// Create a new, unallocated Vec in specified allocator.
    pub const fn new_in(alloc: A) -> Vec<T, A> {
        Self {
            len: 0,
            resvd: 0,
            alloc,
            p: NonNull::dangling(),
        }
    }

    /// Returns the number of elements.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the current capacity.
    pub const fn capacity(&self) -> usize {
        if mem::size_of::<T>() == 0 {
            usize::MAX
        } else {
            self.resvd
        }
    }

    /// Returns a reference to the underlying allocator.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Push a value onto the end of the vec, growing the allocation if needed.
    ///
    /// On failure the vec is unchanged and `value` is dropped.
    pub fn try_push(&mut self, value: T) -> Result<(), TryReserveError> {
        if self.len == self.capacity() {
            let na = if self.resvd == 0 {
                4
            } else {
                self.resvd.checked_mul(2).ok_or(TryReserveError {
                    kind: TryReserveErrorKind::CapacityOverflow,
                })?
            };
            self.try_set_capacity(na)?;
        }
        unsafe {
            ptr::write(self.ixp(self.len), value);
        }
        self.len += 1;
        Ok(())
    }

    /// Reserves capacity for at least `additional` more elements.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        let capacity = self.len.checked_add(additional).ok_or(TryReserveError {
            kind: TryReserveErrorKind::CapacityOverflow,
        })?;
        if capacity > self.capacity() {
            self.try_set_capacity(capacity)?;
        }
        Ok(())
    }

    /// Drops every element, keeping the allocation.
    pub fn clear(&mut self) {
        while self.len > 0 {
            self.len -= 1;
            unsafe {
                ptr::drop_in_place(self.ixp(self.len));
            }
        }
    }

    /// Get pointer to ith element.
    /// # Safety
    ///
    /// i must be <= alloc.
    #[inline]
    unsafe fn ixp(&self, i: usize) -> *mut T {
        unsafe { self.p.as_ptr().add(i) }
    }

    /// Grow the allocation to `na` elements. Storage is only ever grown.
    fn try_set_capacity(&mut self, na: usize) -> Result<(), TryReserveError> {
        assert!(na >= self.resvd);
        if mem::size_of::<T>() == 0 || na == self.resvd {
            return Ok(());
        }
        let new_layout = Layout::array::<T>(na).map_err(|_| TryReserveError {
            kind: TryReserveErrorKind::CapacityOverflow,
        })?;
        let result = if self.resvd == 0 {
            self.alloc.allocate(new_layout)
        } else {
            // The old layout was valid when it was allocated.
            let old_layout = Layout::array::<T>(self.resvd).map_err(|_| TryReserveError {
                kind: TryReserveErrorKind::CapacityOverflow,
            })?;
            let old_ptr = self.p.cast::<u8>();
            unsafe { self.alloc.grow(old_ptr, old_layout, new_layout) }
        };
        match result {
            Ok(new_ptr) => {
                log::trace!("node storage resized from {} to {} slots", self.resvd, na);
                self.p = new_ptr.cast::<T>();
                self.resvd = na;
                Ok(())
            }
            Err(_) => {
                log::debug!("node storage allocation failed, layout={new_layout:?}");
                Err(TryReserveError {
                    kind: TryReserveErrorKind::AllocError { layout: new_layout },
                })
            }
        }
    }
}

impl<T, A: Allocator> Deref for Vec<T, A> {
    type Target = [T];
    fn deref(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.p.as_ptr(), self.len) }
    }
}

impl<T, A: Allocator> DerefMut for Vec<T, A> {
    fn deref_mut(&mut self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.p.as_ptr(), self.len) }
    }
}

impl<T, A: Allocator> Drop for Vec<T, A> {
    fn drop(&mut self) {
        self.clear();
        if self.resvd != 0 && mem::size_of::<T>() != 0 {
            if let Ok(layout) = Layout::array::<T>(self.resvd) {
                unsafe {
                    self.alloc.deallocate(self.p.cast::<u8>(), layout);
                }
            }
        }
    }
}
