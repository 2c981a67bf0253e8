//
// Copyright (c) 2025 Nathan Fiedler
//

//! The buffer directory and the raw allocation of the buffers it points to.
//!
//! All buffers of an array share the same capacity, so the directory does not
//! record it; callers pass the capacity in when allocating and releasing.

use log::trace;
use std::alloc::{Layout, alloc, dealloc, handle_alloc_error};
use std::ptr;

#[cfg(test)]
thread_local! {
    /// Number of buffers allocated and not yet released on this thread.
    pub(crate) static LIVE_BUFFERS: std::cell::Cell<isize> = const { std::cell::Cell::new(0) };
}

#[inline]
fn buffer_layout<T>(capacity: usize) -> Layout {
    Layout::array::<T>(capacity).expect("capacity overflow")
}

/// Allocate an uninitialized buffer of `capacity` slots.
///
/// # Panics
///
/// Panics if the buffer would exceed `isize::MAX` _bytes_.
pub(crate) fn allocate_buffer<T>(capacity: usize) -> *mut T {
    let layout = buffer_layout::<T>(capacity);
    #[cfg(test)]
    LIVE_BUFFERS.with(|live| live.set(live.get() + 1));
    trace!("allocate buffer of {} slots", capacity);
    if layout.size() == 0 {
        return ptr::NonNull::<T>::dangling().as_ptr();
    }
    unsafe {
        let ptr = alloc(layout).cast::<T>();
        if ptr.is_null() {
            handle_alloc_error(layout);
        }
        ptr
    }
}

/// Release a buffer previously returned by `allocate_buffer()`.
///
/// # Safety
///
/// The pointer must have come from `allocate_buffer()` with the same capacity,
/// and any initialized slots must already have been dropped or moved out.
pub(crate) unsafe fn release_buffer<T>(buffer: *mut T, capacity: usize) {
    let layout = buffer_layout::<T>(capacity);
    #[cfg(test)]
    LIVE_BUFFERS.with(|live| live.set(live.get() - 1));
    trace!("release buffer of {} slots", capacity);
    if layout.size() != 0 {
        unsafe {
            dealloc(buffer as *mut u8, layout);
        }
    }
}

/// Fixed length table of buffer pointers, vacant slots are null.
pub(crate) struct Directory<T> {
    slots: Vec<*mut T>,
}

impl<T> Directory<T> {
    /// Create a directory with every slot vacant.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![ptr::null_mut(); capacity],
        }
    }

    /// Number of slots in the directory.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Pointer to the buffer in the given slot (null if vacant).
    #[inline]
    pub(crate) fn get(&self, slot: usize) -> *mut T {
        self.slots[slot]
    }

    /// Install a buffer in a vacant slot.
    #[inline]
    pub(crate) fn set(&mut self, slot: usize, buffer: *mut T) {
        debug_assert!(self.slots[slot].is_null(), "slot {slot} is occupied");
        self.slots[slot] = buffer;
    }

    /// Remove the buffer from the given slot, leaving it vacant.
    #[inline]
    pub(crate) fn take(&mut self, slot: usize) -> *mut T {
        std::mem::replace(&mut self.slots[slot], ptr::null_mut())
    }

    /// Replace the slot table with one of `capacity` slots, carrying over the
    /// first `live` buffer pointers. The buffers themselves are not touched.
    pub(crate) fn resize(&mut self, capacity: usize, live: usize) {
        debug_assert!(live <= capacity);
        debug_assert!(self.slots[live..].iter().all(|p| p.is_null()));
        let mut slots = vec![ptr::null_mut(); capacity];
        slots[..live].copy_from_slice(&self.slots[..live]);
        self.slots = slots;
    }

    /// True if exactly the first `live` slots hold buffers.
    pub(crate) fn is_populated(&self, live: usize) -> bool {
        live <= self.slots.len()
            && self.slots[..live].iter().all(|p| !p.is_null())
            && self.slots[live..].iter().all(|p| p.is_null())
    }

    /// Release every buffer in the directory, leaving all slots vacant.
    ///
    /// # Safety
    ///
    /// Every buffer must have the given capacity and hold no live values.
    pub(crate) unsafe fn release_all(&mut self, capacity: usize) {
        for slot in self.slots.iter_mut() {
            if !slot.is_null() {
                unsafe {
                    release_buffer(*slot, capacity);
                }
                *slot = ptr::null_mut();
            }
        }
    }
}
