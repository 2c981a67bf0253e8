//
// Copyright (c) 2025 Nathan Fiedler
//

//! An implementation of the modified Brodnik array described in "An
//! Empirical Evaluation of Extendible Arrays" by Stelios Joannou and Rajeev
//! Raman, published in 2011.
//!
//! * https://doi.org/10.1007/978-3-642-20662-7_38
//!
//! # Memory Usage
//!
//! The array keeps about √N buffers, each of which holds about √N elements,
//! referenced from a single directory. No more than O(√N) element slots are
//! ever unused, and the directory itself is O(√N) in size. When N doubles or
//! drops to a quarter, either the directory or the buffers are rebuilt, the
//! choice alternating so the two stay within a factor of two of each other.
//! At most one empty buffer is retained to prevent thrashing when pushing and
//! popping across a buffer boundary.
//!
//! # Performance
//!
//! Element access is a shift and a mask, followed by two loads. Appending and
//! removing from the end are amortized constant time. Rebuilding the
//! directory costs O(√N) and rebuilding the buffers costs O(N), paid off by the
//! Θ(N) operations between rebuilds.
//!
//! # Safety
//!
//! Buffers are allocated as raw memory and elements are moved between them
//! with pointer copies, hence the `unsafe` blocks throughout the code. Only
//! the slots below the length are ever read or dropped.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod directory;
pub mod error;
pub mod shape;

use directory::{Directory, allocate_buffer, release_buffer};
use log::debug;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::ptr;

pub use error::{Error, Result};
pub use shape::Shape;

///
/// Growable array with O(√N) space overhead.
///
pub struct ExtendibleArray<T> {
    /// table of buffer pointers, length equals the directory capacity
    directory: Directory<T>,
    /// current geometry of the directory and buffers
    shape: Shape,
}

impl<T> ExtendibleArray<T> {
    /// Return an empty array holding a single buffer of two slots.
    pub fn new() -> Self {
        let shape = Shape::new();
        let mut directory = Directory::with_capacity(shape.directory_capacity());
        directory.set(0, allocate_buffer(shape.buffer_capacity()));
        Self { directory, shape }
    }

    /// Appends an element to the back of a collection.
    ///
    /// # Panics
    ///
    /// Panics if a new buffer is allocated that would exceed `isize::MAX` _bytes_.
    ///
    /// # Time complexity
    ///
    /// Amortized constant time, O(N) when the buffers are rebuilt.
    pub fn push(&mut self, value: T) {
        debug_assert_eq!(self.shape.validate(), Ok(()));
        let last = self.directory.get(self.shape.directory_used - 1);
        unsafe {
            ptr::write(last.add(self.shape.last_buffer_fill), value);
        }
        self.shape.last_buffer_fill += 1;
        // if the last buffer just became full...
        if self.shape.last_buffer_fill == self.shape.buffer_capacity() {
            if !self.shape.has_spare_buffer {
                if self.shape.directory_used == self.shape.directory_capacity() {
                    // no spare buffer and no room in the directory for one
                    self.grow();
                }
                let buffer = allocate_buffer(self.shape.buffer_capacity());
                self.directory.set(self.shape.directory_used, buffer);
            }
            // the new (or spare) buffer becomes the empty last buffer
            self.shape.directory_used += 1;
            self.shape.has_spare_buffer = false;
            self.shape.last_buffer_fill = 0;
        }
        debug_assert_eq!(self.shape.validate(), Ok(()));
    }

    /// Appends an element if doing so will not allocate, otherwise an error is
    /// returned with the element.
    ///
    /// # Time complexity
    ///
    /// Constant time.
    pub fn push_within_capacity(&mut self, value: T) -> std::result::Result<(), T> {
        if self.shape.last_buffer_fill + 1 < self.shape.buffer_capacity()
            || self.shape.has_spare_buffer
        {
            self.push(value);
            Ok(())
        } else {
            Err(value)
        }
    }

    /// Removes the last element from an array and returns it, or `None` if it
    /// is empty.
    ///
    /// # Time complexity
    ///
    /// Amortized constant time, O(N) when the buffers are rebuilt.
    pub fn pop(&mut self) -> Option<T> {
        debug_assert_eq!(self.shape.validate(), Ok(()));
        let (buffer, slot) = self.shape.locate(self.len().checked_sub(1)?)?;
        let value = unsafe { self.directory.get(buffer).add(slot).read() };
        self.retreat();
        debug_assert_eq!(self.shape.validate(), Ok(()));
        Some(value)
    }

    /// Removes and returns the last element from an array if the predicate
    /// returns true, or None if the predicate returns false or the array is
    /// empty (the predicate will not be called in that case).
    ///
    /// # Time complexity
    ///
    /// Amortized constant time.
    pub fn pop_if(&mut self, predicate: impl FnOnce(&mut T) -> bool) -> Option<T> {
        let last = self.len().checked_sub(1)?;
        let value = self.get_mut(last)?;
        if predicate(value) { self.pop() } else { None }
    }

    /// Adjust the shape after the last element has been moved out, releasing
    /// the spare buffer and shrinking as needed.
    fn retreat(&mut self) {
        if self.shape.last_buffer_fill == 0 {
            // the empty last buffer becomes the spare, and the element just
            // removed was the final slot of the (full) buffer before it
            self.shape.directory_used -= 1;
            self.shape.last_buffer_fill = self.shape.buffer_capacity() - 1;
            self.shape.has_spare_buffer = true;
        } else {
            self.shape.last_buffer_fill -= 1;
            if self.shape.last_buffer_fill == 0 && self.shape.has_spare_buffer {
                // an empty last buffer already serves as the spare
                let spare = self.directory.take(self.shape.directory_used);
                unsafe {
                    release_buffer(spare, self.shape.buffer_capacity());
                }
                self.shape.has_spare_buffer = false;
            }
        }
        let occupied = self.shape.occupied_buffers();
        if occupied * 4 <= self.shape.directory_capacity() {
            // strictly less would mean an earlier pop should have shrunk
            debug_assert_eq!(occupied * 4, self.shape.directory_capacity());
            self.shrink();
        }
    }

    /// Make room in a full directory for one more buffer.
    fn grow(&mut self) {
        let len = self.len();
        if self.shape.buffers_are_double {
            self.grow_directory();
        } else {
            self.grow_buffers();
        }
        debug_assert_eq!(len, self.len());
    }

    /// Reduce a directory that has fallen to a quarter occupied.
    fn shrink(&mut self) {
        let len = self.len();
        if self.shape.buffers_are_double {
            self.shrink_buffers();
        } else {
            self.shrink_directory();
        }
        debug_assert_eq!(len, self.len());
    }

    /// Double the directory capacity, buffers remain as they are.
    fn grow_directory(&mut self) {
        let capacity = self.shape.directory_capacity();
        debug!("growing directory from {} to {} slots", capacity, capacity * 2);
        self.directory.resize(capacity * 2, self.shape.occupied_buffers());
        self.shape.buffers_are_double = false;
    }

    /// Halve the directory capacity, buffers remain as they are.
    fn shrink_directory(&mut self) {
        let capacity = self.shape.directory_capacity();
        debug!("shrinking directory from {} to {} slots", capacity, capacity / 2);
        self.directory.resize(capacity / 2, self.shape.occupied_buffers());
        self.shape.buffers_are_double = true;
    }

    /// Merge each pair of adjacent buffers into one of twice the size.
    ///
    /// Only called from `push()` when every buffer, including the last, is
    /// full and the directory has no free slots.
    fn grow_buffers(&mut self) {
        debug_assert!(!self.shape.has_spare_buffer);
        debug_assert_eq!(self.shape.directory_used, self.shape.directory_capacity());
        debug_assert_eq!(self.shape.last_buffer_fill, self.shape.buffer_capacity());
        let capacity = self.shape.buffer_capacity();
        debug!(
            "growing buffers from {} to {} slots ({} buffers)",
            capacity,
            capacity * 2,
            self.shape.directory_used
        );
        // slot k receives the merge of slots 2k and 2k+1, both of which have
        // been taken by then
        for pair in 0..self.shape.directory_used / 2 {
            let first = self.directory.take(2 * pair);
            let second = self.directory.take(2 * pair + 1);
            let merged = allocate_buffer::<T>(capacity * 2);
            unsafe {
                ptr::copy_nonoverlapping(first, merged, capacity);
                ptr::copy_nonoverlapping(second, merged.add(capacity), capacity);
                release_buffer(first, capacity);
                release_buffer(second, capacity);
            }
            self.directory.set(pair, merged);
        }
        self.shape.buffer_capacity_log += 1;
        self.shape.last_buffer_fill *= 2;
        self.shape.buffers_are_double = true;
        self.shape.directory_used /= 2;
    }

    /// Split each buffer into two of half the size.
    ///
    /// Only called from `pop()` when the last buffer is empty and there is no
    /// spare, so the directory is at most a quarter full.
    fn shrink_buffers(&mut self) {
        debug_assert!(!self.shape.has_spare_buffer);
        debug_assert_eq!(self.shape.last_buffer_fill, 0);
        debug_assert!(self.shape.directory_used * 2 < self.shape.directory_capacity());
        let capacity = self.shape.buffer_capacity();
        let half = capacity / 2;
        let used = self.shape.directory_used;
        debug!(
            "shrinking buffers from {} to {} slots ({} buffers)",
            capacity, half, used
        );
        // the empty last buffer is not needed anymore
        let empty = self.directory.take(used - 1);
        unsafe {
            release_buffer(empty, capacity);
        }
        // walk backward so that slots 2k and 2k+1 are vacant before buffer k
        // is split into them
        for k in (0..used - 1).rev() {
            let whole = self.directory.take(k);
            let low = allocate_buffer::<T>(half);
            let high = allocate_buffer::<T>(half);
            unsafe {
                ptr::copy_nonoverlapping(whole, low, half);
                ptr::copy_nonoverlapping(whole.add(half), high, half);
                release_buffer(whole, capacity);
            }
            self.directory.set(2 * k, low);
            self.directory.set(2 * k + 1, high);
        }
        self.shape.buffers_are_double = false;
        self.shape.buffer_capacity_log -= 1;
        // twice as many full buffers as before, plus a new empty last buffer
        self.shape.directory_used = 2 * used - 1;
        let last = allocate_buffer(self.shape.buffer_capacity());
        self.directory.set(self.shape.directory_used - 1, last);
    }

    /// Return the number of elements in the array.
    ///
    /// # Time complexity
    ///
    /// Constant time.
    pub fn len(&self) -> usize {
        self.shape.len()
    }

    /// Returns true if the array has a length of 0.
    ///
    /// # Time complexity
    ///
    /// Constant time.
    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    /// Returns the total number of element slots allocated, including those
    /// of the spare buffer, if any.
    ///
    /// # Time complexity
    ///
    /// Constant time.
    pub fn capacity(&self) -> usize {
        self.shape.allocated_slots()
    }

    /// Returns a snapshot of the current geometry.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Retrieve a reference to the element at the given offset.
    ///
    /// # Time complexity
    ///
    /// Constant time.
    pub fn get(&self, index: usize) -> Option<&T> {
        let (buffer, slot) = self.shape.locate(index)?;
        unsafe { self.directory.get(buffer).add(slot).as_ref() }
    }

    /// Returns a mutable reference to an element.
    ///
    /// # Time complexity
    ///
    /// Constant time.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let (buffer, slot) = self.shape.locate(index)?;
        unsafe { self.directory.get(buffer).add(slot).as_mut() }
    }

    /// Replace the element at the given offset, returning the previous value.
    ///
    /// # Time complexity
    ///
    /// Constant time.
    pub fn set(&mut self, index: usize, value: T) -> Result<T> {
        let len = self.len();
        match self.get_mut(index) {
            Some(elem) => Ok(std::mem::replace(elem, value)),
            None => Err(Error::IndexOutOfBounds { index, len }),
        }
    }

    /// Clears the array, removing and dropping all values and returning to
    /// the geometry of a new array.
    ///
    /// # Time complexity
    ///
    /// O(n) if elements are droppable, otherwise O(sqrt(n))
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Verify that the geometry is consistent and that the directory holds
    /// exactly the buffers the geometry calls for.
    pub fn check_invariants(&self) -> Result<()> {
        self.shape.validate()?;
        if self.directory.capacity() != self.shape.directory_capacity() {
            return Err(Error::InvariantViolation(
                "directory length differs from directory capacity",
            ));
        }
        if !self.directory.is_populated(self.shape.occupied_buffers()) {
            return Err(Error::InvariantViolation(
                "directory slots do not match occupied buffers",
            ));
        }
        Ok(())
    }

    /// Drop every element, leaving the buffers allocated.
    fn drop_elements(&mut self) {
        use std::ptr::{drop_in_place, slice_from_raw_parts_mut};

        if std::mem::needs_drop::<T>() {
            let len = self.len();
            let capacity = self.shape.buffer_capacity();
            for (buffer, start) in (0..len).step_by(capacity).enumerate() {
                let count = capacity.min(len - start);
                unsafe {
                    drop_in_place(slice_from_raw_parts_mut(
                        self.directory.get(buffer),
                        count,
                    ));
                }
            }
        }
        self.shape.set_len(0);
    }
}

impl<T> Default for ExtendibleArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for ExtendibleArray<T> {
    fn clone(&self) -> Self {
        let source = self.shape;
        let capacity = source.buffer_capacity();
        let mut directory = Directory::with_capacity(source.directory_capacity());
        for slot in 0..source.occupied_buffers() {
            directory.set(slot, allocate_buffer(capacity));
        }
        // the length of the copy tracks the elements cloned so far, so that a
        // panic in clone() drops only initialized slots
        let mut copy = Self {
            directory,
            shape: source,
        };
        copy.shape.set_len(0);
        for index in 0..source.len() {
            let (buffer, slot) = shape::locate(index, source.buffer_capacity_log);
            unsafe {
                let value = (*self.directory.get(buffer).add(slot)).clone();
                ptr::write(copy.directory.get(buffer).add(slot), value);
            }
            copy.shape.set_len(index + 1);
        }
        copy.shape = source;
        copy
    }
}

impl<T> fmt::Display for ExtendibleArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExtendibleArray(n: {}, bc: {}, dc: {}, du: {}, lf: {}, spare: {})",
            self.len(),
            self.shape.buffer_capacity(),
            self.shape.directory_capacity(),
            self.shape.directory_used,
            self.shape.last_buffer_fill,
            self.shape.has_spare_buffer
        )
    }
}

impl<T: fmt::Debug> fmt::Debug for ExtendibleArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries((0..self.len()).map(|index| &self[index]))
            .finish()
    }
}

impl<T> Drop for ExtendibleArray<T> {
    fn drop(&mut self) {
        self.drop_elements();
        // deallocate all buffers using the directory as the source of truth
        unsafe {
            self.directory.release_all(self.shape.buffer_capacity());
        }
    }
}

// Buffers are uniquely owned by the array, the same as the heap memory of a
// `Vec`, so sending or sharing follows the element type.
unsafe impl<T: Send> Send for ExtendibleArray<T> {}
unsafe impl<T: Sync> Sync for ExtendibleArray<T> {}

impl<T> Index<usize> for ExtendibleArray<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        let Some(item) = self.get(index) else {
            panic!("index out of bounds: {}", index);
        };
        item
    }
}

impl<T> IndexMut<usize> for ExtendibleArray<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        let Some(item) = self.get_mut(index) else {
            panic!("index out of bounds: {}", index);
        };
        item
    }
}

impl<A> FromIterator<A> for ExtendibleArray<A> {
    fn from_iter<T: IntoIterator<Item = A>>(iter: T) -> Self {
        let mut arr: ExtendibleArray<A> = ExtendibleArray::new();
        for value in iter {
            arr.push(value)
        }
        arr
    }
}
