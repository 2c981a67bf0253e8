//
// Copyright (c) 2025 Nathan Fiedler
//

//! Geometry of an extendible array: the buffer size, the directory size, and
//! how much of each is in use.

use crate::error::{Error, Result};
use std::fmt;

/// Compute the mapping from a one-dimensional array index to a buffer number
/// and the offset within that buffer, for buffers holding `2^log` slots.
#[inline]
pub fn locate(index: usize, log: u32) -> (usize, usize) {
    (index >> log, index & ((1 << log) - 1))
}

/// Snapshot of the geometry of an extendible array.
///
/// Buffers always hold a power of two number of slots. The directory holds
/// either the same number of slots as a buffer, or half as many when the
/// buffers are "double".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shape {
    /// log2 of the number of slots in every buffer
    pub(crate) buffer_capacity_log: u32,
    /// buffers have twice as many slots as the directory
    pub(crate) buffers_are_double: bool,
    /// an empty buffer is parked at `directory[directory_used]`
    pub(crate) has_spare_buffer: bool,
    /// number of buffers holding elements, including the last partial one
    pub(crate) directory_used: usize,
    /// number of elements in the last in-use buffer
    pub(crate) last_buffer_fill: usize,
}

impl Shape {
    /// Geometry of a newly constructed array: one buffer of two slots in a
    /// directory of one slot.
    pub(crate) const fn new() -> Self {
        Self {
            buffer_capacity_log: 1,
            buffers_are_double: true,
            has_spare_buffer: false,
            directory_used: 1,
            last_buffer_fill: 0,
        }
    }

    /// Number of slots in each buffer.
    #[inline]
    pub fn buffer_capacity(&self) -> usize {
        1 << self.buffer_capacity_log
    }

    /// Number of slots in the directory.
    #[inline]
    pub fn directory_capacity(&self) -> usize {
        1 << (self.buffer_capacity_log - u32::from(self.buffers_are_double))
    }

    /// log2 of the buffer capacity.
    pub fn buffer_capacity_log(&self) -> u32 {
        self.buffer_capacity_log
    }

    /// True if buffers have twice as many slots as the directory.
    pub fn buffers_are_double(&self) -> bool {
        self.buffers_are_double
    }

    /// True if an empty buffer is kept ready past the last in-use buffer.
    pub fn has_spare_buffer(&self) -> bool {
        self.has_spare_buffer
    }

    /// Number of buffers that hold elements (the last may hold none).
    pub fn directory_used(&self) -> usize {
        self.directory_used
    }

    /// Number of elements in the last in-use buffer.
    pub fn last_buffer_fill(&self) -> usize {
        self.last_buffer_fill
    }

    /// Number of directory slots pointing at an allocated buffer.
    #[inline]
    pub fn occupied_buffers(&self) -> usize {
        self.directory_used + usize::from(self.has_spare_buffer)
    }

    /// Number of elements addressable in the array.
    #[inline]
    pub fn len(&self) -> usize {
        ((self.directory_used - 1) << self.buffer_capacity_log) + self.last_buffer_fill
    }

    /// Returns true if no elements are addressable.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of element slots across all allocated buffers.
    pub fn allocated_slots(&self) -> usize {
        self.occupied_buffers() << self.buffer_capacity_log
    }

    /// Map an element index to a (buffer, offset) pair, or `None` if the index
    /// is not less than the length.
    #[inline]
    pub fn locate(&self, index: usize) -> Option<(usize, usize)> {
        if index < self.len() {
            Some(locate(index, self.buffer_capacity_log))
        } else {
            None
        }
    }

    /// Set the fill counters so that the length equals `len`, keeping the
    /// buffer geometry as it is. Used while populating a copy.
    pub(crate) fn set_len(&mut self, len: usize) {
        let (buffer, offset) = locate(len, self.buffer_capacity_log);
        self.directory_used = buffer + 1;
        self.last_buffer_fill = offset;
    }

    /// Verify the structural invariants that must hold between operations.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity_log == 0 {
            return Err(Error::InvariantViolation(
                "buffer capacity must be at least 2",
            ));
        }
        if self.buffer_capacity_log >= usize::BITS - 1 {
            return Err(Error::InvariantViolation("buffer capacity is too large"));
        }
        if self.directory_used == 0 {
            return Err(Error::InvariantViolation(
                "directory_used must be at least 1",
            ));
        }
        if self.directory_used > self.directory_capacity() {
            return Err(Error::InvariantViolation(
                "directory_used exceeds directory capacity",
            ));
        }
        if self.last_buffer_fill >= self.buffer_capacity() {
            return Err(Error::InvariantViolation(
                "last buffer must not be full",
            ));
        }
        if self.has_spare_buffer {
            if self.last_buffer_fill == 0 {
                return Err(Error::InvariantViolation(
                    "spare buffer alongside an empty last buffer",
                ));
            }
            if self.directory_used == self.directory_capacity() {
                return Err(Error::InvariantViolation(
                    "no directory slot for the spare buffer",
                ));
            }
        }
        if self.occupied_buffers() * 4 < self.directory_capacity() {
            return Err(Error::InvariantViolation(
                "directory is less than a quarter occupied",
            ));
        }
        Ok(())
    }
}

impl Default for Shape {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Shape(n: {}, bc: {}, dc: {}, du: {}, lf: {}, spare: {})",
            self.len(),
            self.buffer_capacity(),
            self.directory_capacity(),
            self.directory_used,
            self.last_buffer_fill,
            self.has_spare_buffer
        )
    }
}
