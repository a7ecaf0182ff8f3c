//! A bounded, generational table that owns one value per live handle.
//!
//! Indices are recycled through a free list; versions grow monotonically so
//! a freed handle can never alias the value that reuses its slot. The odd
//! bit of the version marks aliveness.

use std::marker::PhantomData;

use crate::errors::Result;

use super::handle::{HandleIndex, HandleLike};

pub struct HandleArena<H: HandleLike, T> {
    versions: Vec<HandleIndex>,
    frees: Vec<HandleIndex>,
    values: Vec<Option<T>>,
    len: usize,
    _marker: PhantomData<H>,
}

impl<H: HandleLike, T> HandleArena<H, T> {
    /// Constructs a new `HandleArena` that can hold at most `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        HandleArena {
            versions: vec![0; capacity],
            frees: Vec::new(),
            values: (0..capacity).map(|_| None).collect(),
            len: 0,
            _marker: PhantomData,
        }
    }

    /// Stores `value` and returns a fresh handle for it. Fails when the
    /// arena is at capacity.
    pub fn create(&mut self, value: T) -> Result<H> {
        // `len + frees.len()` is the high-water mark, so when the free list
        // is empty the slot at `len` is the next untouched one.
        let index = if let Some(index) = self.frees.pop() {
            index as usize
        } else if self.len < self.versions.len() {
            self.len
        } else {
            bail!(
                "out of {} slots, can not allocate more.",
                self.versions.len()
            );
        };

        self.versions[index] += 1;
        self.values[index] = Some(value);
        self.len += 1;
        Ok(H::new(index as HandleIndex, self.versions[index]))
    }

    /// Returns true if `handle` was created by this arena and has not been
    /// freed yet.
    #[inline]
    pub fn contains(&self, handle: H) -> bool {
        let index = handle.index() as usize;
        index < self.versions.len()
            && self.versions[index] & 0x1 == 1
            && self.versions[index] == handle.version()
    }

    /// Returns a reference to the value of `handle`, or `None` if the handle
    /// is stale.
    #[inline]
    pub fn get(&self, handle: H) -> Option<&T> {
        if self.contains(handle) {
            self.values[handle.index() as usize].as_ref()
        } else {
            None
        }
    }

    /// Returns a mutable reference to the value of `handle`, or `None` if
    /// the handle is stale.
    #[inline]
    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        if self.contains(handle) {
            self.values[handle.index() as usize].as_mut()
        } else {
            None
        }
    }

    /// Frees `handle`, returning its value. Stale handles return `None`.
    pub fn free(&mut self, handle: H) -> Option<T> {
        if !self.contains(handle) {
            return None;
        }

        let index = handle.index() as usize;
        self.versions[index] += 1;
        self.frees.push(index as HandleIndex);
        self.len -= 1;
        self.values[index].take()
    }

    /// Returns the number of live values.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the arena holds no live values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
