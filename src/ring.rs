//! A ring buffer that returns contiguous views of reads even across the
//! wrap point, by duplicating the low end of the ring into a mirror tail.
//!
//! Ported from `ri_ring_buffer.c`, generalised from raw bytes to any
//! `T: Copy + Default` so callers don't need `unsafe` byte-casting to use
//! it for `f32` samples or packed spectrum blocks.

use crate::error::RingError;

/// Ring buffer over `[T]` with contiguous-peek support up to
/// `max_required_size` elements.
pub struct MirrorRing<T> {
    storage: Vec<T>,
    max_size: usize,
    max_required_size: usize,
    read_pos: usize,
    write_pos: usize,
}

impl<T: Copy + Default> MirrorRing<T> {
    /// Storage size (in elements) a ring with these bounds requires.
    pub fn work_size(max_size: usize, max_required_size: usize) -> Result<usize, RingError> {
        if max_size < max_required_size {
            return Err(RingError::InvalidArgument);
        }
        Ok(max_size + 1 + max_required_size)
    }

    pub fn new(max_size: usize, max_required_size: usize) -> Result<Self, RingError> {
        let len = Self::work_size(max_size, max_required_size)?;
        Ok(Self {
            storage: vec![T::default(); len],
            max_size,
            max_required_size,
            read_pos: 0,
            write_pos: 0,
        })
    }

    fn buffer_size(&self) -> usize {
        self.max_size + 1
    }

    /// Bytes (elements) currently buffered.
    #[must_use]
    pub fn remain(&self) -> usize {
        if self.read_pos > self.write_pos {
            self.buffer_size() + self.write_pos - self.read_pos
        } else {
            self.write_pos - self.read_pos
        }
    }

    /// Free space available to `put`.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.max_size - self.remain()
    }

    /// Zeroes the entire storage (including the mirror) and rewinds both
    /// positions.
    pub fn clear(&mut self) {
        self.storage.iter_mut().for_each(|slot| *slot = T::default());
        self.read_pos = 0;
        self.write_pos = 0;
    }

    /// Writes `data`, dual-writing into the mirror tail whenever the
    /// logical write position falls within `[0, max_required_size)`.
    pub fn put(&mut self, data: &[T]) -> Result<(), RingError> {
        if data.is_empty() {
            return Err(RingError::InvalidArgument);
        }
        if data.len() > self.capacity() {
            return Err(RingError::ExceedCapacity);
        }

        let buffer_size = self.buffer_size();
        let mut data = data;

        if self.write_pos + data.len() >= buffer_size {
            let head_len = buffer_size - self.write_pos;
            self.storage[self.write_pos..self.write_pos + head_len]
                .copy_from_slice(&data[..head_len]);
            data = &data[head_len..];
            self.write_pos = 0;
            if data.is_empty() {
                return Ok(());
            }
        }

        if self.write_pos < self.max_required_size {
            let copy_len = data.len().min(self.max_required_size - self.write_pos);
            let tail_off = buffer_size + self.write_pos;
            self.storage[tail_off..tail_off + copy_len].copy_from_slice(&data[..copy_len]);
        }

        self.storage[self.write_pos..self.write_pos + data.len()].copy_from_slice(data);
        self.write_pos += data.len();

        Ok(())
    }

    /// Returns a contiguous view of the next `k` buffered elements without
    /// advancing the read position.
    pub fn peek(&self, k: usize) -> Result<&[T], RingError> {
        if k == 0 {
            return Err(RingError::InvalidArgument);
        }
        if k > self.max_required_size {
            return Err(RingError::ExceedRequired);
        }
        if k > self.remain() {
            return Err(RingError::ExceedRemain);
        }
        Ok(&self.storage[self.read_pos..self.read_pos + k])
    }

    /// As [`Self::peek`], then advances the read position by `k`.
    pub fn get(&mut self, k: usize) -> Result<&[T], RingError> {
        if k == 0 {
            return Err(RingError::InvalidArgument);
        }
        if k > self.max_required_size {
            return Err(RingError::ExceedRequired);
        }
        if k > self.remain() {
            return Err(RingError::ExceedRemain);
        }
        let start = self.read_pos;
        self.read_pos = (self.read_pos + k) % self.buffer_size();
        Ok(&self.storage[start..start + k])
    }
}
