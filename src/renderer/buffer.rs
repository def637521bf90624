use gfx_hal::{buffer, prelude::*, Backend, Limits};
use std::mem::ManuallyDrop;
use std::ptr;

use super::{creation, RendererError};

pub struct Buffer<'a, B: Backend> {
    pub device: &'a B::Device,
    pub buf: ManuallyDrop<B::Buffer>,
    /// Bytes the caller asked for, before rounding to the atom size.
    pub len: u64,
}

impl<'a, B: Backend> Buffer<'a, B> {
    pub fn new(
        device: &'a B::Device,
        len: u64,
        usage: buffer::Usage,
        limits: &Limits,
    ) -> Result<Self, RendererError> {
        debug_assert_ne!(len, 0);
        let memory_size = aligned_size(len, limits.non_coherent_atom_size as u64);

        let buf = unsafe { device.create_buffer(memory_size, usage) }.map_err(creation("buffer"))?;

        Ok(Buffer {
            device,
            buf: ManuallyDrop::new(buf),
            len,
        })
    }
}

/// Rounds `len` up to a whole number of non-coherent atoms so flushes stay in bounds.
fn aligned_size(len: u64, atom: u64) -> u64 {
    if atom <= 1 {
        return len;
    }
    ((len + atom - 1) / atom) * atom
}

impl<'a, B: Backend> Drop for Buffer<'a, B> {
    fn drop(&mut self) {
        unsafe {
            self.device
                .destroy_buffer(ManuallyDrop::into_inner(ptr::read(&self.buf)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_round_up_to_the_atom() {
        assert_eq!(aligned_size(36, 64), 64);
        assert_eq!(aligned_size(80, 64), 128);
        assert_eq!(aligned_size(128, 64), 128);
    }

    #[test]
    fn zero_or_unit_atom_keeps_length() {
        assert_eq!(aligned_size(36, 0), 36);
        assert_eq!(aligned_size(36, 1), 36);
    }
}
