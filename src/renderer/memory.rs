use gfx_hal::{adapter::MemoryType, memory as m, prelude::*, Backend, MemoryTypeId};
use std::iter;
use std::mem::{self, ManuallyDrop};
use std::ptr;

use super::buffer::Buffer;
use super::{creation, RendererError};

/// A buffer bound to its own block of host-visible memory.
pub struct Memory<'a, B: Backend> {
    pub buffer: ManuallyDrop<Buffer<'a, B>>,
    memory: ManuallyDrop<B::Memory>,
}

impl<'a, B: Backend> Memory<'a, B> {
    pub fn new(mut buffer: Buffer<'a, B>, memory_types: &[MemoryType]) -> Result<Self, RendererError> {
        let memory = Self::allocate_gpu_memory(&mut buffer, memory_types)?;
        Ok(Memory {
            buffer: ManuallyDrop::new(buffer),
            memory: ManuallyDrop::new(memory),
        })
    }

    /// Allocates and binds memory for a buffer that will be filled with `content` right away.
    pub fn with_content<T: Copy>(
        buffer: Buffer<'a, B>,
        memory_types: &[MemoryType],
        content: &[T],
    ) -> Result<Self, RendererError> {
        let memory = Self::new(buffer, memory_types)?;
        memory.write(content)?;
        Ok(memory)
    }

    fn allocate_gpu_memory(
        buffer: &mut Buffer<'a, B>,
        memory_types: &[MemoryType],
    ) -> Result<B::Memory, RendererError> {
        let device = buffer.device;
        unsafe {
            let buffer_req = device.get_buffer_requirements(&buffer.buf);
            let upload_type =
                Self::upload_type(memory_types, &buffer_req).ok_or(RendererError::NoMemoryType)?;
            let memory = device
                .allocate_memory(upload_type, buffer_req.size)
                .map_err(creation("buffer memory"))?;
            if let Err(err) = device.bind_buffer_memory(&memory, 0, &mut buffer.buf) {
                device.free_memory(memory);
                return Err(creation("buffer memory binding")(err));
            }
            Ok(memory)
        }
    }

    /// Copies `content` to the start of the buffer. The buffer must not be in use by the GPU.
    pub fn write<T: Copy>(&self, content: &[T]) -> Result<(), RendererError> {
        let size = mem::size_of_val(content) as u64;
        if size > self.buffer.len {
            return Err(RendererError::Map(format!(
                "{} bytes do not fit a {} byte buffer",
                size, self.buffer.len
            )));
        }

        let device = self.buffer.device;
        unsafe {
            let mapping = device
                .map_memory(&self.memory, m::Segment::ALL)
                .map_err(|err| RendererError::Map(format!("{:?}", err)))?;
            ptr::copy_nonoverlapping(content.as_ptr() as *const u8, mapping, size as usize);
            let flushed =
                device.flush_mapped_memory_ranges(iter::once((&*self.memory, m::Segment::ALL)));
            device.unmap_memory(&self.memory);
            flushed.map_err(|err| RendererError::Map(format!("{:?}", err)))
        }
    }

    fn upload_type(properties: &[MemoryType], buffer_req: &m::Requirements) -> Option<MemoryTypeId> {
        properties
            .iter()
            .enumerate()
            .position(|(id, mem_type)| {
                buffer_req.type_mask & (1 << id) != 0
                    && mem_type.properties.contains(m::Properties::CPU_VISIBLE)
            })
            .map(MemoryTypeId::from)
    }
}

impl<'a, B: Backend> Drop for Memory<'a, B> {
    fn drop(&mut self) {
        unsafe {
            let device = self.buffer.device;
            ManuallyDrop::drop(&mut self.buffer);
            device.free_memory(ManuallyDrop::into_inner(ptr::read(&self.memory)))
        }
    }
}
