use gfx_hal::{buffer as b, prelude::*, pso, Backend};
use std::iter;
use std::mem::ManuallyDrop;
use std::ptr;

use super::{creation, RendererError};

const UNIFORM_BUFFER: pso::DescriptorType = pso::DescriptorType::Buffer {
    ty: pso::BufferDescriptorType::Uniform,
    format: pso::BufferDescriptorFormat::Structured {
        dynamic_offset: false,
    },
};

/// One uniform-buffer descriptor set per frame in flight, all sharing a layout.
pub struct DescriptorSets<'a, B: Backend> {
    device: &'a B::Device,
    pub set_layout: ManuallyDrop<B::DescriptorSetLayout>,
    pool: ManuallyDrop<B::DescriptorPool>,
    pub sets: Vec<B::DescriptorSet>,
}

impl<'a, B: Backend> DescriptorSets<'a, B> {
    pub fn new(device: &'a B::Device, count: usize) -> Result<Self, RendererError> {
        let set_layout = Self::create_descriptor_set_layout(device)?;
        let mut pool = match Self::create_descriptor_pool(device, count) {
            Ok(pool) => pool,
            Err(err) => {
                unsafe { device.destroy_descriptor_set_layout(set_layout) };
                return Err(err);
            }
        };

        let mut sets = Vec::with_capacity(count);
        for _ in 0..count {
            match unsafe { pool.allocate_set(&set_layout) } {
                Ok(set) => sets.push(set),
                Err(err) => {
                    unsafe {
                        device.destroy_descriptor_pool(pool);
                        device.destroy_descriptor_set_layout(set_layout);
                    }
                    return Err(creation("descriptor set")(err));
                }
            }
        }

        Ok(DescriptorSets {
            set_layout: ManuallyDrop::new(set_layout),
            pool: ManuallyDrop::new(pool),
            sets,
            device,
        })
    }

    fn create_descriptor_set_layout(
        device: &B::Device,
    ) -> Result<B::DescriptorSetLayout, RendererError> {
        unsafe {
            device.create_descriptor_set_layout(
                &[pso::DescriptorSetLayoutBinding {
                    binding: 0,
                    ty: UNIFORM_BUFFER,
                    count: 1,
                    stage_flags: pso::ShaderStageFlags::VERTEX,
                    immutable_samplers: false,
                }],
                &[],
            )
        }
        .map_err(creation("descriptor set layout"))
    }

    fn create_descriptor_pool(
        device: &B::Device,
        count: usize,
    ) -> Result<B::DescriptorPool, RendererError> {
        unsafe {
            device.create_descriptor_pool(
                count,
                &[pso::DescriptorRangeDesc {
                    ty: UNIFORM_BUFFER,
                    count,
                }],
                pso::DescriptorPoolCreateFlags::empty(),
            )
        }
        .map_err(creation("descriptor pool"))
    }

    /// Points binding 0 of set `index` at the whole of `buffer`.
    pub fn bind_uniform_buffer(&self, index: usize, buffer: &B::Buffer) {
        unsafe {
            self.device.write_descriptor_sets(iter::once(pso::DescriptorSetWrite {
                set: &self.sets[index],
                binding: 0,
                array_offset: 0,
                descriptors: iter::once(pso::Descriptor::Buffer(buffer, b::SubRange::WHOLE)),
            }));
        }
    }
}

impl<'a, B: Backend> Drop for DescriptorSets<'a, B> {
    fn drop(&mut self) {
        unsafe {
            self.device
                .destroy_descriptor_set_layout(ManuallyDrop::into_inner(ptr::read(
                    &self.set_layout,
                )));
            self.device
                .destroy_descriptor_pool(ManuallyDrop::into_inner(ptr::read(&self.pool)));
        }
    }
}
