use gfx_hal::{
    adapter, buffer as b, command, format as f, image as i, pass, pool,
    prelude::*,
    queue::{family::QueueFamilyId, Submission},
    window, Backend,
};
use log::{debug, warn};
use thiserror::Error;

use std::borrow::Borrow;
use std::fmt;
use std::io;
use std::iter;
use std::mem::{self, ManuallyDrop};
use std::ptr;

mod buffer;
mod descriptor_set;
mod memory;
mod pipeline;
mod swapchain;
pub mod vertex;

use crate::config::DemoConfig;
use crate::transform::Uniforms;
use buffer::Buffer;
use descriptor_set::DescriptorSets;
use memory::Memory;
use pipeline::{Pipeline, ShaderPair};
use swapchain::Swapchain;
use vertex::{Vertex, TRIANGLE};

const FRAMES_IN_FLIGHT: usize = 2;

const TRIANGLE_SHADERS: ShaderPair = ShaderPair {
    vertex: include_bytes!(concat!(env!("OUT_DIR"), "/triangle.vert.spv")),
    fragment: include_bytes!(concat!(env!("OUT_DIR"), "/triangle.frag.spv")),
};

const SPINNING_SHADERS: ShaderPair = ShaderPair {
    vertex: include_bytes!(concat!(env!("OUT_DIR"), "/spinning.vert.spv")),
    fragment: include_bytes!(concat!(env!("OUT_DIR"), "/spinning.frag.spv")),
};

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("failed to create {what}: {reason}")]
    Creation { what: &'static str, reason: String },
    #[error("no host-visible memory type fits the buffer")]
    NoMemoryType,
    #[error("{stage} shader is not valid SPIR-V: {source}")]
    Spirv {
        stage: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{stage} shader module was rejected: {reason}")]
    Shader { stage: &'static str, reason: String },
    #[error("failed to update mapped memory: {0}")]
    Map(String),
    #[error("device error while drawing: {0}")]
    Device(String),
}

/// Slot in the per-frame resources used by `frame`. A slot comes back around only after
/// every other slot has been submitted, and its fence is waited on before reuse.
fn frame_slot(frame: usize) -> usize {
    frame % FRAMES_IN_FLIGHT
}

pub(crate) fn creation<E: fmt::Debug>(what: &'static str) -> impl FnOnce(E) -> RendererError {
    move |err| RendererError::Creation {
        what,
        reason: format!("{:?}", err),
    }
}

/// Per-frame uniform buffers and the descriptor sets pointing at them.
struct UniformBindings<'a, B: Backend> {
    sets: DescriptorSets<'a, B>,
    buffers: Vec<Memory<'a, B>>,
}

impl<'a, B: Backend> UniformBindings<'a, B> {
    fn new(
        device: &'a B::Device,
        memory_types: &[adapter::MemoryType],
        limits: &gfx_hal::Limits,
    ) -> Result<Self, RendererError> {
        let sets = DescriptorSets::new(device, FRAMES_IN_FLIGHT)?;
        let mut buffers = Vec::with_capacity(FRAMES_IN_FLIGHT);
        for index in 0..FRAMES_IN_FLIGHT {
            let buffer = Buffer::new(
                device,
                mem::size_of::<Uniforms>() as u64,
                b::Usage::UNIFORM,
                limits,
            )?;
            let memory = Memory::with_content(buffer, memory_types, &[Uniforms::at(0.0)])?;
            sets.bind_uniform_buffer(index, &*memory.buffer.buf);
            buffers.push(memory);
        }
        Ok(UniformBindings { sets, buffers })
    }
}

pub struct Renderer<'a, B: Backend> {
    frame: usize,
    device: &'a B::Device,
    clear_color: [f32; 4],
    /// One pool per frame in flight, so resetting one never touches a pending buffer.
    command_pools: Vec<B::CommandPool>,
    command_buffers: Vec<B::CommandBuffer>,
    submission_complete_semaphores: Vec<B::Semaphore>,
    submission_complete_fences: Vec<B::Fence>,
    render_pass: ManuallyDrop<B::RenderPass>,
    pipeline: Pipeline<'a, B>,
    uniforms: Option<UniformBindings<'a, B>>,
    vertices: Memory<'a, B>,
    swapchain: Swapchain<'a, B>,
}

impl<'a, B> Renderer<'a, B>
where
    B: Backend,
{
    pub fn new(
        surface: &'a mut B::Surface,
        adapter: &'a adapter::Adapter<B>,
        device: &'a B::Device,
        family: QueueFamilyId,
        config: &DemoConfig,
    ) -> Result<Self, RendererError> {
        let memory_types = adapter.physical_device.memory_properties().memory_types;
        let limits = adapter.physical_device.limits();

        let vertex_buffer = Buffer::new(
            device,
            mem::size_of_val(&TRIANGLE) as u64,
            b::Usage::VERTEX,
            &limits,
        )?;
        let vertices = Memory::with_content(vertex_buffer, &memory_types, &TRIANGLE)?;

        let uniforms = if config.has_uniforms() {
            Some(UniformBindings::new(device, &memory_types, &limits)?)
        } else {
            None
        };

        let swapchain = Swapchain::new(device, surface, adapter, config.dims)?;
        let render_pass = Self::create_render_pass(device, swapchain.format)?;

        let shaders = if config.has_uniforms() {
            &SPINNING_SHADERS
        } else {
            &TRIANGLE_SHADERS
        };
        let set_layout = uniforms.as_ref().map(|u| &*u.sets.set_layout);
        let pipeline = match Pipeline::new::<Vertex>(device, shaders, &render_pass, set_layout) {
            Ok(pipeline) => pipeline,
            Err(err) => {
                unsafe { device.destroy_render_pass(render_pass) };
                return Err(err);
            }
        };

        // From here on, Drop takes care of partially created pools and sync objects.
        let mut renderer = Renderer {
            frame: 0,
            device,
            clear_color: config.clear_color,
            command_pools: Vec::with_capacity(FRAMES_IN_FLIGHT),
            command_buffers: Vec::with_capacity(FRAMES_IN_FLIGHT),
            submission_complete_semaphores: Vec::with_capacity(FRAMES_IN_FLIGHT),
            submission_complete_fences: Vec::with_capacity(FRAMES_IN_FLIGHT),
            render_pass: ManuallyDrop::new(render_pass),
            pipeline,
            uniforms,
            vertices,
            swapchain,
        };
        for _ in 0..FRAMES_IN_FLIGHT {
            let mut command_pool = Self::create_command_pool(device, family)?;
            let cmd_buffer = unsafe { command_pool.allocate_one(command::Level::Primary) };
            renderer.command_pools.push(command_pool);
            renderer.command_buffers.push(cmd_buffer);
            renderer
                .submission_complete_semaphores
                .push(device.create_semaphore().map_err(creation("semaphore"))?);
            renderer
                .submission_complete_fences
                .push(device.create_fence(true).map_err(creation("fence"))?);
        }

        Ok(renderer)
    }

    /// Records the new window size and reconfigures the swapchain for it.
    /// A zero-sized window leaves the swapchain unconfigured until a later resize.
    pub fn resize(&mut self, dims: window::Extent2D) -> Result<(), RendererError> {
        self.swapchain.dims = dims;
        self.swapchain.recreate()
    }

    /// Whether frames currently reach the window. False while it is minimized.
    pub fn is_presentable(&self) -> bool {
        self.swapchain.is_configured()
    }

    /// Draws one frame. `uniforms` is ignored by pipelines that take none.
    pub fn render(
        &mut self,
        queue: &mut B::CommandQueue,
        uniforms: Option<&Uniforms>,
    ) -> Result<(), RendererError> {
        if !self.swapchain.is_configured() {
            self.swapchain.recreate()?;
            if !self.swapchain.is_configured() {
                return Ok(());
            }
        }

        let surface_image = unsafe {
            match self.swapchain.surface.acquire_image(!0) {
                Ok((image, _)) => image,
                Err(err) => {
                    debug!("acquire failed ({:?}), recreating swapchain", err);
                    return self.swapchain.recreate();
                }
            }
        };

        let frame_buffer = unsafe {
            self.device.create_framebuffer(
                &self.render_pass,
                iter::once(surface_image.borrow()),
                i::Extent {
                    width: self.swapchain.extent.width,
                    height: self.swapchain.extent.height,
                    depth: 1,
                },
            )
        }
        .map_err(creation("framebuffer"))?;

        let frame_idx = frame_slot(self.frame);

        unsafe {
            let fence = &self.submission_complete_fences[frame_idx];
            let waited = match self.device.wait_for_fence(fence, !0) {
                Ok(_) => self
                    .device
                    .reset_fence(fence)
                    .map_err(|err| format!("{:?}", err)),
                Err(err) => Err(format!("{:?}", err)),
            };
            if let Err(reason) = waited {
                self.device.destroy_framebuffer(frame_buffer);
                return Err(RendererError::Device(reason));
            }
            self.command_pools[frame_idx].reset(false);
        }

        // The fence above guarantees the GPU is done with this frame's uniform buffer.
        if let (Some(bindings), Some(values)) = (&self.uniforms, uniforms) {
            if let Err(err) = bindings.buffers[frame_idx].write(&[*values]) {
                unsafe { self.device.destroy_framebuffer(frame_buffer) };
                return Err(err);
            }
        }

        let cmd_buffer = &mut self.command_buffers[frame_idx];
        unsafe {
            cmd_buffer.begin_primary(command::CommandBufferFlags::ONE_TIME_SUBMIT);
            cmd_buffer.set_viewports(0, &[self.swapchain.viewport.clone()]);
            cmd_buffer.set_scissors(0, &[self.swapchain.viewport.rect]);
            cmd_buffer.bind_graphics_pipeline(&self.pipeline.pipeline);
            cmd_buffer.bind_vertex_buffers(
                0,
                iter::once((&*self.vertices.buffer.buf, b::SubRange::WHOLE)),
            );
            if let Some(bindings) = &self.uniforms {
                cmd_buffer.bind_graphics_descriptor_sets(
                    &self.pipeline.pipeline_layout,
                    0,
                    iter::once(&bindings.sets.sets[frame_idx]),
                    &[],
                );
            }
            cmd_buffer.begin_render_pass(
                &self.render_pass,
                &frame_buffer,
                self.swapchain.viewport.rect,
                &[command::ClearValue {
                    color: command::ClearColor {
                        float32: self.clear_color,
                    },
                }],
                command::SubpassContents::Inline,
            );
            cmd_buffer.draw(0..TRIANGLE.len() as u32, 0..1);
            cmd_buffer.end_render_pass();
            cmd_buffer.finish();

            let submission = Submission {
                command_buffers: iter::once(&*cmd_buffer),
                wait_semaphores: None,
                signal_semaphores: iter::once(&self.submission_complete_semaphores[frame_idx]),
            };

            queue.submit(
                submission,
                Some(&self.submission_complete_fences[frame_idx]),
            );

            let result = queue.present_surface(
                &mut self.swapchain.surface,
                surface_image,
                Some(&self.submission_complete_semaphores[frame_idx]),
            );

            self.device.destroy_framebuffer(frame_buffer);

            if let Err(err) = result {
                debug!("present failed ({:?}), recreating swapchain", err);
                self.swapchain.recreate()?;
            }
        }

        self.frame += 1;
        Ok(())
    }

    fn create_render_pass(
        device: &B::Device,
        format: f::Format,
    ) -> Result<B::RenderPass, RendererError> {
        let attachment = pass::Attachment {
            format: Some(format),
            samples: 1,
            ops: pass::AttachmentOps::new(
                pass::AttachmentLoadOp::Clear,
                pass::AttachmentStoreOp::Store,
            ),
            stencil_ops: pass::AttachmentOps::DONT_CARE,
            layouts: i::Layout::Undefined..i::Layout::Present,
        };

        let subpass = pass::SubpassDesc {
            colors: &[(0, i::Layout::ColorAttachmentOptimal)],
            depth_stencil: None,
            inputs: &[],
            resolves: &[],
            preserves: &[],
        };

        unsafe { device.create_render_pass(&[attachment], &[subpass], &[]) }
            .map_err(creation("render pass"))
    }

    fn create_command_pool(
        device: &B::Device,
        family: QueueFamilyId,
    ) -> Result<B::CommandPool, RendererError> {
        unsafe { device.create_command_pool(family, pool::CommandPoolCreateFlags::empty()) }
            .map_err(creation("command pool"))
    }

}

impl<'a, B: Backend> Drop for Renderer<'a, B> {
    fn drop(&mut self) {
        let device = self.device;
        if let Err(err) = device.wait_idle() {
            warn!("device did not go idle before teardown: {:?}", err);
        }
        unsafe {
            for (command_pool, cmd_buffer) in self
                .command_pools
                .iter_mut()
                .zip(self.command_buffers.drain(..))
            {
                command_pool.free(iter::once(cmd_buffer));
            }
            for command_pool in self.command_pools.drain(..) {
                device.destroy_command_pool(command_pool);
            }
            for s in self.submission_complete_semaphores.drain(..) {
                device.destroy_semaphore(s);
            }
            for f in self.submission_complete_fences.drain(..) {
                device.destroy_fence(f);
            }
            device.destroy_render_pass(ManuallyDrop::into_inner(ptr::read(&self.render_pass)));
        }
        // The pipeline, uniform bindings, vertex memory and swapchain are released by
        // their own Drop impls, in field order.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_slot_is_reused_only_after_a_full_cycle() {
        for frame in FRAMES_IN_FLIGHT..FRAMES_IN_FLIGHT * 4 {
            let slot = frame_slot(frame);
            assert_eq!(slot, frame_slot(frame - FRAMES_IN_FLIGHT));
            for previous in frame - FRAMES_IN_FLIGHT + 1..frame {
                assert_ne!(frame_slot(previous), slot, "frame {} shares a slot", previous);
            }
        }
    }

    #[test]
    fn slots_cover_every_frame_in_flight() {
        let mut seen: Vec<usize> = (0..FRAMES_IN_FLIGHT).map(frame_slot).collect();
        seen.sort();
        assert_eq!(seen, (0..FRAMES_IN_FLIGHT).collect::<Vec<_>>());
    }
}
