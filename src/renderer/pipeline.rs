use gfx_hal::{format as f, pass::Subpass, prelude::*, pso, Backend};
use std::io::Cursor;
use std::iter;
use std::mem::{self, ManuallyDrop};
use std::ops::Range;
use std::ptr;

use super::{creation, RendererError};

const ENTRY_NAME: &str = "main";

/// SPIR-V for one vertex/fragment pair, compiled by the build script.
pub struct ShaderPair {
    pub vertex: &'static [u8],
    pub fragment: &'static [u8],
}

pub struct Pipeline<'a, B: Backend> {
    device: &'a B::Device,
    pub pipeline: ManuallyDrop<B::GraphicsPipeline>,
    pub pipeline_layout: ManuallyDrop<B::PipelineLayout>,
}

impl<'a, B: Backend> Pipeline<'a, B> {
    /// Builds a triangle-list pipeline reading one `T` per vertex, with a three-float
    /// position at location 0.
    pub fn new<T>(
        device: &'a B::Device,
        shaders: &ShaderPair,
        render_pass: &B::RenderPass,
        set_layout: Option<&B::DescriptorSetLayout>,
    ) -> Result<Self, RendererError> {
        let pipeline_layout = unsafe {
            device.create_pipeline_layout(
                set_layout,
                iter::empty::<(pso::ShaderStageFlags, Range<u32>)>(),
            )
        }
        .map_err(creation("pipeline layout"))?;

        let modules = Self::load_spirv(device, "vertex", shaders.vertex).and_then(|vs| {
            match Self::load_spirv(device, "fragment", shaders.fragment) {
                Ok(fs) => Ok((vs, fs)),
                Err(err) => {
                    unsafe { device.destroy_shader_module(vs) };
                    Err(err)
                }
            }
        });
        let (vs_module, fs_module) = match modules {
            Ok(modules) => modules,
            Err(err) => {
                unsafe { device.destroy_pipeline_layout(pipeline_layout) };
                return Err(err);
            }
        };

        let graphic_pipeline = {
            let shader_entries = pso::GraphicsShaderSet {
                vertex: pso::EntryPoint {
                    entry: ENTRY_NAME,
                    module: &vs_module,
                    specialization: pso::Specialization::default(),
                },
                hull: None,
                domain: None,
                geometry: None,
                fragment: Some(pso::EntryPoint {
                    entry: ENTRY_NAME,
                    module: &fs_module,
                    specialization: pso::Specialization::default(),
                }),
            };

            let subpass = Subpass {
                index: 0,
                main_pass: render_pass,
            };

            let mut pipeline_desc = pso::GraphicsPipelineDesc::new(
                shader_entries,
                pso::Primitive::TriangleList,
                pso::Rasterizer::FILL,
                &pipeline_layout,
                subpass,
            );
            pipeline_desc.blender.targets.push(pso::ColorBlendDesc {
                mask: pso::ColorMask::ALL,
                blend: Some(pso::BlendState::ALPHA),
            });
            pipeline_desc.vertex_buffers.push(pso::VertexBufferDesc {
                binding: 0,
                stride: mem::size_of::<T>() as u32,
                rate: pso::VertexInputRate::Vertex,
            });
            pipeline_desc.attributes.push(pso::AttributeDesc {
                location: 0,
                binding: 0,
                element: pso::Element {
                    format: f::Format::Rgb32Sfloat,
                    offset: 0,
                },
            });

            unsafe { device.create_graphics_pipeline(&pipeline_desc, None) }
        };

        unsafe {
            device.destroy_shader_module(vs_module);
            device.destroy_shader_module(fs_module);
        }

        match graphic_pipeline {
            Ok(pipeline) => Ok(Pipeline {
                device,
                pipeline: ManuallyDrop::new(pipeline),
                pipeline_layout: ManuallyDrop::new(pipeline_layout),
            }),
            Err(err) => {
                unsafe { device.destroy_pipeline_layout(pipeline_layout) };
                Err(creation("graphics pipeline")(err))
            }
        }
    }

    fn load_spirv(
        device: &B::Device,
        stage: &'static str,
        bytes: &[u8],
    ) -> Result<B::ShaderModule, RendererError> {
        let spirv = pso::read_spirv(Cursor::new(bytes))
            .map_err(|source| RendererError::Spirv { stage, source })?;
        unsafe { device.create_shader_module(&spirv) }.map_err(|err| RendererError::Shader {
            stage,
            reason: format!("{:?}", err),
        })
    }
}

impl<'a, B: Backend> Drop for Pipeline<'a, B> {
    fn drop(&mut self) {
        unsafe {
            self.device
                .destroy_graphics_pipeline(ManuallyDrop::into_inner(ptr::read(&self.pipeline)));
            self.device
                .destroy_pipeline_layout(ManuallyDrop::into_inner(ptr::read(
                    &self.pipeline_layout,
                )));
        }
    }
}
