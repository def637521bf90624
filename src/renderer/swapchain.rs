use gfx_hal::{adapter::Adapter, format as f, prelude::*, pso, window, Backend};
use log::debug;

use super::{creation, RendererError};

pub struct Swapchain<'a, B: Backend> {
    device: &'a B::Device,
    adapter: &'a Adapter<B>,
    pub viewport: pso::Viewport,
    /// Size requested by the window.
    pub dims: window::Extent2D,
    /// Size the surface was actually configured with.
    pub extent: window::Extent2D,
    pub surface: &'a mut B::Surface,
    pub format: f::Format,
    configured: bool,
}

/// Surfaces report a zero extent while the window is minimized; those cannot be configured.
fn is_drawable(extent: window::Extent2D) -> bool {
    extent.width != 0 && extent.height != 0
}

impl<'a, B: Backend> Swapchain<'a, B> {
    pub fn new(
        device: &'a B::Device,
        surface: &'a mut B::Surface,
        adapter: &'a Adapter<B>,
        dims: window::Extent2D,
    ) -> Result<Self, RendererError> {
        let formats = surface.supported_formats(&adapter.physical_device);
        let format = formats.map_or(f::Format::Rgba8Srgb, |formats| {
            formats
                .iter()
                .find(|format| format.base_format().1 == f::ChannelType::Srgb)
                .copied()
                .unwrap_or(formats[0])
        });

        let viewport = pso::Viewport {
            rect: pso::Rect {
                x: 0,
                y: 0,
                w: dims.width as _,
                h: dims.height as _,
            },
            depth: 0.0..1.0,
        };

        let mut swapchain = Swapchain {
            device,
            surface,
            adapter,
            viewport,
            format,
            dims,
            extent: dims,
            configured: false,
        };

        swapchain.recreate()?;
        Ok(swapchain)
    }

    pub fn recreate(&mut self) -> Result<(), RendererError> {
        let caps = self.surface.capabilities(&self.adapter.physical_device);

        let mut swap_config = window::SwapchainConfig::from_caps(&caps, self.format, self.dims);
        swap_config.present_mode = window::PresentMode::FIFO;
        let extent = swap_config.extent;
        if !is_drawable(extent) {
            if self.configured {
                debug!("surface has no area, unconfiguring swapchain");
                unsafe { self.surface.unconfigure_swapchain(self.device) };
                self.configured = false;
            }
            return Ok(());
        }

        unsafe {
            self.surface
                .configure_swapchain(self.device, swap_config)
                .map_err(creation("swapchain"))?;
        }
        debug!("swapchain configured at {}x{}", extent.width, extent.height);

        self.configured = true;
        self.extent = extent;
        self.viewport.rect.w = extent.width as _;
        self.viewport.rect.h = extent.height as _;
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }
}

impl<'a, B: Backend> Drop for Swapchain<'a, B> {
    fn drop(&mut self) {
        if self.configured {
            unsafe { self.surface.unconfigure_swapchain(self.device) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimized_surface_is_not_drawable() {
        assert!(!is_drawable(window::Extent2D {
            width: 0,
            height: 0
        }));
        assert!(!is_drawable(window::Extent2D {
            width: 1024,
            height: 0
        }));
        assert!(!is_drawable(window::Extent2D {
            width: 0,
            height: 768
        }));
    }

    #[test]
    fn any_area_is_drawable() {
        assert!(is_drawable(window::Extent2D {
            width: 1,
            height: 1
        }));
        assert!(is_drawable(window::Extent2D {
            width: 1024,
            height: 768
        }));
    }
}
