//! Window, event loop and render thread shared by both demo programs.

#[cfg(feature = "metal")]
use gfx_backend_metal as back;

#[cfg(feature = "vulkan")]
use gfx_backend_vulkan as back;

use gfx_hal::{adapter::Adapter, prelude::*, window as w, Backend, Features};
use log::{error, info};
use thiserror::Error;
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::{Window, WindowBuilder},
};

use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::{DemoConfig, MIN_DIMS};
use crate::fps::FpsTitle;
use crate::input::{command_for_event, Command};
use crate::renderer::{Renderer, RendererError};
use crate::transform::Uniforms;

const APP_NAME: &str = "gfx-rs triangle";
const POLL_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("graphics backend unavailable: {0}")]
    Backend(String),
    #[error("no graphics adapter found")]
    NoAdapter,
    #[error("no queue family can draw to the window surface")]
    NoQueueFamily,
    #[error("failed to open device: {0}")]
    Device(String),
    #[error(transparent)]
    Renderer(#[from] RendererError),
    #[error("render thread panicked")]
    RenderThreadPanicked,
}

/// Opens the window and renders until it is closed or Escape is pressed.
///
/// Only returns on startup failure; a clean shutdown exits the process from the event loop.
pub fn run(config: DemoConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title(config.title)
        .with_inner_size(winit::dpi::Size::Physical(winit::dpi::PhysicalSize::new(
            config.dims.width,
            config.dims.height,
        )))
        .with_min_inner_size(winit::dpi::Size::Logical(winit::dpi::LogicalSize::new(
            MIN_DIMS, MIN_DIMS,
        )))
        .build(&event_loop)?;
    info!("opened {}x{} window", config.dims.width, config.dims.height);

    let should_close = Arc::new(AtomicBool::new(false));
    let resized = Arc::new(AtomicBool::new(false));

    let handler = {
        let should_close = Arc::clone(&should_close);
        let resized = Arc::clone(&resized);
        thread::spawn(move || {
            let result = render_thread(&window, &config, &should_close, &resized);
            // Wake the event loop's shutdown path on failure too.
            should_close.store(true, Ordering::Relaxed);
            result
        })
    };
    let mut handler = Some(handler);

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::WaitUntil(Instant::now() + POLL_INTERVAL);

        if let Event::WindowEvent { event, .. } = &event {
            if let WindowEvent::Resized(_) = event {
                resized.store(true, Ordering::Relaxed);
            }
            if command_for_event(event) == Some(Command::Close) {
                info!("close requested");
                should_close.store(true, Ordering::Relaxed);
            }
        }

        if should_close.load(Ordering::Relaxed) {
            if let Some(handler) = handler.take() {
                let outcome = handler
                    .join()
                    .unwrap_or(Err(AppError::RenderThreadPanicked));
                if let Err(err) = outcome {
                    error!("{}", err);
                    process::exit(1);
                }
                info!("closed");
            }
            *control_flow = ControlFlow::Exit;
        }
    })
}

fn render_thread(
    window: &Window,
    config: &DemoConfig,
    should_close: &AtomicBool,
    resized: &AtomicBool,
) -> Result<(), AppError> {
    let instance = back::Instance::create(APP_NAME, 1)
        .map_err(|err| AppError::Backend(format!("{:?}", err)))?;
    let mut surface = unsafe { instance.create_surface(window) }
        .map_err(|err| AppError::Backend(format!("{:?}", err)))?;
    let adapters = instance.enumerate_adapters();

    let result = render_on_surface(window, config, adapters, &mut surface, should_close, resized);

    unsafe {
        instance.destroy_surface(surface);
    }
    result
}

fn render_on_surface<B: Backend>(
    window: &Window,
    config: &DemoConfig,
    adapters: Vec<Adapter<B>>,
    surface: &mut B::Surface,
    should_close: &AtomicBool,
    resized: &AtomicBool,
) -> Result<(), AppError> {
    let adapter = adapters.into_iter().next().ok_or(AppError::NoAdapter)?;
    info!("using adapter {}", adapter.info.name);

    let family = adapter
        .queue_families
        .iter()
        .find(|family| {
            surface.supports_queue_family(family) && family.queue_type().supports_graphics()
        })
        .ok_or(AppError::NoQueueFamily)?;
    let mut gpu = unsafe {
        adapter
            .physical_device
            .open(&[(family, &[1.0])], Features::empty())
    }
    .map_err(|err| AppError::Device(format!("{:?}", err)))?;

    let mut queue_group = gpu.queue_groups.pop().ok_or(AppError::NoQueueFamily)?;
    let queue = &mut queue_group.queues[0];
    let device = gpu.device;

    let mut renderer = Renderer::new(surface, &adapter, &device, queue_group.family, config)?;
    let mut fps = if config.shows_fps() {
        Some(FpsTitle::new(config.title))
    } else {
        None
    };
    let start = Instant::now();

    while !should_close.load(Ordering::Relaxed) {
        if resized.swap(false, Ordering::Relaxed) {
            let size = window.inner_size();
            renderer.resize(w::Extent2D {
                width: size.width,
                height: size.height,
            })?;
        }

        let uniforms = if config.has_uniforms() {
            Some(Uniforms::at(start.elapsed().as_secs_f32()))
        } else {
            None
        };
        renderer.render(queue, uniforms.as_ref())?;
        if !renderer.is_presentable() {
            thread::sleep(POLL_INTERVAL);
            continue;
        }

        if let Some(title) = fps.as_mut().and_then(|fps| fps.tick(Instant::now())) {
            window.set_title(&title);
        }
    }

    Ok(())
}
