//! Two minimal triangle demos on top of gfx-hal and winit.

pub mod app;
pub mod config;
pub mod fps;
pub mod input;
pub mod renderer;
pub mod transform;

pub use app::{run, AppError};
pub use config::{DemoConfig, Variant};
