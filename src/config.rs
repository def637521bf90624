//! Fixed settings for the two demo programs.

use gfx_hal::window;

/// Initial window size for both programs.
pub const DIMS: window::Extent2D = window::Extent2D {
    width: 1024,
    height: 768,
};

/// The window cannot be shrunk below this many logical pixels per side.
pub const MIN_DIMS: f64 = 64.0;

const CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.12, 1.0];

/// Which of the two demos is being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// A static triangle with no per-frame inputs.
    Basic,
    /// A triangle rotated and scaled every frame, with the frame rate in the title.
    Spinning,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    pub title: &'static str,
    pub dims: window::Extent2D,
    pub clear_color: [f32; 4],
    pub variant: Variant,
}

impl DemoConfig {
    pub fn basic() -> Self {
        DemoConfig {
            title: "triangle",
            dims: DIMS,
            clear_color: CLEAR_COLOR,
            variant: Variant::Basic,
        }
    }

    pub fn spinning() -> Self {
        DemoConfig {
            title: "spinning triangle",
            variant: Variant::Spinning,
            ..DemoConfig::basic()
        }
    }

    /// Whether the shaders read the transform/time uniform block.
    pub fn has_uniforms(&self) -> bool {
        self.variant == Variant::Spinning
    }

    pub fn shows_fps(&self) -> bool {
        self.variant == Variant::Spinning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_has_no_per_frame_inputs() {
        let config = DemoConfig::basic();
        assert_eq!(config.variant, Variant::Basic);
        assert!(!config.has_uniforms());
        assert!(!config.shows_fps());
    }

    #[test]
    fn spinning_shares_window_settings() {
        let basic = DemoConfig::basic();
        let spinning = DemoConfig::spinning();
        assert_eq!(spinning.dims, basic.dims);
        assert_eq!(spinning.clear_color, basic.clear_color);
        assert_ne!(spinning.title, basic.title);
        assert!(spinning.has_uniforms());
        assert!(spinning.shows_fps());
    }

    #[test]
    fn window_starts_at_1024_by_768() {
        assert_eq!(DemoConfig::basic().dims.width, 1024);
        assert_eq!(DemoConfig::basic().dims.height, 768);
    }
}
