use fps_counter::FPSCounter;
use std::time::{Duration, Instant};

const UPDATE_INTERVAL: Duration = Duration::from_secs(1);

/// Builds a window title carrying the current frame rate, refreshed at most once a second.
pub struct FpsTitle {
    base: String,
    counter: FPSCounter,
    last_update: Option<Instant>,
}

impl FpsTitle {
    pub fn new(base: &str) -> Self {
        FpsTitle {
            base: base.to_owned(),
            counter: FPSCounter::new(),
            last_update: None,
        }
    }

    /// Counts one frame. Returns a new title when one is due.
    pub fn tick(&mut self, now: Instant) -> Option<String> {
        let fps = self.counter.tick();
        let last = *self.last_update.get_or_insert(now);
        if now.saturating_duration_since(last) < UPDATE_INTERVAL {
            return None;
        }
        self.last_update = Some(now);
        Some(format_title(&self.base, fps))
    }
}

/// `fps` comes from `FPSCounter::tick`, which always counts the current frame.
pub fn format_title(base: &str, fps: usize) -> String {
    format!("{} | {} fps ({:.2} ms/frame)", base, fps, 1000.0 / fps as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_includes_frame_time() {
        assert_eq!(format_title("tri", 50), "tri | 50 fps (20.00 ms/frame)");
        assert_eq!(format_title("tri", 1), "tri | 1 fps (1000.00 ms/frame)");
    }

    #[test]
    fn no_title_before_a_second_has_passed() {
        let start = Instant::now();
        let mut fps = FpsTitle::new("tri");
        assert_eq!(fps.tick(start), None);
        assert_eq!(fps.tick(start + Duration::from_millis(500)), None);
        assert_eq!(fps.tick(start + Duration::from_millis(999)), None);
    }

    #[test]
    fn title_refreshes_once_per_second() {
        let start = Instant::now();
        let mut fps = FpsTitle::new("tri");
        for _ in 0..4 {
            fps.tick(start);
        }
        let title = fps.tick(start + UPDATE_INTERVAL).expect("title is due");
        assert!(title.starts_with("tri | 5 fps"), "{}", title);

        assert_eq!(fps.tick(start + Duration::from_millis(1500)), None);
        assert!(fps.tick(start + Duration::from_millis(2000)).is_some());
    }
}
