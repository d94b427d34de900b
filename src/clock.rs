use std::time::{Duration, Instant};

/// Caps the frame rate and measures frame time.
#[derive(Debug)]
pub struct FrameClock {
    last_tick: Instant,
    target_frame: Option<Duration>,
}

impl FrameClock {
    /// A clock that sleeps to hold `target_fps`; `0` disables the cap.
    pub fn new(target_fps: u32) -> Self {
        Self {
            last_tick: Instant::now(),
            target_frame: (target_fps > 0).then(|| Duration::from_secs(1) / target_fps),
        }
    }

    /// Wait out the rest of the frame budget, then return seconds since the last tick.
    pub fn tick(&mut self) -> f64 {
        let mut now = Instant::now();
        if let Some(target) = self.target_frame {
            let elapsed = now.duration_since(self.last_tick);
            if elapsed < target {
                std::thread::sleep(target - elapsed);
                now = Instant::now();
            }
        }

        let dt = now.duration_since(self.last_tick);
        self.last_tick = now;
        dt.as_secs_f64()
    }
}
