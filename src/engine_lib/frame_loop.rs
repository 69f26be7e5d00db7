// src/engine_lib/frame_loop.rs

/// Exit flag for the render loop. The host asks `begin_frame` once per iteration;
/// after `cancel` no further frame is started.
#[derive(Debug, Default)]
pub struct FrameLoop {
    active: bool,
    frames: u64,
}

impl FrameLoop {
    pub fn start(&mut self) {
        self.active = true;
        log::debug!("Frame loop started");
    }

    /// Returns whether the loop was running.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.active;
        self.active = false;
        if was_active {
            log::debug!("Frame loop cancelled after {} frames", self.frames);
        }
        was_active
    }

    pub fn begin_frame(&mut self) -> bool {
        if self.active {
            self.frames += 1;
        }
        self.active
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_only_run_while_active() {
        let mut frame_loop = FrameLoop::default();
        assert!(!frame_loop.begin_frame());
        frame_loop.start();
        assert!(frame_loop.begin_frame());
        assert!(frame_loop.begin_frame());
        assert!(frame_loop.cancel());
        assert!(!frame_loop.begin_frame());
        assert!(!frame_loop.cancel());
        assert_eq!(frame_loop.frames(), 2);
    }
}
