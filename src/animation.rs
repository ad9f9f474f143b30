//! Playback state for stepping a time-indexed map through its frames.
//!
//! The state machine is independent of any UI toolkit: the caller issues
//! `play` / `stop` / `seek` commands and drives playback by calling
//! [`Animation::advance`] every [`Animation::frame_interval`].

use std::time::Duration;

pub const MIN_FPS: u32 = 1;
pub const MAX_FPS: u32 = 10;
pub const DEFAULT_FPS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Showing a single, user-selected frame.
    Idle,
    /// Stepping through frames on every `advance`.
    Playing,
    /// Halted by `stop` or by running out of frames; the last shown frame stays.
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
    frame_count: usize,
    current: usize,
    fps: u32,
    state: PlaybackState,
    // Whether `current` has been yielded since the last `play`.
    shown: bool,
}

impl Animation {
    /// An idle animation over `frame_count` frames, showing frame 0.
    pub fn new(frame_count: usize, fps: u32) -> Self {
        Self {
            frame_count,
            current: 0,
            fps: fps.clamp(MIN_FPS, MAX_FPS),
            state: PlaybackState::Idle,
            shown: false,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// The frame currently shown, `None` when there are no frames.
    pub fn current_frame(&self) -> Option<usize> {
        (self.frame_count > 0).then_some(self.current)
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn set_fps(&mut self, fps: u32) {
        self.fps = fps.clamp(MIN_FPS, MAX_FPS);
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps
    }

    /// Starts playback from the first frame. Does nothing without frames.
    pub fn play(&mut self) {
        if self.frame_count == 0 {
            return;
        }
        self.current = 0;
        self.shown = false;
        self.state = PlaybackState::Playing;
    }

    pub fn stop(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Stopped;
        }
    }

    /// Shows `frame` while not playing. Out-of-range frames are clamped.
    /// Returns the frame now shown.
    pub fn seek(&mut self, frame: usize) -> Option<usize> {
        if self.frame_count == 0 || self.state == PlaybackState::Playing {
            return self.current_frame();
        }
        self.current = frame.min(self.frame_count - 1);
        self.state = PlaybackState::Idle;
        self.current_frame()
    }

    /// The frame to show next while playing, or `None` once playback is over.
    ///
    /// The first call after [`play`](Self::play) yields frame 0. The call after
    /// the last frame returns `None` and moves the animation to `Stopped`.
    pub fn advance(&mut self) -> Option<usize> {
        if self.state != PlaybackState::Playing {
            return None;
        }
        if !self.shown {
            self.shown = true;
            return Some(self.current);
        }
        if self.current + 1 < self.frame_count {
            self.current += 1;
            Some(self.current)
        } else {
            self.state = PlaybackState::Stopped;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plays_every_frame_then_stops() {
        let mut animation = Animation::new(3, DEFAULT_FPS);
        assert_eq!(animation.state(), PlaybackState::Idle);
        assert_eq!(animation.advance(), None);

        animation.play();
        let frames: Vec<_> = std::iter::from_fn(|| animation.advance()).collect();
        assert_eq!(frames, vec![0, 1, 2]);
        assert_eq!(animation.state(), PlaybackState::Stopped);
        assert_eq!(animation.current_frame(), Some(2));
    }

    #[test]
    fn test_stop_mid_playback_keeps_frame() {
        let mut animation = Animation::new(5, 4);
        animation.play();
        animation.advance();
        animation.advance();
        animation.stop();

        assert_eq!(animation.state(), PlaybackState::Stopped);
        assert_eq!(animation.advance(), None);
        assert_eq!(animation.current_frame(), Some(1));
    }

    #[test]
    fn test_play_restarts_from_first_frame() {
        let mut animation = Animation::new(4, 2);
        animation.seek(3);
        animation.play();
        assert_eq!(animation.advance(), Some(0));
    }

    #[test]
    fn test_seek_is_ignored_while_playing_and_clamped_otherwise() {
        let mut animation = Animation::new(4, 2);
        assert_eq!(animation.seek(10), Some(3));

        animation.play();
        assert_eq!(animation.seek(2), Some(0));

        animation.stop();
        assert_eq!(animation.seek(1), Some(1));
        assert_eq!(animation.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_no_frames() {
        let mut animation = Animation::new(0, 2);
        animation.play();
        assert_eq!(animation.state(), PlaybackState::Idle);
        assert_eq!(animation.current_frame(), None);
        assert_eq!(animation.seek(3), None);
    }

    #[test]
    fn test_fps_is_clamped() {
        assert_eq!(Animation::new(1, 0).fps(), MIN_FPS);
        assert_eq!(Animation::new(1, 60).frame_interval(), Duration::from_millis(100));
        assert_eq!(Animation::new(1, 2).frame_interval(), Duration::from_millis(500));
    }
}
