//! Cursor blink scheduling.
//!
//! The caret blinks only while its buffer has focus and the selection is
//! collapsed; a highlighted range suppresses blinking entirely. The
//! scheduler is a small phase machine driven by the host's tick loop: it
//! never owns an OS timer, it owns at most one deadline and the host calls
//! [`CursorBlinkScheduler::poll`] with the current time. Re-arming replaces
//! the deadline, so duplicate schedules cannot exist by construction.

use std::time::{Duration, Instant};

use derive_setters::Setters;

/// Blink timing and behavior knobs.
///
/// `deterministic` freezes the caret fully visible with no timer at all;
/// tests and screenshot tooling use it to take time out of the picture.
#[derive(Debug, Clone, Copy, Setters)]
pub struct CursorBlinkConfig {
    /// Time between visibility flips.
    pub blink_interval: Duration,
    /// Length of the opacity animation for one flip, when animating.
    pub fade_duration: Duration,
    /// Hold time after `start` before the first fade, when animating.
    pub wait_before_fade: Duration,
    /// Animate opacity between flips instead of snapping it.
    pub animate_opacity: bool,
    /// Keep the caret solid and schedule nothing.
    pub deterministic: bool,
}

impl Default for CursorBlinkConfig {
    fn default() -> Self {
        Self {
            blink_interval: Duration::from_millis(500),
            fade_duration: Duration::from_millis(250),
            wait_before_fade: Duration::from_millis(150),
            animate_opacity: false,
            deterministic: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkPhase {
    Off,
    /// Started in animated mode, holding solid before the first fade.
    WaitingForStart,
    BlinkOn,
    BlinkOff,
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    from: f32,
    to: f32,
    started: Instant,
}

pub struct CursorBlinkScheduler {
    config: CursorBlinkConfig,
    phase: BlinkPhase,
    deadline: Option<Instant>,
    fade: Option<Fade>,
    opacity: f32,
    ticks: u32,
}

impl CursorBlinkScheduler {
    pub fn new(config: CursorBlinkConfig) -> Self {
        Self {
            config,
            phase: BlinkPhase::Off,
            deadline: None,
            fade: None,
            opacity: 0.0,
            ticks: 0,
        }
    }

    pub fn phase(&self) -> BlinkPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase != BlinkPhase::Off
    }

    /// The single armed deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Number of visibility flips since the last tick reset.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Begins blinking. A no-op when already running.
    ///
    /// The caret shows solid immediately. In deterministic mode the state
    /// freezes there; in animated mode the first fade waits
    /// `wait_before_fade`; otherwise the periodic flip loop is armed
    /// directly.
    pub fn start(&mut self, now: Instant) {
        if self.phase != BlinkPhase::Off {
            return;
        }
        self.opacity = 1.0;
        self.fade = None;
        if self.config.deterministic {
            self.phase = BlinkPhase::BlinkOn;
            self.deadline = None;
            return;
        }
        if self.config.animate_opacity {
            self.phase = BlinkPhase::WaitingForStart;
            self.deadline = Some(now + self.config.wait_before_fade);
        } else {
            self.phase = BlinkPhase::BlinkOn;
            self.deadline = Some(now + self.config.blink_interval);
        }
    }

    /// Stops blinking and hides the caret. A no-op when already stopped.
    pub fn stop(&mut self, reset_ticks: bool) {
        if reset_ticks {
            self.ticks = 0;
        }
        if self.phase == BlinkPhase::Off {
            return;
        }
        self.phase = BlinkPhase::Off;
        self.deadline = None;
        self.fade = None;
        self.opacity = 0.0;
    }

    /// Stop-then-start, used when typing should leave the caret solid.
    pub fn restart(&mut self, now: Instant) {
        self.stop(true);
        self.start(now);
    }

    /// Applies the scheduling policy: blink iff focused with a collapsed
    /// selection. Safe to call redundantly on every value or focus change.
    pub fn sync(&mut self, now: Instant, focused: bool, selection_collapsed: bool) {
        if focused && selection_collapsed {
            self.start(now);
        } else {
            self.stop(false);
        }
    }

    /// Advances the machine to `now`, firing a due flip.
    pub fn poll(&mut self, now: Instant) {
        if let Some(fade) = self.fade
            && now.duration_since(fade.started) >= self.config.fade_duration
        {
            self.opacity = fade.to;
            self.fade = None;
        }

        let Some(deadline) = self.deadline else {
            return;
        };
        if now < deadline {
            return;
        }
        match self.phase {
            BlinkPhase::Off => {
                self.deadline = None;
            }
            BlinkPhase::WaitingForStart | BlinkPhase::BlinkOn => {
                self.flip(false, now);
                self.deadline = Some(now + self.config.blink_interval);
            }
            BlinkPhase::BlinkOff => {
                self.flip(true, now);
                self.deadline = Some(now + self.config.blink_interval);
            }
        }
    }

    /// Current caret opacity in `[0, 1]`.
    pub fn opacity(&self, now: Instant) -> f32 {
        if self.phase == BlinkPhase::Off {
            return 0.0;
        }
        self.opacity_at(now)
    }

    fn flip(&mut self, visible: bool, now: Instant) {
        self.ticks = self.ticks.wrapping_add(1);
        let target = if visible { 1.0 } else { 0.0 };
        if self.config.animate_opacity {
            self.fade = Some(Fade {
                from: self.opacity_at(now),
                to: target,
                started: now,
            });
        } else {
            self.opacity = target;
            self.fade = None;
        }
        self.phase = if visible {
            BlinkPhase::BlinkOn
        } else {
            BlinkPhase::BlinkOff
        };
    }

    fn opacity_at(&self, now: Instant) -> f32 {
        match self.fade {
            Some(fade) => {
                let t = if self.config.fade_duration.is_zero() {
                    1.0
                } else {
                    (now.duration_since(fade.started).as_secs_f32()
                        / self.config.fade_duration.as_secs_f32())
                    .clamp(0.0, 1.0)
                };
                fade.from + (fade.to - fade.from) * ease_out(t)
            }
            None => self.opacity,
        }
    }
}

fn ease_out(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_start_twice_arms_a_single_timer() {
        let mut blink = CursorBlinkScheduler::new(CursorBlinkConfig::default());
        let t0 = Instant::now();

        blink.start(t0);
        let armed = blink.deadline();
        assert!(armed.is_some());

        blink.start(t0 + ms(100));
        assert_eq!(blink.deadline(), armed, "second start must not re-arm");
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut blink = CursorBlinkScheduler::new(CursorBlinkConfig::default());
        blink.stop(false);
        assert_eq!(blink.phase(), BlinkPhase::Off);

        let t0 = Instant::now();
        blink.start(t0);
        blink.stop(true);
        blink.stop(true);
        assert_eq!(blink.phase(), BlinkPhase::Off);
        assert_eq!(blink.deadline(), None);
        assert_eq!(blink.opacity(t0), 0.0);
    }

    #[test]
    fn test_periodic_flips() {
        let mut blink = CursorBlinkScheduler::new(CursorBlinkConfig::default());
        let t0 = Instant::now();
        blink.start(t0);
        assert_eq!(blink.phase(), BlinkPhase::BlinkOn);
        assert_eq!(blink.opacity(t0), 1.0);

        blink.poll(t0 + ms(499));
        assert_eq!(blink.phase(), BlinkPhase::BlinkOn);

        blink.poll(t0 + ms(500));
        assert_eq!(blink.phase(), BlinkPhase::BlinkOff);
        assert_eq!(blink.opacity(t0 + ms(500)), 0.0);
        assert_eq!(blink.ticks(), 1);

        blink.poll(t0 + ms(1000));
        assert_eq!(blink.phase(), BlinkPhase::BlinkOn);
        assert_eq!(blink.opacity(t0 + ms(1000)), 1.0);
        assert_eq!(blink.ticks(), 2);
    }

    #[test]
    fn test_deterministic_mode_freezes_solid() {
        let config = CursorBlinkConfig::default().deterministic(true);
        let mut blink = CursorBlinkScheduler::new(config);
        let t0 = Instant::now();

        blink.start(t0);
        assert_eq!(blink.phase(), BlinkPhase::BlinkOn);
        assert_eq!(blink.deadline(), None);

        blink.poll(t0 + ms(10_000));
        assert_eq!(blink.phase(), BlinkPhase::BlinkOn);
        assert_eq!(blink.opacity(t0 + ms(10_000)), 1.0);
    }

    #[test]
    fn test_animated_mode_waits_then_fades() {
        let config = CursorBlinkConfig::default().animate_opacity(true);
        let mut blink = CursorBlinkScheduler::new(config);
        let t0 = Instant::now();

        blink.start(t0);
        assert_eq!(blink.phase(), BlinkPhase::WaitingForStart);
        assert_eq!(blink.deadline(), Some(t0 + ms(150)));
        assert_eq!(blink.opacity(t0 + ms(100)), 1.0, "solid during the hold");

        blink.poll(t0 + ms(150));
        assert_eq!(blink.phase(), BlinkPhase::BlinkOff);

        let mid = blink.opacity(t0 + ms(150) + ms(100));
        assert!(mid > 0.0 && mid < 1.0, "mid-fade opacity, got {mid}");

        blink.poll(t0 + ms(150) + ms(250));
        assert_eq!(blink.opacity(t0 + ms(150) + ms(250)), 0.0);
    }

    #[test]
    fn test_sync_follows_focus_and_selection() {
        let mut blink = CursorBlinkScheduler::new(CursorBlinkConfig::default());
        let t0 = Instant::now();

        blink.sync(t0, true, true);
        assert!(blink.is_running());

        // Selecting a range suppresses blinking.
        blink.sync(t0, true, false);
        assert_eq!(blink.phase(), BlinkPhase::Off);

        blink.sync(t0, true, true);
        assert!(blink.is_running());

        // Losing focus always lands in Off.
        blink.sync(t0, false, true);
        assert_eq!(blink.phase(), BlinkPhase::Off);
        blink.sync(t0, false, true);
        assert_eq!(blink.phase(), BlinkPhase::Off);
    }

    #[test]
    fn test_restart_resets_ticks_and_goes_solid() {
        let mut blink = CursorBlinkScheduler::new(CursorBlinkConfig::default());
        let t0 = Instant::now();
        blink.start(t0);
        blink.poll(t0 + ms(500));
        assert_eq!(blink.ticks(), 1);
        assert_eq!(blink.phase(), BlinkPhase::BlinkOff);

        blink.restart(t0 + ms(600));
        assert_eq!(blink.ticks(), 0);
        assert_eq!(blink.phase(), BlinkPhase::BlinkOn);
        assert_eq!(blink.opacity(t0 + ms(600)), 1.0);
    }

    #[test]
    fn test_ease_out_endpoints() {
        assert_eq!(ease_out(0.0), 0.0);
        assert_eq!(ease_out(1.0), 1.0);
        assert!(ease_out(0.5) > 0.5, "ease-out front-loads the change");
    }
}
