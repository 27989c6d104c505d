// THEORY:
// The `BlinkDebouncer` is the only piece of the engine with a notion of time. It turns
// a stream of per-frame eye-pair detections into discrete blink events.
//
// A physical blink spans several frames: the lid closes, pauses, opens, and every
// one of those frame pairs can look like a valid eye pair. Firing once per frame
// would report one blink three or four times. The debouncer therefore has two states:
//
// - `Armed`: the next eye pair fires a blink and moves to `Disarmed`.
// - `Disarmed`: eye pairs are swallowed until the rearm deadline passes. The pair
//   that fired is kept so a host can keep drawing it for the length of the cooldown.
//
// Time is never read from the system here. Every transition takes the caller's clock
// reading, which keeps the cooldown independent of frame rate and lets tests step
// through time without sleeping. Search failures never reach this module, so they
// cannot consume or extend a cooldown.

use crate::core_modules::blob::EyePair;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Armed,
    Disarmed { rearm_at: Instant, eyes: EyePair },
}

/// What happened to an eye pair handed to the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Debounced {
    Fired(EyePair),
    Suppressed,
}

#[derive(Debug, Clone)]
pub struct BlinkDebouncer {
    state: DebounceState,
    cooldown: Duration,
}

impl BlinkDebouncer {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            state: DebounceState::Armed,
            cooldown,
        }
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, DebounceState::Armed)
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Changes the cooldown for future blinks. A pending deadline is left as scheduled.
    pub fn set_cooldown(&mut self, cooldown: Duration) {
        self.cooldown = cooldown;
    }

    /// Rearms if the deadline has passed. Returns `true` on the transition.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.state {
            DebounceState::Disarmed { rearm_at, .. } if now >= rearm_at => {
                self.state = DebounceState::Armed;
                tracing::trace!("blink debouncer rearmed");
                true
            }
            _ => false,
        }
    }

    /// Offers a detected eye pair at time `now`.
    pub fn offer(&mut self, eyes: EyePair, now: Instant) -> Debounced {
        self.tick(now);
        match self.state {
            DebounceState::Armed => {
                self.state = DebounceState::Disarmed {
                    rearm_at: now + self.cooldown,
                    eyes,
                };
                Debounced::Fired(eyes)
            }
            DebounceState::Disarmed { .. } => Debounced::Suppressed,
        }
    }

    /// The eye pair of the last blink while its cooldown is still running.
    pub fn active_eyes(&self) -> Option<&EyePair> {
        match &self.state {
            DebounceState::Disarmed { eyes, .. } => Some(eyes),
            DebounceState::Armed => None,
        }
    }

    pub fn reset(&mut self) {
        self.state = DebounceState::Armed;
    }
}
