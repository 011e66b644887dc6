//! Local typing indicator debouncer.
//!
//! Turns raw keystrokes of the local user into at most one `typing` signal
//! per composing burst and exactly one `stop_typing` signal when the burst
//! ends, either by idle expiry or by sending the message.
//!
//! ```text
//!            keystroke (Start)
//!   ┌──────┐ ───────────────> ┌───────────────────────┐
//!   │ Idle │                  │ Composing { deadline } │ ── keystroke: deadline = now + window
//!   └──────┘ <─────────────── └───────────────────────┘
//!            tick past deadline (Stop)
//!            message sent (Stop)
//! ```
//!
//! The deadline is owned by the state value. There is no free-standing timer
//! to cancel: leaving `Composing` discards it.

use std::{ops::Add, time::Duration};

/// Debouncer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingState<I> {
    /// Not composing
    Idle,
    /// Composing; `stop_typing` is due at `deadline` unless another keystroke
    /// arrives first
    Composing {
        /// Idle expiry
        deadline: I,
    },
}

/// Signal the caller should broadcast for the active room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingSignal {
    /// Send a `typing` frame
    Start,
    /// Send a `stop_typing` frame
    Stop,
}

/// Per-room debouncer for the local user's own typing flag.
#[derive(Debug, Clone)]
pub struct TypingDebouncer<I> {
    state: TypingState<I>,
    idle_window: Duration,
}

impl<I> TypingDebouncer<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    /// Create an idle debouncer.
    pub fn new(idle_window: Duration) -> Self {
        Self { state: TypingState::Idle, idle_window }
    }

    /// Current state
    pub fn state(&self) -> TypingState<I> {
        self.state
    }

    /// True while composing.
    pub fn is_typing(&self) -> bool {
        matches!(self.state, TypingState::Composing { .. })
    }

    /// Pending idle expiry, if composing.
    pub fn deadline(&self) -> Option<I> {
        match self.state {
            TypingState::Idle => None,
            TypingState::Composing { deadline } => Some(deadline),
        }
    }

    /// A keystroke in the composer. Returns `Start` on the first keystroke of
    /// a burst; every keystroke pushes the idle deadline out.
    pub fn keystroke(&mut self, now: I) -> Option<TypingSignal> {
        let signal = match self.state {
            TypingState::Idle => Some(TypingSignal::Start),
            TypingState::Composing { .. } => None,
        };
        self.state = TypingState::Composing { deadline: now + self.idle_window };
        signal
    }

    /// Advance time. Returns `Stop` once when the idle deadline has passed.
    pub fn tick(&mut self, now: I) -> Option<TypingSignal> {
        match self.state {
            TypingState::Composing { deadline } if now >= deadline => {
                self.state = TypingState::Idle;
                Some(TypingSignal::Stop)
            },
            _ => None,
        }
    }

    /// The local user sent a message. Always returns `Stop` and discards any
    /// pending deadline.
    pub fn message_sent(&mut self) -> TypingSignal {
        self.state = TypingState::Idle;
        TypingSignal::Stop
    }

    /// The room is being deactivated. Returns `Stop` only if composing.
    pub fn reset(&mut self) -> Option<TypingSignal> {
        let was_typing = self.is_typing();
        self.state = TypingState::Idle;
        was_typing.then_some(TypingSignal::Stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(2000);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn first_keystroke_starts_burst() {
        let mut deb = TypingDebouncer::new(WINDOW);
        assert_eq!(deb.keystroke(ms(0)), Some(TypingSignal::Start));
        assert_eq!(deb.keystroke(ms(100)), None);
        assert_eq!(deb.keystroke(ms(200)), None);
        assert_eq!(deb.deadline(), Some(ms(2200)));
    }

    #[test]
    fn idle_expiry_stops_exactly_once() {
        let mut deb = TypingDebouncer::new(WINDOW);
        deb.keystroke(ms(0));

        assert_eq!(deb.tick(ms(1999)), None);
        assert_eq!(deb.tick(ms(2000)), Some(TypingSignal::Stop));
        assert_eq!(deb.tick(ms(2500)), None);
        assert_eq!(deb.tick(ms(9000)), None);
        assert!(!deb.is_typing());
    }

    #[test]
    fn keystroke_extends_deadline() {
        let mut deb = TypingDebouncer::new(WINDOW);
        deb.keystroke(ms(0));
        deb.keystroke(ms(1500));
        assert_eq!(deb.tick(ms(2100)), None);
        assert_eq!(deb.tick(ms(3500)), Some(TypingSignal::Stop));
    }

    #[test]
    fn send_supersedes_idle_expiry() {
        let mut deb = TypingDebouncer::new(WINDOW);
        deb.keystroke(ms(0));
        assert_eq!(deb.message_sent(), TypingSignal::Stop);
        assert_eq!(deb.tick(ms(5000)), None);

        // Next burst starts fresh.
        assert_eq!(deb.keystroke(ms(6000)), Some(TypingSignal::Start));
    }

    #[test]
    fn reset_only_stops_when_composing() {
        let mut deb: TypingDebouncer<Duration> = TypingDebouncer::new(WINDOW);
        assert_eq!(deb.reset(), None);
        deb.keystroke(ms(0));
        assert_eq!(deb.reset(), Some(TypingSignal::Stop));
        assert_eq!(deb.state(), TypingState::Idle);
    }
}
