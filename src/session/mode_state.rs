//! Per-connection streaming mode
//!
//! The mode is written from two places: the connection's reader task (client
//! commands) and the broadcast loop (replay start and finish). A mutex makes
//! every transition a single read-modify-write, so the last writer wins and
//! no reader sees a half-updated state.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::protocol::{ClientCommand, HistoryRange};

/// What the broadcast loop should do for a connection on its next tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamMode {
    /// Connected, nothing requested
    #[default]
    Idle,

    /// Send the current reading every tick
    RealTime,

    /// A history replay was requested and has not started yet
    HistoryPending(HistoryRange),

    /// A history replay is being written
    HistoryStreaming,
}

impl StreamMode {
    /// State after a client command, regardless of the current state
    #[inline]
    #[must_use]
    pub const fn after(command: ClientCommand) -> Self {
        match command {
            ClientCommand::Start => Self::RealTime,
            ClientCommand::Stop => Self::Idle,
            ClientCommand::History(range) => Self::HistoryPending(range),
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_real_time(self) -> bool {
        matches!(self, Self::RealTime)
    }
}

/// Thread-safe holder of one connection's [`StreamMode`]
///
/// # Examples
///
/// ```
/// use airsense::protocol::{ClientCommand, HistoryRange};
/// use airsense::session::{ModeState, StreamMode};
///
/// let state = ModeState::new();
/// assert_eq!(state.mode(), StreamMode::Idle);
///
/// state.apply(ClientCommand::History(HistoryRange::new(10, 20)));
/// assert_eq!(state.begin_replay(), Some(HistoryRange::new(10, 20)));
/// assert_eq!(state.mode(), StreamMode::HistoryStreaming);
///
/// // A command during the replay wins over the replay's reset
/// state.apply(ClientCommand::Start);
/// assert!(!state.finish_replay());
/// assert_eq!(state.mode(), StreamMode::RealTime);
/// ```
#[derive(Debug, Default)]
pub struct ModeState {
    mode: Mutex<StreamMode>,
}

impl ModeState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StreamMode> {
        // StreamMode is Copy and every write is a single assignment, so a
        // poisoned guard still holds a whole value
        self.mode.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current mode
    #[inline]
    #[must_use]
    pub fn mode(&self) -> StreamMode {
        *self.lock()
    }

    /// Apply a client command; returns the new mode
    ///
    /// Commands always take effect immediately, including during a replay.
    pub fn apply(&self, command: ClientCommand) -> StreamMode {
        let next = StreamMode::after(command);
        *self.lock() = next;
        next
    }

    /// Claim a pending replay
    ///
    /// Moves `HistoryPending` to `HistoryStreaming` and returns the range.
    /// Any other mode is left untouched and `None` is returned.
    pub fn begin_replay(&self) -> Option<HistoryRange> {
        let mut mode = self.lock();
        match *mode {
            StreamMode::HistoryPending(range) => {
                *mode = StreamMode::HistoryStreaming;
                Some(range)
            }
            _ => None,
        }
    }

    /// End a replay
    ///
    /// Resets to `Idle` only if the mode is still `HistoryStreaming`; returns
    /// whether it did. A command received during the replay is kept.
    pub fn finish_replay(&self) -> bool {
        let mut mode = self.lock();
        if *mode == StreamMode::HistoryStreaming {
            *mode = StreamMode::Idle;
            true
        } else {
            false
        }
    }
}
