//! Display clock: linear extrapolation between authoritative server values.
//!
//! The server owns the real clock. Each push re-anchors this one with the
//! latest remaining times; between pushes only the side to move counts down,
//! by wall-clock time elapsed since the anchor. A disconnected side's forfeit
//! countdown is extrapolated the same way.

#[cfg(test)]
#[path = "clock_test.rs"]
mod clock_test;

use std::time::Instant;

use board::Color;

use crate::state::match_state::{DisconnectCountdown, MatchState};

#[derive(Clone, Copy, Debug)]
pub struct DisplayClock {
    white_ms: i64,
    black_ms: i64,
    running: Option<Color>,
    anchored_at: Instant,
    countdown: Option<(DisconnectCountdown, Instant)>,
}

impl DisplayClock {
    #[must_use]
    pub fn new(now: Instant) -> Self {
        Self { white_ms: 0, black_ms: 0, running: None, anchored_at: now, countdown: None }
    }

    /// Re-anchor clocks and forfeit countdown on a store that just took a
    /// server push. Local navigation must not re-anchor.
    pub fn sync_state(&mut self, state: &MatchState, now: Instant) {
        let active = state.active();
        self.sync(active.white_ms, active.black_ms, state.clock_running(), now);
        self.countdown = state.presence().countdown.map(|countdown| (countdown, now));
    }

    /// Re-anchor on fresh server values.
    pub fn sync(&mut self, white_ms: i64, black_ms: i64, running: Option<Color>, now: Instant) {
        self.white_ms = white_ms;
        self.black_ms = black_ms;
        self.running = running;
        self.anchored_at = now;
    }

    /// Extrapolated remaining time for `color`, never below zero.
    #[must_use]
    pub fn remaining_ms(&self, color: Color, now: Instant) -> i64 {
        let base = match color {
            Color::White => self.white_ms,
            Color::Black => self.black_ms,
        };
        if self.running != Some(color) {
            return base.max(0);
        }
        base.saturating_sub(elapsed_ms(self.anchored_at, now)).max(0)
    }

    #[must_use]
    pub fn running(&self) -> Option<Color> {
        self.running
    }

    /// Forfeit countdown as of `now`, never below zero.
    #[must_use]
    pub fn countdown(&self, now: Instant) -> Option<DisconnectCountdown> {
        self.countdown.map(|(countdown, anchored_at)| DisconnectCountdown {
            color: countdown.color,
            milliseconds: countdown.milliseconds.saturating_sub(elapsed_ms(anchored_at, now)).max(0),
        })
    }

    /// Whether anything shown by this clock changes with time.
    #[must_use]
    pub fn is_ticking(&self) -> bool {
        self.running.is_some() || self.countdown.is_some()
    }
}

fn elapsed_ms(since: Instant, now: Instant) -> i64 {
    i64::try_from(now.saturating_duration_since(since).as_millis()).unwrap_or(i64::MAX)
}

/// `m:ss`, or `s.t` (tenths) under ten seconds.
#[must_use]
pub fn format_clock(ms: i64) -> String {
    let ms = ms.max(0);
    if ms < 10_000 {
        return format!("{}.{}", ms / 1_000, (ms % 1_000) / 100);
    }
    let total_secs = ms / 1_000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}
