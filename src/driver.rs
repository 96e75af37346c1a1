use std::time::Instant;

use crate::game::{Game, GameEvent};

// ── Clock / Driver ──────────────────────────────────────────────────────────

/// Source of monotonic milliseconds. The engine never reads a clock
/// directly; tests substitute a hand-cranked one.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock, milliseconds since construction.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Owns the per-frame cadence: one `tick` advances the simulation once.
/// The driver must be started for ticks to do anything, and it unsubscribes
/// itself the moment a round ends, so no callback can outlive the round.
pub struct Driver<C: Clock> {
    clock: C,
    running: bool,
}

impl<C: Clock> Driver<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Begin (or restart) a round and start ticking.
    pub fn start(&mut self, game: &mut Game) {
        game.start_round(self.clock.now_ms());
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance one frame. A stopped driver is inert; a tick that ends the
    /// round stops the driver before returning.
    pub fn tick(&mut self, game: &mut Game) -> Vec<GameEvent> {
        if !self.running {
            return Vec::new();
        }
        let events = game.step(self.clock.now_ms());
        if events
            .iter()
            .any(|e| matches!(e, GameEvent::RoundOver { .. }))
        {
            self.running = false;
        }
        events
    }
}

/// Hand-cranked clock: time moves only when `advance` is called. This is
/// the deterministic stand-in the `Driver` seam exists for.
pub struct ManualClock {
    now: std::cell::Cell<u64>,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: std::cell::Cell::new(start),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

impl Clock for &ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
