// ── Tuning ──────────────────────────────────────────────────────────────────

/// Physics and obstacle tuning, in virtual-playfield pixels.
///
/// The simulation always runs in a fixed 1200x800 playfield; the renderer
/// projects onto whatever terminal it finds. Keeping the constants in one
/// value (rather than scattered literals) lets tests shrink the field or
/// speed up the ramp without touching the engine.
#[derive(Clone, Debug)]
pub struct GameConfig {
    pub playfield_w: f64,
    pub playfield_h: f64,
    pub gravity: f64,
    pub flap_force: f64,
    pub pipe_speed: f64,
    /// Minimum milliseconds between spawn attempts.
    pub spawn_interval_ms: u64,
    pub base_pipe_gap: f64,
    pub min_pipe_gap: f64,
    /// Gap shrink per raw score point. The sole difficulty ramp.
    pub gap_shrink_rate: f64,
    pub ground_height: f64,
    pub player_size: f64,
    pub pipe_width: f64,
    /// Minimum horizontal clearance behind the newest pair before another
    /// may spawn, regardless of the timer.
    pub min_pipe_distance: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            playfield_w: 1200.0,
            playfield_h: 800.0,
            gravity: 0.6,
            flap_force: -8.0,
            pipe_speed: 2.0,
            spawn_interval_ms: 100,
            base_pipe_gap: 280.0,
            min_pipe_gap: 220.0,
            gap_shrink_rate: 3.0,
            ground_height: 100.0,
            player_size: 80.0,
            pipe_width: 60.0,
            min_pipe_distance: 200.0,
        }
    }
}

impl GameConfig {
    /// Gap for a pair spawned at the given raw score: narrows as the score
    /// grows, never below `min_pipe_gap`.
    pub fn gap_for_score(&self, raw_score: u32) -> f64 {
        (self.base_pipe_gap - raw_score as f64 * self.gap_shrink_rate).max(self.min_pipe_gap)
    }

    /// Y of the ground surface in virtual coordinates.
    pub fn ground_y(&self) -> f64 {
        self.playfield_h - self.ground_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_shrinks_with_score_and_is_floored() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.gap_for_score(0), 280.0);
        assert_eq!(cfg.gap_for_score(10), 250.0);
        // 280 - 20*3 = 220 exactly at the floor
        assert_eq!(cfg.gap_for_score(20), 220.0);
        // beyond the floor it stays put
        assert_eq!(cfg.gap_for_score(200), 220.0);
    }

    #[test]
    fn gap_is_monotone_nonincreasing() {
        let cfg = GameConfig::default();
        let mut prev = f64::INFINITY;
        for s in 0..100 {
            let g = cfg.gap_for_score(s);
            assert!(g <= prev);
            assert!(g >= cfg.min_pipe_gap);
            prev = g;
        }
    }
}
