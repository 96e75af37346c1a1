use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::GameConfig;

// ── Entities ────────────────────────────────────────────────────────────────

/// The bird. X never changes; gravity and flaps fight over Y.
#[derive(Clone, Debug)]
pub struct Player {
    pub x: f64,
    pub y: f64,
    pub velocity: f64,
    /// Visual tilt in degrees, -20 on flap, eased toward 90 while falling.
    pub rotation: f64,
}

/// One pipe rectangle. Pipes live in the `Game::pipes` vec in spawn order,
/// always as consecutive top/bottom pairs sharing an x.
#[derive(Clone, Debug)]
pub struct Pipe {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Player's x has cleared this pipe's trailing edge.
    pub passed: bool,
    /// This pipe's pair has already paid out its score point.
    pub scored: bool,
}

/// Cosmetic spark. Not load-bearing: collisions and scoring ignore these.
#[derive(Clone, Debug)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// 1.0 at birth, fades 0.02 per tick, culled at 0.
    pub life: f64,
}

#[derive(Clone, Debug, Default)]
pub struct GameState {
    pub is_playing: bool,
    /// Raw score: one point per pipe pair. Persisted as-is.
    pub score: u32,
    /// Best known raw score, seeded from the leaderboard.
    pub high_score: u32,
    pub game_over: bool,
}

impl GameState {
    /// Raw scores are halved everywhere a human sees them. The leaderboard
    /// stores raw values, so the conversion lives here and only here.
    pub fn display(raw: u32) -> u32 {
        raw / 2
    }

    pub fn display_score(&self) -> u32 {
        Self::display(self.score)
    }

    pub fn display_high_score(&self) -> u32 {
        Self::display(self.high_score)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrashKind {
    Ground,
    Pipe,
}

/// Discrete outcomes of a tick, consumed by audio and the leaderboard glue.
/// The engine itself never talks to a speaker or a socket.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    ScoredPair { raw_score: u32 },
    NewLocalBest { raw_score: u32 },
    Crashed(CrashKind),
    RoundOver { raw_score: u32, round: u64 },
}

// ── Engine ──────────────────────────────────────────────────────────────────

pub struct Game {
    pub config: GameConfig,
    pub player: Player,
    pub pipes: Vec<Pipe>,
    pub particles: Vec<Particle>,
    pub state: GameState,
    /// Monotone round counter; tags network requests so stale responses
    /// from an earlier round can be recognised.
    pub round: u64,
    /// Scrolling ground pattern phase, wraps at 50 virtual pixels.
    pub ground_offset: f64,
    last_spawn_ms: i64,
    rng: SmallRng,
}

impl Game {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let player = Player {
            x: config.playfield_w / 3.0,
            y: config.playfield_h / 2.0,
            velocity: 0.0,
            rotation: 0.0,
        };
        Self {
            config,
            player,
            pipes: Vec::new(),
            particles: Vec::new(),
            state: GameState::default(),
            round: 0,
            ground_offset: 0.0,
            last_spawn_ms: 0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Reset everything but the high score and begin a new round.
    pub fn start_round(&mut self, now_ms: u64) {
        self.player = Player {
            x: self.config.playfield_w / 3.0,
            y: self.config.playfield_h / 2.0,
            velocity: 0.0,
            rotation: 0.0,
        };
        self.pipes.clear();
        self.particles.clear();
        self.ground_offset = 0.0;
        // Backdate the spawn timer so the first pair appears immediately.
        self.last_spawn_ms = now_ms as i64 - 5000;
        self.state.score = 0;
        self.state.is_playing = true;
        self.state.game_over = false;
        self.round += 1;
    }

    /// Apply a flap. Returns false when the round isn't live (the event is
    /// swallowed, matching a tap on the game-over screen).
    pub fn flap(&mut self) -> bool {
        if !self.state.is_playing || self.state.game_over {
            return false;
        }
        self.player.velocity = self.config.flap_force;
        self.player.rotation = -20.0;
        let cx = self.player.x + self.config.player_size / 2.0;
        let cy = self.player.y + self.config.player_size / 2.0;
        self.spawn_particles(cx, cy, 3);
        true
    }

    /// Advance the simulation by one frame. `now_ms` comes from the driver's
    /// clock; the engine has no clock of its own.
    pub fn step(&mut self, now_ms: u64) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if !self.state.is_playing || self.state.game_over {
            return events;
        }

        self.update_particles();

        // Gravity
        self.player.velocity += self.config.gravity;
        self.player.y += self.player.velocity;
        self.player.rotation = (self.player.rotation + 2.0).min(90.0);

        // Ground collision is checked before pipes so a tick that ends the
        // round produces exactly one terminal transition.
        if self.player.y + self.config.player_size > self.config.ground_y() {
            let cx = self.player.x + self.config.player_size / 2.0;
            self.spawn_particles(cx, self.config.ground_y(), 8);
            self.finish_round(CrashKind::Ground, &mut events);
            return events;
        }

        // Advance and cull pipes
        for pipe in &mut self.pipes {
            pipe.x -= self.config.pipe_speed;
        }
        let pipe_w = self.config.pipe_width;
        self.pipes.retain(|p| p.x + pipe_w > 0.0);

        self.maybe_spawn_pair(now_ms as i64);

        // Pipe collision, axis-aligned boxes
        let hit = self.pipes.iter().any(|p| self.player_overlaps(p));
        if hit {
            let cx = self.player.x + self.config.player_size / 2.0;
            let cy = self.player.y + self.config.player_size / 2.0;
            self.spawn_particles(cx, cy, 10);
            self.finish_round(CrashKind::Pipe, &mut events);
            return events;
        }

        // Mark pipes the player has cleared
        for pipe in &mut self.pipes {
            if !pipe.passed && pipe.x + pipe.width < self.player.x {
                pipe.passed = true;
            }
        }

        // Score once per pair: both pipes cleared, neither counted yet
        let mut score_bursts: Vec<f64> = Vec::new();
        for pair in self.pipes.chunks_exact_mut(2) {
            if pair[0].passed && pair[1].passed && !pair[0].scored && !pair[1].scored {
                pair[0].scored = true;
                pair[1].scored = true;
                self.state.score += 1;
                score_bursts.push(pair[1].x + pair[1].width);
                events.push(GameEvent::ScoredPair {
                    raw_score: self.state.score,
                });
            }
        }
        let py = self.player.y + self.config.player_size / 2.0;
        for x in score_bursts {
            self.spawn_particles(x, py, 5);
        }

        if self.state.score > self.state.high_score {
            self.state.high_score = self.state.score;
            events.push(GameEvent::NewLocalBest {
                raw_score: self.state.score,
            });
        }

        self.ground_offset = (self.ground_offset + self.config.pipe_speed) % 50.0;

        events
    }

    /// Seed the best-known score from the leaderboard without lowering a
    /// better local value.
    pub fn sync_high_score(&mut self, raw: u32) {
        if raw > self.state.high_score {
            self.state.high_score = raw;
        }
    }

    fn finish_round(&mut self, kind: CrashKind, events: &mut Vec<GameEvent>) {
        self.state.game_over = true;
        self.state.is_playing = false;
        events.push(GameEvent::Crashed(kind));
        events.push(GameEvent::RoundOver {
            raw_score: self.state.score,
            round: self.round,
        });
    }

    fn maybe_spawn_pair(&mut self, now_ms: i64) {
        if now_ms - self.last_spawn_ms <= self.config.spawn_interval_ms as i64 {
            return;
        }
        // Even with the timer satisfied, keep pairs a minimum distance
        // apart so back-to-back gaps can't spawn.
        let rightmost = self
            .pipes
            .iter()
            .map(|p| p.x)
            .fold(0.0_f64, f64::max);
        if self.config.playfield_w - rightmost < self.config.min_pipe_distance {
            return;
        }

        let gap = self.config.gap_for_score(self.state.score);
        let span = (self.config.playfield_h - self.config.ground_height - gap - 100.0).max(1.0);
        let top_height = self.rng.gen_range(0.0..span) + 50.0;
        let bottom_height = self.config.playfield_h - self.config.ground_height - top_height - gap;
        let x = self.config.playfield_w;

        self.pipes.push(Pipe {
            x,
            y: 0.0,
            width: self.config.pipe_width,
            height: top_height,
            passed: false,
            scored: false,
        });
        self.pipes.push(Pipe {
            x,
            y: top_height + gap,
            width: self.config.pipe_width,
            height: bottom_height,
            passed: false,
            scored: false,
        });
        self.last_spawn_ms = now_ms;
    }

    fn player_overlaps(&self, pipe: &Pipe) -> bool {
        let size = self.config.player_size;
        self.player.x < pipe.x + pipe.width
            && self.player.x + size > pipe.x
            && self.player.y < pipe.y + pipe.height
            && self.player.y + size > pipe.y
    }

    fn update_particles(&mut self) {
        for p in &mut self.particles {
            p.x += p.vx;
            p.y += p.vy;
            p.life -= 0.02;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    fn spawn_particles(&mut self, x: f64, y: f64, count: usize) {
        for _ in 0..count {
            self.particles.push(Particle {
                x: x + self.rng.gen_range(-10.0..10.0),
                y: y + self.rng.gen_range(-10.0..10.0),
                vx: self.rng.gen_range(-2.0..2.0),
                vy: self.rng.gen_range(-2.0..2.0),
                life: 1.0,
            });
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_game() -> Game {
        let mut game = Game::new(GameConfig::default(), 7);
        game.start_round(10_000);
        game
    }

    /// Step with a clock that never satisfies the spawn timer, keeping the
    /// pipe population fixed while physics advances.
    fn step_no_spawn(game: &mut Game) -> Vec<GameEvent> {
        let now = game.last_spawn_ms as u64 + 1;
        game.step(now)
    }

    fn make_pair(game: &Game, x: f64, top_height: f64, gap: f64) -> [Pipe; 2] {
        let cfg = &game.config;
        [
            Pipe {
                x,
                y: 0.0,
                width: cfg.pipe_width,
                height: top_height,
                passed: false,
                scored: false,
            },
            Pipe {
                x,
                y: top_height + gap,
                width: cfg.pipe_width,
                height: cfg.playfield_h - cfg.ground_height - top_height - gap,
                passed: false,
                scored: false,
            },
        ]
    }

    #[test]
    fn spawned_pairs_partition_the_sky_exactly() {
        let mut game = playing_game();
        let mut now = 10_000_u64;
        let mut recorded: Vec<(Pipe, Pipe)> = Vec::new();
        while recorded.len() < 6 {
            now += 33;
            // Hold the bird clear of pipes and ground so spawning runs.
            game.player.y = 100.0;
            game.player.velocity = 0.0;
            let before = game.pipes.len();
            game.step(now);
            if game.pipes.len() > before {
                let pair = &game.pipes[game.pipes.len() - 2..];
                recorded.push((pair[0].clone(), pair[1].clone()));
            }
            // Drop pairs before they ever reach the player.
            game.pipes.retain(|p| p.x > 900.0);
            assert!(now < 1_000_000, "spawning stalled");
        }
        let sky = game.config.playfield_h - game.config.ground_height;
        for (top, bottom) in &recorded {
            assert_eq!(top.y, 0.0);
            let gap = bottom.y - top.height;
            assert!(gap >= game.config.min_pipe_gap);
            assert!((top.height + gap + bottom.height - sky).abs() < 1e-9);
            assert!(top.height >= 50.0);
        }
    }

    #[test]
    fn scoring_is_pair_atomic() {
        let mut game = playing_game();
        // Pair fully behind the player already: both pipes cross the
        // trailing edge in the same tick.
        let pair = make_pair(&game, game.player.x - 100.0, 120.0, 280.0);
        game.pipes.extend(pair);
        game.player.y = 300.0;
        game.player.velocity = 0.0;

        let events = step_no_spawn(&mut game);
        assert_eq!(game.state.score, 1, "one point per pair, not per pipe");
        assert!(events.iter().any(|e| matches!(e, GameEvent::ScoredPair { raw_score: 1 })));

        // Next tick must not pay out again.
        step_no_spawn(&mut game);
        assert_eq!(game.state.score, 1);
    }

    #[test]
    fn spawn_blocked_by_min_distance_despite_timer() {
        let mut game = playing_game();
        // Newest pair still too close to the right edge.
        let close_x = game.config.playfield_w - game.config.min_pipe_distance + 10.0;
        let pair = make_pair(&game, close_x, 150.0, 280.0);
        game.pipes.extend(pair);
        game.player.y = 300.0;
        game.player.velocity = 0.0;

        // Timer long satisfied.
        let before = game.pipes.len();
        game.step(60_000);
        assert_eq!(game.pipes.len(), before, "distance gate must hold");
    }

    #[test]
    fn terminal_transition_fires_once() {
        let mut game = playing_game();
        // Overlap the bottom pipe AND cross the ground line in one tick:
        // the ground check wins and only one round-over may be emitted.
        // Bottom pipe spans 580..700; resting at 625 the bird's box ends
        // the tick past the ground line AND inside that pipe.
        let pair = make_pair(&game, game.player.x, 300.0, 280.0);
        game.pipes.extend(pair);
        game.player.y = 625.0;
        game.player.velocity = 0.0;

        let events = step_no_spawn(&mut game);
        let overs = events
            .iter()
            .filter(|e| matches!(e, GameEvent::RoundOver { .. }))
            .count();
        assert_eq!(overs, 1);
        assert!(events.contains(&GameEvent::Crashed(CrashKind::Ground)));
        assert!(game.state.game_over);
        assert!(!game.state.is_playing);

        // The engine is inert after the terminal tick.
        assert!(step_no_spawn(&mut game).is_empty());
        assert!(step_no_spawn(&mut game).is_empty());
    }

    #[test]
    fn pipe_collision_ends_the_round() {
        let mut game = playing_game();
        let pair = make_pair(&game, game.player.x, 400.0, 280.0);
        game.pipes.extend(pair);
        game.player.y = 100.0; // inside the top pipe
        game.player.velocity = 0.0;

        let events = step_no_spawn(&mut game);
        assert!(events.contains(&GameEvent::Crashed(CrashKind::Pipe)));
        assert!(game.state.game_over);
    }

    #[test]
    fn gravity_only_fall_hits_the_ground_in_bounded_ticks() {
        let mut game = playing_game();
        let mut now = 10_000_u64;
        let mut ticks = 0;
        while !game.state.game_over {
            now += 33;
            game.step(now);
            ticks += 1;
            assert!(ticks < 200, "fall must terminate");
        }
        // Impact particles appear at the ground line (spawn scatter is ±10).
        let ground = game.config.ground_y();
        assert!(!game.particles.is_empty());
        assert!(game.particles.iter().all(|p| (p.y - ground).abs() <= 10.0));
    }

    #[test]
    fn display_score_is_floor_of_half_raw() {
        assert_eq!(GameState::display(0), 0);
        assert_eq!(GameState::display(1), 0);
        assert_eq!(GameState::display(2), 1);
        assert_eq!(GameState::display(41), 20);
        let mut game = playing_game();
        game.state.score = 9;
        assert_eq!(game.state.display_score(), 4);
    }

    #[test]
    fn flap_is_ignored_outside_a_live_round() {
        let mut game = Game::new(GameConfig::default(), 1);
        assert!(!game.flap(), "no round yet");
        game.start_round(0);
        assert!(game.flap());
        assert_eq!(game.player.velocity, game.config.flap_force);
        assert_eq!(game.player.rotation, -20.0);
        game.state.game_over = true;
        game.state.is_playing = false;
        assert!(!game.flap(), "dead bird doesn't flap");
    }

    #[test]
    fn rotation_eases_down_and_caps_at_ninety() {
        let mut game = playing_game();
        game.player.rotation = 89.0;
        game.player.y = 100.0;
        game.player.velocity = 0.0;
        step_no_spawn(&mut game);
        assert_eq!(game.player.rotation, 90.0);
        step_no_spawn(&mut game);
        assert_eq!(game.player.rotation, 90.0);
    }

    #[test]
    fn sync_high_score_never_lowers() {
        let mut game = playing_game();
        game.sync_high_score(40);
        assert_eq!(game.state.high_score, 40);
        game.sync_high_score(12);
        assert_eq!(game.state.high_score, 40);
    }

    #[test]
    fn start_round_resets_difficulty_and_keeps_best() {
        let mut game = playing_game();
        game.state.score = 30;
        game.state.high_score = 44;
        game.state.game_over = true;
        game.state.is_playing = false;
        game.start_round(99_000);
        assert_eq!(game.state.score, 0);
        assert_eq!(game.state.high_score, 44);
        assert!(game.pipes.is_empty());
        assert_eq!(game.config.gap_for_score(game.state.score), game.config.base_pipe_gap);
    }
}
