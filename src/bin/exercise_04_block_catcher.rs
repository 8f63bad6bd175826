//! Exercise 04: Catch the Block
//! One game-state singleton driving a headless catch-the-block round
//!
//! The whole round lives in a single shared instance: score, lives, paddle,
//! falling objects. `main` demonstrates the sharing, then lets a scripted
//! autopilot play until the round ends.
//!
//! Run with: cargo run --bin exercise_04_block_catcher

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use colored::Colorize;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use singleton_patterns::get_instance;

// =============================================================================
// Tuning
// =============================================================================

/// Distance from the bottom edge to the top of the paddle.
const PADDLE_FLOOR_OFFSET: i32 = 40;

/// Immutable tuning for one game.
#[derive(Debug, Clone, Copy)]
pub struct GameSettings {
    pub width: i32,
    pub height: i32,
    pub paddle_width: i32,
    pub paddle_height: i32,
    pub paddle_speed: i32,
    pub object_radius: i32,
    pub block_speed: f32,
    pub block_speed_step: f32,
    pub enemy_speed: f32,
    pub enemy_speed_step: f32,
    pub starting_lives: i32,
    pub block_interval_ms: u64,
    pub enemy_interval_ms: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            paddle_width: 90,
            paddle_height: 18,
            paddle_speed: 8,
            object_radius: 13,
            block_speed: 3.0,
            block_speed_step: 0.15,
            enemy_speed: 1.8,
            enemy_speed_step: 0.08,
            starting_lives: 3,
            block_interval_ms: 1000,
            enemy_interval_ms: 1500,
        }
    }
}

// =============================================================================
// Objects and events
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Worth points when caught, costs a life when missed.
    Block,
    /// Costs a life when caught, pays a bonus when it falls through.
    Enemy,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallingObject {
    pub kind: ObjectKind,
    pub x: i32,
    pub y: f32,
    pub radius: i32,
    pub speed: f32,
}

/// What one tick of the game resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    BlockCaught { x: i32, score: u32 },
    BlockMissed { lives: i32 },
    EnemyHit { lives: i32 },
    EnemyDodged { score: u32 },
    GameOver { score: u32 },
}

/// Read-only view of the round for observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSnapshot {
    pub score: u32,
    pub lives: i32,
    pub active: bool,
    pub paddle_x: i32,
}

// =============================================================================
// Singleton: the game state
// =============================================================================

struct GameState {
    score: u32,
    lives: i32,
    block_speed: f32,
    enemy_speed: f32,
    active: bool,
    paddle_x: i32,
    objects: Vec<FallingObject>,
    last_block_ms: u64,
    last_enemy_ms: u64,
    rng: StdRng,
}

impl GameState {
    fn fresh(settings: &GameSettings, rng: StdRng) -> Self {
        Self {
            score: 0,
            lives: settings.starting_lives,
            block_speed: settings.block_speed,
            enemy_speed: settings.enemy_speed,
            active: true,
            paddle_x: (settings.width - settings.paddle_width) / 2,
            objects: Vec::new(),
            last_block_ms: 0,
            last_enemy_ms: 0,
            rng,
        }
    }
}

/// The control singleton: all game logic, no rendering, no input.
///
/// Time is pushed in from outside through [`advance`](Self::advance), so the
/// same logic runs under a real clock, the autopilot or a frozen test clock.
pub struct BlockCatcher {
    settings: GameSettings,
    state: Mutex<GameState>,
}

impl BlockCatcher {
    /// A game with default tuning and a seeded spawn sequence.
    pub fn new_seeded(seed: u64) -> Self {
        let settings = GameSettings::default();
        let state = GameState::fresh(&settings, StdRng::seed_from_u64(seed));
        Self {
            settings,
            state: Mutex::new(state),
        }
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Starts the round over: full lives, zero score, empty board.
    pub fn restart(&self) {
        let mut state = self.lock();
        state.score = 0;
        state.lives = self.settings.starting_lives;
        state.block_speed = self.settings.block_speed;
        state.enemy_speed = self.settings.enemy_speed;
        state.active = true;
        state.paddle_x = (self.settings.width - self.settings.paddle_width) / 2;
        state.objects.clear();
        state.last_block_ms = 0;
        state.last_enemy_ms = 0;
    }

    /// Moves the paddle, clamped to the board. Ignored once the round ends.
    pub fn move_paddle(&self, dx: i32) {
        let mut state = self.lock();
        if !state.active {
            return;
        }
        let limit = self.settings.width - self.settings.paddle_width;
        state.paddle_x = (state.paddle_x + dx).clamp(0, limit);
    }

    /// One logic tick at `now_ms`: spawn on the timers, move everything one
    /// step, resolve catches and misses. Returns what happened this tick.
    pub fn advance(&self, now_ms: u64) -> Vec<GameEvent> {
        let mut state = self.lock();
        if !state.active {
            return Vec::new();
        }

        let settings = self.settings;
        let mut events = Vec::new();

        // saturating_sub keeps a rewound clock from panicking the tick.
        if now_ms.saturating_sub(state.last_block_ms) > settings.block_interval_ms {
            let x = state
                .rng
                .gen_range(settings.object_radius..=settings.width - settings.object_radius);
            let speed = state.block_speed;
            state.objects.push(FallingObject {
                kind: ObjectKind::Block,
                x,
                y: -(settings.object_radius as f32),
                radius: settings.object_radius,
                speed,
            });
            state.last_block_ms = now_ms;
        }
        if now_ms.saturating_sub(state.last_enemy_ms) > settings.enemy_interval_ms {
            let x = state
                .rng
                .gen_range(settings.object_radius..=settings.width - settings.object_radius);
            let speed = state.enemy_speed;
            state.objects.push(FallingObject {
                kind: ObjectKind::Enemy,
                x,
                y: -(settings.object_radius as f32),
                radius: settings.object_radius,
                speed,
            });
            state.last_enemy_ms = now_ms;
        }

        let paddle_x = state.paddle_x;
        let mut survivors = Vec::with_capacity(state.objects.len());
        for mut object in std::mem::take(&mut state.objects) {
            object.y += object.speed;

            if overlaps_paddle(&object, paddle_x, &settings) {
                match object.kind {
                    ObjectKind::Block => {
                        state.score += 10;
                        state.block_speed += settings.block_speed_step;
                        events.push(GameEvent::BlockCaught {
                            x: object.x,
                            score: state.score,
                        });
                    }
                    ObjectKind::Enemy => {
                        state.lives -= 1;
                        events.push(GameEvent::EnemyHit { lives: state.lives });
                        if state.lives <= 0 && state.active {
                            state.active = false;
                            events.push(GameEvent::GameOver { score: state.score });
                        }
                    }
                }
            } else if object.y > settings.height as f32 {
                match object.kind {
                    ObjectKind::Block => {
                        state.lives -= 1;
                        events.push(GameEvent::BlockMissed { lives: state.lives });
                        if state.lives <= 0 && state.active {
                            state.active = false;
                            events.push(GameEvent::GameOver { score: state.score });
                        }
                    }
                    ObjectKind::Enemy => {
                        state.score += 5;
                        state.enemy_speed += settings.enemy_speed_step;
                        events.push(GameEvent::EnemyDodged { score: state.score });
                    }
                }
            } else {
                survivors.push(object);
            }
        }
        state.objects = survivors;

        events
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let state = self.lock();
        GameSnapshot {
            score: state.score,
            lives: state.lives,
            active: state.active,
            paddle_x: state.paddle_x,
        }
    }

    /// Everything currently in flight, for observers and the autopilot.
    pub fn objects(&self) -> Vec<FallingObject> {
        self.lock().objects.clone()
    }

    fn lock(&self) -> MutexGuard<'_, GameState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn inject(&self, object: FallingObject) {
        self.lock().objects.push(object);
    }
}

fn overlaps_paddle(object: &FallingObject, paddle_x: i32, settings: &GameSettings) -> bool {
    let left = object.x - object.radius;
    let top = (object.y - object.radius as f32) as i32;
    let size = object.radius * 2;
    let paddle_top = settings.height - PADDLE_FLOOR_OFFSET;
    left < paddle_x + settings.paddle_width
        && left + size > paddle_x
        && top < paddle_top + settings.paddle_height
        && top + size > paddle_top
}

// =============================================================================
// Demonstration: autopilot round
// =============================================================================

const DEMO_SEED: u64 = 2024;
const TICK_MS: u64 = 16;
const ROUND_LIMIT_MS: u64 = 30_000;

fn demonstrate_singleton() {
    println!("--- Singleton demonstration ---");
    let a = get_instance(|| BlockCatcher::new_seeded(DEMO_SEED));
    let b = get_instance(|| BlockCatcher::new_seeded(DEMO_SEED));
    println!("Instance a: {:p}", Arc::as_ptr(&a));
    println!("Instance b: {:p}", Arc::as_ptr(&b));
    println!("Same instance: {}", Arc::ptr_eq(&a, &b));

    a.move_paddle(40);
    println!(
        "Paddle via a: {} | via b: {}",
        a.snapshot().paddle_x,
        b.snapshot().paddle_x
    );
    println!();
}

/// Chases the lowest block, flees the lowest enemy.
fn steer(game: &BlockCatcher) {
    let objects = game.objects();
    let threat = match objects.iter().max_by(|a, b| a.y.total_cmp(&b.y)) {
        Some(object) => *object,
        None => return,
    };

    let settings = game.settings();
    let paddle_center = game.snapshot().paddle_x + settings.paddle_width / 2;
    let toward = if threat.x > paddle_center {
        settings.paddle_speed
    } else {
        -settings.paddle_speed
    };
    match threat.kind {
        ObjectKind::Block => game.move_paddle(toward),
        ObjectKind::Enemy => game.move_paddle(-toward),
    }
}

fn announce(now_ms: u64, event: GameEvent) {
    match event {
        GameEvent::BlockCaught { x, score } => println!(
            "[{now_ms:>6} ms] {}",
            format!("✓ caught a block at x={x}, score {score}").green()
        ),
        GameEvent::BlockMissed { lives } => println!(
            "[{now_ms:>6} ms] {}",
            format!("a block slipped past, {lives} lives left").yellow()
        ),
        GameEvent::EnemyHit { lives } => println!(
            "[{now_ms:>6} ms] {}",
            format!("✗ enemy hit the paddle, {lives} lives left").red()
        ),
        GameEvent::EnemyDodged { score } => println!(
            "[{now_ms:>6} ms] {}",
            format!("enemy dodged for a bonus, score {score}").cyan()
        ),
        GameEvent::GameOver { score } => println!(
            "[{now_ms:>6} ms] {}",
            format!("GAME OVER with score {score}").red().bold()
        ),
    }
}

fn main() {
    println!("=== Exercise 04: Catch the Block (headless) ===\n");

    demonstrate_singleton();

    let game = get_instance(|| BlockCatcher::new_seeded(DEMO_SEED));
    println!("--- Autopilot round (seed {DEMO_SEED}) ---");

    let mut now_ms = 0;
    loop {
        now_ms += TICK_MS;
        for event in game.advance(now_ms) {
            announce(now_ms, event);
        }
        steer(&game);

        let snapshot = game.snapshot();
        if !snapshot.active || now_ms >= ROUND_LIMIT_MS {
            break;
        }
    }

    let last = game.snapshot();
    let ending = if last.active {
        "time limit reached"
    } else {
        "round over"
    };
    println!(
        "\nFinal state: score {} | lives {} | {}",
        last.score, last.lives, ending
    );

    // The "press R" of the headless world: the same instance starts over.
    if !last.active {
        game.restart();
        let fresh = game.snapshot();
        println!(
            "Restarted: score {} | lives {} | paddle back at {}",
            fresh.score, fresh.lives, fresh.paddle_x
        );
    }

    println!("\n=== Key Points ===");
    println!("1. Score, lives and board live in one shared instance");
    println!("2. Logic is headless; time and input are pushed in from outside");
    println!("3. Any module can observe or steer the same round");
    println!("4. A seeded RNG makes every run of the demo reproducible");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_at(x: i32, y: f32) -> FallingObject {
        FallingObject {
            kind: ObjectKind::Block,
            x,
            y,
            radius: 13,
            speed: 3.0,
        }
    }

    fn enemy_at(x: i32, y: f32) -> FallingObject {
        FallingObject {
            kind: ObjectKind::Enemy,
            x,
            y,
            radius: 13,
            speed: 1.8,
        }
    }

    #[test]
    fn a_fresh_round_is_centered_and_alive() {
        let game = BlockCatcher::new_seeded(1);
        let snapshot = game.snapshot();
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.lives, 3);
        assert!(snapshot.active);
        assert_eq!(snapshot.paddle_x, 275);
        assert!(game.objects().is_empty());
    }

    #[test]
    fn paddle_clamps_to_the_board() {
        let game = BlockCatcher::new_seeded(1);
        game.move_paddle(-10_000);
        assert_eq!(game.snapshot().paddle_x, 0);
        game.move_paddle(10_000);
        assert_eq!(game.snapshot().paddle_x, 550);
    }

    #[test]
    fn spawns_follow_the_interval_timers() {
        let game = BlockCatcher::new_seeded(7);
        let settings = *game.settings();

        // 1001 ms: past the block interval, not yet the enemy interval.
        game.advance(1001);
        let objects = game.objects();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].kind, ObjectKind::Block);
        assert!(objects[0].x >= settings.object_radius);
        assert!(objects[0].x <= settings.width - settings.object_radius);
        assert!(objects[0].y < 0.0);

        // 1600 ms: enemy timer fires; block timer (reset at 1001) does not.
        game.advance(1600);
        let objects = game.objects();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[1].kind, ObjectKind::Enemy);
    }

    #[test]
    fn a_rewound_clock_spawns_nothing_and_does_not_panic() {
        let game = BlockCatcher::new_seeded(7);
        game.advance(1001);
        assert_eq!(game.objects().len(), 1);

        // A tick stamped earlier than the last spawn must be a plain
        // movement tick, not an underflow.
        game.advance(500);
        assert_eq!(game.objects().len(), 1);
        assert!(game.snapshot().active);
    }

    #[test]
    fn catching_a_block_scores_ten() {
        let game = BlockCatcher::new_seeded(1);
        game.inject(block_at(320, 430.0));

        let events = game.advance(1);
        assert_eq!(
            events,
            vec![GameEvent::BlockCaught { x: 320, score: 10 }]
        );
        let snapshot = game.snapshot();
        assert_eq!(snapshot.score, 10);
        assert_eq!(snapshot.lives, 3);
        assert!(game.objects().is_empty());
    }

    #[test]
    fn missing_a_block_costs_a_life() {
        let game = BlockCatcher::new_seeded(1);
        // Far from the paddle, one step above the floor.
        game.inject(block_at(13, 478.0));

        let events = game.advance(1);
        assert_eq!(events, vec![GameEvent::BlockMissed { lives: 2 }]);
        assert_eq!(game.snapshot().score, 0);
    }

    #[test]
    fn enemy_on_the_paddle_costs_a_life() {
        let game = BlockCatcher::new_seeded(1);
        game.inject(enemy_at(320, 430.0));

        let events = game.advance(1);
        assert_eq!(events, vec![GameEvent::EnemyHit { lives: 2 }]);
    }

    #[test]
    fn dodged_enemy_pays_a_bonus() {
        let game = BlockCatcher::new_seeded(1);
        game.inject(enemy_at(13, 479.0));

        let events = game.advance(1);
        assert_eq!(events, vec![GameEvent::EnemyDodged { score: 5 }]);
        assert_eq!(game.snapshot().score, 5);
        assert_eq!(game.snapshot().lives, 3);
    }

    #[test]
    fn third_miss_ends_the_round() {
        let game = BlockCatcher::new_seeded(1);
        for _ in 0..3 {
            game.inject(block_at(13, 478.0));
        }

        let events = game.advance(1);
        assert_eq!(
            events,
            vec![
                GameEvent::BlockMissed { lives: 2 },
                GameEvent::BlockMissed { lives: 1 },
                GameEvent::BlockMissed { lives: 0 },
                GameEvent::GameOver { score: 0 },
            ]
        );

        let snapshot = game.snapshot();
        assert!(!snapshot.active);

        // A finished round ignores further ticks and paddle input.
        assert!(game.advance(5000).is_empty());
        game.move_paddle(50);
        assert_eq!(game.snapshot().paddle_x, snapshot.paddle_x);
    }

    #[test]
    fn restart_wipes_the_round() {
        let game = BlockCatcher::new_seeded(1);
        for _ in 0..3 {
            game.inject(block_at(13, 478.0));
        }
        game.advance(1);
        assert!(!game.snapshot().active);

        game.restart();
        let snapshot = game.snapshot();
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.lives, 3);
        assert!(snapshot.active);
        assert_eq!(snapshot.paddle_x, 275);
        assert!(game.objects().is_empty());
    }

    #[test]
    fn catches_speed_up_later_blocks() {
        let game = BlockCatcher::new_seeded(9);
        game.inject(block_at(320, 430.0));
        game.advance(1);

        // The next spawned block carries the stepped-up speed.
        game.advance(1002);
        let objects = game.objects();
        assert_eq!(objects.len(), 1);
        assert!((objects[0].speed - 3.15).abs() < 1e-4);
    }
}
