//! Fixed timestep simulation tick
//!
//! One call advances the session by one frame, in a fixed order:
//! input, player, score and difficulty, obstacle motion and recycling,
//! spawning, collision. Obstacles are moved before the spawner validates
//! against them and before collision reads their bounds.

use super::autopilot;
use super::collision::first_collision;
use super::motion;
use super::player::Intent;
use super::spawn::SpawnContext;
use super::state::{GameEvent, GamePhase, GameState};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Intents received since the previous tick, in arrival order
    pub intents: Vec<Intent>,
    /// Pause toggle
    pub pause: bool,
    /// Idle/demo mode - the autopilot drives
    pub idle_mode: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                log::info!("Paused at tick {}", state.time_ticks);
                return;
            }
            GamePhase::Paused => {
                state.phase = GamePhase::Playing;
                log::info!("Resumed at tick {}", state.time_ticks);
            }
            GamePhase::GameOver => {}
        }
    }

    // Intents outside of play are dropped, not queued
    if state.phase != GamePhase::Playing {
        return;
    }
    state.time_ticks += 1;

    // Input
    let driven = if input.idle_mode {
        autopilot::drive(&state.player, &state.pool, state.player_z)
    } else {
        Vec::new()
    };
    for &intent in input.intents.iter().chain(&driven) {
        if state.player.apply(intent) {
            state.events.push(GameEvent::GearChanged {
                gear: state.player.gear,
            });
        }
    }

    // Player
    if state.player.update(dt) {
        state.events.push(GameEvent::GearChanged {
            gear: state.player.gear,
        });
    }

    // Score and difficulty
    let scroll_speed = state.motion_context().scroll_speed;
    state.distance += scroll_speed * dt;
    state.score = (state.distance * state.tuning.scoring.points_per_unit).floor() as u64;
    if state.difficulty.update(state.score) {
        let tier = state.difficulty.current();
        state.events.push(GameEvent::TierChanged {
            level: tier.level,
            name: tier.name.clone(),
        });
    }

    // Motion and recycling
    let motion_ctx = state.motion_context();
    motion::advance(&mut state.pool, &motion_ctx, dt);
    let retired = motion::recycle(&mut state.pool, state.player_z, &state.tuning.motion);
    state
        .events
        .extend(retired.into_iter().map(|id| GameEvent::ObstacleRecycled { id }));

    // Spawn
    let ctx = SpawnContext {
        player_z: state.player_z,
        tier: state.difficulty.current(),
        motion: motion_ctx,
    };
    let report = state.spawner.update(
        dt,
        &ctx,
        &mut state.pool,
        &mut state.rng,
        state.visuals.as_ref(),
    );
    state
        .events
        .extend(report.spawned.iter().map(|&(id, c)| GameEvent::ObstacleSpawned {
            id,
            kind: c.kind,
            lane: c.lane,
        }));

    // Collision
    if let Some(hit) = first_collision(&state.player.bounds, state.pool.iter_active()) {
        state.phase = GamePhase::GameOver;
        state.events.push(GameEvent::Collision { kind: hit.kind });
        log::info!(
            "Game over: hit {} obstacle at tick {}, score {}",
            hit.kind.as_str(),
            state.time_ticks,
            state.score
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::lanes::Lane;
    use crate::sim::obstacle::ObstacleKind;
    use crate::sim::pool::NoVisuals;
    use proptest::prelude::*;

    fn place(state: &mut GameState, kind: ObstacleKind, lane: Lane, z: f32) {
        let id = state.pool.acquire(kind, &NoVisuals).unwrap();
        state.pool.activate(id, lane, z);
    }

    #[test]
    fn test_tick_pause() {
        let mut state = GameState::new(12345);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.time_ticks, 1);

        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause, SIM_DT);
        assert_eq!(state.phase, GamePhase::Paused);

        // Paused ticks neither advance nor accept intents
        let steer = TickInput {
            intents: vec![Intent::MoveLeft, Intent::GearUp],
            ..Default::default()
        };
        tick(&mut state, &steer, SIM_DT);
        assert_eq!(state.time_ticks, 1);
        assert_eq!(state.player.target_lane, Lane::SAME_DIRECTION);
        assert_eq!(state.player.gear, 1);

        // Unpause
        tick(&mut state, &pause, SIM_DT);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.time_ticks, 2);
    }

    #[test]
    fn test_score_follows_distance() {
        let mut state = GameState::new(1);
        for _ in 0..60 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        // One second at 20 u/s in first gear
        assert!((state.distance - 20.0).abs() < 1e-3);
        assert!(state.score == 19 || state.score == 20);
    }

    #[test]
    fn test_gear_up_emits_event() {
        let mut state = GameState::new(1);
        let input = TickInput {
            intents: vec![Intent::GearUp],
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::GearChanged { gear: 2 }));
    }

    #[test]
    fn test_tier_change_emits_event() {
        let mut state = GameState::new(1);
        state.distance = 499.9;
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.difficulty.current().level, 2);
        assert!(state.drain_events().contains(&GameEvent::TierChanged {
            level: 2,
            name: "Traffic".to_string(),
        }));
    }

    #[test]
    fn test_collision_ends_run() {
        let mut state = GameState::new(1);
        place(&mut state, ObstacleKind::Static, Lane::SAME_DIRECTION, -3.0);
        tick(&mut state, &TickInput::default(), SIM_DT);

        assert_eq!(state.phase, GamePhase::GameOver);
        let collisions: Vec<_> = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::Collision { .. }))
            .collect();
        assert_eq!(
            collisions,
            vec![GameEvent::Collision {
                kind: ObstacleKind::Static
            }]
        );

        // Frozen after game over
        let ticks = state.time_ticks;
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.time_ticks, ticks);
    }

    #[test]
    fn test_neighbouring_lane_does_not_collide() {
        let mut state = GameState::new(1);
        place(&mut state, ObstacleKind::Oncoming, Lane::ONCOMING, -1.0);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_spawn_and_recycle_events_carry_ids() {
        let mut state = GameState::new(5);
        let passed = {
            let id = state.pool.acquire(ObstacleKind::Static, &NoVisuals).unwrap();
            state.pool.activate(id, Lane::LEFT_SHOULDER, 10.5);
            id
        };
        let mut spawned = Vec::new();
        let mut recycled = Vec::new();
        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), SIM_DT);
            for event in state.drain_events() {
                match event {
                    GameEvent::ObstacleSpawned { id, kind, lane } => {
                        let o = state.pool.get(id).unwrap();
                        assert_eq!((o.kind, o.lane), (kind, lane));
                        spawned.push(id);
                    }
                    GameEvent::ObstacleRecycled { id } => recycled.push(id),
                    _ => {}
                }
            }
        }
        assert_eq!(recycled, vec![passed]);
        assert!(!spawned.is_empty());
        assert!(spawned.iter().all(|id| state.pool.get(*id).unwrap().active));
    }

    #[test]
    fn test_reset_after_game_over() {
        let mut state = GameState::new(77);
        place(&mut state, ObstacleKind::Static, Lane::SAME_DIRECTION, -2.0);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state.is_over());

        state.reset();
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.pool.active_len(), 0);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let mut state1 = GameState::new(99999);
        let mut state2 = GameState::new(99999);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };

        for _ in 0..1200 {
            tick(&mut state1, &input, SIM_DT);
            tick(&mut state2, &input, SIM_DT);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.score, state2.score);
        assert_eq!(state1.phase, state2.phase);
        assert_eq!(state1.player.x, state2.player.x);
        let z1: Vec<f32> = state1.pool.iter_active().map(|o| o.z()).collect();
        let z2: Vec<f32> = state2.pool.iter_active().map(|o| o.z()).collect();
        assert_eq!(z1, z2);
    }

    #[test]
    fn test_reset_replays_identically() {
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        let mut state = GameState::new(2024);
        for _ in 0..600 {
            tick(&mut state, &input, SIM_DT);
        }
        let first = (state.score, state.pool.active_len(), state.player.x);

        state.reset();
        for _ in 0..600 {
            tick(&mut state, &input, SIM_DT);
        }
        assert_eq!((state.score, state.pool.active_len(), state.player.x), first);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(12))]

        #[test]
        fn prop_session_keeps_a_lane_clear(seed in any::<u64>()) {
            let mut state = GameState::new(seed);
            let input = TickInput {
                idle_mode: true,
                ..Default::default()
            };
            for _ in 0..1800 {
                tick(&mut state, &input, SIM_DT);
                prop_assert!(state.spawner.has_clear_lane(&state.pool, state.player_z));
                prop_assert!(state.player.gear >= 1);
                if state.is_over() {
                    break;
                }
            }
        }
    }
}
