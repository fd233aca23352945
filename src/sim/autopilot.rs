//! Idle/demo driver
//!
//! Plays the game when no one is at the controls: steers toward the lane
//! whose nearest obstacle is farthest ahead and shifts gear by how much road
//! it has. Emits ordinary intents, so it goes through the same state machine
//! a human does.

use super::lanes::Lane;
use super::player::{Intent, Player};
use super::pool::ObstaclePool;

/// Extra clearance a lane needs before the driver leaves its current one
const SWITCH_MARGIN: f32 = 6.0;
/// Clearance above which the driver shifts up
const SHIFT_UP_CLEARANCE: f32 = 80.0;
/// Clearance under which the driver shifts down
const SHIFT_DOWN_CLEARANCE: f32 = 30.0;

/// Distance from the player to the nearest obstacle in `lane` that has not
/// yet been passed. `f32::INFINITY` for an empty lane.
pub fn lane_clearance(pool: &ObstaclePool, lane: Lane, player_z: f32) -> f32 {
    pool.iter_active()
        .filter(|o| o.lane == lane && o.bounds.min.z <= player_z)
        .map(|o| (player_z - o.bounds.max.z).max(0.0))
        .fold(f32::INFINITY, f32::min)
}

/// Lane the driver wants to be in
pub fn best_lane(player: &Player, pool: &ObstaclePool, player_z: f32) -> Lane {
    let current = player.target_lane;
    let current_clearance = lane_clearance(pool, current, player_z);

    let (best, best_clearance) = Lane::ALL
        .into_iter()
        .map(|lane| (lane, lane_clearance(pool, lane, player_z)))
        // Ties go to the lane closest to where the player already is
        .fold((current, current_clearance), |acc, (lane, clearance)| {
            let step = |l: Lane| l.index().abs_diff(current.index());
            let closer = step(lane) < step(acc.0);
            if clearance > acc.1 || (clearance == acc.1 && closer) {
                (lane, clearance)
            } else {
                acc
            }
        });

    if best_clearance > current_clearance + SWITCH_MARGIN {
        best
    } else {
        current
    }
}

/// Intents for this tick
pub fn drive(player: &Player, pool: &ObstaclePool, player_z: f32) -> Vec<Intent> {
    let mut intents = Vec::new();

    let want = best_lane(player, pool, player_z);
    if want.index() < player.target_lane.index() {
        intents.push(Intent::MoveLeft);
    } else if want.index() > player.target_lane.index() {
        intents.push(Intent::MoveRight);
    }

    let clearance = lane_clearance(pool, want, player_z);
    if clearance < SHIFT_DOWN_CLEARANCE && player.gear > 1 {
        intents.push(Intent::GearDown);
    } else if clearance > SHIFT_UP_CLEARANCE && player.gear < player.tuning().max_gear {
        intents.push(Intent::GearUp);
    }

    intents
}
