//! Agent AI behaviour system.
//!
//! Distance-driven state machines. Ground agents run patrol → chase →
//! attack with hysteresis on the way back; flyers pick a band purely from
//! the distance to the player. Both evaluations are idempotent: feeding the
//! result back with the same distance yields the same state.

use bevy::prelude::*;
use rand::Rng;

use super::steering::{step_towards, turn_towards, yaw_of};
use super::{random_patrol_point, Agent, ArchetypeStats, Behavior, FlyerState, GroundState};
use crate::collision::CollisionSystem;
use crate::combat::projectile::{ProjectileOwner, ProjectileSpec};
use crate::constants::*;

/// Next ground state for the current distance to the player.
///
/// Boundaries are inclusive on the way in (`<=` detection / attack range)
/// and exclusive on the way out (`>` 1.5x detection, `>` 1.2x attack range).
/// Transitions cascade until stable, so a patrolling agent that finds the
/// player already inside attack range goes straight to attack.
pub fn next_ground_state(current: GroundState, distance: f32, stats: &ArchetypeStats) -> GroundState {
    let mut state = current;
    // Longest chain is patrol -> chase -> attack
    for _ in 0..3 {
        let next = match state {
            GroundState::Patrol => {
                if distance <= stats.detection_range {
                    GroundState::Chase
                } else {
                    GroundState::Patrol
                }
            }
            GroundState::Chase => {
                if distance <= stats.attack_range {
                    GroundState::Attack
                } else if distance > stats.detection_range * CHASE_GIVE_UP_FACTOR {
                    GroundState::Patrol
                } else {
                    GroundState::Chase
                }
            }
            GroundState::Attack => {
                if distance > stats.attack_range * ATTACK_BREAK_FACTOR {
                    GroundState::Chase
                } else {
                    GroundState::Attack
                }
            }
        };
        if next == state {
            break;
        }
        state = next;
    }
    state
}

/// Flyer band for a distance: retreat when crowded, chase when far,
/// attack in between.
pub fn flyer_state(distance: f32) -> FlyerState {
    if distance < FLYER_RETREAT_DISTANCE {
        FlyerState::Retreat
    } else if distance > FLYER_CHASE_DISTANCE {
        FlyerState::Chase
    } else {
        FlyerState::Attack
    }
}

/// Shared per-tick context for agent updates
pub struct AiContext<'a> {
    pub dt: f32,
    /// Simulation time in seconds
    pub now: f32,
    pub player_position: Vec3,
    pub collision: &'a CollisionSystem,
}

/// Think, move and (maybe) attack for one agent.
///
/// Returns a projectile to launch when the agent fires this tick.
pub fn update_agent(agent: &mut Agent, ctx: &AiContext<'_>, rng: &mut impl Rng) -> Option<ProjectileSpec> {
    if agent.destroyed {
        return None;
    }
    agent.tick_flash(ctx.dt);

    let stats = agent.stats();
    let distance = agent.position.distance(ctx.player_position);

    let attacking = match &mut agent.behavior {
        Behavior::Ground {
            state,
            patrol_target,
        } => {
            *state = next_ground_state(*state, distance, &stats);
            let state = *state;
            update_ground(
                agent_body(&mut agent.position, &mut agent.velocity, &mut agent.facing),
                state,
                patrol_target,
                &stats,
                ctx,
                rng,
            );
            state == GroundState::Attack
        }
        Behavior::Flyer(plan) => {
            plan.state = flyer_state(distance);
            plan.circle_angle += FLYER_ORBIT_SPEED * ctx.dt;
            update_flyer(
                agent_body(&mut agent.position, &mut agent.velocity, &mut agent.facing),
                plan.state,
                plan.circle_angle,
                plan.circle_radius,
                plan.flying_height,
                &stats,
                ctx,
            );
            plan.state == FlyerState::Attack
        }
    };

    if !attacking || !agent.attack_ready(ctx.now) {
        return None;
    }
    // Distance after moving; the state may lag the range by hysteresis
    if agent.position.distance(ctx.player_position) > stats.attack_range {
        return None;
    }

    agent.last_attack = Some(ctx.now);
    Some(ProjectileSpec {
        origin: agent.position,
        direction: ctx.player_position - agent.position,
        speed: ENEMY_PROJECTILE_SPEED,
        damage: stats.attack_damage,
        max_range: ENEMY_PROJECTILE_RANGE,
        owner: ProjectileOwner::Agent(agent.id),
    })
}

/// Mutable kinematic view of an agent
struct Body<'a> {
    position: &'a mut Vec3,
    velocity: &'a mut Vec3,
    facing: &'a mut f32,
}

fn agent_body<'a>(position: &'a mut Vec3, velocity: &'a mut Vec3, facing: &'a mut f32) -> Body<'a> {
    Body {
        position,
        velocity,
        facing,
    }
}

/// Push an agent out of any structure it overlaps, then put ground
/// archetypes back on the ground
pub fn settle_agent(agent: &mut Agent, collision: &CollisionSystem) {
    let stats = agent.stats();
    let flyer = agent.archetype.is_flyer();
    let mut body = agent_body(&mut agent.position, &mut agent.velocity, &mut agent.facing);
    resolve_body(&mut body, &stats, collision);
    if !flyer {
        snap_to_ground(body.position, &stats, collision);
    }
}

fn resolve_body(body: &mut Body<'_>, stats: &ArchetypeStats, collision: &CollisionSystem) {
    let sweep = collision.move_sphere(*body.position, *body.velocity, stats.radius);
    *body.position = sweep.position;
    *body.velocity = sweep.velocity;
}

fn snap_to_ground(position: &mut Vec3, stats: &ArchetypeStats, collision: &CollisionSystem) {
    position.y = collision.height_at_position(position.x, position.z) + stats.ground_offset;
}

fn update_ground(
    mut body: Body<'_>,
    state: GroundState,
    patrol_target: &mut Vec3,
    stats: &ArchetypeStats,
    ctx: &AiContext<'_>,
    rng: &mut impl Rng,
) {
    let target = match state {
        GroundState::Patrol => {
            let flat_dist = Vec2::new(patrol_target.x - body.position.x, patrol_target.z - body.position.z).length();
            if flat_dist < PATROL_ARRIVAL_DISTANCE {
                *patrol_target = random_patrol_point(*body.position, rng);
            }
            Some(*patrol_target)
        }
        // Ground-projected player position
        GroundState::Chase => Some(Vec3::new(
            ctx.player_position.x,
            body.position.y,
            ctx.player_position.z,
        )),
        GroundState::Attack => None,
    };

    match target {
        Some(target) => {
            let (position, velocity) =
                step_towards(*body.position, *body.velocity, target, stats.speed, ctx.dt, true);
            if let Some(yaw) = yaw_of(position - *body.position) {
                *body.facing = turn_towards(*body.facing, yaw, TURN_RATE * ctx.dt);
            }
            *body.position = position;
            *body.velocity = velocity;
        }
        None => {
            // Hold ground and face the player
            *body.velocity = Vec3::ZERO;
            if let Some(yaw) = yaw_of(ctx.player_position - *body.position) {
                *body.facing = turn_towards(*body.facing, yaw, TURN_RATE * ctx.dt);
            }
        }
    }

    // Structures block the step; the terrain snap comes last
    resolve_body(&mut body, stats, ctx.collision);
    snap_to_ground(body.position, stats, ctx.collision);
}

fn update_flyer(
    mut body: Body<'_>,
    state: FlyerState,
    circle_angle: f32,
    circle_radius: f32,
    flying_height: f32,
    stats: &ArchetypeStats,
    ctx: &AiContext<'_>,
) {
    let player = ctx.player_position;
    let orbit_point = Vec3::new(
        player.x + circle_angle.cos() * circle_radius,
        body.position.y,
        player.z + circle_angle.sin() * circle_radius,
    );

    let target = match state {
        FlyerState::Retreat => {
            let away = Vec3::new(body.position.x - player.x, 0.0, body.position.z - player.z);
            // Directly on top of the player: fall back to the orbit direction
            let away = away
                .try_normalize()
                .unwrap_or_else(|| Vec3::new(circle_angle.cos(), 0.0, circle_angle.sin()));
            *body.position + away * FLYER_CHASE_DISTANCE
        }
        FlyerState::Chase | FlyerState::Attack => orbit_point,
    };

    let (position, velocity) = step_towards(*body.position, *body.velocity, target, stats.speed, ctx.dt, true);

    let facing_target = match state {
        FlyerState::Attack => yaw_of(player - position),
        _ => yaw_of(position - *body.position),
    };
    if let Some(yaw) = facing_target {
        *body.facing = turn_towards(*body.facing, yaw, TURN_RATE * ctx.dt);
    }

    *body.position = position;
    *body.velocity = velocity;
    resolve_body(&mut body, stats, ctx.collision);

    // Ease toward cruising altitude instead of snapping
    let position = *body.position;
    let cruise = ctx.collision.height_at_position(position.x, position.z) + flying_height;
    let blend = super::steering::smoothing_factor(ctx.dt);
    body.position.y = position.y + (cruise - position.y) * blend;
}
