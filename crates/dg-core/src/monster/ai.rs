//! Monster AI
//!
//! One call to [`step`] advances one monster by one simulation tick. The AI
//! only moves the monster and updates its own timers; anything that touches
//! other entities (damage, projectiles, summons, telegraphs) is returned as
//! a [`MonsterAction`] for the instance to apply.

use crate::data::{AbilityDef, AbilityKind, EffectDef, MonsterDef};
use crate::geom::facing_towards;
use crate::player::PlayerId;
use crate::{CHASE_STOP_RATIO, GROUND_Y, KITE_DISTANCE_RATIO, RETURN_SNAP_DISTANCE, Vec3};

use super::{AiState, MonsterEntity, MonsterRuntime, boss};

/// A living player as the AI sees it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerView {
    pub id: PlayerId,
    pub position: Vec3,
}

/// Everything a monster needs to know about the world for one tick
#[derive(Debug, Clone, Copy)]
pub struct AiContext<'a> {
    pub def: &'a MonsterDef,
    /// Living players only
    pub players: &'a [PlayerView],
    /// Summons of this monster currently alive
    pub alive_summons: u32,
    pub now: f64,
    pub dt: f32,
}

/// Side effects requested by a monster's tick
#[derive(Debug, Clone, PartialEq)]
pub enum MonsterAction {
    /// Came back to life at its spawn point
    Respawned,
    /// Boss moved forward to a new phase
    PhaseChanged { phase: usize },
    /// Basic attack on the target
    Attack { target: PlayerId, raw: i32 },
    /// Direct ability hit, possibly carrying an effect
    Strike {
        target: PlayerId,
        raw: i32,
        effect: Option<EffectDef>,
    },
    /// Hit every player within `radius` of the monster
    Nova {
        raw: i32,
        radius: f32,
        effect: Option<EffectDef>,
    },
    Projectile {
        target_pos: Vec3,
        raw: i32,
        speed: f32,
        radius: f32,
        lifetime: f32,
        effect: Option<EffectDef>,
    },
    /// Warn now, hit whoever is inside the circle after `delay`
    Telegraph {
        ability_id: String,
        x: f32,
        z: f32,
        radius: f32,
        delay: f64,
        raw: i32,
        effect: Option<EffectDef>,
    },
    Root {
        target: PlayerId,
        raw: i32,
        effect: Option<EffectDef>,
    },
    Summon {
        monster: String,
        count: u32,
        max_alive: u32,
        spread: f32,
    },
}

/// Advance one monster by one tick.
pub fn step(
    monster: &mut MonsterEntity,
    rt: &mut MonsterRuntime,
    ctx: &AiContext<'_>,
) -> Vec<MonsterAction> {
    let mut actions = Vec::new();
    let def = ctx.def;

    if rt.dead {
        if rt.respawn_duration > 0.0 {
            rt.respawn_timer -= ctx.dt;
            if rt.respawn_timer <= 0.0 {
                respawn(monster, rt);
                actions.push(MonsterAction::Respawned);
            }
        }
        return actions;
    }

    // Death is resolved once by the kill path
    if monster.hp <= 0 {
        return actions;
    }

    rt.attack_timer = (rt.attack_timer - ctx.dt).max(0.0);
    for timer in rt.ability_timers.iter_mut() {
        *timer = (*timer - ctx.dt).max(0.0);
    }

    if let Some(phase) = boss::advance_phase(def, rt.phase, monster.hp_ratio()) {
        rt.phase = phase;
        monster.phase = phase;
        actions.push(MonsterAction::PhaseChanged { phase });
    }

    if rt.is_stunned(ctx.now) {
        monster.state = AiState::Idle;
        return actions;
    }

    let (damage_mult, speed_mult) = boss::phase_multipliers(def, rt.phase);
    let speed = def.speed * speed_mult;

    let reach = def.max_reach();
    let nearest = ctx
        .players
        .iter()
        .map(|p| (p, monster.position.distance_xz(&p.position)))
        .filter(|(_, d)| *d <= reach)
        .min_by(|a, b| a.1.total_cmp(&b.1));

    let Some((target, dist)) = nearest else {
        return_or_idle(monster, rt, speed * ctx.dt);
        return actions;
    };

    // At most one ability per tick, replacing the generic behaviour
    for (index, ability) in def.abilities.iter().enumerate() {
        let timer = rt.ability_timers.get(index).copied().unwrap_or(0.0);
        if !boss::ability_allowed(def, rt.phase, ability)
            || !boss::ability_ready(ability, timer, Some(dist), ctx.alive_summons)
        {
            continue;
        }
        if let Some(t) = rt.ability_timers.get_mut(index) {
            *t = ability.cooldown;
        }
        monster.target = Some(target.id);
        monster.state = AiState::Attack;
        monster.facing = facing_towards(&monster.position, &target.position);
        actions.push(ability_action(ability, target, damage_mult));
        return actions;
    }

    monster.target = Some(target.id);
    monster.facing = facing_towards(&monster.position, &target.position);

    if def.is_ranged() && dist < def.attack_range * KITE_DISTANCE_RATIO {
        monster.state = AiState::Chase;
        if let Some((dx, dz)) = target.position.direction_xz(&monster.position) {
            let step = speed * ctx.dt;
            monster.position = monster.position.offset_xz(dx * step, dz * step);
            monster.position.y = GROUND_Y;
        }
        return actions;
    }

    if dist <= def.attack_range {
        monster.state = AiState::Attack;
        if rt.attack_timer <= 0.0 {
            rt.attack_timer = def.attack_cooldown;
            actions.push(MonsterAction::Attack {
                target: target.id,
                raw: scale(def.damage, damage_mult),
            });
        }
        return actions;
    }

    if dist <= def.aggro_range {
        monster.state = AiState::Chase;
        let stop = def.attack_range * CHASE_STOP_RATIO;
        let step = (speed * ctx.dt).min(dist - stop);
        if step > 0.0 {
            monster.position = move_towards(&monster.position, &target.position, step);
        }
        return actions;
    }

    return_or_idle(monster, rt, speed * ctx.dt);
    actions
}

fn scale(raw: i32, mult: f32) -> i32 {
    (raw as f32 * mult).round() as i32
}

fn ability_action(ability: &AbilityDef, target: &PlayerView, damage_mult: f32) -> MonsterAction {
    let raw = scale(ability.damage, damage_mult);
    let effect = ability.effect;
    match &ability.kind {
        AbilityKind::Projectile {
            speed,
            radius,
            lifetime,
        } => MonsterAction::Projectile {
            target_pos: target.position,
            raw,
            speed: *speed,
            radius: *radius,
            lifetime: *lifetime,
            effect,
        },
        AbilityKind::Strike => MonsterAction::Strike {
            target: target.id,
            raw,
            effect,
        },
        AbilityKind::Nova { radius } => MonsterAction::Nova {
            raw,
            radius: *radius,
            effect,
        },
        AbilityKind::Telegraph { radius, delay } => MonsterAction::Telegraph {
            ability_id: ability.id.clone(),
            x: target.position.x,
            z: target.position.z,
            radius: *radius,
            delay: *delay,
            raw,
            effect,
        },
        AbilityKind::Root => MonsterAction::Root {
            target: target.id,
            raw,
            effect,
        },
        AbilityKind::Summon {
            monster,
            count,
            max_alive,
            spread,
        } => MonsterAction::Summon {
            monster: monster.clone(),
            count: *count,
            max_alive: *max_alive,
            spread: *spread,
        },
    }
}

/// Walk back to the spawn point, or idle there.
fn return_or_idle(monster: &mut MonsterEntity, rt: &MonsterRuntime, step: f32) {
    monster.target = None;
    let dist = monster.position.distance_xz(&rt.spawn_pos);
    if dist <= RETURN_SNAP_DISTANCE {
        monster.position = rt.spawn_pos;
        monster.state = AiState::Idle;
        return;
    }
    monster.state = AiState::Return;
    monster.facing = facing_towards(&monster.position, &rt.spawn_pos);
    monster.position = move_towards(&monster.position, &rt.spawn_pos, step.min(dist));
}

fn move_towards(from: &Vec3, to: &Vec3, step: f32) -> Vec3 {
    match from.direction_xz(to) {
        Some((dx, dz)) => {
            let mut pos = from.offset_xz(dx * step, dz * step);
            pos.y = GROUND_Y;
            pos
        }
        None => *from,
    }
}

fn respawn(monster: &mut MonsterEntity, rt: &mut MonsterRuntime) {
    monster.reset(rt.spawn_pos);
    monster.phase = 0;
    rt.dead = false;
    rt.respawn_timer = 0.0;
    rt.attack_timer = 0.0;
    rt.phase = 0;
    rt.stunned_until = 0.0;
    for timer in rt.ability_timers.iter_mut() {
        *timer = 0.0;
    }
}
