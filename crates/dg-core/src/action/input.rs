//! Input packets and movement integration
//!
//! Movement is camera-relative: forward follows the facing angle, strafing
//! follows its right vector. Diagonals are normalized so they are no faster
//! than straight movement.

use serde::{Deserialize, Serialize};

use crate::GROUND_Y;
use crate::geom::{forward_xz, right_xz};
use crate::player::{AnimTag, PlayerEntity};

/// One frame of client input
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InputPacket {
    pub seq: i64,
    /// Seconds covered by this input
    pub dt: f32,
    /// Facing angle in radians
    pub rotation: f32,
    #[serde(default)]
    pub forward: bool,
    #[serde(default)]
    pub backward: bool,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub attack: bool,
}

impl InputPacket {
    pub fn is_moving(&self) -> bool {
        (self.forward != self.backward) || (self.left != self.right)
    }
}

/// Bounds check for an input packet. Invalid packets are dropped without a
/// reply.
pub fn validate_input(packet: &InputPacket, max_dt: f32) -> bool {
    packet.seq >= 0
        && packet.dt.is_finite()
        && packet.dt > 0.0
        && packet.dt <= max_dt
        && packet.rotation.is_finite()
}

/// Apply a validated packet to a player.
///
/// `rooted` players turn and animate but do not move.
pub fn apply_input(player: &mut PlayerEntity, packet: &InputPacket, speed: f32, rooted: bool) {
    player.facing = packet.rotation;
    player.last_input_seq = packet.seq;

    let (fx, fz) = forward_xz(packet.rotation);
    let (rx, rz) = right_xz(packet.rotation);
    let axis = |pos: bool, neg: bool| (pos as i32 - neg as i32) as f32;
    let f = axis(packet.forward, packet.backward);
    let r = axis(packet.right, packet.left);

    let mut dx = fx * f + rx * r;
    let mut dz = fz * f + rz * r;
    let len = (dx * dx + dz * dz).sqrt();
    let moving = len > 1e-6;

    if moving && !rooted {
        dx /= len;
        dz /= len;
        let step = speed * packet.dt;
        player.position = player.position.offset_xz(dx * step, dz * step);
    }
    player.position.y = GROUND_Y;

    player.anim = if packet.attack {
        AnimTag::Attack
    } else if moving && !rooted {
        AnimTag::Run
    } else {
        AnimTag::Idle
    };
}
