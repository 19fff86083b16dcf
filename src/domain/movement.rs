/// Movement policies: map an input snapshot to a horizontal velocity.
///
/// The body holds a `Box<dyn MovementPolicy>` and can swap it at runtime
/// (e.g. freeze the player during a transition) without being rebuilt.

use std::fmt;

use super::input::FrameInput;

pub trait MovementPolicy: fmt::Debug {
    fn horizontal_velocity(&self, move_speed: i32, input: &FrameInput) -> i32;
}

/// Arrow/letter movement. Left is checked first, so holding both
/// directions moves left.
#[derive(Clone, Copy, Debug, Default)]
pub struct NormalMovement;

impl MovementPolicy for NormalMovement {
    fn horizontal_velocity(&self, move_speed: i32, input: &FrameInput) -> i32 {
        if input.left() {
            return -move_speed;
        }
        if input.right() {
            return move_speed;
        }
        0
    }
}

/// Ignores input entirely.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMovement;

impl MovementPolicy for NoMovement {
    fn horizontal_velocity(&self, _move_speed: i32, _input: &FrameInput) -> i32 {
        0
    }
}
