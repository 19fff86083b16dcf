/// Jump / wall-jump decision.
///
/// Runs after the horizontal pass (wall flags are fresh) and before gravity
/// (a jump this frame moves the body this frame).
///
///   on_ground && jump                       → ground jump, budget refilled
///   can_wall_jump && jump && touching wall  → wall jump, budget spent
///   otherwise                               → nothing
///
/// The wall-jump budget is one jump per ground contact: holding jump while
/// airborne with the budget spent does nothing.

use super::body::KinematicBody;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JumpKind {
    Ground,
    Wall,
}

pub fn try_jump(body: &mut KinematicBody, jump_pressed: bool) -> Option<JumpKind> {
    if !jump_pressed {
        return None;
    }

    if body.contacts.on_ground {
        body.vertical_velocity = -body.jump_speed();
        body.contacts.on_ground = false;
        body.can_wall_jump = true;
        return Some(JumpKind::Ground);
    }

    if body.can_wall_jump && body.contacts.touching_wall() {
        body.vertical_velocity = -body.wall_jump_speed();
        body.can_wall_jump = false;
        return Some(JumpKind::Wall);
    }

    None
}
