/// Collision resolution against static level geometry.
///
/// Two separate passes per frame, never a combined diagonal check:
///
///   1. `resolve_horizontal` moves the body along x, then pushes it out of
///      every overlapping collider against the direction of travel and
///      sets the matching wall flag.
///   2. `resolve_vertical` runs after gravity has moved the body along y and
///      pushes it out vertically: falling → land on top (ground contact,
///      wall-jump budget refilled), rising → bump the underside.
///
/// Colliders are visited in catalog order and each overlap snaps the body
/// independently, so with several simultaneous overlaps the last one in
/// iteration order decides the final edge. Callers that depend on a
/// particular result for wedged bodies must order their colliders.

use super::body::{Contacts, KinematicBody};
use super::rect::Rect;

/// Move by `velocity_x` and resolve horizontal overlaps.
///
/// Both wall flags are cleared first. With `velocity_x == 0` nothing is
/// snapped and no wall flag is set, even if the body overlaps something.
pub fn resolve_horizontal(body: &mut KinematicBody, colliders: &[Rect], velocity_x: i32) -> Contacts {
    body.rect.x = body.rect.x.saturating_add(velocity_x);
    body.contacts.left_wall = false;
    body.contacts.right_wall = false;

    for collider in colliders {
        if !body.rect.overlaps(collider) {
            continue;
        }
        if velocity_x > 0 {
            body.rect.set_right(collider.left());
            body.contacts.right_wall = true;
        } else if velocity_x < 0 {
            body.rect.set_left(collider.right());
            body.contacts.left_wall = true;
        }
    }

    body.contacts
}

/// Resolve vertical overlaps after the gravity step.
///
/// Ground contact is recomputed from scratch; a ceiling bump stops the
/// rise but never counts as ground.
pub fn resolve_vertical(body: &mut KinematicBody, colliders: &[Rect]) -> Contacts {
    body.contacts.on_ground = false;

    for collider in colliders {
        if !body.rect.overlaps(collider) {
            continue;
        }
        if body.vertical_velocity > 0.0 {
            body.rect.set_bottom(collider.top());
            body.vertical_velocity = 0.0;
            body.contacts.on_ground = true;
            body.can_wall_jump = true;
        } else if body.vertical_velocity < 0.0 {
            body.rect.set_top(collider.bottom());
            body.vertical_velocity = 0.0;
        }
    }

    body.contacts
}
