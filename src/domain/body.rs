/// The kinematic body: the player's box, its vertical velocity, contact
/// flags and tunables.
///
/// Tunables are validated once by `BodyBuilder::build` and again by each
/// explicit mutator. Invalid values are rejected and the body is left
/// untouched; nothing is clamped.
///
/// ## Per-frame order (`update`)
///
///   1. Movement policy yields horizontal velocity
///   2. Horizontal move + horizontal collision pass (wall flags)
///   3. Jump / wall-jump check (uses the fresh wall flags)
///   4. Gravity integration (velocity, then truncated position step)
///   5. Vertical collision pass (ground flag, ceiling bump)

use super::collision;
use super::error::ValidationError;
use super::input::FrameInput;
use super::jump::{self, JumpKind};
use super::movement::{MovementPolicy, NormalMovement};
use super::rect::Rect;

/// Landing snaps with a smaller impact than this are the body settling on
/// the floor it already stands on, not a real landing.
const LANDING_MIN_IMPACT: f64 = 2.0;

/// Upper bound for every speed tunable, in px per frame: one playfield
/// width. Larger values would tunnel through any level geometry.
pub const MAX_SPEED: f64 = 800.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn from_name(name: &str) -> Result<Rgb, ValidationError> {
        match name.to_lowercase().as_str() {
            "red" => Ok(Rgb(255, 0, 0)),
            "green" => Ok(Rgb(0, 255, 0)),
            "blue" => Ok(Rgb(0, 0, 255)),
            "white" => Ok(Rgb(255, 255, 255)),
            "black" => Ok(Rgb(0, 0, 0)),
            "yellow" => Ok(Rgb(255, 255, 0)),
            _ => Err(ValidationError::UnknownColor(name.to_string())),
        }
    }
}

/// Contact flags, recomputed by the collision passes every frame.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Contacts {
    pub on_ground: bool,
    pub left_wall: bool,
    pub right_wall: bool,
}

impl Contacts {
    pub fn touching_wall(&self) -> bool {
        self.left_wall || self.right_wall
    }
}

/// Something noteworthy the body did during one `update`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BodyEvent {
    Jumped(JumpKind),
    Landed,
    BumpedCeiling,
}

#[derive(Clone, Copy, PartialEq, Debug)]
struct Tuning {
    move_speed: i32,
    jump_speed: f64,
    fall_speed: f64,
    wall_jump_speed: f64,
}

fn check_speed(name: &'static str, value: i32) -> Result<i32, ValidationError> {
    if value < 0 {
        return Err(ValidationError::NegativeSpeed { name, value });
    }
    if value as f64 > MAX_SPEED {
        return Err(ValidationError::SpeedTooLarge { name, value: value as f64, max: MAX_SPEED });
    }
    Ok(value)
}

fn check_tunable(name: &'static str, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::NonPositiveTunable { name, value });
    }
    if value > MAX_SPEED {
        return Err(ValidationError::SpeedTooLarge { name, value, max: MAX_SPEED });
    }
    Ok(value)
}

// ── Builder ──

#[derive(Clone, Debug)]
pub struct BodyBuilder {
    x: i32,
    y: i32,
    size: (i32, i32),
    color: Rgb,
    move_speed: i32,
    jump_speed: f64,
    fall_speed: f64,
    wall_jump_speed: f64,
}

impl Default for BodyBuilder {
    fn default() -> Self {
        BodyBuilder {
            x: 0,
            y: 0,
            size: (40, 40),
            color: Rgb(0, 128, 255),
            move_speed: 5,
            jump_speed: 15.0,
            fall_speed: 0.7,
            wall_jump_speed: 13.0,
        }
    }
}

impl BodyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn size(mut self, w: i32, h: i32) -> Self {
        self.size = (w, h);
        self
    }

    pub fn color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn move_speed(mut self, speed: i32) -> Self {
        self.move_speed = speed;
        self
    }

    pub fn jump_speed(mut self, speed: f64) -> Self {
        self.jump_speed = speed;
        self
    }

    pub fn fall_speed(mut self, gravity: f64) -> Self {
        self.fall_speed = gravity;
        self
    }

    pub fn wall_jump_speed(mut self, speed: f64) -> Self {
        self.wall_jump_speed = speed;
        self
    }

    pub fn build(self) -> Result<KinematicBody, ValidationError> {
        let rect = Rect::new(self.x, self.y, self.size.0, self.size.1)?;
        let tuning = Tuning {
            move_speed: check_speed("move_speed", self.move_speed)?,
            jump_speed: check_tunable("jump_speed", self.jump_speed)?,
            fall_speed: check_tunable("fall_speed", self.fall_speed)?,
            wall_jump_speed: check_tunable("wall_jump_speed", self.wall_jump_speed)?,
        };
        Ok(KinematicBody {
            rect,
            color: self.color,
            tuning,
            vertical_velocity: 0.0,
            contacts: Contacts::default(),
            can_wall_jump: true,
            policy: Box::new(NormalMovement),
        })
    }
}

// ── Body ──

#[derive(Debug)]
pub struct KinematicBody {
    pub(crate) rect: Rect,
    color: Rgb,
    tuning: Tuning,
    /// Positive = falling (screen y grows downward).
    pub(crate) vertical_velocity: f64,
    pub(crate) contacts: Contacts,
    /// Wall-jump budget: refilled by ground contact or a ground jump.
    pub(crate) can_wall_jump: bool,
    policy: Box<dyn MovementPolicy>,
}

impl KinematicBody {
    pub fn rect(&self) -> Rect { self.rect }
    pub fn x(&self) -> i32 { self.rect.x }
    pub fn y(&self) -> i32 { self.rect.y }
    pub fn size(&self) -> (i32, i32) { self.rect.size() }
    pub fn color(&self) -> Rgb { self.color }

    pub fn move_speed(&self) -> i32 { self.tuning.move_speed }
    pub fn jump_speed(&self) -> f64 { self.tuning.jump_speed }
    pub fn fall_speed(&self) -> f64 { self.tuning.fall_speed }
    pub fn wall_jump_speed(&self) -> f64 { self.tuning.wall_jump_speed }

    pub fn vertical_velocity(&self) -> f64 { self.vertical_velocity }
    pub fn contacts(&self) -> Contacts { self.contacts }
    pub fn on_ground(&self) -> bool { self.contacts.on_ground }
    pub fn touching_left_wall(&self) -> bool { self.contacts.left_wall }
    pub fn touching_right_wall(&self) -> bool { self.contacts.right_wall }
    pub fn can_wall_jump(&self) -> bool { self.can_wall_jump }

    // ── Validated mutators ──

    pub fn set_move_speed(&mut self, speed: i32) -> Result<(), ValidationError> {
        self.tuning.move_speed = check_speed("move_speed", speed)?;
        Ok(())
    }

    pub fn set_jump_speed(&mut self, speed: f64) -> Result<(), ValidationError> {
        self.tuning.jump_speed = check_tunable("jump_speed", speed)?;
        Ok(())
    }

    pub fn set_fall_speed(&mut self, gravity: f64) -> Result<(), ValidationError> {
        self.tuning.fall_speed = check_tunable("fall_speed", gravity)?;
        Ok(())
    }

    pub fn set_wall_jump_speed(&mut self, speed: f64) -> Result<(), ValidationError> {
        self.tuning.wall_jump_speed = check_tunable("wall_jump_speed", speed)?;
        Ok(())
    }

    pub fn resize(&mut self, w: i32, h: i32) -> Result<(), ValidationError> {
        self.rect.set_size(w, h)
    }

    pub fn set_color(&mut self, color: Rgb) {
        self.color = color;
    }

    pub fn set_color_name(&mut self, name: &str) -> Result<(), ValidationError> {
        self.set_color(Rgb::from_name(name)?);
        Ok(())
    }

    pub fn set_movement_policy(&mut self, policy: Box<dyn MovementPolicy>) {
        self.policy = policy;
    }

    /// Teleport to (x, y) and drop all motion state: velocity zero, every
    /// contact flag false, wall-jump budget refilled.
    pub fn reposition(&mut self, x: i32, y: i32) {
        self.rect.x = x;
        self.rect.y = y;
        self.vertical_velocity = 0.0;
        self.contacts = Contacts::default();
        self.can_wall_jump = true;
    }

    // ── Simulation ──

    pub fn apply_gravity(&mut self) {
        self.vertical_velocity += self.tuning.fall_speed;
        // `as` truncates toward zero: sub-pixel velocity does not move the box
        self.rect.y = self.rect.y.saturating_add(self.vertical_velocity as i32);
    }

    /// Advance one frame against the given static colliders.
    pub fn update(&mut self, input: &FrameInput, colliders: &[Rect]) -> Vec<BodyEvent> {
        let mut events = Vec::new();

        let vx = self.policy.horizontal_velocity(self.tuning.move_speed, input);
        collision::resolve_horizontal(self, colliders, vx);

        if let Some(kind) = jump::try_jump(self, input.jump()) {
            events.push(BodyEvent::Jumped(kind));
        }

        self.apply_gravity();
        let impact = self.vertical_velocity;
        let contacts = collision::resolve_vertical(self, colliders);

        if contacts.on_ground && impact >= LANDING_MIN_IMPACT {
            events.push(BodyEvent::Landed);
        } else if impact < 0.0 && self.vertical_velocity == 0.0 {
            events.push(BodyEvent::BumpedCeiling);
        }

        events
    }
}
