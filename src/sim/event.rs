/// Events emitted during a simulation tick.
/// The presentation layer consumes these for sound and the status line.

use crate::domain::body::BodyEvent;
use crate::domain::jump::JumpKind;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    Jumped,
    WallJumped,
    Landed,
    BumpedCeiling,
    LevelWon { level: usize },
    LevelLost { level: usize },
}

impl From<BodyEvent> for GameEvent {
    fn from(event: BodyEvent) -> Self {
        match event {
            BodyEvent::Jumped(JumpKind::Ground) => GameEvent::Jumped,
            BodyEvent::Jumped(JumpKind::Wall) => GameEvent::WallJumped,
            BodyEvent::Landed => GameEvent::Landed,
            BodyEvent::BumpedCeiling => GameEvent::BumpedCeiling,
        }
    }
}
