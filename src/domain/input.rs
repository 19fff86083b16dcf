/// Per-frame input snapshot consumed by the simulation.
///
/// The core never polls devices. The ui layer folds keyboard and gamepad
/// state into a `FrameInput` once per tick and hands it over by value.

/// Physical keys the core understands. Each logical action maps to an
/// arrow key plus a letter (jump also accepts Space).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Key {
    Left,
    A,
    Right,
    D,
    Up,
    W,
    Space,
}

impl Key {
    #[inline]
    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct FrameInput {
    pressed: u8,
}

impl FrameInput {
    pub fn none() -> Self {
        FrameInput { pressed: 0 }
    }

    /// Builder-style helper: `FrameInput::none().with(Key::Right)`.
    pub fn with(mut self, key: Key) -> Self {
        self.press(key);
        self
    }

    pub fn press(&mut self, key: Key) {
        self.pressed |= key.bit();
    }

    #[inline]
    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed & key.bit() != 0
    }

    pub fn left(&self) -> bool {
        self.is_pressed(Key::Left) || self.is_pressed(Key::A)
    }

    pub fn right(&self) -> bool {
        self.is_pressed(Key::Right) || self.is_pressed(Key::D)
    }

    pub fn jump(&self) -> bool {
        self.is_pressed(Key::Up) || self.is_pressed(Key::W) || self.is_pressed(Key::Space)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_actions_accept_both_bindings() {
        assert!(FrameInput::none().with(Key::A).left());
        assert!(FrameInput::none().with(Key::Left).left());
        assert!(FrameInput::none().with(Key::D).right());
        assert!(FrameInput::none().with(Key::Space).jump());
        assert!(FrameInput::none().with(Key::W).jump());
        assert!(!FrameInput::none().with(Key::Right).left());
        assert!(!FrameInput::none().jump());
    }
}
