/// Gamepad input tracker using gilrs.
///
/// Button mapping comes from the `[gamepad]` section of config.toml.
/// Default mapping:
///   D-pad / Left Stick    →  Move (menus: move cursor)
///   A / X                 →  Jump
///   A / Start             →  Confirm (menus)
///   B / Select            →  Back
///
/// Without the `gamepad` feature every query reports "not pressed".

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};
use tracing::warn;
#[cfg(feature = "gamepad")]
use tracing::info;

use crate::config::GamepadConfig;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    L2,
    R2,
    Start,
    Select,
}

const BTN_COUNT: usize = 10;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "L2" | "LT" => Some(Btn::L2),
            "R2" | "RT" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2 => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Held (continuous) and just_pressed (edge) for one input.
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

impl BtnState {
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn set(&mut self, held: bool) {
        if held && !self.held {
            self.just_pressed = true;
        }
        self.held = held;
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

/// D-pad and stick share one slot per direction.
#[derive(Clone, Copy, Debug, Default)]
struct DirState {
    dpad: BtnState,
    stick: BtnState,
}

impl DirState {
    fn held(&self) -> bool {
        self.dpad.held || self.stick.held
    }

    fn just_pressed(&self) -> bool {
        self.dpad.just_pressed || self.stick.just_pressed
    }
}

#[derive(Clone, Debug, PartialEq)]
struct ActionMap {
    jump: Vec<Btn>,
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            jump: vec![Btn::A, Btn::X],
            confirm: vec![Btn::A, Btn::Start],
            cancel: vec![Btn::B, Btn::Select],
        }
    }
}

impl ActionMap {
    /// Unknown names are skipped; an action left with no valid button
    /// keeps its default binding.
    fn from_config(cfg: &GamepadConfig) -> Self {
        fn parse_list(action: &str, names: &[String], fallback: Vec<Btn>) -> Vec<Btn> {
            let mut btns = Vec::with_capacity(names.len());
            for name in names {
                match Btn::from_name(name) {
                    Some(b) => btns.push(b),
                    None => warn!(action, button = %name, "unknown gamepad button name"),
                }
            }
            if btns.is_empty() { fallback } else { btns }
        }
        let defaults = ActionMap::default();
        ActionMap {
            jump: parse_list("jump", &cfg.jump, defaults.jump),
            confirm: parse_list("confirm", &cfg.confirm, defaults.confirm),
            cancel: parse_list("cancel", &cfg.cancel, defaults.cancel),
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; BTN_COUNT],
    dirs: [DirState; 4],
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick: (f32, f32),

    action_map: ActionMap,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let gilrs_opt = match Gilrs::new() {
            Ok(g) => {
                if let Some((_, pad)) = g.gamepads().next() {
                    info!(name = pad.name(), "gamepad found");
                }
                Some(g)
            }
            Err(e) => {
                warn!(error = %e, "gamepad support unavailable");
                None
            }
        };

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); BTN_COUNT],
            dirs: [DirState::default(); 4],
            stick: (0.0, 0.0),
            action_map: ActionMap::default(),
        }
    }

    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        self.action_map = ActionMap::from_config(cfg);
    }

    /// Poll once per frame, before reading any query.
    pub fn update(&mut self) {
        for b in &mut self.buttons {
            b.just_pressed = false;
        }
        for d in &mut self.dirs {
            d.dpad.just_pressed = false;
            d.stick.just_pressed = false;
        }

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let Some(gilrs) = &mut self.gilrs else { return };
        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => self.set_button(btn, true),
                EventType::ButtonReleased(btn, _) => self.set_button(btn, false),
                EventType::AxisChanged(Axis::LeftStickX, value, _) => self.stick.0 = value,
                EventType::AxisChanged(Axis::LeftStickY, value, _) => self.stick.1 = value,
                EventType::Connected => info!("gamepad connected"),
                EventType::Disconnected => {
                    info!("gamepad disconnected");
                    self.buttons = [BtnState::default(); BTN_COUNT];
                    self.dirs = [DirState::default(); 4];
                    self.stick = (0.0, 0.0);
                }
                _ => {}
            }
        }

        let (x, y) = self.stick;
        self.dirs[Dir::Left as usize].stick.set(x < -STICK_DEADZONE);
        self.dirs[Dir::Right as usize].stick.set(x > STICK_DEADZONE);
        self.dirs[Dir::Up as usize].stick.set(y > STICK_DEADZONE);
        self.dirs[Dir::Down as usize].stick.set(y < -STICK_DEADZONE);
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        let dir = match gilrs_btn {
            Button::DPadUp => Some(Dir::Up),
            Button::DPadDown => Some(Dir::Down),
            Button::DPadLeft => Some(Dir::Left),
            Button::DPadRight => Some(Dir::Right),
            _ => None,
        };
        if let Some(dir) = dir {
            self.dirs[dir as usize].dpad.set(held);
        } else if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.buttons[btn as usize].set(held);
        }
    }

    // ── Action queries (config-driven) ──

    fn any_held(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].held)
    }

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].just_pressed)
    }

    /// Jump is level-triggered, like the keyboard binding.
    pub fn jump_held(&self) -> bool {
        self.any_held(&self.action_map.jump)
    }
    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }

    pub fn held(&self, dir: Dir) -> bool {
        self.dirs[dir as usize].held()
    }
    pub fn pressed(&self, dir: Dir) -> bool {
        self.dirs[dir as usize].just_pressed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn button_names_are_case_insensitive() {
        assert_eq!(Btn::from_name("start"), Some(Btn::Start));
        assert_eq!(Btn::from_name("Back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("south"), Some(Btn::A));
        assert_eq!(Btn::from_name("Z"), None);
    }

    #[test]
    fn config_overrides_and_falls_back() {
        let cfg = GamepadConfig {
            jump: names(&["R1", "bogus"]),
            confirm: names(&["nope"]),
            cancel: vec![],
        };
        let map = ActionMap::from_config(&cfg);
        assert_eq!(map.jump, vec![Btn::R1]);
        assert_eq!(map.confirm, ActionMap::default().confirm);
        assert_eq!(map.cancel, ActionMap::default().cancel);
    }

    #[test]
    fn edge_only_on_transition() {
        let mut s = BtnState::default();
        s.set(true);
        assert!(s.held && s.just_pressed);
        s.just_pressed = false;
        s.set(true);
        assert!(s.held && !s.just_pressed);
        s.set(false);
        assert!(!s.held);
    }

    #[test]
    fn idle_pad_reports_nothing() {
        let mut pad = GamepadState::new();
        pad.update();
        assert!(!pad.jump_held());
        assert!(!pad.confirm_pressed());
        assert!(!pad.held(Dir::Left));
        assert!(!pad.pressed(Dir::Down));
    }
}
