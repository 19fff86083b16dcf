/// Flow controller: the menu / level state machine around the body.
///
/// ## Phases
///
///   MainMenu ──(1)──▶ LevelSelect ──pick n──▶ Playing ──goal / fall──▶ PostGame
///      │  ▲               │  ▲                   │ Esc                  │
///      │  └──────X────────┘  └────────(3)────────┼──────────────────────┤
///      │  ▲                                      ▼                      │
///      │  └────────────────────(4)───────────── PostGame ◀──────────────┘
///     (0)                                         (2) next  (5) retry ──▶ Playing
///      ▼
///    Exited
///
/// Menu choices on the main menu and the post-game screen produce numeric
/// control codes (`Control`), which `dispatch` turns into transitions.
///
/// The controller owns the single `KinematicBody` and the level catalog.
/// It is constructed explicitly and passed by reference; `initialize`
/// guards one-time setup with a flag stored on the instance.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::body::{KinematicBody, Rgb};
use crate::domain::input::FrameInput;
use crate::domain::movement::{NoMovement, NormalMovement};
use crate::domain::rect::Rect;
use crate::sim::event::GameEvent;
use crate::sim::level::{Catalog, FAIL_BOUNDARY};
use crate::sim::menu::{self, Button, MenuAction};

/// Status messages stay up for about two and a half seconds at 60 Hz.
pub const MESSAGE_TICKS: u32 = 150;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    MainMenu,
    LevelSelect,
    Playing,
    PostGame,
    Exited,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Won,
    Lost,
}

/// Control codes exchanged between screens.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Control {
    Quit = 0,
    LevelSelect = 1,
    NextLevel = 2,
    SelectAfterGame = 3,
    MainMenu = 4,
    Retry = 5,
}

impl Control {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Control::Quit),
            1 => Some(Control::LevelSelect),
            2 => Some(Control::NextLevel),
            3 => Some(Control::SelectAfterGame),
            4 => Some(Control::MainMenu),
            5 => Some(Control::Retry),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("level {index} does not exist (choose 1 to {available})")]
    InvalidLevel { index: usize, available: usize },

    #[error("{action:?} is not offered on the {phase:?} screen")]
    Unavailable { action: MenuAction, phase: Phase },
}

/// Everything the renderer needs to draw one gameplay frame.
#[derive(Clone, Copy, Debug)]
pub struct RenderFrame<'a> {
    pub colliders: &'a [Rect],
    pub goal: Option<Rect>,
    pub body: Rect,
    pub body_color: Rgb,
}

#[derive(Debug)]
pub struct FlowController {
    catalog: Catalog,
    body: KinematicBody,
    phase: Phase,
    /// 1-based; 0 until a level has been loaded.
    level: usize,
    goal: Option<Rect>,
    outcome: Option<Outcome>,
    cursor: usize,
    /// Set on level start: horizontal input is ignored until the body
    /// first rests on the ground.
    settling: bool,
    initialized: bool,
    pub message: String,
    pub message_timer: u32,
}

impl FlowController {
    pub fn new(catalog: Catalog, body: KinematicBody) -> Self {
        FlowController {
            catalog,
            body,
            phase: Phase::MainMenu,
            level: 0,
            goal: None,
            outcome: None,
            cursor: 0,
            settling: false,
            initialized: false,
            message: String::new(),
            message_timer: 0,
        }
    }

    /// Run `init` unless it already succeeded once on this controller.
    /// Returns whether it ran. A failed `init` leaves the controller
    /// uninitialized so the caller may try again.
    pub fn initialize<F, E>(&mut self, init: F) -> Result<bool, E>
    where
        F: FnOnce() -> Result<(), E>,
    {
        if self.initialized {
            debug!("initialize called again, skipping");
            return Ok(false);
        }
        init()?;
        self.initialized = true;
        info!(levels = self.catalog.len(), "flow controller initialized");
        Ok(true)
    }

    // ── Accessors ──

    pub fn is_initialized(&self) -> bool { self.initialized }
    pub fn phase(&self) -> Phase { self.phase }
    pub fn level(&self) -> usize { self.level }
    pub fn outcome(&self) -> Option<Outcome> { self.outcome }
    pub fn goal(&self) -> Option<Rect> { self.goal }
    pub fn cursor(&self) -> usize { self.cursor }
    pub fn body(&self) -> &KinematicBody { &self.body }
    pub fn body_mut(&mut self) -> &mut KinematicBody { &mut self.body }

    pub fn level_name(&self) -> Option<&str> {
        self.catalog.get(self.level).map(|l| l.name.as_str())
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
            }
        }
    }

    // ── Levels ──

    /// Load level `index` (1-based): set the goal and move the body to the
    /// level's start with all motion state cleared. An unknown index is
    /// rejected and nothing changes.
    pub fn change_level(&mut self, index: usize) -> Result<(), FlowError> {
        let level = self.catalog.get(index).ok_or(FlowError::InvalidLevel {
            index,
            available: self.catalog.len(),
        })?;
        self.goal = Some(level.goal_rect());
        self.body.reposition(level.start.0, level.start.1);
        self.level = index;
        Ok(())
    }

    fn start_level(&mut self, index: usize) -> Result<(), FlowError> {
        self.change_level(index)?;
        self.body.set_movement_policy(Box::new(NoMovement));
        self.settling = true;
        self.phase = Phase::Playing;
        self.outcome = None;
        self.cursor = 0;
        info!(level = index, name = self.level_name().unwrap_or(""), "level started");
        Ok(())
    }

    /// Pick a level from the level select screen.
    pub fn select_level(&mut self, index: usize) -> Result<(), FlowError> {
        if self.phase != Phase::LevelSelect {
            return Err(FlowError::Unavailable { action: MenuAction::PlayLevel(index), phase: self.phase });
        }
        self.start_level(index).map_err(|e| {
            warn!(level = index, "rejected level selection");
            e
        })
    }

    // ── Menus ──

    /// Buttons on the current screen. Empty while playing.
    pub fn buttons(&self) -> Vec<Button> {
        match self.phase {
            Phase::MainMenu => menu::main_menu(),
            Phase::LevelSelect => menu::level_select(self.catalog.len()),
            Phase::PostGame => menu::post_game(self.outcome.unwrap_or(Outcome::Lost)),
            Phase::Playing | Phase::Exited => Vec::new(),
        }
    }

    pub fn move_cursor(&mut self, delta: i32) {
        let n = self.buttons().len() as i32;
        if n == 0 {
            return;
        }
        self.cursor = (self.cursor as i32 + delta).rem_euclid(n) as usize;
    }

    pub fn set_cursor(&mut self, index: usize) {
        if index < self.buttons().len() {
            self.cursor = index;
        }
    }

    /// Activate the button under the cursor.
    pub fn activate(&mut self) -> Result<Option<Control>, FlowError> {
        match self.buttons().get(self.cursor) {
            Some(button) => self.apply(button.action),
            None => Ok(None),
        }
    }

    /// Act on a menu choice. Choices on the main menu and post-game screen
    /// yield the control code of the transition performed.
    pub fn apply(&mut self, action: MenuAction) -> Result<Option<Control>, FlowError> {
        if let MenuAction::PlayLevel(index) = action {
            self.select_level(index)?;
            return Ok(None);
        }

        if !self.buttons().iter().any(|b| b.action == action) {
            return Err(FlowError::Unavailable { action, phase: self.phase });
        }

        let control = match (self.phase, action) {
            (Phase::LevelSelect, MenuAction::MainMenu) => {
                self.enter(Phase::MainMenu);
                return Ok(None);
            }
            (Phase::MainMenu, MenuAction::OpenLevelSelect) => Control::LevelSelect,
            (Phase::MainMenu, MenuAction::Quit) => Control::Quit,
            (Phase::PostGame, MenuAction::NextLevel) => Control::NextLevel,
            (Phase::PostGame, MenuAction::OpenLevelSelect) => Control::SelectAfterGame,
            (Phase::PostGame, MenuAction::MainMenu) => Control::MainMenu,
            (Phase::PostGame, MenuAction::Retry) => Control::Retry,
            (phase, action) => return Err(FlowError::Unavailable { action, phase }),
        };

        Ok(Some(self.dispatch(control)?))
    }

    /// Perform the transition a control code names and return the one that
    /// actually happened. `NextLevel` after the last level does not advance;
    /// it goes back to level select and reports `SelectAfterGame`.
    pub fn dispatch(&mut self, control: Control) -> Result<Control, FlowError> {
        debug!(code = control.code(), ?control, "dispatch");
        match control {
            Control::Quit => {
                info!("quit requested");
                self.enter(Phase::Exited);
            }
            Control::LevelSelect | Control::SelectAfterGame => self.enter(Phase::LevelSelect),
            Control::MainMenu => self.enter(Phase::MainMenu),
            Control::Retry => self.start_level(self.level)?,
            Control::NextLevel => {
                let next = self.level + 1;
                if self.catalog.get(next).is_some() {
                    self.start_level(next)?;
                } else {
                    info!(level = self.level, "no level after the last one");
                    self.set_message("That was the last level!", MESSAGE_TICKS);
                    self.enter(Phase::LevelSelect);
                    return Ok(Control::SelectAfterGame);
                }
            }
        }
        Ok(control)
    }

    /// Esc / cancel on a menu screen.
    pub fn back(&mut self) -> Result<Option<Control>, FlowError> {
        match self.phase {
            Phase::MainMenu => self.apply(MenuAction::Quit),
            Phase::LevelSelect | Phase::PostGame => self.apply(MenuAction::MainMenu),
            Phase::Playing | Phase::Exited => Ok(None),
        }
    }

    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.cursor = match phase {
            Phase::LevelSelect if self.level >= 1 && self.level <= self.catalog.len() => self.level - 1,
            _ => 0,
        };
    }

    // ── Gameplay ──

    /// Advance one frame of gameplay. Outside `Playing` nothing moves.
    pub fn tick(&mut self, input: &FrameInput) -> Vec<GameEvent> {
        if self.phase != Phase::Playing {
            return Vec::new();
        }

        let colliders = self
            .catalog
            .get(self.level)
            .map(|l| l.colliders.as_slice())
            .unwrap_or(&[]);
        let mut events: Vec<GameEvent> = self
            .body
            .update(input, colliders)
            .into_iter()
            .map(GameEvent::from)
            .collect();
        for event in &events {
            debug!(?event, "body event");
        }
        if self.settling && self.body.on_ground() {
            self.body.set_movement_policy(Box::new(NormalMovement));
            self.settling = false;
        }

        if let Some(outcome) = self.check_outcome() {
            events.push(self.finish(outcome));
        }
        events
    }

    /// Give up on the running level; counts as a loss.
    pub fn abandon(&mut self) -> Option<GameEvent> {
        if self.phase != Phase::Playing {
            return None;
        }
        Some(self.finish(Outcome::Lost))
    }

    /// Falling out of the level beats touching the goal in the same frame.
    fn check_outcome(&self) -> Option<Outcome> {
        let body = self.body.rect();
        if body.overlaps(&FAIL_BOUNDARY) || body.top() >= FAIL_BOUNDARY.bottom() {
            return Some(Outcome::Lost);
        }
        match self.goal {
            Some(goal) if body.overlaps(&goal) => Some(Outcome::Won),
            _ => None,
        }
    }

    fn finish(&mut self, outcome: Outcome) -> GameEvent {
        info!(level = self.level, ?outcome, "level finished");
        self.phase = Phase::PostGame;
        self.outcome = Some(outcome);
        self.cursor = 0;
        match outcome {
            Outcome::Won => GameEvent::LevelWon { level: self.level },
            Outcome::Lost => GameEvent::LevelLost { level: self.level },
        }
    }

    pub fn render_frame(&self) -> RenderFrame<'_> {
        RenderFrame {
            colliders: self
                .catalog
                .get(self.level)
                .map(|l| l.colliders.as_slice())
                .unwrap_or(&[]),
            goal: self.goal,
            body: self.body.rect(),
            body_color: self.body.color(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::body::BodyBuilder;
    use crate::domain::input::Key;
    use proptest::prelude::*;

    fn controller() -> FlowController {
        FlowController::new(Catalog::builtin(), BodyBuilder::new().build().unwrap())
    }

    fn playing(level: usize) -> FlowController {
        let mut f = controller();
        f.apply(MenuAction::OpenLevelSelect).unwrap();
        f.apply(MenuAction::PlayLevel(level)).unwrap();
        f
    }

    fn win(f: &mut FlowController) {
        let goal = f.goal().unwrap();
        f.body_mut().reposition(goal.x, goal.y);
        f.tick(&FrameInput::none());
        assert_eq!(f.outcome(), Some(Outcome::Won));
    }

    #[test]
    fn starts_on_main_menu_without_level() {
        let f = controller();
        assert_eq!(f.phase(), Phase::MainMenu);
        assert_eq!(f.level(), 0);
        assert!(f.goal().is_none());
        assert!(f.render_frame().colliders.is_empty());
    }

    #[test]
    fn initialize_runs_once() {
        let mut f = controller();
        let mut calls = 0;
        assert_eq!(f.initialize(|| -> Result<(), ()> { calls += 1; Ok(()) }), Ok(true));
        assert_eq!(f.initialize(|| -> Result<(), ()> { calls += 1; Ok(()) }), Ok(false));
        assert_eq!(calls, 1);
        assert!(f.is_initialized());
    }

    #[test]
    fn failed_initialize_can_be_retried() {
        let mut f = controller();
        assert_eq!(f.initialize(|| Err("no tty")), Err("no tty"));
        assert!(!f.is_initialized());
        assert_eq!(f.initialize(|| Ok::<(), &str>(())), Ok(true));
    }

    #[test]
    fn control_codes_are_stable() {
        let all = [
            (Control::Quit, 0),
            (Control::LevelSelect, 1),
            (Control::NextLevel, 2),
            (Control::SelectAfterGame, 3),
            (Control::MainMenu, 4),
            (Control::Retry, 5),
        ];
        for (control, code) in all {
            assert_eq!(control.code(), code);
            assert_eq!(Control::from_code(code), Some(control));
        }
        assert_eq!(Control::from_code(6), None);
    }

    #[test]
    fn main_menu_choices() {
        let mut f = controller();
        assert_eq!(f.apply(MenuAction::OpenLevelSelect), Ok(Some(Control::LevelSelect)));
        assert_eq!(f.phase(), Phase::LevelSelect);

        assert_eq!(f.apply(MenuAction::MainMenu), Ok(None));
        assert_eq!(f.phase(), Phase::MainMenu);

        assert_eq!(f.apply(MenuAction::Quit), Ok(Some(Control::Quit)));
        assert_eq!(f.phase(), Phase::Exited);
    }

    #[test]
    fn picking_a_level_loads_it() {
        let f = playing(2);
        assert_eq!(f.phase(), Phase::Playing);
        assert_eq!(f.level(), 2);
        assert_eq!(f.goal(), Some(Rect::new(600, 340, 80, 80).unwrap()));
        assert_eq!((f.body().x(), f.body().y()), (200, 621));
        assert_eq!(f.render_frame().colliders.len(), 3);
    }

    #[test]
    fn invalid_level_selection_changes_nothing() {
        let mut f = controller();
        f.apply(MenuAction::OpenLevelSelect).unwrap();
        let before = f.body().rect();

        assert_eq!(
            f.apply(MenuAction::PlayLevel(7)),
            Err(FlowError::InvalidLevel { index: 7, available: 6 })
        );
        assert!(f.apply(MenuAction::PlayLevel(0)).is_err());
        assert_eq!(f.phase(), Phase::LevelSelect);
        assert_eq!(f.level(), 0);
        assert_eq!(f.body().rect(), before);
    }

    #[test]
    fn level_pick_only_from_level_select() {
        let mut f = controller();
        assert!(matches!(
            f.apply(MenuAction::PlayLevel(1)),
            Err(FlowError::Unavailable { phase: Phase::MainMenu, .. })
        ));
        assert_eq!(f.phase(), Phase::MainMenu);
    }

    #[test]
    fn reaching_goal_wins() {
        let mut f = playing(1);
        let goal = f.goal().unwrap();
        f.body_mut().reposition(goal.x + 10, goal.y + 10);

        let events = f.tick(&FrameInput::none());

        assert!(events.contains(&GameEvent::LevelWon { level: 1 }));
        assert_eq!(f.phase(), Phase::PostGame);
        assert_eq!(f.buttons()[0].action, MenuAction::NextLevel);
    }

    #[test]
    fn falling_out_loses() {
        let mut f = playing(3);
        // Spawn overlaps the floor; let it settle before walking
        f.tick(&FrameInput::none());
        assert_eq!(f.body().rect().bottom(), 620);

        // Walk into the gap and drop
        let mut lost = false;
        for _ in 0..600 {
            let events = f.tick(&FrameInput::none().with(Key::Right));
            if events.contains(&GameEvent::LevelLost { level: 3 }) {
                lost = true;
                break;
            }
        }
        assert!(lost);
        assert_eq!(f.phase(), Phase::PostGame);
        assert_eq!(f.outcome(), Some(Outcome::Lost));
    }

    #[test]
    fn far_below_the_boundary_still_loses() {
        let mut f = playing(1);
        f.body_mut().reposition(5000, 2000);
        f.tick(&FrameInput::none());
        assert_eq!(f.outcome(), Some(Outcome::Lost));
    }

    #[test]
    fn advancing_after_win_loads_next_level() {
        let mut f = playing(1);
        win(&mut f);

        assert_eq!(f.apply(MenuAction::NextLevel), Ok(Some(Control::NextLevel)));

        assert_eq!(f.phase(), Phase::Playing);
        assert_eq!(f.level(), 2);
        assert_eq!(f.goal(), Some(Rect::new(600, 340, 80, 80).unwrap()));
        assert_eq!((f.body().x(), f.body().y()), (200, 621));
        assert_eq!(f.body().vertical_velocity(), 0.0);
    }

    #[test]
    fn advancing_is_not_offered_after_loss() {
        let mut f = playing(1);
        f.abandon();
        assert_eq!(f.outcome(), Some(Outcome::Lost));

        let actions: Vec<MenuAction> = f.buttons().iter().map(|b| b.action).collect();
        assert_eq!(
            actions,
            vec![MenuAction::Retry, MenuAction::OpenLevelSelect, MenuAction::MainMenu]
        );
        assert!(matches!(f.apply(MenuAction::NextLevel), Err(FlowError::Unavailable { .. })));
        assert_eq!(f.phase(), Phase::PostGame);
    }

    #[test]
    fn retry_restarts_same_level() {
        let mut f = playing(4);
        for _ in 0..10 {
            f.tick(&FrameInput::none().with(Key::Left));
        }
        f.abandon();

        assert_eq!(f.apply(MenuAction::Retry), Ok(Some(Control::Retry)));
        assert_eq!(f.phase(), Phase::Playing);
        assert_eq!(f.level(), 4);
        assert_eq!((f.body().x(), f.body().y()), (200, 621));
    }

    #[test]
    fn post_game_navigation_codes() {
        let mut f = playing(1);
        f.abandon();
        assert_eq!(f.apply(MenuAction::OpenLevelSelect), Ok(Some(Control::SelectAfterGame)));
        assert_eq!(f.phase(), Phase::LevelSelect);
        // Cursor lands on the level just played
        assert_eq!(f.cursor(), 0);

        f.apply(MenuAction::PlayLevel(3)).unwrap();
        f.abandon();
        assert_eq!(f.apply(MenuAction::MainMenu), Ok(Some(Control::MainMenu)));
        assert_eq!(f.phase(), Phase::MainMenu);
    }

    #[test]
    fn next_after_last_level_returns_to_select() {
        let mut f = playing(6);
        win(&mut f);

        assert_eq!(f.apply(MenuAction::NextLevel), Ok(Some(Control::SelectAfterGame)));
        assert_eq!(f.phase(), Phase::LevelSelect);
        assert_eq!(f.level(), 6);
        assert!(!f.message.is_empty());
        assert_eq!(f.cursor(), 5);
    }

    #[test]
    fn body_drops_in_before_it_can_walk() {
        // Spawn overlaps the floor by a pixel; held keys wait for the snap
        let mut f = playing(1);
        f.tick(&FrameInput::none().with(Key::Right));
        assert_eq!((f.body().x(), f.body().y()), (200, 580));
        assert!(f.body().on_ground());

        f.tick(&FrameInput::none().with(Key::Right));
        assert_eq!(f.body().x(), 205);

        // Airborne spawn: straight down onto the first platform
        let mut f = playing(5);
        for _ in 0..30 {
            f.tick(&FrameInput::none().with(Key::Left));
            if f.body().on_ground() {
                break;
            }
            assert_eq!(f.body().x(), 80);
        }
        assert!(f.body().on_ground());
        assert_eq!(f.body().rect().bottom(), 400);
    }

    #[test]
    fn dispatch_reports_the_transition_taken() {
        let mut f = playing(5);
        win(&mut f);
        assert_eq!(f.dispatch(Control::NextLevel), Ok(Control::NextLevel));
        assert_eq!(f.level(), 6);

        win(&mut f);
        assert_eq!(f.dispatch(Control::NextLevel), Ok(Control::SelectAfterGame));
        assert_eq!(f.phase(), Phase::LevelSelect);
        assert_eq!(f.level(), 6);
    }

    #[test]
    fn tick_outside_play_is_inert() {
        let mut f = controller();
        let before = f.body().rect();
        assert!(f.tick(&FrameInput::none().with(Key::Right)).is_empty());
        assert_eq!(f.body().rect(), before);
    }

    #[test]
    fn cursor_wraps_and_activates() {
        let mut f = controller();
        f.move_cursor(-1);
        assert_eq!(f.cursor(), 1);
        f.move_cursor(1);
        assert_eq!(f.cursor(), 0);

        assert_eq!(f.activate(), Ok(Some(Control::LevelSelect)));
        f.set_cursor(2);
        assert_eq!(f.activate(), Ok(None));
        assert_eq!(f.level(), 3);
    }

    #[test]
    fn back_walks_up_the_menus() {
        let mut f = controller();
        f.apply(MenuAction::OpenLevelSelect).unwrap();
        f.back().unwrap();
        assert_eq!(f.phase(), Phase::MainMenu);
        assert_eq!(f.back(), Ok(Some(Control::Quit)));
        assert_eq!(f.phase(), Phase::Exited);
    }

    #[test]
    fn message_expires() {
        let mut f = controller();
        f.set_message("hi", 2);
        f.tick_message();
        assert_eq!(f.message, "hi");
        f.tick_message();
        assert!(f.message.is_empty());
    }

    proptest! {
        #[test]
        fn out_of_range_levels_are_rejected(index in prop_oneof![Just(0usize), 7usize..10_000]) {
            let mut f = playing(2);
            f.abandon();
            f.apply(MenuAction::OpenLevelSelect).unwrap();
            let body = f.body().rect();

            prop_assert!(f.select_level(index).is_err());
            prop_assert_eq!(f.level(), 2);
            prop_assert_eq!(f.phase(), Phase::LevelSelect);
            prop_assert_eq!(f.body().rect(), body);
        }
    }
}
