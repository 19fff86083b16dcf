/// Menu screens as data: each screen is a list of buttons laid out in
/// playfield pixels. The renderer draws them, the input layer hit-tests
/// them, the flow controller acts on the chosen `MenuAction`.

use crate::domain::body::Rgb;
use crate::domain::rect::Rect;
use crate::sim::flow::Outcome;
use crate::sim::level::MAX_LEVELS;

pub const BUTTON_COLOR: Rgb = Rgb(112, 112, 112);
pub const DANGER_COLOR: Rgb = Rgb(255, 0, 0);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MenuAction {
    OpenLevelSelect,
    Quit,
    PlayLevel(usize),
    MainMenu,
    NextLevel,
    Retry,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Button {
    pub rect: Rect,
    pub label: String,
    pub hotkey: char,
    pub action: MenuAction,
    pub color: Rgb,
}

impl Button {
    fn new(rect: Rect, label: &str, hotkey: char, action: MenuAction) -> Self {
        Button { rect, label: label.to_string(), hotkey, action, color: BUTTON_COLOR }
    }

    fn danger(mut self) -> Self {
        self.color = DANGER_COLOR;
        self
    }
}

const LEVEL_SLOTS: [Rect; MAX_LEVELS] = [
    Rect::from_raw(81, 161, 160, 160),
    Rect::from_raw(321, 161, 160, 160),
    Rect::from_raw(561, 161, 160, 160),
    Rect::from_raw(81, 401, 160, 160),
    Rect::from_raw(321, 401, 160, 160),
    Rect::from_raw(561, 401, 160, 160),
];

const POST_GAME_SLOTS: [Rect; 3] = [
    Rect::from_raw(81, 241, 160, 160),
    Rect::from_raw(321, 241, 160, 160),
    Rect::from_raw(561, 241, 160, 160),
];

pub fn main_menu() -> Vec<Button> {
    vec![
        Button::new(Rect::from_raw(161, 161, 480, 160), "Level Select", 'l', MenuAction::OpenLevelSelect),
        Button::new(Rect::from_raw(161, 401, 480, 160), "Exit", 'q', MenuAction::Quit).danger(),
    ]
}

/// One slot per available level (at most six), then the close button.
pub fn level_select(level_count: usize) -> Vec<Button> {
    let mut buttons: Vec<Button> = LEVEL_SLOTS
        .iter()
        .take(level_count)
        .enumerate()
        .map(|(i, &rect)| {
            let number = i + 1;
            let hotkey = char::from_digit(number as u32, 10).unwrap_or('?');
            Button::new(rect, &number.to_string(), hotkey, MenuAction::PlayLevel(number))
        })
        .collect();
    buttons.push(Button::new(Rect::from_raw(681, 42, 80, 80), "X", 'x', MenuAction::MainMenu).danger());
    buttons
}

/// A win offers the next level, a loss offers a retry instead.
pub fn post_game(outcome: Outcome) -> Vec<Button> {
    let first = match outcome {
        Outcome::Won => Button::new(POST_GAME_SLOTS[0], "Next Level", 'n', MenuAction::NextLevel),
        Outcome::Lost => Button::new(POST_GAME_SLOTS[0], "Retry Level", 'r', MenuAction::Retry),
    };
    vec![
        first,
        Button::new(POST_GAME_SLOTS[1], "Select Level", 's', MenuAction::OpenLevelSelect),
        Button::new(POST_GAME_SLOTS[2], "Main Menu", 'm', MenuAction::MainMenu),
    ]
}

/// Index of the button under a playfield point.
pub fn hit_test(buttons: &[Button], x: i32, y: i32) -> Option<usize> {
    buttons.iter().position(|b| b.rect.contains_point(x, y))
}

/// Index of the button bound to `key` (case-insensitive).
pub fn hotkey(buttons: &[Button], key: char) -> Option<usize> {
    let key = key.to_ascii_lowercase();
    buttons.iter().position(|b| b.hotkey == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_menu_layout() {
        let b = main_menu();
        assert_eq!(b.len(), 2);
        assert_eq!(b[0].action, MenuAction::OpenLevelSelect);
        assert_eq!(b[1].action, MenuAction::Quit);
        assert_eq!(b[1].color, DANGER_COLOR);
    }

    #[test]
    fn level_select_has_slot_per_level_plus_close() {
        let b = level_select(6);
        assert_eq!(b.len(), 7);
        assert_eq!(b[0].action, MenuAction::PlayLevel(1));
        assert_eq!(b[5].action, MenuAction::PlayLevel(6));
        assert_eq!(b[5].hotkey, '6');
        assert_eq!(b[6].action, MenuAction::MainMenu);

        let short = level_select(2);
        assert_eq!(short.len(), 3);
        assert_eq!(short[2].label, "X");
    }

    #[test]
    fn post_game_depends_on_outcome() {
        assert_eq!(post_game(Outcome::Won)[0].action, MenuAction::NextLevel);
        let lost = post_game(Outcome::Lost);
        assert_eq!(lost[0].action, MenuAction::Retry);
        assert!(lost.iter().all(|b| b.action != MenuAction::NextLevel));
    }

    #[test]
    fn hit_testing() {
        let b = level_select(6);
        assert_eq!(hit_test(&b, 81, 161), Some(0));
        assert_eq!(hit_test(&b, 400, 500), Some(4));
        assert_eq!(hit_test(&b, 700, 60), Some(6));
        assert_eq!(hit_test(&b, 20, 20), None);
        // Right/bottom edges are outside
        assert_eq!(hit_test(&b, 241, 200), None);
    }

    #[test]
    fn hotkeys_ignore_case() {
        let b = main_menu();
        assert_eq!(hotkey(&b, 'L'), Some(0));
        assert_eq!(hotkey(&b, 'q'), Some(1));
        assert_eq!(hotkey(&b, 'z'), None);
    }
}
