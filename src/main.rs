/// Entry point and game loop.

mod config;
mod domain;
mod logging;
mod sim;
mod ui;

use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing::{debug, error, info, warn};

use config::GameConfig;
use domain::input::{FrameInput, Key};
use sim::event::GameEvent;
use sim::flow::{FlowController, Phase, MESSAGE_TICKS};
use sim::level::Catalog;
use sim::menu;
use ui::gamepad::{Dir, GamepadState};
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::{Sfx, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() -> ExitCode {
    let log_file = logging::init();
    info!(version = env!("CARGO_PKG_VERSION"), "wallhop starting");

    let config = GameConfig::load();
    let body = match config.physics.build_body() {
        Ok(b) => b,
        Err(e) => {
            error!(error = %e, "invalid [physics] settings");
            eprintln!("Invalid [physics] settings in config.toml: {e}");
            return ExitCode::FAILURE;
        }
    };
    let catalog = Catalog::load(config.levels_file.as_deref());

    let mut flow = FlowController::new(catalog, body);
    let mut renderer = Renderer::new();

    if let Err(e) = flow.initialize(|| renderer.init()) {
        error!(error = %e, "terminal init failed");
        // Raw mode may already be on
        let _ = renderer.cleanup();
        eprintln!("Terminal init failed: {e}");
        return ExitCode::FAILURE;
    }

    let sound = SoundEngine::new();

    // The default hook would print into the alternate screen
    panic::set_hook(Box::new(|info| error!("panic: {info}")));

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        game_loop(&mut flow, &mut renderer, sound.as_ref(), &config)
    }));

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    let log_hint = log_file
        .map(|p| format!(" (see {})", p.display()))
        .unwrap_or_default();

    match result {
        Ok(Ok(())) => {
            info!("clean exit");
            println!("Thanks for playing Wallhop!");
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            error!(error = %e, "game loop failed");
            eprintln!("Game error: {e}{log_hint}");
            ExitCode::FAILURE
        }
        Err(_) => {
            eprintln!("Wallhop crashed{log_hint}");
            ExitCode::FAILURE
        }
    }
}

fn game_loop(
    flow: &mut FlowController,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.keyboard_enhanced();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);
    let mut last_tick = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            info!("ctrl-c");
            break;
        }

        if flow.phase() == Phase::Playing {
            if kb.any_pressed(KEYS_BACK) || gp.cancel_pressed() {
                let events: Vec<GameEvent> = flow.abandon().into_iter().collect();
                process_sound_events(sound, &events);
            }
        } else {
            handle_menu(flow, renderer, sound, &kb, &gp);
        }

        if flow.phase() == Phase::Exited {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            if flow.phase() == Phase::Playing {
                let events = flow.tick(&frame_input(&kb, &gp));
                process_sound_events(sound, &events);
            }
            flow.tick_message();
            last_tick = Instant::now();
        }

        renderer.render(flow)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

// ── Key Constants ──

const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];
const KEYS_BACK: &[KeyCode] = &[KeyCode::Esc];
const KEYS_PREV: &[KeyCode] = &[KeyCode::Up, KeyCode::Left, KeyCode::BackTab];
const KEYS_NEXT: &[KeyCode] = &[KeyCode::Down, KeyCode::Right, KeyCode::Tab];

/// Keyboard snapshot plus the gamepad's d-pad/stick and jump buttons.
fn frame_input(kb: &InputState, gp: &GamepadState) -> FrameInput {
    let mut input = kb.frame_input();
    if gp.held(Dir::Left) {
        input.press(Key::Left);
    }
    if gp.held(Dir::Right) {
        input.press(Key::Right);
    }
    if gp.jump_held() || gp.held(Dir::Up) {
        input.press(Key::Up);
    }
    input
}

/// Menu screens: hover and arrows move the cursor; a click, a hotkey,
/// Enter or the confirm button chooses; Esc goes back.
fn handle_menu(
    flow: &mut FlowController,
    renderer: &Renderer,
    sound: Option<&SoundEngine>,
    kb: &InputState,
    gp: &GamepadState,
) {
    let buttons = flow.buttons();

    if let Some((x, y)) = kb.hover().and_then(|(c, r)| renderer.screen_to_world(c, r)) {
        if let Some(i) = menu::hit_test(&buttons, x, y) {
            flow.set_cursor(i);
        }
    }
    if kb.any_pressed(KEYS_PREV) || gp.pressed(Dir::Up) || gp.pressed(Dir::Left) {
        flow.move_cursor(-1);
    }
    if kb.any_pressed(KEYS_NEXT) || gp.pressed(Dir::Down) || gp.pressed(Dir::Right) {
        flow.move_cursor(1);
    }

    let clicked = kb
        .clicks
        .iter()
        .filter_map(|&(c, r)| renderer.screen_to_world(c, r))
        .find_map(|(x, y)| menu::hit_test(&buttons, x, y));
    let hotkey = kb.pressed_chars().find_map(|c| menu::hotkey(&buttons, c));

    let result = if let Some(i) = clicked.or(hotkey) {
        flow.apply(buttons[i].action)
    } else if kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed() {
        flow.activate()
    } else if kb.any_pressed(KEYS_BACK) || gp.cancel_pressed() {
        flow.back()
    } else {
        return;
    };

    match result {
        Ok(control) => {
            if let Some(c) = control {
                debug!(code = c.code(), ?c, "menu control");
            }
            if let Some(sfx) = sound {
                sfx.play(Sfx::Select);
            }
        }
        Err(e) => {
            warn!(error = %e, "menu choice rejected");
            flow.set_message(&e.to_string(), MESSAGE_TICKS);
        }
    }
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let Some(sfx) = sound else { return };
    for effect in events.iter().filter_map(Sfx::for_event) {
        sfx.play(effect);
    }
}
