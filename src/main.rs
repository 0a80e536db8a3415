/// Entry point and host loop.
///
/// The host owns the facility of attached objects and the puzzle-package
/// registry. Activating a locked object routes through the registry to
/// the governing package; the opened surface is then driven from this
/// loop (input, 1 Hz deadline tick, completion poll, render) until the
/// player closes it. Closing drops the whole session, so no timer can
/// outlive its puzzle.

mod config;
mod domain;
mod host;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use config::HostConfig;
use domain::grid::Column;
use host::channel::{completion_channel, CompletionHandle};
use host::hackterm::HackTermPackage;
use host::object::WorldObject;
use host::registry::{OpenContext, PuzzleSurface, Registry, TargetView};
use sim::event::PuzzleEvent;
use ui::input::InputState;
use ui::renderer::{PuzzleScreen, Renderer};
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(16);
const TICK_INTERVAL: Duration = Duration::from_secs(1);
const GLITCH_FRAMES: u32 = 14;
const FLASH_FRAMES: u32 = 48;

/// One open puzzle session and its host-side bookkeeping.
struct OpenPuzzle {
    surface: Box<dyn PuzzleSurface>,
    handle: CompletionHandle,
    object_index: usize,
    title: String,
    selected: usize,
    glitch: u32,
    flash: u32,
    last_tick: Instant,
}

struct Host {
    objects: Vec<WorldObject>,
    cursor: usize,
    message: String,
    message_timer: u32,
    puzzle: Option<OpenPuzzle>,
}

impl Host {
    fn set_message(&mut self, msg: &str, frames: u32) {
        self.message = msg.to_string();
        self.message_timer = frames;
    }
}

fn main() {
    let cfg = HostConfig::load();

    let mut registry = Registry::new();
    if let Err(e) = registry.register(Box::new(HackTermPackage)) {
        eprintln!("Package registration failed: {e}");
        return;
    }
    registry.apply_enabled_list(&cfg.enabled_packages);
    registry.set_default(host::object::ObjectKind::Door, &cfg.default_door);
    registry.set_default(host::object::ObjectKind::Actor, &cfg.default_actor);

    let mut host_state = Host {
        objects: cfg.objects.clone(),
        cursor: 0,
        message: String::new(),
        message_timer: 0,
        puzzle: None,
    };

    let mut renderer = Renderer::new(cfg.terminal_color);
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();
    let mut rng = StdRng::from_entropy();

    let result = run(
        &mut host_state,
        &mut registry,
        &cfg,
        &mut renderer,
        sound.as_ref(),
        &mut rng,
    );

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Host error: {e}");
    }

    let open = host_state.objects.iter().filter(|o| !o.locked).count();
    println!();
    println!("TermBreach session closed.");
    println!("Objects unlocked: {open}/{}", host_state.objects.len());
}

fn run(
    host: &mut Host,
    registry: &mut Registry,
    cfg: &HostConfig,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    rng: &mut StdRng,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = InputState::new();

    loop {
        input.drain_events();
        if input.ctrl_c_pressed() {
            break;
        }

        let now = Instant::now();
        if host.puzzle.is_some() {
            step_puzzle(host, &input, sound, now);
        } else if step_facility(host, registry, cfg, &input, sound, rng, now) {
            break;
        }

        if host.message_timer > 0 {
            host.message_timer -= 1;
            if host.message_timer == 0 {
                host.message.clear();
            }
        }

        match &host.puzzle {
            Some(p) => {
                let view = p.surface.view(now);
                renderer.render_puzzle(&PuzzleScreen {
                    view: &view,
                    title: &p.title,
                    object: &host.objects[p.object_index].name,
                    selected: p.selected,
                    glitch: p.glitch,
                    flash: p.flash,
                })?;
            }
            None => renderer.render_facility(&host.objects, host.cursor, &host.message)?,
        }

        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

// ── Facility screen ──

const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_RESET: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

/// Returns true when the player quits the host.
fn step_facility(
    host: &mut Host,
    registry: &mut Registry,
    cfg: &HostConfig,
    input: &InputState,
    sound: Option<&SoundEngine>,
    rng: &mut StdRng,
    now: Instant,
) -> bool {
    if input.any_pressed(KEYS_QUIT) || input.any_pressed(&[KeyCode::Esc]) {
        return true;
    }
    if host.objects.is_empty() {
        return false;
    }

    if input.any_pressed(KEYS_UP) {
        host.cursor = host.cursor.saturating_sub(1);
    } else if input.any_pressed(KEYS_DOWN) {
        host.cursor = (host.cursor + 1).min(host.objects.len() - 1);
    } else if input.any_pressed(KEYS_CONFIRM) {
        open_puzzle(host, registry, cfg, sound, rng, host.cursor, now);
    }
    false
}

/// Route an interaction through the registry, consulting the object's
/// flags first. Refusals become status messages, never failures.
fn open_puzzle(
    host: &mut Host,
    registry: &mut Registry,
    cfg: &HostConfig,
    sound: Option<&SoundEngine>,
    rng: &mut StdRng,
    index: usize,
    now: Instant,
) {
    let obj = &host.objects[index];
    if !obj.locked {
        host.set_message("ALREADY UNLOCKED", 120);
        return;
    }
    if !obj.puzzle_enabled {
        host.set_message("PUZZLE OFFLINE: DIRECT ACCESS DENIED", 120);
        return;
    }
    let pkg_id = match registry.resolve(obj.kind, &obj.puzzle_type) {
        Some(id) => id,
        None => {
            host.set_message("NO PUZZLE TYPE ASSIGNED", 120);
            return;
        }
    };

    let token = rng.gen::<u64>();
    let (completion, handle) = completion_channel(token);
    let ctx = OpenContext {
        object_name: obj.name.clone(),
        object_kind: obj.kind,
        settings: cfg.session.clone(),
        dictionary: cfg.dictionary.clone(),
        completion,
        rng: StdRng::seed_from_u64(rng.gen()),
    };

    match registry.open(&pkg_id, ctx) {
        Ok(surface) => {
            let title = registry
                .title_of(&pkg_id)
                .unwrap_or("PUZZLE")
                .to_uppercase();
            host.puzzle = Some(OpenPuzzle {
                surface,
                handle,
                object_index: index,
                title,
                selected: 0,
                glitch: 0,
                flash: 0,
                last_tick: now,
            });
            if let Some(sfx) = sound {
                sfx.play_boot();
            }
        }
        Err(e) => host.set_message(&e.to_string().to_uppercase(), 180),
    }
}

// ── Puzzle screen ──

fn step_puzzle(host: &mut Host, input: &InputState, sound: Option<&SoundEngine>, now: Instant) {
    // Esc tears the session down; dropping it cancels the deadline tick.
    if input.any_pressed(&[KeyCode::Esc]) {
        host.puzzle = None;
        return;
    }

    let mut events = Vec::new();
    let mut unlocked: Option<String> = None;
    let mut close = false;

    if let Some(p) = host.puzzle.as_mut() {
        p.glitch = p.glitch.saturating_sub(1);
        p.flash = p.flash.saturating_sub(1);

        let view = p.surface.view(now);
        if !view.started {
            if input.any_key() {
                events.extend(p.surface.start(now));
            }
        } else if view.over {
            if input.any_pressed(KEYS_CONFIRM) {
                close = true;
            }
        } else {
            let n = view.targets.len();
            if n > 0 {
                if input.any_pressed(KEYS_UP) {
                    p.selected = p.selected.saturating_sub(1);
                } else if input.any_pressed(KEYS_DOWN) {
                    p.selected = (p.selected + 1).min(n - 1);
                } else if input.any_pressed(&[KeyCode::Left, KeyCode::Right]) {
                    p.selected = jump_column(&view.targets, p.selected);
                } else if input.was_pressed(KeyCode::Tab) {
                    p.selected = (p.selected + 1) % n;
                } else if input.any_pressed(KEYS_CONFIRM) {
                    let target = &view.targets[p.selected];
                    if target.disabled {
                        if let Some(sfx) = sound {
                            sfx.play_deny();
                        }
                    } else {
                        let word = target.word.clone();
                        events.extend(p.surface.guess(&word));
                    }
                }
            }
            if input.any_pressed(KEYS_RESET) {
                events.extend(p.surface.reset());
            }
        }

        // Deadline tick, 1 Hz while the session is open.
        if now.duration_since(p.last_tick) >= TICK_INTERVAL {
            p.last_tick = now;
            events.extend(p.surface.tick(now));
        }

        apply_events(p, sound, &events);

        // Completion: single-use, token-correlated.
        if let Some(notice) = p.handle.poll() {
            host.objects[p.object_index].locked = false;
            unlocked = Some(notice.object);
        }
    }

    if close {
        host.puzzle = None;
        return;
    }
    if let Some(name) = unlocked {
        host.message = format!("{} UNLOCKED", name.to_uppercase());
        host.message_timer = 240;
    }
}

fn apply_events(p: &mut OpenPuzzle, sound: Option<&SoundEngine>, events: &[PuzzleEvent]) {
    for event in events {
        match event {
            PuzzleEvent::Booted => {}
            PuzzleEvent::GuessScored { .. } => {
                if let Some(sfx) = sound {
                    sfx.play_key();
                }
            }
            PuzzleEvent::AccessGranted => {
                p.flash = FLASH_FRAMES;
                if let Some(sfx) = sound {
                    sfx.play_grant();
                }
            }
            PuzzleEvent::TerminalLocked { .. } => {
                p.flash = FLASH_FRAMES;
                if let Some(sfx) = sound {
                    sfx.play_lockout();
                }
            }
            PuzzleEvent::ResetApplied => {
                p.selected = 0;
                p.glitch = GLITCH_FRAMES;
                if let Some(sfx) = sound {
                    sfx.play_glitch();
                }
            }
            PuzzleEvent::ResetRefused { .. } => {
                if let Some(sfx) = sound {
                    sfx.play_deny();
                }
            }
        }
    }
}

/// Hop to the nearest target in the other grid column.
fn jump_column(targets: &[TargetView], selected: usize) -> usize {
    let cur = &targets[selected];
    let want = match cur.column {
        Column::Left => Column::Right,
        Column::Right => Column::Left,
    };
    targets
        .iter()
        .enumerate()
        .filter(|(_, t)| t.column == want)
        .min_by_key(|(_, t)| t.row.abs_diff(cur.row))
        .map(|(i, _)| i)
        .unwrap_or(selected)
}
