/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use sim::event::GameEvent;
use sim::ranking::{RankingBoard, MAX_NAME_LEN};
use sim::stage::{self, StageDef};
use sim::step;
use sim::world::World;
use ui::input::InputState;
use ui::renderer::{Hud, Renderer};
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Phase tick budgets (at the default 50 ms tick).
const INTRO_TICKS: u32 = 24;
const CLEAR_TICKS: u32 = 30;
const DYING_TICKS: u32 = 20;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
    Title,
    HowTo,
    Ranking,
    StageIntro,
    Playing,
    Dying,
    StageClear,
    NameEntry,
    GameComplete,
}

struct Session {
    phase: Phase,
    menu_cursor: usize,
    stages: Vec<StageDef>,
    stage_idx: usize,
    world: World,
    /// Whole-run clock; advances only while playing.
    elapsed: f32,
    /// Generic countdown for the transition phases.
    phase_ticks: u32,
    name_buf: String,
    board: RankingBoard,
}

impl Session {
    fn new(stages: Vec<StageDef>, config: &GameConfig) -> Self {
        let world = stages[0].instantiate(config.tuning);
        Session {
            phase: Phase::Title,
            menu_cursor: 0,
            stages,
            stage_idx: 0,
            world,
            elapsed: 0.0,
            phase_ticks: 0,
            name_buf: String::new(),
            board: RankingBoard::load(),
        }
    }
}

fn main() {
    let config = GameConfig::load();
    let stages = stage::load_stages(&config.stages_dir);
    if stages.is_empty() {
        eprintln!("No stages available.");
        return;
    }

    let mut session = Session::new(stages, &config);
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut session, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Ember & Tide!");
}

fn game_loop(
    s: &mut Session,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.tick_rate_ms);
    let dt = config.tick_rate_ms as f32 / 1000.0;

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(s, &kb, sound, config) {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            match s.phase {
                Phase::Playing => {
                    let (fire, water) = kb.player_inputs();
                    let events = step::tick(&mut s.world, fire, water, dt);
                    s.elapsed += dt;
                    process_sound_events(sound, &events);

                    if events.iter().any(|e| matches!(e, GameEvent::StageCleared)) {
                        s.phase = Phase::StageClear;
                        s.phase_ticks = 0;
                    } else if s.world.any_player_dead() {
                        s.phase = Phase::Dying;
                        s.phase_ticks = 0;
                    }
                }
                Phase::StageIntro => {
                    s.phase_ticks += 1;
                    if s.phase_ticks >= INTRO_TICKS {
                        s.phase = Phase::Playing;
                    }
                }
                Phase::StageClear => {
                    s.phase_ticks += 1;
                    if s.phase_ticks >= CLEAR_TICKS {
                        finish_stage(s, config);
                    }
                }
                Phase::Dying => {
                    s.phase_ticks += 1;
                    if s.phase_ticks >= DYING_TICKS {
                        stage::restart_stage(&mut s.world, &s.stages[s.stage_idx]);
                        s.phase = Phase::StageIntro;
                        s.phase_ticks = 0;
                    }
                }
                _ => {}
            }
            last_tick = Instant::now();
        }

        render_phase(s, renderer)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn render_phase(s: &Session, renderer: &mut Renderer) -> std::io::Result<()> {
    match s.phase {
        Phase::Title => renderer.render_title(s.menu_cursor, s.stages.len()),
        Phase::HowTo => renderer.render_howto(),
        Phase::Ranking => renderer.render_ranking(&s.board),
        Phase::NameEntry => renderer.render_name_entry(&s.name_buf, s.elapsed, s.world.deaths),
        Phase::GameComplete => {
            renderer.render_finale(s.elapsed, s.world.deaths, s.world.total_gems())
        }
        Phase::StageIntro | Phase::Playing | Phase::Dying | Phase::StageClear => {
            let hud = Hud {
                stage_name: &s.stages[s.stage_idx].name,
                stage_idx: s.stage_idx,
                stage_count: s.stages.len(),
                elapsed: s.elapsed,
            };
            let banner = match s.phase {
                Phase::StageIntro => Some("Get ready…".to_string()),
                Phase::Dying => Some("Perished — the stage resets".to_string()),
                Phase::StageClear => Some("Stage clear!".to_string()),
                _ => None,
            };
            renderer.render_playing(&s.world, &hud, banner.as_deref())
        }
    }
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::GemPicked { .. } => sfx.play_gem(),
            GameEvent::Jumped { .. } => sfx.play_jump(),
            GameEvent::SwitchPressed { .. } => sfx.play_switch(),
            GameEvent::PlayerDied { .. } => sfx.play_die(),
            GameEvent::StageCleared => sfx.play_clear(),
            _ => {}
        }
    }
}

// ── Run lifecycle ──

/// Start a fresh run from the given stage: new world, zeroed counters,
/// zeroed clock.
fn start_run(s: &mut Session, stage_idx: usize, config: &GameConfig) {
    s.stage_idx = stage_idx.min(s.stages.len() - 1);
    s.world = s.stages[s.stage_idx].instantiate(config.tuning);
    s.world.reset_counters();
    s.elapsed = 0.0;
    s.phase = Phase::StageIntro;
    s.phase_ticks = 0;
}

/// Advance past a cleared stage: next stage keeps the run counters, the
/// last stage ends the run (ranking entry when the time qualifies).
fn finish_stage(s: &mut Session, config: &GameConfig) {
    if s.stage_idx + 1 < s.stages.len() {
        s.stage_idx += 1;
        let gems = s.world.gems;
        let deaths = s.world.deaths;
        s.world = s.stages[s.stage_idx].instantiate(config.tuning);
        s.world.gems = gems;
        s.world.deaths = deaths;
        s.phase = Phase::StageIntro;
        s.phase_ticks = 0;
    } else if s.board.qualifies(s.elapsed) {
        s.name_buf.clear();
        s.phase = Phase::NameEntry;
    } else {
        s.phase = Phase::GameComplete;
    }
}

// ── Per-phase key handling ──

const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];

/// Returns true when the program should quit.
fn handle_meta(
    s: &mut Session,
    kb: &InputState,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM);
    let esc = kb.any_pressed(&[KeyCode::Esc]);

    match s.phase {
        Phase::Title => {
            if kb.any_pressed(&[KeyCode::Up]) && s.menu_cursor > 0 {
                s.menu_cursor -= 1;
            }
            if kb.any_pressed(&[KeyCode::Down]) && s.menu_cursor < 3 {
                s.menu_cursor += 1;
            }
            if let Some(idx) = kb.stage_digit() {
                if idx < s.stages.len() {
                    start_run(s, idx, config);
                    return false;
                }
            }
            if confirm {
                match s.menu_cursor {
                    0 => start_run(s, 0, config),
                    1 => s.phase = Phase::HowTo,
                    2 => s.phase = Phase::Ranking,
                    _ => return true,
                }
            } else if esc || kb.any_pressed(&[KeyCode::Char('q'), KeyCode::Char('Q')]) {
                return true;
            }
        }

        Phase::HowTo | Phase::Ranking => {
            if confirm || esc {
                s.phase = Phase::Title;
            }
        }

        Phase::StageIntro => {
            if confirm {
                s.phase = Phase::Playing;
            } else if esc {
                s.phase = Phase::Title;
            }
        }

        Phase::Playing => {
            if kb.any_pressed(KEYS_RESTART) {
                stage::restart_stage(&mut s.world, &s.stages[s.stage_idx]);
                s.phase = Phase::StageIntro;
                s.phase_ticks = 0;
            } else if esc {
                s.phase = Phase::Title;
            }
        }

        Phase::Dying | Phase::StageClear => {
            // Transitions run on their own countdowns.
        }

        Phase::NameEntry => {
            for c in kb.typed_chars() {
                if s.name_buf.chars().count() < MAX_NAME_LEN {
                    s.name_buf.push(c);
                }
            }
            if kb.any_pressed(&[KeyCode::Backspace]) {
                s.name_buf.pop();
            }
            // Space is a typeable character here, so only Enter confirms.
            if kb.any_pressed(&[KeyCode::Enter]) && !s.name_buf.trim().is_empty() {
                s.board
                    .add(s.name_buf.trim(), s.elapsed, s.world.deaths);
                if let Err(e) = s.board.save() {
                    eprintln!("Warning: could not save rankings: {e}");
                }
                if let Some(sfx) = sound {
                    sfx.play_clear();
                }
                s.phase = Phase::Ranking;
            } else if esc {
                s.phase = Phase::GameComplete;
            }
        }

        Phase::GameComplete => {
            if confirm {
                s.phase = Phase::Title;
            } else if esc {
                return true;
            }
        }
    }

    false
}
