/// Input state tracker for two players on one keyboard.
///
/// Terminals deliver key *presses*, not key *state*, so held keys are
/// reconstructed: a key counts as held until it goes quiet for longer
/// than `HOLD_TIMEOUT`. Terminals that support the keyboard enhancement
/// protocol report explicit Release events, which are honored when seen.
///
/// Per tick the tracker answers three questions:
///   - held?   (movement: left/right while the key is down)
///   - fresh?  (menu navigation, confirm — edge per drain)
///   - the decoded per-character `FrameInput` pair for the simulation.
///
/// Fire character: arrow keys (Up to jump).
/// Water character: A/D to move, W to jump.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};

use crate::domain::entity::FrameInput;

/// A key with no Press/Repeat activity for this long reads as released.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const FIRE_LEFT: &[KeyCode] = &[KeyCode::Left];
const FIRE_RIGHT: &[KeyCode] = &[KeyCode::Right];
const FIRE_JUMP: &[KeyCode] = &[KeyCode::Up];
const WATER_LEFT: &[KeyCode] = &[KeyCode::Char('a'), KeyCode::Char('A')];
const WATER_RIGHT: &[KeyCode] = &[KeyCode::Char('d'), KeyCode::Char('D')];
const WATER_JUMP: &[KeyCode] = &[KeyCode::Char('w'), KeyCode::Char('W')];

pub struct InputState {
    /// Timestamp of the last Press/Repeat event per key.
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went not-held → held during the latest drain.
    fresh: Vec<KeyCode>,
    /// Raw events from the latest drain, for modifier checks.
    raw: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh: Vec::with_capacity(8),
            raw: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events. Call once per frame, before
    /// the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh.clear();
        self.raw.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.raw.push(key);
                match key.kind {
                    KeyEventKind::Release => {
                        self.last_active.remove(&key.code);
                    }
                    _ => {
                        let was_held = self.held_inner(key.code);
                        self.last_active.insert(key.code, Instant::now());
                        if !was_held {
                            self.fresh.push(key.code);
                        }
                    }
                }
            }
        }

        // Timeout-based expiry for terminals without Release events.
        let now = Instant::now();
        self.last_active
            .retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    /// Per-character simulation inputs for this tick.
    pub fn player_inputs(&self) -> (FrameInput, FrameInput) {
        let fire = FrameInput {
            left: self.any_held(FIRE_LEFT),
            right: self.any_held(FIRE_RIGHT),
            jump: self.any_held(FIRE_JUMP),
        };
        let water = FrameInput {
            left: self.any_held(WATER_LEFT),
            right: self.any_held(WATER_RIGHT),
            jump: self.any_held(WATER_JUMP),
        };
        (fire, water)
    }

    /// Is this key currently held down? (continuous actions)
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held_inner(code)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (one-shot actions)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Digit keys 1-9 select a stage directly on the title screen.
    pub fn stage_digit(&self) -> Option<usize> {
        self.fresh.iter().find_map(|code| match code {
            KeyCode::Char(c @ '1'..='9') => Some(*c as usize - '1' as usize),
            _ => None,
        })
    }

    /// Printable characters freshly pressed this frame (name entry).
    pub fn typed_chars(&self) -> Vec<char> {
        self.fresh
            .iter()
            .filter_map(|code| match code {
                KeyCode::Char(c) if !c.is_control() => Some(*c),
                _ => None,
            })
            .collect()
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
        })
    }

    // ── Internal ──

    fn held_inner(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}
