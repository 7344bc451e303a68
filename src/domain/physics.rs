/// Physics predicates and tuning — single source of truth.
///
/// Two distinct concepts, queried separately:
///   1. TERRAIN   — what a cell IS (the grid symbol)
///   2. OCCUPANCY — what overlay entity is THERE (crates, platforms,
///      characters), tracked in registries keyed by coordinate
///
/// Movement legality is a terrain question; support (who stands, who
/// falls) mixes terrain with platform occupancy. Both are pure functions
/// here so the step pass, the loader and the tests share one rule set.
///
/// ## Support specification
///
/// A character is grounded if ANY of:
///   - It sits at (or below) the bottom edge of the grid
///   - The tile below is wall, floor, or a spawn marker
///   - The tile below is the character's own safe terrain
///   - An active moving platform's rounded position is the cell below
///   - Its own cell is floor with empty space below (top of an internal
///     floor segment)
///
/// Crates and closed doors are deliberately absent from the ground set.

use super::entity::{Element, Platform};
use super::tile::Tile;

// ── Motion quantization constants ──

/// Accumulator magnitude at which a horizontal step is attempted.
pub const MOVE_THRESHOLD: f32 = 0.3;
/// Accumulator cost of one attempted horizontal step.
pub const MOVE_STEP: f32 = 0.5;
/// Per-tick decay of the horizontal accumulator when grounded with no input.
pub const GROUND_FRICTION: f32 = 0.8;
/// Airborne steering factor relative to ground speed. 1.0 = full control.
pub const AIR_CONTROL: f32 = 1.0;

/// Runtime-tunable physics constants, loaded from config.toml.
/// Units are tiles and seconds throughout.
#[derive(Clone, Copy, Debug)]
pub struct Tuning {
    pub gravity: f32,
    pub jump_power: f32,
    pub max_fall_speed: f32,
    pub move_speed: f32,
    pub platform_speed: f32,
    pub lift_speed: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            gravity: 25.0,
            jump_power: 11.0,
            max_fall_speed: 16.0,
            move_speed: 5.0,
            platform_speed: 2.0,
            lift_speed: 3.0,
        }
    }
}

// ── Terrain queries ──

/// Tile at (x, y). Anything outside the grid reads as empty space, so
/// malformed coordinates can never fail.
#[inline]
pub fn tile_at(tiles: &[Vec<Tile>], x: i32, y: i32) -> Tile {
    if x < 0 || y < 0 {
        return Tile::Empty;
    }
    tiles
        .get(y as usize)
        .and_then(|row| row.get(x as usize))
        .copied()
        .unwrap_or(Tile::Empty)
}

/// The kinds of entity that move through the grid. Occupiability rules
/// differ per kind, so they are parameterized here rather than scattered
/// through the movement code.
#[derive(Clone, Copy, Debug)]
pub enum Mover {
    Character { elem: Element, grounded: bool },
    Crate,
}

/// May a mover of this kind enter the given cell?
///
/// For characters this covers blocking geometry only: lethal terrain and
/// crate-pushing are resolved by the kinematics pass, which needs to act
/// (kill, push) rather than merely refuse the step.
pub fn can_enter(tile: Tile, mover: Mover) -> bool {
    match mover {
        Mover::Crate => matches!(tile, Tile::Empty | Tile::Switch),
        Mover::Character { grounded, .. } => {
            if tile.is_blocking() {
                return false;
            }
            // Floors block walking but are passable mid-air.
            !(tile == Tile::Floor && grounded)
        }
    }
}

// ── Occupancy queries ──

/// Is an active moving platform currently occupying cell (x, y)?
#[inline]
pub fn platform_at(platforms: &[Platform], x: i32, y: i32) -> bool {
    platforms.iter().any(|p| p.active && p.rounded() == (x, y))
}

// ── Support ──

/// Full ground test for a character at (x, y). See module docs.
pub fn is_grounded(
    tiles: &[Vec<Tile>],
    platforms: &[Platform],
    x: i32,
    y: i32,
    elem: Element,
) -> bool {
    let height = tiles.len() as i32;
    if y + 1 >= height {
        return true;
    }
    let below = tile_at(tiles, x, y + 1);
    if below.is_standable() || below.is_safe_terrain_for(elem) {
        return true;
    }
    if platform_at(platforms, x, y + 1) {
        return true;
    }
    // Standing on top of an internal floor segment.
    tile_at(tiles, x, y) == Tile::Floor && below == Tile::Empty
}

/// Ground test for a crate at (x, y): map bottom, wall, floor, switch,
/// or another crate below.
pub fn crate_supported(tiles: &[Vec<Tile>], x: i32, y: i32) -> bool {
    let height = tiles.len() as i32;
    if y + 1 >= height {
        return true;
    }
    tile_at(tiles, x, y + 1).supports_crate()
}
