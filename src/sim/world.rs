/// World: the complete state of one running stage.
///
/// One in-process instance owns the tile grid, the interactive-object
/// registries and both characters. The run-scoped counters (gems,
/// deaths) live here too, as plain fields with an explicit reset owned
/// by the game loop — never as process globals.
///
/// The grid is authoritative for terrain; crates, platforms, lifts and
/// characters are overlay records keyed by coordinate. A cell can be
/// "occupied" by its grid symbol and an overlay entity at once.

use crate::domain::entity::{
    Barrier, Crate, Door, Element, Lift, LifeState, Platform, Player, Switch,
};
use crate::domain::physics::{self, Tuning};
use crate::domain::tile::Tile;

pub struct World {
    // ── Grid ──
    pub tiles: Vec<Vec<Tile>>,
    pub width: i32,
    pub height: i32,

    // ── Load-time landmarks ──
    pub fire_spawn: (i32, i32),
    pub water_spawn: (i32, i32),
    pub exit: (i32, i32),

    // ── Interactive-object registries ──
    pub crates: Vec<Crate>,
    pub switches: Vec<Switch>,
    pub doors: Vec<Door>,
    pub platforms: Vec<Platform>,
    pub lifts: Vec<Lift>,
    pub barriers: Vec<Barrier>,

    // ── Characters, indexed by Element::index() ──
    pub players: [Player; 2],

    // ── Run-scoped counters ──
    pub gems: [u32; 2],
    pub deaths: u32,

    pub tuning: Tuning,
    pub tick: u64,
}

impl World {
    pub fn new() -> Self {
        World {
            tiles: vec![],
            width: 0,
            height: 0,
            fire_spawn: (0, 0),
            water_spawn: (0, 0),
            exit: (0, 0),
            crates: vec![],
            switches: vec![],
            doors: vec![],
            platforms: vec![],
            lifts: vec![],
            barriers: vec![],
            players: [
                Player::new(Element::Fire, 0, 0),
                Player::new(Element::Water, 0, 0),
            ],
            gems: [0, 0],
            deaths: 0,
            tuning: Tuning::default(),
            tick: 0,
        }
    }

    // ── Tile query / mutation ──

    /// Tile at (x, y); out-of-grid coordinates read as empty space.
    #[inline]
    pub fn tile_at(&self, x: i32, y: i32) -> Tile {
        physics::tile_at(&self.tiles, x, y)
    }

    /// Write a tile, silently ignoring out-of-grid coordinates.
    #[inline]
    pub fn set_tile(&mut self, x: i32, y: i32, tile: Tile) {
        if x >= 0 && y >= 0 && x < self.width && y < self.height {
            self.tiles[y as usize][x as usize] = tile;
        }
    }

    // ── Registry lookups ──

    pub fn crate_at(&self, x: i32, y: i32) -> Option<usize> {
        self.crates
            .iter()
            .position(|c| c.active && c.x == x && c.y == y)
    }

    pub fn switch_at(&self, x: i32, y: i32) -> Option<usize> {
        self.switches.iter().position(|s| s.x == x && s.y == y)
    }

    pub fn any_switch_active(&self) -> bool {
        self.switches.iter().any(|s| s.activated)
    }

    // ── Characters ──

    pub fn player(&self, elem: Element) -> &Player {
        &self.players[elem.index()]
    }

    /// (Re)initialize a character at the given spawn cell, clearing all
    /// of its motion state. Counters are untouched: respawn is not a
    /// stage restart.
    pub fn init_player(&mut self, elem: Element, x: i32, y: i32) {
        self.players[elem.index()] = Player::new(elem, x, y);
    }

    /// Full ground test for a character cell, including platform support.
    pub fn grounded(&self, x: i32, y: i32, elem: Element) -> bool {
        physics::is_grounded(&self.tiles, &self.platforms, x, y, elem)
    }

    pub fn any_player_dead(&self) -> bool {
        self.players.iter().any(|p| p.state == LifeState::Dead)
    }

    /// Stage-clear condition: both characters alive on the exit cell.
    pub fn both_at_exit(&self) -> bool {
        self.players
            .iter()
            .all(|p| p.alive() && (p.x, p.y) == self.exit)
    }

    // ── Counters ──

    pub fn gem_count(&self, elem: Element) -> u32 {
        self.gems[elem.index()]
    }

    pub fn total_gems(&self) -> u32 {
        self.gems[0] + self.gems[1]
    }

    /// Explicit counter reset, called by the game loop at run start.
    pub fn reset_counters(&mut self) {
        self.gems = [0, 0];
        self.deaths = 0;
    }

    /// Gem counters only — a stage reload replants the gems, so the
    /// collected counts for the stage start over; deaths persist.
    pub fn reset_gems(&mut self) {
        self.gems = [0, 0];
    }
}
