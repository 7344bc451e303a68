/// Stage loader.
///
/// ## Sources (priority order):
///   1. `stages/` directory (individual `.txt` files, sorted by name)
///   2. Built-in embedded stages
///
/// ## Stage file format:
///   ```
///   ; comment line
///   @name The Boiler Room
///   @platform 18,5 vertical     ; platform spawned at (18,5) travels vertically
///   @toggle 0 1                 ; link lift #0 to switch #1
///   @wall 0 1                   ; link barrier #0 to switch #1
///   <grid rows>
///   ```
///
/// Rows are right-padded with empty space to the widest row. The first
/// occurrence of each spawn marker and of the exit wins.
///
/// ## Tile legend:
///   '#' wall          '.' floor          'F' fire terrain  'W' water terrain
///   'B' crate         'S' switch         'D' door          'P' moving platform
///   'T' lift          '|' barrier        '^' barrier target marker
///   'R' fire gem      'b' water gem      'f' fire spawn    'w' water spawn
///   'E' exit          ' ' empty
///
/// Overlay entities ('P' platforms, 'T' lifts) are lifted out of the
/// grid at load time; barriers are materialized into it across their
/// whole origin-to-marker span.

use std::path::Path;

use crate::domain::entity::{Barrier, Crate, Door, Element, Lift, Platform, Switch};
use crate::domain::physics::Tuning;
use crate::domain::tile::Tile;
use crate::sim::world::World;

/// A parsed stage definition: the text rows plus wiring directives.
/// Instantiation into a `World` is repeatable — a stage restart is a
/// fresh instantiate, never a partial reset.
#[derive(Clone, Debug)]
pub struct StageDef {
    pub name: String,
    pub rows: Vec<String>,
    /// Platform spawn cells marked vertical by an `@platform` directive.
    pub vertical_platforms: Vec<(i32, i32)>,
    /// (lift index, switch index) overrides from `@toggle` directives.
    pub toggle_links: Vec<(usize, usize)>,
    /// (barrier index, switch index) overrides from `@wall` directives.
    pub wall_links: Vec<(usize, usize)>,
}

// ══════════════════════════════════════════════════════════════
// Parsing
// ══════════════════════════════════════════════════════════════

impl StageDef {
    /// Parse a stage from text. Returns None if no grid rows remain.
    pub fn parse(content: &str) -> Option<StageDef> {
        let mut name = String::new();
        let mut rows: Vec<String> = vec![];
        let mut vertical_platforms = vec![];
        let mut toggle_links = vec![];
        let mut wall_links = vec![];

        for line in content.lines() {
            if line.starts_with(';') {
                continue;
            }
            if let Some(rest) = line.strip_prefix('@') {
                let mut words = rest.split_whitespace();
                match words.next() {
                    Some("name") => {
                        name = words.collect::<Vec<_>>().join(" ");
                    }
                    Some("platform") => {
                        if let Some(pos) = words.next().and_then(parse_coord) {
                            if words.next() == Some("vertical") {
                                vertical_platforms.push(pos);
                            }
                        }
                    }
                    Some("toggle") => {
                        if let Some(link) = parse_link(&mut words) {
                            toggle_links.push(link);
                        }
                    }
                    Some("wall") => {
                        if let Some(link) = parse_link(&mut words) {
                            wall_links.push(link);
                        }
                    }
                    _ => {}
                }
                continue;
            }
            rows.push(line.to_string());
        }

        while rows.last().map_or(false, |r| r.trim().is_empty()) {
            rows.pop();
        }
        if rows.is_empty() {
            return None;
        }

        let max_width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        for row in &mut rows {
            let short = max_width - row.chars().count();
            row.extend(std::iter::repeat(' ').take(short));
        }

        if name.is_empty() {
            name = "Nameless Chamber".to_string();
        }

        Some(StageDef {
            name,
            rows,
            vertical_platforms,
            toggle_links,
            wall_links,
        })
    }
}

fn parse_coord(word: &str) -> Option<(i32, i32)> {
    let (x, y) = word.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

fn parse_link(words: &mut std::str::SplitWhitespace<'_>) -> Option<(usize, usize)> {
    let a = words.next()?.parse().ok()?;
    let b = words.next()?.parse().ok()?;
    Some((a, b))
}

// ══════════════════════════════════════════════════════════════
// Instantiation
// ══════════════════════════════════════════════════════════════

impl StageDef {
    /// Build a fresh world from this definition.
    pub fn instantiate(&self, tuning: Tuning) -> World {
        let mut world = World::new();
        world.tuning = tuning;

        world.tiles = self
            .rows
            .iter()
            .map(|row| row.chars().map(Tile::from_symbol).collect())
            .collect();
        world.height = world.tiles.len() as i32;
        world.width = world.tiles.first().map_or(0, |r| r.len() as i32);

        let mut fire_spawn: Option<(i32, i32)> = None;
        let mut water_spawn: Option<(i32, i32)> = None;
        let mut exit: Option<(i32, i32)> = None;
        let mut platform_spawns: Vec<(i32, i32)> = vec![];
        let mut barrier_origins: Vec<(i32, i32)> = vec![];

        for y in 0..world.height {
            for x in 0..world.width {
                match world.tile_at(x, y) {
                    Tile::Crate => world.crates.push(Crate::new(x, y)),
                    Tile::Switch => world.switches.push(Switch::new(x, y)),
                    Tile::Door => world.doors.push(Door::new(x, y)),
                    Tile::Platform => {
                        platform_spawns.push((x, y));
                        world.set_tile(x, y, Tile::Empty);
                    }
                    Tile::Barrier => barrier_origins.push((x, y)),
                    Tile::FireSpawn => {
                        fire_spawn.get_or_insert((x, y));
                    }
                    Tile::WaterSpawn => {
                        water_spawn.get_or_insert((x, y));
                    }
                    Tile::Exit => {
                        exit.get_or_insert((x, y));
                    }
                    _ => {}
                }
            }
        }

        self.collect_lifts(&mut world);
        collect_barriers(&mut world, &barrier_origins);
        self.collect_platforms(&mut world, &platform_spawns);

        // Unpaired target markers read as empty space.
        for row in world.tiles.iter_mut() {
            for tile in row.iter_mut() {
                if *tile == Tile::BarrierMark {
                    *tile = Tile::Empty;
                }
            }
        }

        world.fire_spawn = fire_spawn.unwrap_or((0, 0));
        world.water_spawn = water_spawn.unwrap_or((0, 0));
        world.exit = exit.unwrap_or((0, 0));
        world.init_player(Element::Fire, world.fire_spawn.0, world.fire_spawn.1);
        world.init_player(Element::Water, world.water_spawn.0, world.water_spawn.1);

        world
    }

    /// Lifts: each horizontal run of contiguous lift tiles is one lift.
    /// The run is removed from the grid (overlay only) and its target
    /// row is the row immediately above the first solid obstruction
    /// below the origin.
    fn collect_lifts(&self, world: &mut World) {
        for y in 0..world.height {
            let mut x = 0;
            while x < world.width {
                if world.tile_at(x, y) != Tile::Lift {
                    x += 1;
                    continue;
                }
                let start = x;
                while world.tile_at(x, y) == Tile::Lift {
                    world.set_tile(x, y, Tile::Empty);
                    x += 1;
                }
                let target = scan_lift_target(world, start, y);
                world.lifts.push(Lift::new(start, y, x - start, target));
            }
        }
        for &(lift, switch) in &self.toggle_links {
            if lift < world.lifts.len() && switch < world.switches.len() {
                world.lifts[lift].switch_idx = switch;
            }
        }
    }

    /// Platforms: travel range discovered by scanning outward from the
    /// spawn cell along the travel axis until terrain blocks it.
    fn collect_platforms(&self, world: &mut World, spawns: &[(i32, i32)]) {
        let speed = world.tuning.platform_speed;
        for &(x, y) in spawns {
            let vertical = self.vertical_platforms.contains(&(x, y));
            let (min, max) = scan_platform_range(world, x, y, vertical);
            world
                .platforms
                .push(Platform::new(x, y, vertical, min, max, speed));
        }
    }
}

fn scan_lift_target(world: &World, x: i32, y: i32) -> i32 {
    for yy in (y + 1)..world.height {
        if matches!(world.tile_at(x, yy), Tile::Wall | Tile::Floor) {
            return yy - 1;
        }
    }
    world.height - 1
}

/// Barriers: each origin tile pairs with the nearest target marker above
/// it in the same column; the whole span is materialized into the grid.
fn collect_barriers(world: &mut World, origins: &[(i32, i32)]) {
    for &(x, y) in origins {
        let mut target = y;
        for yy in (0..y).rev() {
            if world.tile_at(x, yy) == Tile::BarrierMark {
                target = yy;
                world.set_tile(x, yy, Tile::Empty);
                break;
            }
        }
        let barrier = Barrier::new(x, y, target);
        let (lo, hi) = barrier.span();
        for yy in lo..=hi {
            world.set_tile(x, yy, Tile::Barrier);
        }
        world.barriers.push(barrier);
    }
}

fn scan_platform_range(world: &World, x: i32, y: i32, vertical: bool) -> (i32, i32) {
    let blocked = |tx: i32, ty: i32| matches!(world.tile_at(tx, ty), Tile::Wall | Tile::Floor);
    if vertical {
        let mut min = y;
        while min > 0 && !blocked(x, min - 1) {
            min -= 1;
        }
        let mut max = y;
        while max + 1 < world.height && !blocked(x, max + 1) {
            max += 1;
        }
        (min, max)
    } else {
        let mut min = x;
        while min > 0 && !blocked(min - 1, y) {
            min -= 1;
        }
        let mut max = x;
        while max + 1 < world.width && !blocked(max + 1, y) {
            max += 1;
        }
        (min, max)
    }
}

// ══════════════════════════════════════════════════════════════
// Restart
// ══════════════════════════════════════════════════════════════

/// Stage reload: full teardown and reinit. The death counter survives
/// the reload; collected-gem counts start over with the replanted gems.
pub fn restart_stage(world: &mut World, def: &StageDef) {
    let deaths = world.deaths;
    let tuning = world.tuning;
    *world = def.instantiate(tuning);
    world.deaths = deaths;
}

// ══════════════════════════════════════════════════════════════
// Directory loading
// ══════════════════════════════════════════════════════════════

/// Load stages from `dir/*.txt` sorted by filename; fall back to the
/// embedded set when the directory is missing or empty.
pub fn load_stages(dir: &Path) -> Vec<StageDef> {
    let mut found: Vec<(String, StageDef)> = vec![];

    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map_or(false, |e| e == "txt") {
                if let Ok(content) = std::fs::read_to_string(&path) {
                    if let Some(def) = StageDef::parse(&content) {
                        let filename = path
                            .file_name()
                            .unwrap_or_default()
                            .to_string_lossy()
                            .to_string();
                        found.push((filename, def));
                    }
                }
            }
        }
    }

    if found.is_empty() {
        return embedded_stages();
    }
    found.sort_by(|a, b| a.0.cmp(&b.0));
    found.into_iter().map(|(_, def)| def).collect()
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback stages
// ══════════════════════════════════════════════════════════════

pub fn embedded_stages() -> Vec<StageDef> {
    [
        concat!(
            "@name Kindled Steps\n",
            "############################\n",
            "#                          #\n",
            "# f    R            b  w   #\n",
            "#####..####FFF####..########\n",
            "#                          #\n",
            "#   b        S        R    #\n",
            "####..####WWW####..#########\n",
            "#                          #\n",
            "#                 D        #\n",
            "#                 D        #\n",
            "#  R   S     b    D  E  S  #\n",
            "############################\n",
        ),
        concat!(
            "@name Counterweight Vault\n",
            "############################\n",
            "#                          #\n",
            "# f  w                R    #\n",
            "#####....######     ##..####\n",
            "#            TT    ^       #\n",
            "#                          #\n",
            "#                          #\n",
            "#                          #\n",
            "#   B     S        |  E  b #\n",
            "############################\n",
        ),
        concat!(
            "@name Ferry Crossing\n",
            "@platform 18,5 vertical\n",
            "############################\n",
            "#                          #\n",
            "# f  w               E     #\n",
            "########           #########\n",
            "#                          #\n",
            "#   R     P       P  b     #\n",
            "#                          #\n",
            "#####FFFFWWWWFFFFWW#########\n",
        ),
    ]
    .iter()
    .filter_map(|text| StageDef::parse(text))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::physics::Tuning;

    fn stage(rows: &[&str]) -> StageDef {
        StageDef::parse(&rows.join("\n")).expect("stage should parse")
    }

    #[test]
    fn registries_are_populated_from_symbols() {
        let w = stage(&[
            "#######",
            "#f w E#",
            "#B S D#",
            "#######",
        ])
        .instantiate(Tuning::default());

        assert_eq!(w.fire_spawn, (1, 1));
        assert_eq!(w.water_spawn, (3, 1));
        assert_eq!(w.exit, (5, 1));
        assert_eq!(w.crates.len(), 1);
        assert_eq!((w.crates[0].x, w.crates[0].y), (1, 2));
        assert_eq!(w.switches.len(), 1);
        assert_eq!(w.doors.len(), 1);
        assert_eq!(w.player(Element::Fire).x, 1);
        assert_eq!(w.player(Element::Water).x, 3);
    }

    #[test]
    fn first_spawn_marker_wins_on_duplicates() {
        let w = stage(&["f  f", "####"]).instantiate(Tuning::default());
        assert_eq!(w.fire_spawn, (0, 0));
    }

    #[test]
    fn ragged_rows_are_padded_with_empty() {
        let w = stage(&["##", "#####"]).instantiate(Tuning::default());
        assert_eq!(w.width, 5);
        assert_eq!(w.tile_at(4, 0), Tile::Empty);
        assert_eq!(w.tile_at(4, 1), Tile::Wall);
    }

    #[test]
    fn platform_cells_become_overlay_records() {
        let w = stage(&[
            "#######",
            "#  P  #",
            "#######",
        ])
        .instantiate(Tuning::default());
        assert_eq!(w.tile_at(3, 1), Tile::Empty);
        assert_eq!(w.platforms.len(), 1);
        assert!(!w.platforms[0].vertical);
        // Range spans the open corridor between the side walls.
        assert_eq!((w.platforms[0].min, w.platforms[0].max), (1, 5));
    }

    #[test]
    fn platform_directive_marks_vertical_travel() {
        let def = StageDef::parse(concat!(
            "@platform 1,2 vertical\n",
            "###\n",
            "# #\n",
            "#P#\n",
            "# #\n",
            "###\n",
        ))
        .expect("stage should parse");
        let w = def.instantiate(Tuning::default());
        assert!(w.platforms[0].vertical);
        assert_eq!((w.platforms[0].min, w.platforms[0].max), (1, 3));
    }

    #[test]
    fn lift_runs_collapse_to_one_record_with_scanned_target() {
        let w = stage(&[
            "#######",
            "# TTT #",
            "#     #",
            "#     #",
            "#######",
        ])
        .instantiate(Tuning::default());
        assert_eq!(w.lifts.len(), 1);
        let lift = &w.lifts[0];
        assert_eq!((lift.x, lift.width), (2, 3));
        assert_eq!(lift.origin_y, 1);
        // First solid obstruction below is the bottom wall at y=4.
        assert_eq!(lift.target_y, 3);
        assert_eq!(w.tile_at(2, 1), Tile::Empty);
    }

    #[test]
    fn barrier_pairs_with_marker_and_fills_span() {
        let w = stage(&[
            "# #",
            "#^#",
            "# #",
            "#|#",
            "###",
        ])
        .instantiate(Tuning::default());
        assert_eq!(w.barriers.len(), 1);
        assert_eq!(w.barriers[0].span(), (1, 3));
        for y in 1..=3 {
            assert_eq!(w.tile_at(1, y), Tile::Barrier);
        }
    }

    #[test]
    fn unpaired_marker_is_cleared() {
        let w = stage(&["^", "#"]).instantiate(Tuning::default());
        assert_eq!(w.tile_at(0, 0), Tile::Empty);
        assert!(w.barriers.is_empty());
    }

    #[test]
    fn link_directives_rewire_switch_indices() {
        let def = StageDef::parse(concat!(
            "@toggle 0 1\n",
            "@wall 0 1\n",
            "#########\n",
            "# TT  ^ #\n",
            "#       #\n",
            "# S S | #\n",
            "#########\n",
        ))
        .expect("stage should parse");
        let w = def.instantiate(Tuning::default());
        assert_eq!(w.lifts[0].switch_idx, 1);
        assert_eq!(w.barriers[0].switch_idx, 1);
    }

    #[test]
    fn comments_and_name_directive() {
        let def = StageDef::parse("; a note\n@name The Boiler Room\n###\n").unwrap();
        assert_eq!(def.name, "The Boiler Room");
        assert_eq!(def.rows.len(), 1);
    }

    #[test]
    fn embedded_stages_parse_and_have_landmarks() {
        let stages = embedded_stages();
        assert_eq!(stages.len(), 3);
        for def in &stages {
            let w = def.instantiate(Tuning::default());
            assert_ne!(w.fire_spawn, w.water_spawn, "{}: spawns overlap", def.name);
            assert_ne!(w.exit, (0, 0), "{}: exit missing", def.name);
        }
    }

    #[test]
    fn restart_preserves_deaths_and_replants_gems() {
        let def = stage(&["fRw", "###"]);
        let mut w = def.instantiate(Tuning::default());
        w.set_tile(1, 0, Tile::Empty);
        w.gems = [1, 0];
        w.deaths = 2;
        restart_stage(&mut w, &def);
        assert_eq!(w.tile_at(1, 0), Tile::FireGem);
        assert_eq!(w.gems, [0, 0]);
        assert_eq!(w.deaths, 2);
    }
}
