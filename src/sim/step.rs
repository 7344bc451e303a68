/// The step function: advances the world by one tick.
///
/// Processing order (load-bearing):
///   1. Crate gravity
///   2. Switch activation from current occupancy
///   3. Door open/close from switch state
///   4. Lift (toggle platform) travel
///   5. Barrier (vertical wall) show/hide
///   6. Moving-platform travel + rider carry
///   7. Fire character kinematics
///   8. Water character kinematics
///
/// Switches and doors must see this frame's occupancy before platforms
/// move, and platforms must move before character collision so a riding
/// character lands on its platform's new footing. Each pass is an
/// independent entry point; `tick` composes them in the required order.

use crate::domain::entity::{Element, FrameInput, LifeState, Player};
use crate::domain::physics::{self, Mover};
use crate::domain::tile::Tile;
use super::event::GameEvent;
use super::world::World;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn tick(
    world: &mut World,
    fire_input: FrameInput,
    water_input: FrameInput,
    dt: f32,
) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;

    update_crates(world, dt);
    update_switches(world, &mut events);
    update_doors(world, &mut events);
    update_lifts(world, dt);
    update_barriers(world);
    update_platforms(world, dt);
    update_player(world, Element::Fire, fire_input, dt, &mut events);
    update_player(world, Element::Water, water_input, dt, &mut events);

    if world.both_at_exit() {
        events.push(GameEvent::StageCleared);
    }

    events
}

// ══════════════════════════════════════════════════════════════
// Crate gravity
// ══════════════════════════════════════════════════════════════

pub fn update_crates(world: &mut World, dt: f32) {
    let gravity = world.tuning.gravity;
    let max_fall = world.tuning.max_fall_speed;

    for i in 0..world.crates.len() {
        if !world.crates[i].active {
            continue;
        }
        let (cx, cy) = (world.crates[i].x, world.crates[i].y);

        if physics::crate_supported(&world.tiles, cx, cy) {
            world.crates[i].vy = 0.0;
            world.crates[i].fall_accum = 0.0;
            continue;
        }

        {
            let c = &mut world.crates[i];
            c.vy = (c.vy + gravity * dt).min(max_fall);
            c.fall_accum += c.vy * dt;
        }

        while world.crates[i].fall_accum >= 1.0 {
            world.crates[i].fall_accum -= 1.0;
            let (cx, cy) = (world.crates[i].x, world.crates[i].y);
            if cy + 1 >= world.height
                || !physics::can_enter(world.tile_at(cx, cy + 1), Mover::Crate)
            {
                world.crates[i].vy = 0.0;
                world.crates[i].fall_accum = 0.0;
                break;
            }
            move_crate(world, i, cx, cy + 1);
        }
    }
}

/// Relocate a crate one cell, keeping grid and record in sync. Refused
/// unless the destination is empty or a switch. The source cell gets
/// its switch glyph back when a switch record lives there — the record,
/// not the glyph, is authoritative for activation.
pub fn move_crate(world: &mut World, idx: usize, nx: i32, ny: i32) -> bool {
    if !physics::can_enter(world.tile_at(nx, ny), Mover::Crate) {
        return false;
    }
    let (ox, oy) = (world.crates[idx].x, world.crates[idx].y);
    let restore = if world.switch_at(ox, oy).is_some() {
        Tile::Switch
    } else {
        Tile::Empty
    };
    world.set_tile(ox, oy, restore);
    world.set_tile(nx, ny, Tile::Crate);
    world.crates[idx].x = nx;
    world.crates[idx].y = ny;
    true
}

// ══════════════════════════════════════════════════════════════
// Switch / door coupling
// ══════════════════════════════════════════════════════════════

/// Recompute every switch from current occupancy. Stateless: stepping
/// off a switch releases it on the very next pass.
pub fn update_switches(world: &mut World, events: &mut Vec<GameEvent>) {
    for i in 0..world.switches.len() {
        let (sx, sy) = (world.switches[i].x, world.switches[i].y);
        let by_crate = world
            .crates
            .iter()
            .any(|c| c.active && c.x == sx && c.y == sy);
        let by_player = !world.switches[i].box_only
            && world
                .players
                .iter()
                .any(|p| p.alive() && p.x == sx && p.y == sy);
        let pressed = by_crate || by_player;
        if pressed && !world.switches[i].activated {
            events.push(GameEvent::SwitchPressed { x: sx, y: sy });
        }
        world.switches[i].activated = pressed;
    }
}

/// Derive every door from the global OR of all switches. The per-switch
/// group field exists but is not wired up; all switches gate all doors.
pub fn update_doors(world: &mut World, events: &mut Vec<GameEvent>) {
    if world.doors.is_empty() {
        return;
    }
    let open = world.any_switch_active();
    let was_open = world.doors.iter().any(|d| d.open);

    for i in 0..world.doors.len() {
        world.doors[i].open = open;
        let (dx, dy) = (world.doors[i].x, world.doors[i].y);
        world.set_tile(dx, dy, if open { Tile::Empty } else { Tile::Door });
    }

    if open && !was_open {
        events.push(GameEvent::DoorsOpened);
    } else if !open && was_open {
        events.push(GameEvent::DoorsClosed);
    }
}

// ══════════════════════════════════════════════════════════════
// Lifts (toggle platforms)
// ══════════════════════════════════════════════════════════════

/// Glide each lift toward whichever row its linked switch selects.
/// Overlay only: the grid is never touched.
pub fn update_lifts(world: &mut World, dt: f32) {
    let speed = world.tuning.lift_speed;
    for i in 0..world.lifts.len() {
        let active = world
            .switches
            .get(world.lifts[i].switch_idx)
            .map_or(false, |s| s.activated);
        let lift = &mut world.lifts[i];
        let target = if active { lift.target_y } else { lift.origin_y } as f32;
        let step = speed * dt;
        if (lift.y - target).abs() <= step {
            lift.y = target;
            lift.moving = false;
        } else if target > lift.y {
            lift.y += step;
            lift.moving = true;
        } else {
            lift.y -= step;
            lift.moving = true;
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Barriers (vertical walls)
// ══════════════════════════════════════════════════════════════

/// Show or hide each barrier in whole-span steps. A barrier retracts
/// only while a crate rests exactly on its linked switch; characters
/// on the switch do not count.
pub fn update_barriers(world: &mut World) {
    for i in 0..world.barriers.len() {
        let b = world.barriers[i];
        let held = world.switches.get(b.switch_idx).map_or(false, |s| {
            let (sx, sy) = (s.x, s.y);
            world
                .crates
                .iter()
                .any(|c| c.active && c.x == sx && c.y == sy)
        });
        let (lo, hi) = b.span();
        let tile = if held { Tile::Empty } else { Tile::Barrier };
        for y in lo..=hi {
            world.set_tile(b.x, y, tile);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Moving platforms + rider carry
// ══════════════════════════════════════════════════════════════

pub fn update_platforms(world: &mut World, dt: f32) {
    for i in 0..world.platforms.len() {
        if !world.platforms[i].active {
            continue;
        }
        let prior = world.platforms[i].rounded();
        let (fx, fy) = (world.platforms[i].x, world.platforms[i].y);

        {
            let p = &mut world.platforms[i];
            if p.vertical {
                p.y += p.vy * dt;
                if p.y <= p.min as f32 {
                    p.y = p.min as f32;
                    p.vy = -p.vy;
                } else if p.y >= p.max as f32 {
                    p.y = p.max as f32;
                    p.vy = -p.vy;
                }
            } else {
                p.x += p.vx * dt;
                if p.x <= p.min as f32 {
                    p.x = p.min as f32;
                    p.vx = -p.vx;
                } else if p.x >= p.max as f32 {
                    p.x = p.max as f32;
                    p.vx = -p.vx;
                }
            }
        }

        // Bounce off terrain the range did not account for.
        let landed = world.platforms[i].rounded();
        if matches!(world.tile_at(landed.0, landed.1), Tile::Wall | Tile::Floor) {
            let p = &mut world.platforms[i];
            if p.vertical {
                p.vy = -p.vy;
                p.y = fy;
            } else {
                p.vx = -p.vx;
                p.x = fx;
            }
        }

        let now = world.platforms[i].rounded();
        let delta = (now.0 - prior.0, now.1 - prior.1);

        // Carry characters standing on the platform's prior cell. Riding
        // forces ground contact so the rider's own support check never
        // sees the gap under its feet.
        for pi in 0..world.players.len() {
            let plr = world.players[pi];
            if !plr.alive() || (plr.x, plr.y) != (prior.0, prior.1 - 1) {
                continue;
            }
            if delta != (0, 0) {
                let (nx, ny) = (plr.x + delta.0, plr.y + delta.1);
                if !matches!(world.tile_at(nx, ny), Tile::Wall | Tile::Floor | Tile::Door) {
                    world.players[pi].x = nx;
                    world.players[pi].y = ny;
                }
            }
            world.players[pi].vy = 0.0;
            world.players[pi].grounded = true;
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Character kinematics
// ══════════════════════════════════════════════════════════════

pub fn update_player(
    world: &mut World,
    elem: Element,
    input: FrameInput,
    dt: f32,
    events: &mut Vec<GameEvent>,
) {
    let idx = elem.index();
    if !world.players[idx].alive() {
        return;
    }

    let t = world.tuning;
    let mut p = world.players[idx];

    // Lethal contact: occupying the terrain, or standing with feet on it.
    if world.tile_at(p.x, p.y).is_lethal_to(elem)
        || world.tile_at(p.x, p.y + 1).is_lethal_to(elem)
    {
        world.players[idx] = p;
        kill(world, idx, events);
        return;
    }

    collect_gem(world, &mut p, events);

    p.grounded = world.grounded(p.x, p.y, elem);

    // Jump: fires only on the not-pressed → pressed edge, only while
    // grounded and not already rising.
    let jump_edge = input.jump && !p.jump_held;
    p.jump_held = input.jump;
    if jump_edge && p.grounded && p.vy >= 0.0 {
        p.vy = -t.jump_power;
        events.push(GameEvent::Jumped { elem });
    }

    if p.grounded {
        if p.vy > 0.0 {
            p.vy = 0.0;
        }
    } else {
        p.vy = (p.vy + t.gravity * dt).min(t.max_fall_speed);
    }

    // ── Horizontal: quantized accumulator motion ──

    let dir = (input.right as i32) - (input.left as i32);
    if dir != 0 {
        let speed = if p.grounded {
            t.move_speed
        } else {
            t.move_speed * physics::AIR_CONTROL
        };
        p.move_accum += dir as f32 * speed * dt;
    } else if p.grounded {
        p.move_accum *= physics::GROUND_FRICTION;
    }

    while p.move_accum.abs() >= physics::MOVE_THRESHOLD {
        let step: i32 = if p.move_accum > 0.0 { 1 } else { -1 };
        let nx = p.x + step;
        let dest = world.tile_at(nx, p.y);

        if dest.is_blocking() {
            p.move_accum = 0.0;
            break;
        }
        if dest == Tile::Crate {
            if !push_crate(world, nx, p.y, step) {
                // Push refused: the whole horizontal move is off this tick.
                break;
            }
        } else if dest.is_lethal_to(elem) {
            world.players[idx] = p;
            kill(world, idx, events);
            return;
        } else if dest == Tile::Floor && p.grounded {
            p.move_accum = 0.0;
            break;
        }

        p.x = nx;
        p.move_accum -= step as f32 * physics::MOVE_STEP;
        collect_gem(world, &mut p, events);
        if world.tile_at(p.x, p.y + 1).is_lethal_to(elem) {
            world.players[idx] = p;
            kill(world, idx, events);
            return;
        }
        p.grounded = world.grounded(p.x, p.y, elem);
    }

    // ── Vertical: whole-tile accumulator motion ──

    p.fall_accum += p.vy * dt;

    // Falling.
    while p.fall_accum >= 1.0 {
        p.fall_accum -= 1.0;
        let ny = p.y + 1;
        let dest = world.tile_at(p.x, ny);

        if dest.is_lethal_to(elem) {
            world.players[idx] = p;
            kill(world, idx, events);
            return;
        }
        if dest.is_blocking() {
            land(&mut p);
            break;
        }
        if dest == Tile::Floor && world.tile_at(p.x, ny + 1) == Tile::Empty {
            // Dropping onto the top of an internal floor segment.
            p.y = ny;
            collect_gem(world, &mut p, events);
            land(&mut p);
            break;
        }

        p.y = ny;
        collect_gem(world, &mut p, events);

        let below = world.tile_at(p.x, ny + 1);
        if below.is_lethal_to(elem) {
            world.players[idx] = p;
            kill(world, idx, events);
            return;
        }
        if ny + 1 >= world.height || below.breaks_fall() || below.is_safe_terrain_for(elem) {
            land(&mut p);
            break;
        }
    }

    // Rising.
    while p.fall_accum <= -1.0 {
        p.fall_accum += 1.0;
        let ny = p.y - 1;
        let above = world.tile_at(p.x, ny);

        if above.is_blocking() || above == Tile::Floor {
            p.vy = 0.0;
            p.fall_accum = 0.0;
            break;
        }
        if above.is_lethal_to(elem) {
            world.players[idx] = p;
            kill(world, idx, events);
            return;
        }

        p.y = ny;
        collect_gem(world, &mut p, events);
    }

    p.grounded = world.grounded(p.x, p.y, elem);
    world.players[idx] = p;
}

/// Push the crate at (cx, cy) one cell along `dir`. The push target is
/// the next cell beyond the crate; only empty or switch cells accept it.
fn push_crate(world: &mut World, cx: i32, cy: i32, dir: i32) -> bool {
    match world.crate_at(cx, cy) {
        Some(idx) => move_crate(world, idx, cx + dir, cy),
        // A crate glyph without a live record reads as solid.
        None => false,
    }
}

fn land(p: &mut Player) {
    p.vy = 0.0;
    p.fall_accum = 0.0;
    p.grounded = true;
}

fn kill(world: &mut World, idx: usize, events: &mut Vec<GameEvent>) {
    if world.players[idx].state == LifeState::Dead {
        return;
    }
    world.players[idx].state = LifeState::Dead;
    world.deaths += 1;
    events.push(GameEvent::PlayerDied {
        elem: world.players[idx].elem,
    });
}

fn collect_gem(world: &mut World, p: &mut Player, events: &mut Vec<GameEvent>) {
    let gem = Tile::gem_for(p.elem);
    if world.tile_at(p.x, p.y) == gem {
        world.set_tile(p.x, p.y, Tile::Empty);
        world.gems[p.elem.index()] += 1;
        events.push(GameEvent::GemPicked {
            elem: p.elem,
            x: p.x,
            y: p.y,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::physics::Tuning;
    use crate::sim::stage::StageDef;

    /// Default tick length: 50 ms.
    const DT: f32 = 0.05;

    fn world(rows: &[&str]) -> World {
        StageDef::parse(&rows.join("\n"))
            .expect("test stage should parse")
            .instantiate(Tuning::default())
    }

    fn held(left: bool, right: bool, jump: bool) -> FrameInput {
        FrameInput { left, right, jump }
    }

    fn drive(world: &mut World, elem: Element, input: FrameInput, ticks: u32) -> Vec<GameEvent> {
        let mut events = vec![];
        for _ in 0..ticks {
            update_player(world, elem, input, DT, &mut events);
        }
        events
    }

    // ── Walls and tunneling ──

    #[test]
    fn wall_is_never_entered_from_any_accumulator_state() {
        for accum in [0.0, 0.3, 0.45, 0.9, 5.0] {
            let mut w = world(&["#####", "#f# #", "#####"]);
            w.players[0].move_accum = accum;
            drive(&mut w, Element::Fire, held(false, true, false), 20);
            let p = w.player(Element::Fire);
            assert_eq!(p.x, 1, "entered the wall from accum={accum}");
            assert!(
                p.move_accum.abs() < physics::MOVE_THRESHOLD,
                "blocked step must zero the accumulator (accum={accum})"
            );
        }
    }

    #[test]
    fn closed_door_blocks_walking() {
        let mut w = world(&["#####", "#fD #", "#####"]);
        drive(&mut w, Element::Fire, held(false, true, false), 20);
        assert_eq!(w.player(Element::Fire).x, 1);
    }

    // ── Lethal terrain ──

    #[test]
    fn stepping_into_lethal_terrain_kills_within_the_tick() {
        let mut w = world(&["#####", "#wF #", "#####"]);
        let mut events = vec![];
        for _ in 0..5 {
            update_player(&mut w, Element::Water, held(false, true, false), DT, &mut events);
            if !w.player(Element::Water).alive() {
                break;
            }
        }
        let p = *w.player(Element::Water);
        assert_eq!(p.state, LifeState::Dead);
        assert_eq!((p.x, p.y), (1, 1), "death must abort the move");
        assert_eq!(w.deaths, 1);

        // Dead characters never update again.
        drive(&mut w, Element::Water, held(false, true, true), 10);
        let after = w.player(Element::Water);
        assert_eq!((after.x, after.y), (1, 1));
        assert_eq!(w.deaths, 1);
    }

    #[test]
    fn standing_on_own_terrain_is_safe_on_foreign_lethal() {
        let mut fire_home = world(&["#####", "#f  #", "#FFF#", "#####"]);
        drive(&mut fire_home, Element::Fire, held(false, false, false), 5);
        assert!(fire_home.player(Element::Fire).alive());
        assert!(fire_home.player(Element::Fire).grounded);

        let mut water_guest = world(&["#####", "#w  #", "#FFF#", "#####"]);
        drive(&mut water_guest, Element::Water, held(false, false, false), 2);
        assert!(!water_guest.player(Element::Water).alive());
    }

    // ── Gems ──

    #[test]
    fn gem_pickup_is_idempotent() {
        let mut w = world(&["#####", "#fR #", "#####"]);
        drive(&mut w, Element::Fire, held(false, true, false), 4);
        assert_eq!(w.gem_count(Element::Fire), 1);
        assert_eq!(w.tile_at(2, 1), Tile::Empty);

        // Re-crossing the emptied cell never double-counts.
        drive(&mut w, Element::Fire, held(true, false, false), 6);
        drive(&mut w, Element::Fire, held(false, true, false), 6);
        assert_eq!(w.gem_count(Element::Fire), 1);
    }

    #[test]
    fn wrong_element_gem_is_inert() {
        let mut w = world(&["#####", "#wR #", "#####"]);
        drive(&mut w, Element::Water, held(false, true, false), 6);
        assert_eq!(w.gem_count(Element::Water), 0);
        assert_eq!(w.tile_at(2, 1), Tile::FireGem);
        assert!(w.player(Element::Water).alive());
    }

    // ── Jump and gravity ──

    #[test]
    fn jump_is_edge_triggered_and_needs_ground() {
        let mut w = world(&["#####", "#   #", "#   #", "#f  #", "#####"]);

        let events = drive(&mut w, Element::Fire, held(false, false, true), 1);
        assert!(matches!(events[..], [GameEvent::Jumped { .. }]));
        assert!(w.player(Element::Fire).vy < 0.0);

        // Still held: no second jump even after the character lands again.
        let events = drive(&mut w, Element::Fire, held(false, false, true), 60);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::Jumped { .. })));

        // Release, then press again: a fresh edge.
        drive(&mut w, Element::Fire, held(false, false, false), 1);
        let events = drive(&mut w, Element::Fire, held(false, false, true), 1);
        assert!(matches!(events[..], [GameEvent::Jumped { .. }]));
    }

    #[test]
    fn falling_character_lands_with_zero_velocity() {
        let mut w = world(&["#####", "#f  #", "#   #", "#   #", "#####"]);
        drive(&mut w, Element::Fire, held(false, false, false), 60);
        let p = w.player(Element::Fire);
        assert_eq!((p.x, p.y), (1, 3));
        assert!(p.grounded);
        assert_eq!(p.vy, 0.0);
    }

    #[test]
    fn friction_decays_only_on_the_ground() {
        let mut w = world(&["#####", "#f  #", "#####"]);
        w.players[0].move_accum = 0.2;
        drive(&mut w, Element::Fire, held(false, false, false), 1);
        assert!((w.player(Element::Fire).move_accum - 0.16).abs() < 1e-5);

        let mut airborne = world(&["#####", "#f  #", "#   #", "#####"]);
        airborne.players[0].move_accum = 0.2;
        drive(&mut airborne, Element::Fire, held(false, false, false), 1);
        assert!((airborne.player(Element::Fire).move_accum - 0.2).abs() < 1e-5);
    }

    // ── Crates ──

    #[test]
    fn push_moves_crate_and_never_overlaps() {
        let mut w = world(&["#######", "#f B S#", "#######"]);
        for _ in 0..40 {
            drive(&mut w, Element::Fire, held(false, true, false), 1);
            let p = w.player(Element::Fire);
            let c = &w.crates[0];
            assert_ne!((p.x, p.y), (c.x, c.y), "character overlapped the crate");
        }
        // Crate pushed onto the switch, pinned by the far wall; the
        // character ends adjacent.
        assert_eq!((w.crates[0].x, w.crates[0].y), (5, 1));
        assert_eq!(w.player(Element::Fire).x, 4);
        assert_eq!(w.tile_at(5, 1), Tile::Crate);

        let mut events = vec![];
        update_switches(&mut w, &mut events);
        assert!(w.switches[0].activated, "crate on switch must activate it");
    }

    #[test]
    fn refused_push_cancels_the_move() {
        let mut w = world(&["#####", "#fB #", "# # #", "#####"]);
        // Crate at (2,1) falls nowhere (wall below); push target (3,1)
        // is empty, so one push works, then the far wall pins it.
        drive(&mut w, Element::Fire, held(false, true, false), 40);
        assert_eq!(w.crates[0].x, 3);
        assert_eq!(w.player(Element::Fire).x, 2);
    }

    #[test]
    fn crate_falls_and_rewrites_the_grid() {
        let mut w = world(&["#####", "# B #", "#   #", "#####"]);
        for _ in 0..40 {
            update_crates(&mut w, DT);
        }
        assert_eq!((w.crates[0].x, w.crates[0].y), (2, 2));
        assert_eq!(w.tile_at(2, 1), Tile::Empty);
        assert_eq!(w.tile_at(2, 2), Tile::Crate);
        assert_eq!(w.crates[0].vy, 0.0);
    }

    #[test]
    fn falling_crate_rests_on_top_of_a_switch_cell() {
        let mut w = world(&["#####", "# B #", "#   #", "# S #", "#####"]);
        for _ in 0..60 {
            update_crates(&mut w, DT);
        }
        // A switch below is support; falling crates stop above it and
        // only a sideways push seats a crate on a switch.
        assert_eq!((w.crates[0].x, w.crates[0].y), (2, 2));
        let mut events = vec![];
        update_switches(&mut w, &mut events);
        assert!(!w.switches[0].activated);
    }

    #[test]
    fn switch_glyph_is_restored_when_a_crate_leaves() {
        let mut w = world(&["#######", "# B S #", "#######"]);
        assert!(move_crate(&mut w, 0, 4, 1));
        assert_eq!(w.tile_at(4, 1), Tile::Crate);
        assert_eq!(w.tile_at(2, 1), Tile::Empty);
        assert!(move_crate(&mut w, 0, 3, 1));
        assert_eq!(w.tile_at(4, 1), Tile::Switch);
    }

    // ── Switches and doors ──

    #[test]
    fn switch_activation_is_pure_occupancy() {
        let mut w = world(&["#######", "#f S  #", "#######"]);
        let mut events = vec![];

        w.players[0].x = 3;
        update_switches(&mut w, &mut events);
        assert!(w.switches[0].activated);

        w.players[0].x = 1;
        update_switches(&mut w, &mut events);
        assert!(!w.switches[0].activated, "switch state must not latch");
    }

    #[test]
    fn any_switch_opens_all_doors_globally() {
        let mut w = world(&["#########", "#f S S D#", "#########"]);
        let mut events = vec![];

        for sx in [3, 5] {
            w.players[0].x = sx;
            update_switches(&mut w, &mut events);
            update_doors(&mut w, &mut events);
            assert!(w.doors[0].open, "switch at x={sx} should open the door");
            assert_eq!(w.tile_at(7, 1), Tile::Empty);

            w.players[0].x = 1;
            update_switches(&mut w, &mut events);
            update_doors(&mut w, &mut events);
            assert!(!w.doors[0].open);
            assert_eq!(w.tile_at(7, 1), Tile::Door);
        }
        assert!(events.iter().any(|e| matches!(e, GameEvent::DoorsOpened)));
        assert!(events.iter().any(|e| matches!(e, GameEvent::DoorsClosed)));
    }

    // ── Lifts ──

    #[test]
    fn lift_travels_between_origin_and_target() {
        let mut w = world(&["#######", "# TTT #", "#     #", "# S   #", "#######"]);
        assert_eq!(w.lifts[0].origin_y, 1);
        assert_eq!(w.lifts[0].target_y, 3);

        w.switches[0].activated = true;
        for _ in 0..40 {
            update_lifts(&mut w, DT);
        }
        assert_eq!(w.lifts[0].y, 3.0);
        assert!(!w.lifts[0].moving);

        w.switches[0].activated = false;
        for _ in 0..40 {
            update_lifts(&mut w, DT);
        }
        assert_eq!(w.lifts[0].y, 1.0);
    }

    #[test]
    fn lifts_do_not_carry_or_support_riders() {
        // Only moving platforms enter the ride check: a character above
        // a lift is not grounded by it and is never translated with it.
        let w = world(&["#######", "#     #", "# TTT #", "#     #", "#######"]);
        assert!(!w.grounded(3, 1, Element::Fire));
    }

    // ── Barriers ──

    #[test]
    fn barrier_follows_crate_on_its_switch() {
        let mut w = world(&[
            "#########",
            "#     ^ #",
            "#       #",
            "#f B S| #",
            "#########",
        ]);
        assert_eq!(w.barriers[0].span(), (1, 3));
        for y in 1..=3 {
            assert_eq!(w.tile_at(6, y), Tile::Barrier);
        }

        // Crate seated on the switch: the whole span vanishes this pass.
        assert!(move_crate(&mut w, 0, 5, 3));
        update_barriers(&mut w);
        for y in 1..=3 {
            assert_eq!(w.tile_at(6, y), Tile::Empty);
        }

        // Crate pushed off: the whole span is back.
        assert!(move_crate(&mut w, 0, 4, 3));
        update_barriers(&mut w);
        for y in 1..=3 {
            assert_eq!(w.tile_at(6, y), Tile::Barrier);
        }
    }

    #[test]
    fn character_on_switch_does_not_retract_a_barrier() {
        let mut w = world(&[
            "#########",
            "#     ^ #",
            "#       #",
            "#f   S| #",
            "#########",
        ]);
        w.players[0].x = 5;
        let mut events = vec![];
        update_switches(&mut w, &mut events);
        assert!(w.switches[0].activated);
        update_barriers(&mut w);
        assert_eq!(w.tile_at(6, 1), Tile::Barrier);
    }

    // ── Moving platforms ──

    #[test]
    fn platform_carries_its_rider() {
        let mut w = world(&[
            "#####",
            "#   #",
            "#   #",
            "#   #",
            "#   #",
            "# P #",
            "#   #",
            "#####",
        ]);
        w.platforms[0].vertical = true;
        w.platforms[0].min = 2;
        w.platforms[0].max = 6;
        w.platforms[0].vx = 0.0;
        w.platforms[0].vy = -2.0; // moving upward

        w.players[0].x = 2;
        w.players[0].y = 4; // one cell above the platform
        w.players[0].vy = 3.0;

        update_platforms(&mut w, 0.3);
        let p = w.player(Element::Fire);
        assert_eq!((p.x, p.y), (2, 3), "rider must move with the platform");
        assert!(p.grounded);
        assert_eq!(p.vy, 0.0);
    }

    #[test]
    fn platform_bounces_at_its_range_limits() {
        let mut w = world(&["#########", "#       #", "#P      #", "#########"]);
        w.platforms[0].x = w.platforms[0].max as f32 - 0.05;
        let vx = w.platforms[0].vx;
        assert!(vx > 0.0);
        update_platforms(&mut w, DT);
        assert!(w.platforms[0].vx < 0.0, "velocity must invert at the boundary");
        assert_eq!(w.platforms[0].x, w.platforms[0].max as f32);
    }

    #[test]
    fn bystander_is_not_carried() {
        let mut w = world(&["#######", "#     #", "# P   #", "#######"]);
        w.players[0].x = 5;
        w.players[0].y = 1;
        w.players[0].vy = 2.0;
        update_platforms(&mut w, DT);
        let p = w.player(Element::Fire);
        assert_eq!((p.x, p.y), (5, 1));
        assert_eq!(p.vy, 2.0);
    }

    // ── Tick composition ──

    #[test]
    fn tick_reports_stage_clear_when_both_reach_the_exit() {
        let mut w = world(&["#####", "#fwE#", "#####"]);
        w.players[0].x = 3;
        w.players[1].x = 3;
        let events = tick(&mut w, FrameInput::default(), FrameInput::default(), DT);
        assert!(events.iter().any(|e| matches!(e, GameEvent::StageCleared)));
    }

    #[test]
    fn tick_withholds_stage_clear_while_one_lags() {
        let mut w = world(&["#####", "#fwE#", "#####"]);
        w.players[0].x = 3;
        let events = tick(&mut w, FrameInput::default(), FrameInput::default(), DT);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::StageCleared)));
    }
}
