/// Entities: the two characters plus the interactive-object records.
///
/// Everything here is an overlay over the tile grid: records are keyed
/// by coordinate and linked by index, never by pointer. Grid cells and
/// overlay records can coexist at the same coordinate (a crate standing
/// on a switch, a character standing on a gem).

/// Which of the two characters this is. Doubles as the registry index
/// for per-character state (`Element::index`).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Element {
    Fire,
    Water,
}

impl Element {
    pub fn index(self) -> usize {
        match self {
            Element::Fire => 0,
            Element::Water => 1,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LifeState {
    Alive,
    Dead,
}

/// One tick of input for one character, already decoded from raw keys.
#[derive(Clone, Copy, Default, Debug)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    /// Whether the jump key is down this tick. The edge detection that
    /// turns this into an actual jump lives in the kinematics pass.
    pub jump: bool,
}

/// A playable character. Position is whole tiles; the fractional part of
/// its motion lives in the two accumulators, which persist across ticks.
#[derive(Clone, Copy, Debug)]
pub struct Player {
    pub elem: Element,
    pub x: i32,
    pub y: i32,
    pub vx: f32, // kept for the record layout; horizontal speed is quantized
    pub vy: f32,
    pub state: LifeState,
    pub grounded: bool,
    pub move_accum: f32,
    pub fall_accum: f32,
    /// Jump key state from the previous tick, for edge detection.
    pub jump_held: bool,
}

impl Player {
    pub fn new(elem: Element, x: i32, y: i32) -> Self {
        Player {
            elem,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            state: LifeState::Alive,
            grounded: true,
            move_accum: 0.0,
            fall_accum: 0.0,
            jump_held: false,
        }
    }

    pub fn alive(&self) -> bool {
        self.state == LifeState::Alive
    }
}

/// A pushable crate. Moves vertically under gravity, horizontally only
/// when pushed by a character. Its glyph lives in the grid; this record
/// is authoritative for its coordinate.
#[derive(Clone, Copy, Debug)]
pub struct Crate {
    pub x: i32,
    pub y: i32,
    pub vy: f32,
    pub fall_accum: f32,
    pub active: bool,
}

impl Crate {
    pub fn new(x: i32, y: i32) -> Self {
        Crate { x, y, vy: 0.0, fall_accum: 0.0, active: true }
    }
}

/// A pressure switch. `activated` is recomputed every tick from current
/// occupancy, never latched.
#[derive(Clone, Copy, Debug)]
pub struct Switch {
    pub x: i32,
    pub y: i32,
    pub activated: bool,
    /// Reserved: a switch that only crates can press. The loader never
    /// sets this today.
    pub box_only: bool,
    /// Reserved: wiring group. The coupler deliberately ignores it and
    /// keeps the observed all-switches-gate-all-doors behavior.
    pub group: u8,
}

impl Switch {
    pub fn new(x: i32, y: i32) -> Self {
        Switch { x, y, activated: false, box_only: false, group: 0 }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Door {
    pub x: i32,
    pub y: i32,
    pub open: bool,
}

impl Door {
    pub fn new(x: i32, y: i32) -> Self {
        Door { x, y, open: false }
    }
}

/// A moving platform. Pure overlay: it is never written into the grid,
/// and ride/collision logic queries the registry directly.
#[derive(Clone, Copy, Debug)]
pub struct Platform {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Travel range on the active axis, inclusive tile coordinates.
    pub min: i32,
    pub max: i32,
    pub vertical: bool,
    pub active: bool,
}

impl Platform {
    pub fn new(x: i32, y: i32, vertical: bool, min: i32, max: i32, speed: f32) -> Self {
        Platform {
            x: x as f32,
            y: y as f32,
            vx: if vertical { 0.0 } else { speed },
            vy: if vertical { speed } else { 0.0 },
            min,
            max,
            vertical,
            active: true,
        }
    }

    /// Grid coordinate the platform currently occupies.
    pub fn rounded(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

/// A toggle platform: a horizontal run of tiles that glides between its
/// loaded row and a target row while its linked switch is held. Overlay
/// only. Riders are not carried; only moving platforms do that.
#[derive(Clone, Copy, Debug)]
pub struct Lift {
    pub x: i32,
    pub width: i32,
    pub y: f32,
    pub origin_y: i32,
    /// Row immediately above the first solid obstruction below the
    /// origin, computed at load time.
    pub target_y: i32,
    pub switch_idx: usize,
    pub moving: bool,
}

impl Lift {
    pub fn new(x: i32, y: i32, width: i32, target_y: i32) -> Self {
        Lift {
            x,
            width,
            y: y as f32,
            origin_y: y,
            target_y,
            switch_idx: 0,
            moving: false,
        }
    }

    /// Row the lift currently occupies for rendering and collision.
    pub fn row(&self) -> i32 {
        self.y.round() as i32
    }
}

/// A vertical wall segment toggled in whole-span steps: materialized
/// into the grid across origin..target, hidden while a crate rests on
/// its linked switch.
#[derive(Clone, Copy, Debug)]
pub struct Barrier {
    pub x: i32,
    pub origin_y: i32,
    /// Row of the paired target marker above the origin.
    pub target_y: i32,
    pub switch_idx: usize,
}

impl Barrier {
    pub fn new(x: i32, origin_y: i32, target_y: i32) -> Self {
        Barrier { x, origin_y, target_y, switch_idx: 0 }
    }

    /// Inclusive row range of the span, low to high.
    pub fn span(&self) -> (i32, i32) {
        if self.origin_y <= self.target_y {
            (self.origin_y, self.target_y)
        } else {
            (self.target_y, self.origin_y)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_indices_are_stable() {
        assert_eq!(Element::Fire.index(), 0);
        assert_eq!(Element::Water.index(), 1);
    }

    #[test]
    fn platform_rounds_to_nearest_cell() {
        let mut p = Platform::new(3, 5, false, 2, 8, 2.0);
        p.x = 3.4;
        assert_eq!(p.rounded(), (3, 5));
        p.x = 3.6;
        assert_eq!(p.rounded(), (4, 5));
    }

    #[test]
    fn barrier_span_is_ordered() {
        let b = Barrier::new(4, 7, 3);
        assert_eq!(b.span(), (3, 7));
    }

    #[test]
    fn fresh_player_is_alive_and_grounded() {
        let p = Player::new(Element::Fire, 2, 3);
        assert!(p.alive());
        assert!(p.grounded);
        assert_eq!(p.move_accum, 0.0);
    }
}
