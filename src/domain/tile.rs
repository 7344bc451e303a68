/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

use super::entity::Element;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Empty,
    Wall,          // blocks everything
    Floor,         // blocks grounded walking, passable mid-air
    FireTerrain,   // safe for Fire, lethal to Water
    WaterTerrain,  // safe for Water, lethal to Fire
    Crate,         // pushable box, tracked by a registry record
    Switch,        // pressure switch, record keyed by coordinate
    Door,          // rewritten each tick from switch state
    Platform,      // moving platform spawn marker (overlay after load)
    Lift,          // toggle platform spawn marker (overlay after load)
    Barrier,       // switch-driven vertical wall segment
    BarrierMark,   // load-time target marker for a barrier, cleared after load
    FireGem,
    WaterGem,
    FireSpawn,
    WaterSpawn,
    Exit,
}

impl Tile {
    /// Map a stage-file byte to a tile. Unknown symbols read as empty space.
    pub fn from_symbol(ch: char) -> Tile {
        match ch {
            '#' => Tile::Wall,
            '.' => Tile::Floor,
            'F' => Tile::FireTerrain,
            'W' => Tile::WaterTerrain,
            'B' => Tile::Crate,
            'S' => Tile::Switch,
            'D' => Tile::Door,
            'P' => Tile::Platform,
            'T' => Tile::Lift,
            '|' => Tile::Barrier,
            '^' => Tile::BarrierMark,
            'R' => Tile::FireGem,
            'b' => Tile::WaterGem,
            'f' => Tile::FireSpawn,
            'w' => Tile::WaterSpawn,
            'E' => Tile::Exit,
            _ => Tile::Empty,
        }
    }

    /// Does this tile stop an entity dead, regardless of state?
    /// Closed doors live in the grid as `Door`; open doors are `Empty`.
    pub fn is_blocking(self) -> bool {
        matches!(self, Tile::Wall | Tile::Barrier | Tile::Door)
    }

    /// Can a character stand on this tile? (ground-contact set)
    pub fn is_standable(self) -> bool {
        matches!(
            self,
            Tile::Wall | Tile::Floor | Tile::FireSpawn | Tile::WaterSpawn
        )
    }

    /// Landing set for a falling character: everything standable plus
    /// barriers. Element-safe terrain is handled by the caller.
    pub fn breaks_fall(self) -> bool {
        self.is_standable() || self == Tile::Barrier
    }

    /// Can a crate rest on this tile?
    pub fn supports_crate(self) -> bool {
        matches!(self, Tile::Wall | Tile::Floor | Tile::Switch | Tile::Crate)
    }

    /// Is this the terrain the given element walks on unharmed?
    pub fn is_safe_terrain_for(self, elem: Element) -> bool {
        matches!(
            (self, elem),
            (Tile::FireTerrain, Element::Fire) | (Tile::WaterTerrain, Element::Water)
        )
    }

    /// Is this terrain lethal to the given element?
    pub fn is_lethal_to(self, elem: Element) -> bool {
        matches!(
            (self, elem),
            (Tile::FireTerrain, Element::Water) | (Tile::WaterTerrain, Element::Fire)
        )
    }

    /// The gem tile collectible by the given element.
    pub fn gem_for(elem: Element) -> Tile {
        match elem {
            Element::Fire => Tile::FireGem,
            Element::Water => Tile::WaterGem,
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_map_known_tiles() {
        for ch in ['#', '.', 'F', 'W', 'B', 'S', 'D', 'P', 'T', '|', '^', 'R', 'b', 'f', 'w', 'E'] {
            assert_ne!(Tile::from_symbol(ch), Tile::Empty, "symbol {ch:?} should map to a tile");
        }
        assert_eq!(Tile::from_symbol(' '), Tile::Empty);
        assert_eq!(Tile::from_symbol('?'), Tile::Empty);
    }

    #[test]
    fn terrain_rules_are_asymmetric() {
        assert!(Tile::FireTerrain.is_safe_terrain_for(Element::Fire));
        assert!(Tile::FireTerrain.is_lethal_to(Element::Water));
        assert!(Tile::WaterTerrain.is_safe_terrain_for(Element::Water));
        assert!(Tile::WaterTerrain.is_lethal_to(Element::Fire));
        assert!(!Tile::FireTerrain.is_lethal_to(Element::Fire));
        assert!(!Tile::WaterTerrain.is_lethal_to(Element::Water));
    }

    #[test]
    fn doors_block_but_do_not_support() {
        assert!(Tile::Door.is_blocking());
        assert!(!Tile::Door.is_standable());
        assert!(!Tile::Door.breaks_fall());
    }

    #[test]
    fn barriers_break_falls_but_are_not_standable() {
        assert!(Tile::Barrier.breaks_fall());
        assert!(!Tile::Barrier.is_standable());
    }

    #[test]
    fn crates_stack_on_switches_and_each_other() {
        assert!(Tile::Switch.supports_crate());
        assert!(Tile::Crate.supports_crate());
        assert!(!Tile::Empty.supports_crate());
        assert!(!Tile::Door.supports_crate());
    }
}
