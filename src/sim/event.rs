/// Events emitted during a simulation tick.
/// The presentation layer consumes these for sound and messages.

use crate::domain::entity::Element;

#[derive(Clone, Debug)]
#[allow(dead_code)]
pub enum GameEvent {
    GemPicked { elem: Element, x: i32, y: i32 },
    Jumped { elem: Element },
    PlayerDied { elem: Element },
    SwitchPressed { x: i32, y: i32 },
    DoorsOpened,
    DoorsClosed,
    StageCleared,
}
