use std::fmt;

use crate::config::MovementSpeeds;
use crate::content::{LoadError, MapId, ObjMovement, BLOCK_SIZE_PX};

use super::collision::{resolve_move, Destination};
use super::direction::Direction;
use super::registry::Registry;

/// Timer values at or below this count as arrived; repeated f32 subtraction
/// of 0.1 does not land exactly on zero.
const TIMER_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(pub u32);

impl fmt::Display for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

/// Discrete board position. `x`/`y` are local to `map`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub map: MapId,
    pub x: i32,
    pub y: i32,
    pub elevation: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MovementMode {
    #[default]
    Walking,
    Surfing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjKind {
    Player,
    Npc { event_id: u16, movement: ObjMovement },
}

/// A movable entity. Collision is resolved against `position` the moment a
/// move starts; the timer only drives the sub-tile animation toward it.
#[derive(Debug, Clone, PartialEq)]
pub struct Obj {
    kind: ObjKind,
    position: Position,
    facing: Direction,
    color: [u8; 3],
    mode: MovementMode,
    can_move: bool,
    timer: f32,
    speed: f32,
    step: (i32, i32),
    moved: bool,
    leg: bool,
}

impl Obj {
    pub fn new(kind: ObjKind, position: Position, color: [u8; 3]) -> Self {
        Self {
            kind,
            position,
            facing: Direction::South,
            color,
            mode: MovementMode::Walking,
            can_move: true,
            timer: 0.0,
            speed: 0.0,
            step: (0, 0),
            moved: false,
            leg: false,
        }
    }

    pub fn kind(&self) -> ObjKind {
        self.kind
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn color(&self) -> [u8; 3] {
        self.color
    }

    pub fn mode(&self) -> MovementMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: MovementMode) {
        self.mode = mode;
    }

    pub fn can_move(&self) -> bool {
        self.can_move
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    /// Which foot leads; flips on every move attempt.
    pub fn leg(&self) -> bool {
        self.leg
    }

    /// Turns in place. Ignored while a move is still animating.
    pub fn face(&mut self, direction: Direction) -> bool {
        if !self.can_move {
            return false;
        }
        self.facing = direction;
        true
    }

    /// Attempts one step. Returns `Ok(false)` both when the move is blocked
    /// and when the previous move is still animating; only a blocked attempt
    /// starts the bump animation.
    pub fn try_move(
        &mut self,
        registry: &Registry,
        direction: Direction,
        running: bool,
        speeds: &MovementSpeeds,
    ) -> Result<bool, LoadError> {
        if !self.can_move {
            return Ok(false);
        }
        let destination = resolve_move(registry, self.position, direction, self.mode)?;
        Ok(self.begin_move(direction, running, destination, speeds))
    }

    pub(crate) fn begin_move(
        &mut self,
        direction: Direction,
        running: bool,
        destination: Option<Destination>,
        speeds: &MovementSpeeds,
    ) -> bool {
        self.facing = direction;
        self.leg = !self.leg;
        self.can_move = false;
        self.timer = 1.0;

        match destination {
            Some(destination) => {
                self.speed = if destination.cells > 1 {
                    speeds.jump
                } else if running {
                    speeds.running
                } else {
                    speeds.normal
                };
                let (dx, dy) = direction.offset();
                self.step = (dx * destination.cells, dy * destination.cells);
                self.position = destination.position;
                self.moved = true;
                true
            }
            None => {
                // One flat bump speed, running or not.
                self.speed = speeds.blocked;
                self.step = (0, 0);
                self.moved = false;
                false
            }
        }
    }

    /// Advances the move animation by one tick. Returns `true` on the tick a
    /// successful move completes.
    pub fn update_movement_timer(&mut self) -> bool {
        if self.can_move {
            return false;
        }
        self.timer -= self.speed;
        if self.timer > TIMER_EPSILON {
            return false;
        }
        self.timer = 0.0;
        self.can_move = true;
        self.moved
    }

    /// Pixel offset from the discrete position to where the Obj is drawn.
    pub fn pixel_offset(&self) -> (i32, i32) {
        if self.timer <= 0.0 {
            return (0, 0);
        }
        let scale = BLOCK_SIZE_PX as f32 * self.timer;
        (
            (-(self.step.0 as f32) * scale).round() as i32,
            (-(self.step.1 as f32) * scale).round() as i32,
        )
    }

    /// Places the Obj without animation, cancelling any move in progress.
    pub fn place(&mut self, position: Position) {
        self.position = position;
        self.can_move = true;
        self.timer = 0.0;
        self.step = (0, 0);
        self.moved = false;
    }
}
