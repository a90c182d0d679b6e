mod behavior;
mod collision;
mod direction;
mod obj;
mod registry;
mod state;

pub use behavior::{Behavior, BehaviorAttributes};
pub use collision::{resolve_move, Destination};
pub use direction::{Direction, DirectionSet};
pub use obj::{MovementMode, Obj, ObjId, ObjKind, Position};
pub use registry::{CellOwner, Registry, ResolvedCell};
pub use state::{Arrival, World, WorldError};
