mod compositor;
mod frame;

pub use compositor::draw_map;
pub use frame::{Frame, VOID_COLOR};
