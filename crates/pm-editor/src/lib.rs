pub mod drag;
pub mod engine;
pub mod history;
pub mod input;
pub mod pivot;
pub mod selection;
pub mod shortcuts;

pub use drag::{Axis, TransformController, TransformMode, TransformSpace};
pub use engine::{ChangeMeta, FrameInfo, PatchEngine};
pub use history::HistoryStack;
pub use input::{InputEvent, Modifiers};
pub use selection::{Selection, SelectionManager};
pub use shortcuts::{ShortcutAction, ShortcutMap};
