pub mod config;
pub mod dto;
pub mod math;
pub mod model;
pub mod registry;

pub use config::EngineConfig;
pub use dto::{PatchDto, parse_patches};
pub use math::Aabb;
pub use model::{Color, Patch, PatchId, PatchRole};
pub use registry::PatchSet;
