//! CLI command implementations.

pub mod extract;
pub mod map;
pub mod plan;

pub use extract::ExtractCommand;
pub use map::MapCommand;
pub use plan::PlanCommand;
