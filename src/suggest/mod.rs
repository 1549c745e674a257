pub mod engine;
pub mod picker;

pub use engine::*;
pub use picker::*;
