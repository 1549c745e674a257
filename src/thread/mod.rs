pub mod model;
pub mod render;
pub mod tree;

pub use model::*;
pub use render::*;
pub use tree::*;
