pub mod offsets;
pub mod session;
pub mod surface;

pub use offsets::*;
pub use session::*;
pub use surface::*;
