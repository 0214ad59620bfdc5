pub mod enums;
pub mod lab;
pub mod wearable;

pub use enums::*;
pub use lab::*;
pub use wearable::*;
