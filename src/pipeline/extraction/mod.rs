pub mod types;
pub mod format;
pub mod sanitize;
pub mod pdf;
pub mod orchestrator;

pub use types::*;
pub use format::*;
pub use sanitize::*;
pub use pdf::*;
pub use orchestrator::*;
