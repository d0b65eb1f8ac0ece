//! Data models

pub mod detection;
pub mod history;
pub mod session;

pub use detection::*;
pub use history::*;
pub use session::*;
