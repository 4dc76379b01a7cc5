//! Core types for Reel.

pub mod memory;
pub mod message;
pub mod session;
pub mod usage;

pub use memory::*;
pub use message::*;
pub use session::*;
pub use usage::*;
