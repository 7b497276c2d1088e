//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - `received_at` is stamped by the dispatcher at receipt time (UTC)
//! - The wire payload carries no timestamp of its own

mod blueprint;
mod delivery;
mod error;
mod event;
mod message;
mod sink;
mod store;

pub use blueprint::*;
pub use delivery::*;
pub use error::*;
pub use event::*;
pub use message::*;
pub use sink::*;
pub use store::*;
