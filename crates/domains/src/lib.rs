//! rusty-forum/crates/domains/src/lib.rs
//!
//! Domain models, the vote calculator and the port traits for rusty-forum.
//! Nothing in this crate performs I/O.

pub mod error;
pub mod models;
pub mod ports;
pub mod session;
pub mod voting;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use ports::*;
pub use session::*;
pub use voting::*;
