//! Data-model types for the onboard wallet core.
//!
//! This crate contains the serde-serializable types shared between the
//! session core and its persistence layer. These types represent the
//! "data layer" - the shapes of values as they are stored and exchanged.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization
//! * Stable: Changes only when the persisted layout changes
//!
//! Higher-level connector and session APIs are built on top of these
//! types in `onboard-rs`.

pub mod account;
pub mod chain;
pub mod persist;
pub mod value;

pub use account::*;
pub use chain::*;
pub use persist::*;
pub use value::*;
