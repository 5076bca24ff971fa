//! An abstraction layer for different completion engines.
//!
//! This crate establishes an unified protocol for the orchestration
//! runtime to interact with various supported completion engines, so
//! that the runtime can seamlessly switch between them without
//! modifying the core codebase.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.
//!
//! Users of this crate may add some extra functionalities or wrappers,
//! depending on their own use cases. Those extra code should be placed
//! in their own crate.

#![deny(missing_docs)]

mod error;
mod message;
mod provider;
mod request;
mod usage;

pub use error::*;
pub use message::*;
pub use provider::*;
pub use request::*;
pub use usage::*;
