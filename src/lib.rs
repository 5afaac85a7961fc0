//! Blog service seed plans
//!
//! Literal users and databases provisioned for the blog service, built on the
//! seedkit kernel.

pub mod plans;

/// Re-export commonly used types
pub use plans::*;
