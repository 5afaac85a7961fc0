//! Core types for seedkit: settings, the seed model, and the provisioner seam.

pub mod error;
pub mod memory;
pub mod plan;
pub mod provisioner;
pub mod seed;
pub mod settings;

pub use error::SeedError;
pub use memory::MemoryProvisioner;
pub use plan::{SeedOutcome, SeedPlan, SeedReport};
pub use provisioner::Provisioner;
pub use seed::{Fixture, FixtureDocument, RoleGrant, SeedRequest, UserRecord, Variant};
