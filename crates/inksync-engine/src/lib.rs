//! Reconciliation engine for directory-to-e-signature sync.
//!
//! Reduces each directory user's group memberships to a single target
//! group and role set, diffs the result against cached remote state,
//! and drives create/update/deactivate decisions through the connector.

pub mod directory;
pub mod engine;
pub mod error;
pub mod resolver;

pub use directory::DirectoryUser;
pub use engine::{SyncEngine, SyncSummary};
pub use error::{EngineError, EngineResult};
pub use resolver::{
    GroupBinding, GroupMapping, GroupMappingEntry, OrgScope, ResolvedAssignment, resolve,
    roles_match,
};
