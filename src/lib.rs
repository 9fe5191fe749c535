//! Supabase work components
//!
//! Supabase Storage and database access packaged for use inside work components:
//! units with a `mount` and a `run` step and a construction-time resource config.
//! Destructive storage operations can be routed through an interactive confirmation.

pub mod confirm;
pub mod database;
pub mod error;
pub mod storage;
pub mod work;

pub use confirm::{Confirmer, Outcome, PendingAction};
pub use database::SupabaseDb;
pub use error::ConfigError;
pub use storage::{StorageBackend, StorageClient, StorageConfig, SupabaseStorage};
pub use work::{launch, CloudCompute, Work, WorkConfig};
