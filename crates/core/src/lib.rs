pub mod engine;
pub mod frontmatter;
pub mod marker;
pub mod note;
pub mod schema;
pub mod state;
pub mod store;
pub mod vault;

pub use engine::GtdEngine;
pub use frontmatter::Frontmatter;
pub use marker::{Marker, marker_id, scan_note};
pub use schema::{TaskKind, TaskStatus};
pub use state::SyncStateFile;
pub use store::{SyncEntry, SyncStore};
pub use vault::{FsVault, MemVault, Vault};
