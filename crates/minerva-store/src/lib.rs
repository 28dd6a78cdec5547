//! Local side of the review loop: prompt lookup, snapshot cache, CSV export.

mod error;
pub use error::StoreError;

pub mod cache;
pub mod export;
pub mod prompts;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use cache::{RowSource, SnapshotCache};
pub use export::{snapshot_to_batch, write_snapshot_csv};
pub use prompts::{PromptCache, PromptLookup};

#[cfg(any(test, feature = "test-util"))]
pub use memory::MemorySheet;
