pub mod nav;
pub mod record;
pub mod reveal;
pub mod schema;
pub mod snapshot;
pub mod update;

pub use nav::{Direction, NavError, Navigator, Reanchor};
pub use record::{AiLabel, Decision, FormVariant, Record};
pub use reveal::{RevealGate, RevealMode};
pub use schema::sheet;
pub use snapshot::{Filter, Progress, Snapshot};
pub use update::RowUpdate;
