pub mod snapshot;
pub mod state;

pub use snapshot::{take_snapshot, LibrarySnapshot};
pub use state::AppState;
