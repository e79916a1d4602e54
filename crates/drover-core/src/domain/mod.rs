//! Domain model (ids, statuses, snapshots, event channels).

pub mod events;
pub mod ids;
pub mod process;
pub mod state;

pub use self::events::{ProcessEvent, UnknownEventError};
pub use self::ids::{ParseProcessIdError, ProcessId};
pub use self::process::ProcessSnapshot;
pub use self::state::{ProcessStatus, RunState};
