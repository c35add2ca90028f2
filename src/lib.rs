pub mod config;
pub mod drive;
pub mod model;
pub mod remote;

pub use config::DriveConfig;
pub use drive::GoogleDrive;
pub use model::{DriveError, DriveResult, RemoteItem};

#[allow(unreachable_code)]
#[must_use]
pub const fn is_debug() -> bool {
    #[cfg(debug_assertions)]
    {
        return true;
    }
    false
}
