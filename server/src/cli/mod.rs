//! Implementation of the command line subcommands (apart from `serve`)

pub mod database_migration;
pub mod file_io;
pub mod manage_bookings;
pub mod manage_users;
mod util;

/// Key for creating [crate::data_store::auth_token::AuthToken]s with admin privileges for command
/// line functions. Only code in this crate can create it.
pub struct CliAuthTokenKey {
    _private: (),
}

impl CliAuthTokenKey {
    #[allow(clippy::new_without_default)] // We always want to explicitly create these objects
    pub fn new() -> Self {
        Self { _private: () }
    }
}
