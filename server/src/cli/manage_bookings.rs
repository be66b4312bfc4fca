use crate::booking::lifecycle::complete_past_bookings;
use crate::cli::CliAuthTokenKey;
use crate::cli_error::CliError;
use crate::data_store::auth_token::AuthToken;
use crate::data_store::{get_store_from_env, LittleLemonStore};
use crate::setup::get_timezone_from_env;

/// Mark all BOOKED bookings of past days (in the restaurant's timezone) as COMPLETED.
pub fn complete_bookings() -> Result<(), CliError> {
    let today = chrono::Utc::now()
        .with_timezone(&get_timezone_from_env()?)
        .date_naive();
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;
    let auth_token = AuthToken::create_for_cli(&CliAuthTokenKey::new());

    let count = complete_past_bookings(&mut *data_store, &auth_token, today)?;
    println!("{} bookings before {} marked as completed.", count, today);
    Ok(())
}
