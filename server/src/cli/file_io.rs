use crate::cli::CliAuthTokenKey;
use crate::cli_error::CliError;
use crate::data_store::auth_token::AuthToken;
use crate::data_store::{get_store_from_env, models, LittleLemonStore, StoreError};
use littlelemon_api_types::{Branch, Holiday, MenuItem, User};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// Contents of a sample data file, as read by [load_data_from_file]
#[derive(Serialize, Deserialize)]
struct SampleData {
    #[serde(default)]
    branches: Vec<Branch>,
    #[serde(default)]
    menu: Vec<MenuItem>,
    #[serde(default)]
    holidays: Vec<Holiday>,
    #[serde(default)]
    users: Vec<User>,
}

/// Load branches, menu items, holidays and user accounts from a JSON file into the database.
///
/// Entities which already exist (same branch label, menu item title or user email) are skipped,
/// so the same file can be loaded repeatedly.
pub fn load_data_from_file(path: &PathBuf) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let f = File::open(path).map_err(|e| {
        CliError::FileError(format!("Could not open {:?} for reading: {}", path, e))
    })?;
    let data: SampleData = serde_json::from_reader(BufReader::new(f))?;

    let auth_token = AuthToken::create_for_cli(&CliAuthTokenKey::new());
    let mut skipped = 0;
    for branch in data.branches {
        skipped += skip_existing(data_store.create_branch(&auth_token, branch.into()))?;
    }
    for menu_item in data.menu {
        skipped += skip_existing(data_store.create_menu_item(&auth_token, menu_item.into()))?;
    }
    for holiday in data.holidays {
        data_store.create_holiday(&auth_token, models::NewHoliday::from(holiday))?;
    }
    for user in data.users {
        skipped += skip_existing(data_store.create_user(&auth_token, user.into()))?;
    }

    if skipped > 0 {
        log::info!("Skipped {} already existing entities.", skipped);
    }
    println!("Success.");
    Ok(())
}

fn skip_existing<T>(result: Result<T, StoreError>) -> Result<usize, CliError> {
    match result {
        Ok(_) => Ok(0),
        Err(StoreError::ConflictEntityExists) => Ok(1),
        Err(e) => Err(e.into()),
    }
}
