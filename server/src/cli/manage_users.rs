use crate::auth_session::SessionToken;
use crate::booking::validation::is_valid_phone;
use crate::cli::util::{query_user, query_user_and_check, query_user_bool};
use crate::cli::CliAuthTokenKey;
use crate::cli_error::CliError;
use crate::data_store::auth_token::AuthToken;
use crate::data_store::models::{NewUser, UserPatch};
use crate::data_store::{get_store_from_env, ListFilter, LittleLemonStore};
use crate::setup::get_secret_from_env;

pub fn print_user_list() -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;
    let auth_token = AuthToken::create_for_cli(&CliAuthTokenKey::new());
    let users = data_store.get_users(&auth_token, ListFilter::default())?;

    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED)
        .set_header(vec!["id", "email", "name", "phone", "manager"])
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic)
        .add_rows(users.into_iter().map(|user| {
            [
                user.id.to_string(),
                user.email,
                format!("{} {}", user.first_name, user.last_name)
                    .trim()
                    .to_owned(),
                user.phone_number.unwrap_or_default(),
                if user.is_manager { "yes" } else { "" }.to_owned(),
            ]
        }));

    println!("{table}");
    Ok(())
}

/// Interactively create a new user account
pub fn add_user() -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;
    let auth_token = AuthToken::create_for_cli(&CliAuthTokenKey::new());

    let email: String = query_user_and_check("Enter email address", |v: &String| {
        if v.contains('@') {
            Ok(())
        } else {
            Err("Not a valid email address")
        }
    });
    let first_name: String = query_user("Enter first name");
    let last_name: String = query_user("Enter last name");
    let phone_number: String = query_user_and_check(
        "Enter phone number (10 digits; empty value for none)",
        |v: &String| {
            if v.is_empty() || is_valid_phone(v) {
                Ok(())
            } else {
                Err("Phone number must be exactly 10 digits")
            }
        },
    );
    let is_manager = query_user_bool("Is the user a branch manager?", Some(false));

    let user = data_store.create_user(
        &auth_token,
        NewUser {
            email,
            first_name,
            last_name,
            phone_number: Some(phone_number).filter(|p| !p.is_empty()),
            is_manager,
        },
    )?;
    println!("Success. New user id: {}", user.id);
    Ok(())
}

/// Grant or revoke the branch manager role of the user with the given email address
pub fn set_manager(email: &str, is_manager: bool) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;
    let auth_token = AuthToken::create_for_cli(&CliAuthTokenKey::new());

    let user = data_store.get_user_by_email(&auth_token, email)?;
    data_store.update_user(
        &auth_token,
        user.id,
        UserPatch {
            is_manager: Some(is_manager),
            ..Default::default()
        },
    )?;
    println!(
        "User {} is {} a branch manager.",
        email,
        if is_manager { "now" } else { "no longer" }
    );
    Ok(())
}

/// Create a session token for the user with the given email address and print it to stdout.
///
/// The token can be used by API clients in the `X-SESSION-TOKEN` header.
pub fn issue_token(email: &str) -> Result<(), CliError> {
    let secret = get_secret_from_env()?;
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;
    let auth_token = AuthToken::create_for_cli(&CliAuthTokenKey::new());

    let user = data_store.get_user_by_email(&auth_token, email)?;
    println!("{}", SessionToken::new(user.id).as_string(&secret));
    Ok(())
}
