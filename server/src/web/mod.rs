use crate::cli_error::CliError;
use crate::data_store::get_store_from_env;
use crate::setup::{
    get_buffer_tables_from_env, get_listen_address_from_env, get_listen_port_from_env,
    get_secret_from_env, get_timezone_from_env,
};
use actix_web::{middleware, web, App, HttpServer};
use chrono::NaiveDate;
use std::sync::Arc;

mod api;
mod http_error_logging;
mod util;

pub fn serve() -> Result<(), CliError> {
    let state = AppState::new()?;
    let listen_address = get_listen_address_from_env()?;
    let listen_port = get_listen_port_from_env()?;
    log::info!(
        "Starting littlelemon_server {} on {}:{} (timezone {}, {} buffer tables per branch)",
        crate::get_version(),
        listen_address,
        listen_port,
        state.timezone,
        state.buffer_tables
    );
    actix_web::rt::System::new()
        .block_on(
            HttpServer::new(move || {
                App::new()
                    .configure(api::configure_app)
                    .app_data(web::Data::new(state.clone()))
                    .wrap(middleware::from_fn(
                        http_error_logging::error_logging_middleware,
                    ))
                    .wrap(middleware::Compress::default())
            })
            .bind((listen_address, listen_port))
            .map_err(CliError::BindError)?
            .run(),
        )
        .map_err(CliError::ServerError)
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn crate::data_store::LittleLemonStore>,
    secret: String,
    /// Number of tables per branch kept free for walk-in guests
    buffer_tables: i64,
    /// Timezone of the restaurants, defining the current date for booking validation
    timezone: chrono_tz::Tz,
}

impl AppState {
    pub fn new() -> Result<Self, CliError> {
        Ok(Self {
            store: Arc::new(get_store_from_env()?),
            secret: get_secret_from_env()?,
            buffer_tables: get_buffer_tables_from_env()?,
            timezone: get_timezone_from_env()?,
        })
    }

    /// The current date in the restaurants' timezone
    fn today(&self) -> NaiveDate {
        chrono::Utc::now().with_timezone(&self.timezone).date_naive()
    }
}
