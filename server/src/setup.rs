use crate::booking::DEFAULT_BUFFER_TABLES;
use std::env;
use std::env::VarError;
use std::fmt::{Display, Formatter};

/// Get the database URL from the environment variable.
pub fn get_database_url_from_env() -> Result<String, SetupError> {
    env::var("DATABASE_URL").map_err(|e| SetupError::from_env_error(e, "DATABASE_URL"))
}

/// Get the cryptographic application secret for signing secure tokens from the environment variable.
pub fn get_secret_from_env() -> Result<String, SetupError> {
    env::var("SECRET").map_err(|e| SetupError::from_env_error(e, "SECRET"))
}

/// Get the web server TCP listening port from the environment variable
pub fn get_listen_port_from_env() -> Result<u16, SetupError> {
    env::var("LISTEN_PORT")
        .map_err(|e| SetupError::from_env_error(e, "LISTEN_PORT"))
        .and_then(|v| {
            v.parse().map_err(|_| SetupError::EnvVariableInvalid {
                variable_name: "LISTEN_PORT",
                problem: "Not a valid uint16",
            })
        })
}

/// Get the web server TCP listening interface address from the environment variable
pub fn get_listen_address_from_env() -> Result<String, SetupError> {
    env::var("LISTEN_ADDRESS").map_err(|e| SetupError::from_env_error(e, "LISTEN_ADDRESS"))
}

/// Get the number of tables per branch to keep free for walk-in guests from the environment
/// variable. Defaults to [DEFAULT_BUFFER_TABLES] if not set.
pub fn get_buffer_tables_from_env() -> Result<i64, SetupError> {
    match env::var("BOOKING_BUFFER_TABLES") {
        Err(VarError::NotPresent) => Ok(DEFAULT_BUFFER_TABLES),
        Err(e) => Err(SetupError::from_env_error(e, "BOOKING_BUFFER_TABLES")),
        Ok(v) => match v.parse::<i64>() {
            Ok(value) if value >= 0 => Ok(value),
            _ => Err(SetupError::EnvVariableInvalid {
                variable_name: "BOOKING_BUFFER_TABLES",
                problem: "Not a non-negative integer",
            }),
        },
    }
}

/// Get the timezone of the restaurant (IANA name, e.g. "Asia/Kolkata") from the environment
/// variable. It defines the current date for booking validation. Defaults to UTC if not set.
pub fn get_timezone_from_env() -> Result<chrono_tz::Tz, SetupError> {
    match env::var("RESTAURANT_TIMEZONE") {
        Err(VarError::NotPresent) => Ok(chrono_tz::UTC),
        Err(e) => Err(SetupError::from_env_error(e, "RESTAURANT_TIMEZONE")),
        Ok(v) => v.parse().map_err(|_| SetupError::EnvVariableInvalid {
            variable_name: "RESTAURANT_TIMEZONE",
            problem: "Not a known IANA timezone name",
        }),
    }
}

#[derive(Debug)]
pub enum SetupError {
    EnvVariableMissing {
        variable_name: &'static str,
    },
    EnvVariableInvalid {
        variable_name: &'static str,
        problem: &'static str,
    },
}

impl SetupError {
    fn from_env_error(error: VarError, variable_name: &'static str) -> Self {
        match error {
            VarError::NotPresent => Self::EnvVariableMissing { variable_name },
            VarError::NotUnicode(_) => Self::EnvVariableInvalid {
                variable_name,
                problem: "no valid unicode",
            },
        }
    }
}

impl Display for SetupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupError::EnvVariableMissing { variable_name } => {
                write!(f, "Environment variable {} must be defined", variable_name)
            }
            SetupError::EnvVariableInvalid {
                variable_name,
                problem,
            } => write!(
                f,
                "Value of environment variable {} is invalid: {}",
                variable_name, problem
            ),
        }
    }
}

impl std::error::Error for SetupError {}
