use clap::ArgAction;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use littlelemon_server::cli;
use littlelemon_server::cli_error::CliError;
use log::{error, warn};
use std::path::PathBuf;

fn main() {
    let args = CliArgs::parse();
    let dotenv_result = dotenv();

    let env = env_logger::Env::new().filter_or(
        "RUST_LOG",
        match args.global_opts.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        },
    );
    env_logger::Builder::from_env(env).init();
    if let Err(e) = dotenv_result {
        warn!("Could not read .env file: {}", e);
    }

    if let Err(e) = run_command(args.command) {
        error!("{}", e);
        std::process::exit(e.exit_code());
    }
}

fn run_command(command: Command) -> Result<(), CliError> {
    match command {
        Command::Serve => {
            cli::database_migration::check_migration_state()?;
            littlelemon_server::web::serve()
        }
        Command::MigrateDb => cli::database_migration::run_migrations(),
        Command::LoadData { path } => cli::file_io::load_data_from_file(&path),
        Command::User(UserCommand::List) => cli::manage_users::print_user_list(),
        Command::User(UserCommand::Add) => cli::manage_users::add_user(),
        Command::User(UserCommand::SetManager { email, revoke }) => {
            cli::manage_users::set_manager(&email, !revoke)
        }
        Command::IssueToken { email } => cli::manage_users::issue_token(&email),
        Command::CompleteBookings => cli::manage_bookings::complete_bookings(),
    }
}

/// Table reservation and menu management backend of the Little Lemon restaurants
#[derive(Debug, Parser)]
#[clap(name = "littlelemon_server", version)]
pub struct CliArgs {
    #[clap(flatten)]
    global_opts: GlobalOpts,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the REST API
    Serve,
    /// Apply pending database schema migrations
    MigrateDb,
    /// Load branches, menu, holidays and users from JSON file
    LoadData {
        /// The path of the JSON file to read from
        path: PathBuf,
    },
    /// Manage user accounts
    #[clap(subcommand)]
    User(UserCommand),
    /// Print a session token for the user with the given email address
    IssueToken { email: String },
    /// Mark all booked bookings of past days as completed
    CompleteBookings,
}

#[derive(Debug, Subcommand)]
enum UserCommand {
    /// List all user accounts
    List,
    /// Interactively create a new user account
    Add,
    /// Grant the branch manager role to a user
    SetManager {
        email: String,
        /// Revoke the role instead
        #[clap(long)]
        revoke: bool,
    },
}

#[derive(Debug, Args)]
struct GlobalOpts {
    /// Verbosity level (can be specified multiple times)
    #[clap(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,
}
