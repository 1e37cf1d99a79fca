//! CLI module for backoffice
//!
//! Provides command-line interface for the admin back-office server.

pub mod serve;

use clap::{Parser, Subcommand};

/// Admin back-office server - users, notices, documentation and audit logs
#[derive(Parser, Debug)]
#[command(name = "backoffice")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    BACKOFFICE_HOST              Bind address (default: 0.0.0.0)
    BACKOFFICE_PORT              Listen port (default: 8080)
    BACKOFFICE_LOG_LEVEL         Log level (default: info)
    BACKOFFICE_LOG_DIR           Directory for daily-rolling JSON logs
    BACKOFFICE_DATABASE_URL      Database URL
    BACKOFFICE_REDIS_URL         Redis URL (in-process cache if not set)
    BACKOFFICE_LIMITER_MAX       Requests per client IP per window (default: 20)
    BACKOFFICE_LIMITER_EXPIRATION_SECS
                                 Rate limit window in seconds (default: 30)
    BACKOFFICE_ADMIN_EMAIL       Initial admin email
    BACKOFFICE_ADMIN_USERNAME    Initial admin username (default: admin)
    BACKOFFICE_ADMIN_PASSWORD    Initial admin password (required on first run)
"#)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the back-office server
    Serve(serve::ServeArgs),
    /// Apply database migrations and exit
    Migrate(serve::ServeArgs),
}
