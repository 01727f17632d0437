use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "adrive-server")]
#[command(version, about = "adrive - share files with short numeric codes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Data directory (defaults to ~/.adrive)
    #[arg(long, global = true, env = "ADRIVE_DIR")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Register an account
    AddUser(AddUserArgs),

    /// List accounts with their usage
    ListUsers,
}

#[derive(Args)]
pub struct AddUserArgs {
    #[arg(long)]
    pub username: String,

    /// Credential produced by the external password hasher
    #[arg(long)]
    pub password_hash: String,

    /// Quota in GB (defaults to the configured default quota)
    #[arg(long)]
    pub quota_gb: Option<f64>,

    #[arg(long)]
    pub admin: bool,
}
