#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod api;
mod auth;
mod cli;
mod config;
mod logging;

use adrive_core::{DriveConfig, DriveCore};
use anyhow::Result;
use api::state::ServerState;
use clap::Parser;
use cli::{AddUserArgs, Cli, Commands};
use config::ServerConfig;
use std::sync::Arc;
use tracing::{info, warn};

const BOOTSTRAP_ADMIN: &str = "admin";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let drive_config = match &cli.data_dir {
        Some(dir) => DriveConfig::from_data_dir(dir),
        None => DriveConfig::load()?,
    };

    let _guard = logging::init(&drive_config.logs_dir())?;
    let core = Arc::new(DriveCore::open(drive_config).await?);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(core).await,
        Commands::AddUser(args) => add_user(&core, args),
        Commands::ListUsers => list_users(&core),
    }
}

async fn serve(core: Arc<DriveCore>) -> Result<()> {
    let config = ServerConfig::load()?;

    if let Some(hash) = config.admin_password_hash.as_deref()
        && core.bootstrap_admin(BOOTSTRAP_ADMIN, hash)?
    {
        info!(username = BOOTSTRAP_ADMIN, "Created bootstrap administrator");
    }
    if config.jwt_secret.is_none() {
        warn!("ADRIVE_JWT_SECRET is not set, every request is anonymous");
    }

    let state = Arc::new(ServerState {
        core: core.clone(),
        jwt_secret: config.jwt_secret.clone(),
        max_upload_bytes: config.max_upload_bytes,
    });
    let app = api::router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("adrive running on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let reusable files leave their serving window before exiting.
    core.exchange.wait_for_follow_ups().await;
    info!("adrive stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn add_user(core: &DriveCore, args: AddUserArgs) -> Result<()> {
    let user = core.register_user(&args.username, &args.password_hash, args.quota_gb, args.admin)?;
    println!(
        "Registered {} ({} GB{})",
        user.username,
        user.quota_gb,
        if user.is_admin { ", admin" } else { "" }
    );
    Ok(())
}

fn list_users(core: &DriveCore) -> Result<()> {
    for user in core.admin.list_users()? {
        println!(
            "{:<24} {:>8.1} / {:>8.1} GB {:>6} files{}",
            user.username,
            user.usage_gb,
            user.quota_gb,
            user.file_count,
            if user.is_admin { "  admin" } else { "" }
        );
    }
    Ok(())
}
