// src/main.rs
use notification_sync::config::Settings;
use notification_sync::setup::{init_tracing, setup_and_run};
use structopt::StructOpt;
use tracing::{error, info};

#[derive(StructOpt, Debug)]
#[structopt(name = "notification-sync", about = "Keeps a user's dashboard notifications in sync")]
struct Opt {
    /// Settings file; defaults to ./notification-sync.{toml,yaml,json} when present
    #[structopt(short, long)]
    config: Option<String>,

    /// User whose notifications are synchronized
    #[structopt(short, long)]
    user: String,

    /// Bearer token, overriding api.token from settings
    #[structopt(short, long, env = "NOTIFICATION_SYNC_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let opt = Opt::from_args();

    let mut settings = match Settings::load(opt.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(token) = opt.token {
        settings.api.token = Some(token);
    }

    init_tracing(&settings.log_level);
    info!(user = %opt.user, "Starting notification sync");

    if let Err(e) = setup_and_run(settings, opt.user).await {
        error!(error = %e, "Notification sync stopped with an error");
        return Err(e);
    }
    Ok(())
}
