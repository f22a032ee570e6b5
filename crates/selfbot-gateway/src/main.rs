use std::sync::Arc;

use clap::Parser;
use tracing::info;

use selfbot_commands::{handlers, BotContext, Interceptor};
use selfbot_core::config::SelfbotConfig;
use selfbot_discord::{DiscordAdapter, DiscordService};

/// Command selfbot for your own Discord account.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Config file (default: $SELFBOT_CONFIG, then ~/.selfbot/selfbot.toml).
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "selfbot=info,selfbot_core=info,selfbot_commands=info,selfbot_discord=info".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    // explicit flag > SELFBOT_CONFIG env > ~/.selfbot/selfbot.toml
    let config_path = cli.config.or_else(|| std::env::var("SELFBOT_CONFIG").ok());
    let config = SelfbotConfig::load(config_path.as_deref())?;

    let (service, me) = DiscordService::connect(&config.discord.token).await?;
    info!(user = %me, prefix = %config.commands.prefix, "attached to account");

    let bot = Arc::new(BotContext::new(
        Arc::new(service),
        me,
        config.notices.lifetime(),
    ));
    let commands = Arc::new(handlers::registry());
    info!(count = commands.len(), "commands registered");

    let interceptor = Arc::new(Interceptor::new(
        bot,
        commands,
        config.commands.prefix.clone(),
    ));
    let adapter = DiscordAdapter::new(config.discord.token.clone(), interceptor);

    tokio::select! {
        _ = adapter.run() => {}
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("shutting down");
        }
    }

    Ok(())
}
