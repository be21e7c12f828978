mod chat;
mod send;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;
use santa_core::{config::load_config, open_storage, Config, SecretSanta};

use crate::bot::Bot;

pub async fn dispatch(matches: &ArgMatches) -> Result<()> {
    let config = resolve_config(matches).await?;
    let bot = open_bot(&config).await?;

    match matches.subcommand() {
        Some(("chat", _)) => chat::run(&bot).await,
        Some(("send", sub_m)) => send::run(&bot, sub_m).await,
        _ => anyhow::bail!("Unknown command. Run 'santa --help' for usage."),
    }
}

/// Layer CLI flags over the file and environment configuration
async fn resolve_config(matches: &ArgMatches) -> Result<Config> {
    let explicit = matches.get_one::<String>("config").map(Path::new);
    let mut config = load_config(explicit)
        .await
        .context("Failed to load configuration")?;

    if let Some(dir) = matches.get_one::<String>("data-dir") {
        config.data_dir = PathBuf::from(dir);
    }
    if let Some(backend) = matches.get_one::<String>("backend") {
        config.backend = backend
            .parse()
            .map_err(|_| anyhow::anyhow!("Unknown backend '{backend}'"))?;
    }
    Ok(config)
}

async fn open_bot(config: &Config) -> Result<Bot> {
    let storage = open_storage(config).await.with_context(|| {
        format!("Failed to open {} store at {}", config.backend, config.data_dir.display())
    })?;
    let santa = SecretSanta::open(storage, config)
        .await
        .context("Failed to load stored state")?;
    Ok(Bot::new(santa, config))
}
