use anyhow::{Context, Result};
use clap::ArgMatches;
use santa_core::ParticipantId;

use crate::bot::Bot;

pub async fn run(bot: &Bot, matches: &ArgMatches) -> Result<()> {
    let from = matches
        .get_one::<String>("from")
        .context("--from is required")?;
    let from = ParticipantId::parse(from).with_context(|| format!("Invalid sender '{from}'"))?;

    let text = matches
        .get_many::<String>("text")
        .map(|words| words.map(String::as_str).collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    if let Some(reply) = bot.handle(&from, &text).await {
        print!("{reply}");
    }
    Ok(())
}
