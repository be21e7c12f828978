use anyhow::Result;
use santa_core::ParticipantId;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::bot::Bot;

/// Answer `@user message` lines from stdin until EOF
pub async fn run(bot: &Bot) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    tracing::info!("chat started; send '@user message' lines, EOF to quit");

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((from, text)) = parse_line(line) else {
            tracing::warn!(line, "expected '@user message'");
            continue;
        };

        if let Some(reply) = bot.handle(&from, text).await {
            println!("[@{from}] {}", reply.trim_end());
        }
    }

    tracing::info!("chat finished");
    Ok(())
}

/// Split `@user rest` into a sender and the message text
fn parse_line(line: &str) -> Option<(ParticipantId, &str)> {
    if !line.starts_with('@') {
        return None;
    }
    let (user, text) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let from = ParticipantId::parse(user).ok()?;
    Some((from, text.trim_start()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let (from, text) = parse_line("@amy /register now").unwrap();
        assert_eq!(from.as_str(), "amy");
        assert_eq!(text, "/register now");

        let (from, text) = parse_line("@ben").unwrap();
        assert_eq!(from.as_str(), "ben");
        assert_eq!(text, "");

        assert!(parse_line("amy /register").is_none());
        assert!(parse_line("@a/b hi").is_none());
    }
}
