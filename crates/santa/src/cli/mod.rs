pub mod handlers;

use anyhow::Result;
use clap::{Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    Command::new("santa")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Secret Santa registration and assignment bot")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("PATH")
                .help("Config file to use instead of .santa/config.toml"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .global(true)
                .value_name("PATH")
                .help("Directory holding the participant store"),
        )
        .arg(
            Arg::new("backend")
                .long("backend")
                .global(true)
                .value_parser(["memory", "json", "sqlite"])
                .help("Persistence backend"),
        )
        .subcommand(cmd_chat())
        .subcommand(cmd_send())
}

fn cmd_chat() -> Command {
    Command::new("chat")
        .about("Read '@user message' lines from stdin and answer each one")
}

fn cmd_send() -> Command {
    Command::new("send")
        .about("Deliver a single message and print the reply")
        .arg(
            Arg::new("from")
                .long("from")
                .required(true)
                .value_name("USER")
                .help("Sender's username"),
        )
        .arg(
            Arg::new("text")
                .required(true)
                .num_args(1..)
                .action(ArgAction::Append)
                .trailing_var_arg(true)
                .allow_hyphen_values(true)
                .help("Message text, e.g. /register"),
        )
}

/// Install the stderr log subscriber
///
/// Defaults to INFO; `RUST_LOG` adds directives.
///
/// # Errors
/// Returns an error if a subscriber is already installed
pub fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_send_collects_words() {
        let matches = build_cli()
            .try_get_matches_from([
                "santa", "send", "--backend", "memory", "--from", "amy", "hello", "there",
            ])
            .unwrap();
        assert_eq!(
            matches.get_one::<String>("backend").map(String::as_str),
            Some("memory")
        );
        let (_, send) = matches.subcommand().unwrap();
        let words: Vec<&String> = send.get_many::<String>("text").unwrap().collect();
        assert_eq!(words, ["hello", "there"]);
    }
}
