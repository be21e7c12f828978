//! Chat command dispatcher
//!
//! Maps one inbound chat message to a [`SecretSanta`] operation and returns
//! the reply text, if any. Transport agnostic: the console loop and the
//! one-shot `send` command both go through [`Bot::handle`].

use std::str::FromStr;

use santa_core::{Config, InputMode, ParticipantId, SecretSanta};
use strum::{AsRefStr, EnumString};

const FALLBACK: &str = "Super interesting! Sadly I don't know what to answer, \
     but I wish you a merry Christmas!\n";

const HELP: &str = "Hi! I am the Secret Santa 🎅 bot.\n\n\
/register - 🎁 join the Secret Santa. To take part you will need to provide an \
address 🏠, which will only be shared with your Secret Santa.\n\
/user_list - 🕵️ list the people registered so far.\n\n\
Once registered you can use:\n\
/delete_me - 😢 leave the Secret Santa.\n\
/my_info - see what I know about you.\n\
/add_address - 🏠 set your address. Make sure it includes your full name.\n\
/modify_address - 🏠 change your address.\n\
/add_message - 📬 leave a message for your Secret Santa: hints, a blacklist, anything useful!\n\
/modify_message - 📬 change that message.\n\n\
After the draw:\n\
/assign_me - find out who you are giving a gift to, with their address and message.\n";

const ADMIN_HELP: &str = "You are an admin! These commands are available to you too:\n\
/toggle_registrations - stop or restart registration and edits\n\
/assign - run the random assignment\n\
/incomplete_users - see who has not provided an address yet\n";

/// Bot commands, without the leading slash
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Command {
    Start,
    Help,
    Register,
    DeleteMe,
    MyInfo,
    AddAddress,
    ModifyAddress,
    AddMessage,
    ModifyMessage,
    AssignMe,
    UserList,
    Assign,
    IncompleteUsers,
    ToggleRegistrations,
}

impl Command {
    /// Parse the leading token of `text`; `/cmd@botname` is accepted.
    ///
    /// Returns `None` for free text and unknown commands.
    pub fn parse(text: &str) -> Option<Self> {
        let token = text.split_whitespace().next()?.strip_prefix('/')?;
        let name = token.split('@').next().unwrap_or(token);
        Self::from_str(name).ok()
    }

    /// Commands restricted to the admin allow-list
    pub const fn is_admin_only(self) -> bool {
        matches!(
            self,
            Self::Assign | Self::IncompleteUsers | Self::ToggleRegistrations
        )
    }

    /// Input mode this command starts, if any
    pub const fn input_mode(self) -> Option<InputMode> {
        match self {
            Self::AddAddress | Self::ModifyAddress => Some(InputMode::AwaitingAddress),
            Self::AddMessage | Self::ModifyMessage => Some(InputMode::AwaitingMessage),
            _ => None,
        }
    }
}

/// Dispatches chat messages for one exchange
pub struct Bot {
    santa: SecretSanta,
    admins: Vec<ParticipantId>,
    confirmation_phrase: String,
}

impl Bot {
    pub fn new(santa: SecretSanta, config: &Config) -> Self {
        Self {
            santa,
            admins: config.admins.clone(),
            confirmation_phrase: config.confirmation_phrase.clone(),
        }
    }

    fn is_admin(&self, id: &ParticipantId) -> bool {
        self.admins.contains(id)
    }

    /// Handle one message from `from`. `None` means stay silent.
    pub async fn handle(&self, from: &ParticipantId, text: &str) -> Option<String> {
        match Command::parse(text) {
            Some(command) => self.command(from, command).await,
            None => Some(self.free_text(from, text).await),
        }
    }

    async fn command(&self, from: &ParticipantId, command: Command) -> Option<String> {
        if let Some(mode) = command.input_mode() {
            return Some(self.santa.begin_input(from, mode).await.text);
        }

        self.santa.reset_input(from).await;
        let admin = self.is_admin(from);
        if command.is_admin_only() && !admin {
            tracing::warn!(participant = %from, command = command.as_ref(), "admin command ignored");
            return None;
        }
        tracing::debug!(participant = %from, command = command.as_ref(), "command");

        let text = match command {
            Command::Start | Command::Help => {
                let mut text = HELP.to_string();
                if admin {
                    text.push('\n');
                    text.push_str(ADMIN_HELP);
                }
                text
            }
            Command::Register => self.santa.register(from).await.text,
            Command::DeleteMe => self.santa.unregister(from).await.text,
            Command::MyInfo => {
                let info = self.santa.my_info(from).await.text;
                if admin {
                    format!("You are an admin!\n{info}")
                } else {
                    info
                }
            }
            Command::AssignMe => self.santa.child_for(from).await.text,
            Command::UserList => self.santa.participant_list().await.text,
            Command::Assign => format!(
                "{}If you want to run the assignment, write \"{}\"\n",
                self.santa.incomplete_report().await.text,
                self.confirmation_phrase
            ),
            Command::IncompleteUsers => self.santa.incomplete_report().await.text,
            Command::ToggleRegistrations => self.santa.toggle_registrations().await.text,
            Command::AddAddress
            | Command::ModifyAddress
            | Command::AddMessage
            | Command::ModifyMessage => return None,
        };
        Some(text)
    }

    async fn free_text(&self, from: &ParticipantId, text: &str) -> String {
        if let Some(reply) = self.santa.consume_input(from, text).await {
            return reply.text;
        }

        let confirmed = text.trim().to_lowercase() == self.confirmation_phrase.to_lowercase();
        if confirmed && self.is_admin(from) {
            tracing::info!(admin = %from, "assignment confirmed");
            return self.santa.run_assignment().await.text;
        }

        FALLBACK.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use santa_core::MemoryStorage;

    use super::*;

    fn id(name: &str) -> ParticipantId {
        ParticipantId::parse(name).unwrap()
    }

    async fn bot() -> Bot {
        let config = Config {
            admins: vec![id("elf")],
            seed: Some(7),
            ..Config::default()
        };
        let santa = SecretSanta::open(Arc::new(MemoryStorage::new()), &config)
            .await
            .unwrap();
        Bot::new(santa, &config)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/register"), Some(Command::Register));
        assert_eq!(
            Command::parse("/assign_me@SantaBot please"),
            Some(Command::AssignMe)
        );
        assert_eq!(Command::parse("hello /register"), None);
        assert_eq!(Command::parse("/unknown"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[tokio::test]
    async fn test_non_admin_gets_no_reply() {
        let bot = bot().await;
        for text in ["/assign", "/incomplete_users", "/toggle_registrations"] {
            assert_eq!(bot.handle(&id("amy"), text).await, None);
        }
        assert!(bot.handle(&id("elf"), "/assign").await.is_some());
    }

    #[tokio::test]
    async fn test_address_flow() {
        let bot = bot().await;
        bot.handle(&id("amy"), "/register").await;
        let prompt = bot.handle(&id("amy"), "/add_address@SantaBot").await.unwrap();
        assert!(prompt.contains("address"));

        let reply = bot.handle(&id("amy"), "1 Snow Lane").await.unwrap();
        assert!(reply.contains("1 Snow Lane"));

        let fallback = bot.handle(&id("amy"), "1 Snow Lane").await.unwrap();
        assert_eq!(fallback, FALLBACK);
    }

    #[tokio::test]
    async fn test_other_commands_reset_mode() {
        let bot = bot().await;
        bot.handle(&id("amy"), "/register").await;
        bot.handle(&id("amy"), "/add_message").await;
        bot.handle(&id("amy"), "/user_list").await;

        let reply = bot.handle(&id("amy"), "a book").await.unwrap();
        assert_eq!(reply, FALLBACK);
    }

    #[tokio::test]
    async fn test_confirmation_phrase_runs_assignment() {
        let bot = bot().await;
        for name in ["amy", "ben"] {
            bot.handle(&id(name), "/register").await;
            bot.handle(&id(name), "/add_address").await;
            bot.handle(&id(name), "somewhere").await;
        }

        let phrase = Config::default().confirmation_phrase;
        assert_eq!(bot.handle(&id("amy"), &phrase).await.unwrap(), FALLBACK);

        let done = bot
            .handle(&id("elf"), &phrase.to_uppercase())
            .await
            .unwrap();
        assert!(done.contains("Congratulations"));

        let child = bot.handle(&id("amy"), "/assign_me").await.unwrap();
        assert!(child.contains("ben"));
    }

    #[tokio::test]
    async fn test_admin_sees_admin_help() {
        let bot = bot().await;
        let admin = bot.handle(&id("elf"), "/help").await.unwrap();
        let user = bot.handle(&id("amy"), "/start").await.unwrap();
        assert!(admin.contains("/toggle_registrations"));
        assert!(!user.contains("/toggle_registrations"));
        assert!(bot
            .handle(&id("elf"), "/my_info")
            .await
            .unwrap()
            .starts_with("You are an admin!"));
    }
}
