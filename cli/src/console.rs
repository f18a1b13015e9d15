//! Line-oriented console transport
//!
//! Simulates a chat platform on stdin/stdout so the bot can be run and
//! inspected locally:
//!
//! ```text
//! title -100 Book club
//! name 1 Alice
//! say -100 1 What are we reading next?
//! dm 1 /summary
//! press 1 group_-100
//! press 1 time_today
//! ```

use recap_core::storage::ConversationStorage;
use recap_core::{Bot, ConversationId, InboundEvent, IncomingText, ProgressHook, Reply, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

pub const USAGE: &str = "Commands:\n\
    \x20 say <chat_id> <user_id> <text>   - message in a group chat\n\
    \x20 dm <user_id> <text>              - private message to the bot (e.g. /summary)\n\
    \x20 press <user_id> <action_id>      - press a reply button\n\
    \x20 title <chat_id> <title>          - set a group title\n\
    \x20 name <user_id> <name>            - set a user display name\n\
    \x20 stats                            - ingestion counters\n\
    \x20 help                             - show this help\n\
    \x20 quit                             - exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Say {
        chat_id: ConversationId,
        user_id: UserId,
        text: String,
    },
    Dm {
        user_id: UserId,
        text: String,
    },
    Press {
        user_id: UserId,
        action_id: String,
    },
    Title {
        chat_id: ConversationId,
        title: String,
    },
    Name {
        user_id: UserId,
        name: String,
    },
    Stats,
    Help,
    Quit,
}

/// Split off the first whitespace-delimited word
fn next_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (input, ""),
    }
}

fn parse_id<T: std::str::FromStr>(word: &str, what: &str) -> Result<T, String> {
    word.parse()
        .map_err(|_| format!("Invalid {}: '{}'", what, word))
}

fn require_text<'a>(rest: &'a str, usage: &str) -> Result<&'a str, String> {
    if rest.trim().is_empty() {
        Err(format!("Usage: {}", usage))
    } else {
        Ok(rest)
    }
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let (command, rest) = next_word(line);
        match command.to_ascii_lowercase().as_str() {
            "say" => {
                let (chat, rest) = next_word(rest);
                let (user, text) = next_word(rest);
                Ok(Self::Say {
                    chat_id: parse_id(chat, "chat id")?,
                    user_id: parse_id(user, "user id")?,
                    text: require_text(text, "say <chat_id> <user_id> <text>")?.to_string(),
                })
            }
            "dm" => {
                let (user, text) = next_word(rest);
                Ok(Self::Dm {
                    user_id: parse_id(user, "user id")?,
                    text: require_text(text, "dm <user_id> <text>")?.to_string(),
                })
            }
            "press" => {
                let (user, action) = next_word(rest);
                Ok(Self::Press {
                    user_id: parse_id(user, "user id")?,
                    action_id: require_text(action, "press <user_id> <action_id>")?
                        .trim()
                        .to_string(),
                })
            }
            "title" => {
                let (chat, title) = next_word(rest);
                Ok(Self::Title {
                    chat_id: parse_id(chat, "chat id")?,
                    title: require_text(title, "title <chat_id> <title>")?.trim().to_string(),
                })
            }
            "name" => {
                let (user, name) = next_word(rest);
                Ok(Self::Name {
                    user_id: parse_id(user, "user id")?,
                    name: require_text(name, "name <user_id> <name>")?.trim().to_string(),
                })
            }
            "stats" => Ok(Self::Stats),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            "" => Err("Empty command".to_string()),
            other => Err(format!("Unknown command: {}. Type help for available commands.", other)),
        }
    }
}

/// Render a reply the way a chat client would show it
pub fn render_reply(reply: &Reply) -> String {
    let mut out = reply.text.clone();
    for choice in &reply.choices {
        out.push_str(&format!("\n  [{}] {}", choice.action_id, choice.label));
    }
    out
}

/// Progress notice addressed to one user
pub fn progress_line(user_id: UserId) -> String {
    format!("(to {}) {}", user_id, render_reply(&Reply::progress()))
}

/// Print the progress notice as soon as a summary starts
pub fn progress_hook() -> ProgressHook {
    Arc::new(|user_id: UserId| println!("{}\n", progress_line(user_id)))
}

pub enum Step {
    Output(String),
    Silent,
    Exit,
}

pub struct Console<S: ?Sized> {
    bot: Arc<Bot<S>>,
    titles: HashMap<ConversationId, String>,
    names: HashMap<UserId, String>,
}

impl<S: ConversationStorage + ?Sized> Console<S> {
    pub fn new(bot: Arc<Bot<S>>) -> Self {
        Self {
            bot,
            titles: HashMap::new(),
            names: HashMap::new(),
        }
    }

    pub async fn execute(&mut self, command: ConsoleCommand) -> Step {
        let reply = match command {
            ConsoleCommand::Say {
                chat_id,
                user_id,
                text,
            } => {
                let mut message = IncomingText::group(chat_id, user_id, text);
                message.conversation_name = self.titles.get(&chat_id).cloned();
                message.author_name = self.names.get(&user_id).cloned();
                self.bot.handle(InboundEvent::Text(message)).await
            }
            ConsoleCommand::Dm { user_id, text } => {
                let mut message = IncomingText::private(user_id, text);
                message.author_name = self.names.get(&user_id).cloned();
                self.bot.handle(InboundEvent::Text(message)).await
            }
            ConsoleCommand::Press { user_id, action_id } => {
                self.bot
                    .handle(InboundEvent::Action { user_id, action_id })
                    .await
            }
            ConsoleCommand::Title { chat_id, title } => {
                self.titles.insert(chat_id, title);
                return Step::Silent;
            }
            ConsoleCommand::Name { user_id, name } => {
                self.names.insert(user_id, name);
                return Step::Silent;
            }
            ConsoleCommand::Stats => {
                let stats = self.bot.stats();
                return Step::Output(format!(
                    "accepted: {}, rejected: {}, failed: {}",
                    stats.accepted, stats.rejected, stats.failed
                ));
            }
            ConsoleCommand::Help => return Step::Output(USAGE.to_string()),
            ConsoleCommand::Quit => return Step::Exit,
        };

        match reply {
            Some(reply) => Step::Output(render_reply(&reply)),
            None => Step::Silent,
        }
    }

    /// Read commands from stdin until EOF or `quit`
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        stdout.write_all(b"Type help for commands, Ctrl+D or quit to exit.\n").await?;
        stdout.flush().await?;

        while let Some(line) = lines.next_line().await? {
            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            let output = match ConsoleCommand::parse(input) {
                Ok(command) => match self.execute(command).await {
                    Step::Output(text) => text,
                    Step::Silent => continue,
                    Step::Exit => break,
                },
                Err(err) => err,
            };
            stdout.write_all(format!("{}\n\n", output).as_bytes()).await?;
            stdout.flush().await?;
        }

        self.bot.log_stats();
        Ok(())
    }
}
