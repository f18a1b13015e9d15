//! Command and action parsing

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use crate::dialogue::DialogueError;
use crate::retrieval::TimeWindow;
use crate::storage::{ConversationId, COMMAND_PREFIX};

const CONVERSATION_ACTION_PREFIX: &str = "group_";
const WINDOW_ACTION_PREFIX: &str = "time_";

/// Commands the bot reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// Interactive selection
    Summary,
    SummaryToday,
    SummaryLastHours(NonZeroU32),
    /// `/summary` with an hour argument that is not a positive integer
    InvalidSummaryArgument(String),
}

/// Parse a command text such as `/summary 3h` or `/start@recap_bot`
///
/// Returns `None` for plain text and for commands the bot does not know.
pub fn parse_command(text: &str) -> Option<Command> {
    let mut parts = text.trim().split_whitespace();
    let head = parts.next()?.strip_prefix(COMMAND_PREFIX)?;
    let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();
    let argument = parts.next();

    match name.as_str() {
        "start" => Some(Command::Start),
        "help" => Some(Command::Help),
        "summary" => Some(summary_command(argument)),
        _ => None,
    }
}

fn summary_command(argument: Option<&str>) -> Command {
    let Some(argument) = argument else {
        return Command::Summary;
    };
    let lowered = argument.to_ascii_lowercase();
    if lowered == "today" {
        return Command::SummaryToday;
    }
    if lowered.ends_with('h') {
        return match lowered.parse::<TimeWindow>() {
            Ok(TimeWindow::LastHours(hours)) => Command::SummaryLastHours(hours),
            _ => Command::InvalidSummaryArgument(argument.to_string()),
        };
    }
    // Anything else opens the picker
    Command::Summary
}

/// A button press, encoded in the button's action id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PickConversation(ConversationId),
    PickWindow(TimeWindow),
}

impl Action {
    pub fn action_id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PickConversation(id) => write!(f, "{CONVERSATION_ACTION_PREFIX}{id}"),
            Self::PickWindow(window) => write!(f, "{WINDOW_ACTION_PREFIX}{}", window.token()),
        }
    }
}

impl FromStr for Action {
    type Err = DialogueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DialogueError::MalformedAction(s.to_string());
        if let Some(id) = s.strip_prefix(CONVERSATION_ACTION_PREFIX) {
            return id
                .parse::<ConversationId>()
                .map(Self::PickConversation)
                .map_err(|_| malformed());
        }
        if let Some(token) = s.strip_prefix(WINDOW_ACTION_PREFIX) {
            return token
                .parse::<TimeWindow>()
                .map(Self::PickWindow)
                .map_err(|_| malformed());
        }
        Err(malformed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours(h: u32) -> NonZeroU32 {
        NonZeroU32::new(h).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command("/help@recap_bot"), Some(Command::Help));
        assert_eq!(parse_command("  /summary  "), Some(Command::Summary));
        assert_eq!(parse_command("/summary today"), Some(Command::SummaryToday));
        assert_eq!(parse_command("/summary@recap_bot 6h"), Some(Command::SummaryLastHours(hours(6))));
        assert_eq!(parse_command("/summary 48H"), Some(Command::SummaryLastHours(hours(48))));
    }

    #[test]
    fn test_invalid_hour_arguments() {
        for arg in ["0h", "-3h", "xh", "h"] {
            assert_eq!(
                parse_command(&format!("/summary {arg}")),
                Some(Command::InvalidSummaryArgument(arg.to_string())),
                "{arg}"
            );
        }
        // Non-hour arguments fall back to the picker
        assert_eq!(parse_command("/summary please"), Some(Command::Summary));
    }

    #[test]
    fn test_non_commands() {
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("/unknown"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("/"), None);
    }

    #[test]
    fn test_action_ids() {
        let pick = Action::PickConversation(ConversationId::new(-1001));
        assert_eq!(pick.action_id(), "group_-1001");
        assert_eq!("group_-1001".parse::<Action>().unwrap(), pick);

        let window = Action::PickWindow(TimeWindow::last_hours(3).unwrap());
        assert_eq!(window.action_id(), "time_3h");
        assert_eq!("time_today".parse::<Action>().unwrap(), Action::PickWindow(TimeWindow::Today));
    }

    #[test]
    fn test_malformed_actions() {
        for bad in ["group_abc", "time_0h", "time_week", "delete_1", ""] {
            assert_eq!(
                bad.parse::<Action>(),
                Err(DialogueError::MalformedAction(bad.to_string()))
            );
        }
    }
}
