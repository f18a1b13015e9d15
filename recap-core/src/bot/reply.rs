//! Transport-neutral replies
//!
//! All user-facing text is produced here from dialogue outcomes, so
//! transports only have to display `text` and turn `choices` into buttons.

use serde::Serialize;

use super::command::Action;
use crate::dialogue::{DialogueError, Outcome, WindowChoice};
use crate::retrieval::TimeWindow;
use crate::storage::ConversationSummary;

pub const WELCOME_TEXT: &str = "👋 Hi! I summarize group chat discussions.\n\n\
    Add me to a group and I will keep track of the conversation there. \
    Then ask me for a summary:\n\n\
    /summary - pick a group and a period\n\
    /summary today - today in your most active group\n\
    /summary 3h - the last 3 hours in your most active group\n\
    /help - show this message";

pub const HELP_TEXT: &str = "ℹ️ How to use me\n\n\
    1. Add me to a group chat\n\
    2. I store the messages written there\n\
    3. Send /summary to pick a group and a period\n\n\
    Shortcuts:\n\
    /summary today - summary of today\n\
    /summary 6h - summary of the last 6 hours\n\n\
    You can only summarize groups you have written in.";

const PROGRESS_TEXT: &str = "🔄 Creating summary, this may take a moment...";
const INVALID_TIME_TEXT: &str = "❌ Invalid time format. Use for example: /summary 3h";

/// A button offered with a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub label: String,
    pub action_id: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action_id: action.action_id(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            choices: Vec::new(),
        }
    }

    pub fn with_choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }

    pub fn welcome() -> Self {
        Self::text(WELCOME_TEXT)
    }

    pub fn help() -> Self {
        Self::text(HELP_TEXT)
    }

    pub fn invalid_time_format() -> Self {
        Self::text(INVALID_TIME_TEXT)
    }

    /// Notice sent while a summary is being produced
    pub fn progress() -> Self {
        Self::text(PROGRESS_TEXT)
    }
}

fn conversation_choice(conversation: &ConversationSummary) -> Choice {
    Choice::new(
        format!(
            "📋 {} ({} msgs)",
            conversation.display_name(),
            conversation.message_count
        ),
        Action::PickConversation(conversation.conversation_id),
    )
}

fn window_choice(choice: &WindowChoice) -> Choice {
    let icon = match choice.window {
        TimeWindow::Recent | TimeWindow::Today => "📅",
        TimeWindow::LastHours(_) => "⏰",
    };
    Choice::new(
        format!("{} {}", icon, capitalize(&choice.label)),
        Action::PickWindow(choice.window),
    )
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl From<Outcome> for Reply {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::ChooseConversation(conversations) => {
                Reply::text("📂 Choose a group to summarize:")
                    .with_choices(conversations.iter().map(conversation_choice).collect())
            }
            Outcome::ChooseWindow {
                conversation_name,
                windows,
                ..
            } => Reply::text(format!("⏱ Choose a period for «{}»:", conversation_name))
                .with_choices(windows.iter().map(window_choice).collect()),
            Outcome::NoConversations => Reply::text(
                "❌ I have no groups for you yet. Add me to a group and write something there first.",
            ),
            Outcome::NothingToSummarize {
                conversation_name,
                period,
            } => Reply::text(format!(
                "📭 No messages in «{}» for the selected period ({}).",
                conversation_name, period
            )),
            Outcome::Summary(text) => Reply::text(text),
            Outcome::SummaryFailed => {
                Reply::text("❌ Could not produce a summary. Please try again later.")
            }
            Outcome::Failed => Reply::text("❌ Something went wrong. Please try again later."),
            Outcome::Invalid(DialogueError::MalformedAction(_)) => {
                Reply::text("⚠️ Unknown selection. Use /summary to start again.")
            }
            Outcome::Invalid(_) => {
                Reply::text("⚠️ This selection is no longer valid. Use /summary to start again.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ConversationId;

    #[test]
    fn test_conversation_buttons() {
        let reply = Reply::from(Outcome::ChooseConversation(vec![
            ConversationSummary {
                conversation_id: ConversationId::new(-1),
                name: Some("Team".to_string()),
                last_activity: 2,
                message_count: 12,
            },
            ConversationSummary {
                conversation_id: ConversationId::new(-2),
                name: None,
                last_activity: 1,
                message_count: 1,
            },
        ]));

        assert_eq!(reply.choices[0].label, "📋 Team (12 msgs)");
        assert_eq!(reply.choices[0].action_id, "group_-1");
        assert_eq!(reply.choices[1].label, "📋 Group -2 (1 msgs)");
    }

    #[test]
    fn test_window_buttons() {
        let windows = TimeWindow::presets()
            .into_iter()
            .map(|window| WindowChoice {
                label: window.label(200),
                window,
            })
            .collect();
        let reply = Reply::from(Outcome::ChooseWindow {
            conversation_id: ConversationId::new(-1),
            conversation_name: "Team".to_string(),
            windows,
        });

        let labels: Vec<_> = reply.choices.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "📅 Last 200 messages",
                "📅 Today",
                "⏰ Last 3 hours",
                "⏰ Last 6 hours",
                "⏰ Last 12 hours"
            ]
        );
        assert_eq!(reply.choices[1].action_id, "time_today");
        assert!(reply.text.contains("«Team»"));
    }

    #[test]
    fn test_plain_outcomes_have_no_buttons() {
        for outcome in [
            Outcome::NoConversations,
            Outcome::SummaryFailed,
            Outcome::Failed,
            Outcome::Invalid(DialogueError::NoActiveSelection),
        ] {
            let reply = Reply::from(outcome);
            assert!(reply.choices.is_empty());
            assert!(!reply.text.is_empty());
        }
    }

    #[test]
    fn test_progress_notice() {
        let reply = Reply::progress();
        assert!(reply.text.starts_with("🔄 Creating summary"));
        assert!(reply.choices.is_empty());
    }
}
