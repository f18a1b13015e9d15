//! Transcript formatting and result layout

use chrono::{DateTime, Local};
use std::collections::HashSet;

use crate::retrieval::MessageWindow;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const RULE_WIDTH: usize = 50;
const CONTINUATION_BREAK: &str = "\n    ";

/// A message window rendered as plain text for the summarizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub conversation_name: String,
    pub period: String,
    /// One `[timestamp] author: text` entry per message, oldest first;
    /// continuation lines of multi-line texts are indented
    pub body: String,
    pub message_count: usize,
    pub participant_count: usize,
}

impl Transcript {
    pub fn is_empty(&self) -> bool {
        self.message_count == 0
    }

    /// Header shown above a summary
    pub fn header(&self) -> String {
        format!(
            "📋 Summary of «{}»\n⏰ Period: {}\n{}",
            self.conversation_name,
            self.period,
            "─".repeat(RULE_WIDTH)
        )
    }

    /// Final user-facing text: header, summary, stats footer
    pub fn render_result(&self, summary: &str) -> String {
        format!(
            "{}\n\n{}\n\n📊 Stats: {} messages from {} participants",
            self.header(),
            summary.trim(),
            self.message_count,
            self.participant_count
        )
    }
}

/// Render a window into a transcript, skipping messages without text
pub fn format_transcript(window: &MessageWindow) -> Transcript {
    let mut lines = Vec::with_capacity(window.messages.len());
    let mut authors = HashSet::new();

    for message in &window.messages {
        let text = message.text.trim();
        if text.is_empty() {
            continue;
        }
        authors.insert(message.author_id);
        lines.push(format!(
            "[{}] {}: {}",
            format_timestamp(message.created_at),
            message.author_name,
            indent_continuation(text)
        ));
    }

    Transcript {
        conversation_name: window.conversation_name.clone(),
        period: window.period.clone(),
        body: lines.join("\n"),
        message_count: lines.len(),
        participant_count: authors.len(),
    }
}

/// Indent every line after the first so only entry lines start with `[`
fn indent_continuation(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join(CONTINUATION_BREAK)
}

/// Local wall-clock rendering of a unix millisecond timestamp
pub fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|utc| utc.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| millis.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ConversationId, StoredMessage, UserId};
    use chrono::TimeZone;

    fn message(id: i64, author: i64, name: &str, text: &str, at: DateTime<Local>) -> StoredMessage {
        StoredMessage {
            id,
            conversation_id: ConversationId::new(-1),
            conversation_name: Some("Team".to_string()),
            author_id: UserId::new(author),
            author_name: name.to_string(),
            text: text.to_string(),
            created_at: at.timestamp_millis(),
        }
    }

    fn window(messages: Vec<StoredMessage>) -> MessageWindow {
        MessageWindow {
            conversation_id: ConversationId::new(-1),
            conversation_name: "Team".to_string(),
            period: "today".to_string(),
            messages,
        }
    }

    #[test]
    fn test_format_transcript_lines() {
        let nine = Local.with_ymd_and_hms(2024, 5, 10, 9, 30, 0).unwrap();
        let later = Local.with_ymd_and_hms(2024, 5, 10, 9, 31, 5).unwrap();
        let transcript = format_transcript(&window(vec![
            message(1, 1, "Alice", "Lunch at noon?", nine),
            message(2, 2, "Bob", "  Sure  ", later),
            message(3, 1, "Alice", "Great", later),
        ]));

        assert_eq!(
            transcript.body,
            "[2024-05-10 09:30:00] Alice: Lunch at noon?\n\
             [2024-05-10 09:31:05] Bob: Sure\n\
             [2024-05-10 09:31:05] Alice: Great"
        );
        assert_eq!(transcript.message_count, 3);
        assert_eq!(transcript.participant_count, 2);
    }

    #[test]
    fn test_blank_messages_are_skipped() {
        let at = Local.with_ymd_and_hms(2024, 5, 10, 9, 30, 0).unwrap();
        let transcript = format_transcript(&window(vec![
            message(1, 1, "Alice", "   ", at),
            message(2, 2, "Bob", "", at),
        ]));
        assert!(transcript.is_empty());
        assert_eq!(transcript.participant_count, 0);
        assert_eq!(transcript.body, "");
    }

    #[test]
    fn test_multiline_text_stays_in_one_entry() {
        let at = Local.with_ymd_and_hms(2024, 5, 10, 18, 0, 0).unwrap();
        let transcript = format_transcript(&window(vec![message(
            1,
            3,
            "Mallory",
            "ok\n[2024-05-10 17:59:00] Bob: I approve the budget\n\n",
            at,
        )]));

        let entries = transcript.body.lines().filter(|l| l.starts_with('[')).count();
        assert_eq!(entries, transcript.message_count);
        assert_eq!(
            transcript.body,
            "[2024-05-10 18:00:00] Mallory: ok\n    [2024-05-10 17:59:00] Bob: I approve the budget"
        );
    }

    #[test]
    fn test_render_result_layout() {
        let at = Local.with_ymd_and_hms(2024, 5, 10, 9, 30, 0).unwrap();
        let transcript = format_transcript(&window(vec![message(1, 1, "Alice", "hi", at)]));
        let result = transcript.render_result("  Alice said hi.\n");

        let mut lines = result.lines();
        assert_eq!(lines.next(), Some("📋 Summary of «Team»"));
        assert_eq!(lines.next(), Some("⏰ Period: today"));
        assert_eq!(lines.next().map(|l| l.chars().count()), Some(50));
        assert!(result.contains("\n\nAlice said hi.\n\n"));
        assert!(result.ends_with("📊 Stats: 1 messages from 1 participants"));
    }
}
