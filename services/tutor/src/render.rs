//! Prints the conversation as it changes.

use lumina_core::{ConversationStore, Message, MessageKind, Role, Status};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Follows a session's store and prints every new message and flag change
/// until the session is dropped.
pub fn spawn(mut rx: watch::Receiver<ConversationStore>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut view = View::default();
        loop {
            let lines = view.update(&rx.borrow_and_update());
            for line in lines {
                println!("{line}");
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    })
}

/// What has already been printed for one session.
#[derive(Debug, Default)]
pub struct View {
    rendered: usize,
    awaiting_response: Status,
    speaking: Status,
}

impl View {
    /// Lines describing everything that changed since the previous update.
    pub fn update(&mut self, store: &ConversationStore) -> Vec<String> {
        let mut lines: Vec<String> = store
            .messages()
            .iter()
            .skip(self.rendered)
            .map(format_message)
            .collect();
        self.rendered = store.len();

        if store.awaiting_response() != self.awaiting_response {
            self.awaiting_response = store.awaiting_response();
            if store.is_awaiting_response() {
                lines.push("  thinking...".to_string());
            }
        }
        if store.speaking() != self.speaking {
            self.speaking = store.speaking();
            lines.push(if store.is_speaking() {
                "  speaking...".to_string()
            } else {
                "  (done speaking)".to_string()
            });
        }
        lines
    }
}

pub fn format_message(message: &Message) -> String {
    let speaker = match message.role {
        Role::User => "you",
        Role::Assistant => "lumina",
    };
    match message.kind {
        MessageKind::Text => format!("{speaker}> {}\n", message.content),
        MessageKind::Image => format!("{speaker}> {}\n", describe_image(&message.content)),
        MessageKind::Audio => format!("{speaker}> [audio]\n"),
    }
}

/// Summarizes a `data:<mime>;base64,<payload>` URI as
/// `[image: <mime>, <n> bytes]`.
pub fn describe_image(uri: &str) -> String {
    let Some((header, data)) = uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
    else {
        return "[image]".to_string();
    };
    let mime = header.strip_suffix(";base64").unwrap_or(header);
    let padding = data.bytes().rev().take_while(|b| *b == b'=').count();
    let bytes = (data.len() / 4 * 3).saturating_sub(padding);
    format!("[image: {mime}, {bytes} bytes]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_core::provider::OfflineProvider;
    use lumina_core::{Difficulty, SessionConfig, SilentPlayer, Subject, TutorSession};
    use std::sync::Arc;

    #[test]
    fn test_describe_image() {
        assert_eq!(
            describe_image("data:image/png;base64,iVBORw0KGgo="),
            "[image: image/png, 8 bytes]"
        );
        assert_eq!(
            describe_image("data:image/jpeg;base64,AAAA"),
            "[image: image/jpeg, 3 bytes]"
        );
        assert_eq!(describe_image("https://example.com/a.png"), "[image]");
    }

    #[tokio::test]
    async fn test_view_prints_each_message_once() {
        let session = TutorSession::new(
            SessionConfig::new(Subject::Coding, Difficulty::Intermediate),
            Arc::new(OfflineProvider::default()),
            Arc::new(SilentPlayer),
        );
        let mut view = View::default();
        assert!(view.update(&session.snapshot()).is_empty());

        session.ask("What is recursion?").await;
        let lines = view.update(&session.snapshot());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "you> What is recursion?\n");
        assert!(lines[1].starts_with("lumina> ## Coding (Intermediate)"));

        assert!(view.update(&session.snapshot()).is_empty());
    }
}
