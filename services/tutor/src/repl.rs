//! The interactive prompt: reads lines from stdin and turns them into
//! session operations.

use crate::render;
use lumina_core::subject::ParseConfigError;
use lumina_core::{Difficulty, SessionConfig, Subject, TutorSession};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

const HELP: &str = "\
Type a question and press enter to ask the tutor.
  /visualize                       illustrate the tutor's last answer
  /speak                           read the tutor's last answer aloud
  /subject <subject> [difficulty]  start a new session
  /subjects                        list subjects and difficulty levels
  /help                            show this message
  /quit                            leave (Ctrl-D works too)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Visualize,
    Speak,
    NewSession {
        subject: Subject,
        difficulty: Option<Difficulty>,
    },
    Subjects,
    Help,
    Quit,
    Empty,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '/{0}', try /help")]
    Unknown(String),
    #[error("Usage: /subject <subject> [difficulty]")]
    MissingSubject,
    #[error(transparent)]
    Invalid(#[from] ParseConfigError),
}

/// Parses one input line. Anything not starting with `/` is a question.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        if line.is_empty() {
            return Ok(Command::Empty);
        }
        return Ok(Command::Ask(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default().to_lowercase();
    match name.as_str() {
        "visualize" | "v" => Ok(Command::Visualize),
        "speak" | "s" => Ok(Command::Speak),
        "subject" => {
            let subject = parts.next().ok_or(CommandError::MissingSubject)?.parse()?;
            let difficulty = parts.next().map(str::parse).transpose()?;
            Ok(Command::NewSession {
                subject,
                difficulty,
            })
        }
        "subjects" => Ok(Command::Subjects),
        "help" | "h" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn subjects_listing() -> String {
    let subjects: Vec<&str> = Subject::ALL.iter().map(Subject::as_str).collect();
    let levels: Vec<&str> = Difficulty::ALL.iter().map(Difficulty::as_str).collect();
    format!(
        "Subjects: {}\nLevels:   {}",
        subjects.join(", "),
        levels.join(", ")
    )
}

/// Runs the prompt until `/quit` or end of input.
///
/// Operations are spawned so the prompt stays responsive; a question typed
/// while the tutor is still thinking is dropped by the session.
pub async fn run(session: TutorSession) -> anyhow::Result<()> {
    let mut session = Arc::new(session);
    let mut renderer = render::spawn(session.subscribe());
    println!("Lumina tutor: {} session. /help for commands.\n", session.config());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match command {
            Command::Ask(text) => {
                let session = session.clone();
                tokio::spawn(async move { session.ask(&text).await });
            }
            Command::Visualize => match session.snapshot().last_assistant_text() {
                Some(message) => {
                    let text = message.content.clone();
                    let session = session.clone();
                    tokio::spawn(async move { session.visualize(&text).await });
                }
                None => println!("Nothing to visualize yet, ask a question first."),
            },
            Command::Speak => match session.snapshot().last_assistant_text() {
                Some(message) => {
                    let text = message.content.clone();
                    let session = session.clone();
                    tokio::spawn(async move { session.speak(&text).await });
                }
                None => println!("Nothing to read aloud yet, ask a question first."),
            },
            Command::NewSession {
                subject,
                difficulty,
            } => {
                let difficulty = difficulty.unwrap_or(session.config().difficulty);
                session = Arc::new(session.start_new(SessionConfig::new(subject, difficulty)));
                renderer.abort();
                renderer = render::spawn(session.subscribe());
                info!(config = %session.config(), "Started new session");
                println!("Started a new {} session.\n", session.config());
            }
            Command::Subjects => println!("{}", subjects_listing()),
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
            Command::Empty => {}
        }
    }

    renderer.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_question() {
        assert_eq!(
            parse("  What is recursion?  ").unwrap(),
            Command::Ask("What is recursion?".to_string())
        );
        assert_eq!(parse("   ").unwrap(), Command::Empty);
    }

    #[test]
    fn test_commands() {
        assert_eq!(parse("/visualize").unwrap(), Command::Visualize);
        assert_eq!(parse("/SPEAK").unwrap(), Command::Speak);
        assert_eq!(parse("/subjects").unwrap(), Command::Subjects);
        assert_eq!(parse("/?").unwrap(), Command::Help);
        assert_eq!(parse("/quit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_subject_command() {
        assert_eq!(
            parse("/subject history advanced").unwrap(),
            Command::NewSession {
                subject: Subject::History,
                difficulty: Some(Difficulty::Advanced),
            }
        );
        assert_eq!(
            parse("/subject Science").unwrap(),
            Command::NewSession {
                subject: Subject::Science,
                difficulty: None,
            }
        );
    }

    #[test]
    fn test_invalid_commands() {
        assert_eq!(parse("/subject").unwrap_err(), CommandError::MissingSubject);
        assert!(matches!(
            parse("/subject astrology"),
            Err(CommandError::Invalid(_))
        ));
        assert!(matches!(
            parse("/subject coding expert"),
            Err(CommandError::Invalid(_))
        ));
        assert_eq!(
            parse("/dance").unwrap_err(),
            CommandError::Unknown("dance".to_string())
        );
    }

    #[test]
    fn test_subjects_listing() {
        let listing = subjects_listing();
        assert!(listing.contains("Mathematics, Science, History, Coding, Languages, Philosophy"));
        assert!(listing.contains("Beginner, Intermediate, Advanced"));
    }
}
