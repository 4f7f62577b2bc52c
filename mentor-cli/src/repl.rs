//! Interactive session loop.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;

use mentor_agent::audit::{AuditEntry, AuditStats, CallOutcome};
use mentor_agent::AgentService;
use mentor_engine::{Orchestrator, Rating};

/// Calls listed by `/stats`.
const RECENT_CALLS: usize = 5;

const HELP: &str = "\
Commands:
  /upload <path>    Plan a topic from a text file
  /topics           List stored topics
  /learn <topic>    Resume a stored topic
  /concept <name>   Add a concept to the current topic
  /review           Review due flashcards
  /mastery          Show mastery for the current topic
  /state            Show the tutor state
  /stats            Show model calls and token use
  /reset            Forget progress and dialogue
  /help             Show this help
  /quit             Leave
Anything else is sent to the tutor.";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Say(String),
    Upload(PathBuf),
    Topics,
    Learn(String),
    Concept(String),
    Review,
    Mastery,
    State,
    Stats,
    Reset,
    Help,
    Quit,
    Empty,
    /// A slash command that is unknown or missing its argument
    Invalid(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Input::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Input::Say(line.to_string());
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };
        let needs_arg = |make: fn(String) -> Input| {
            if arg.is_empty() {
                Input::Invalid(format!("/{} needs an argument", name))
            } else {
                make(arg.to_string())
            }
        };

        match name {
            "upload" => needs_arg(|a| Input::Upload(PathBuf::from(a))),
            "topics" => Input::Topics,
            "learn" => needs_arg(Input::Learn),
            "concept" => needs_arg(Input::Concept),
            "review" => Input::Review,
            "mastery" => Input::Mastery,
            "state" => Input::State,
            "stats" => Input::Stats,
            "reset" => Input::Reset,
            "help" => Input::Help,
            "quit" | "exit" => Input::Quit,
            other => Input::Invalid(format!("unknown command /{}", other)),
        }
    }
}

/// Terminal session around one orchestrator.
pub struct Repl {
    tutor: Orchestrator,
    service: Arc<AgentService>,
    lines: Lines<BufReader<Stdin>>,
}

impl Repl {
    pub fn new(tutor: Orchestrator, service: Arc<AgentService>) -> Self {
        Self {
            tutor,
            service,
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        println!("Tell me what you'd like to learn. Type /help for commands.");

        while let Some(line) = self.prompt("> ").await? {
            match Input::parse(&line) {
                Input::Quit => break,
                Input::Empty => {}
                Input::Help => println!("{}", HELP),
                Input::Invalid(reason) => println!("{}. Type /help for commands.", reason),
                Input::Say(text) => println!("\n{}\n", self.tutor.step(&text).await),
                Input::Upload(path) => match tokio::fs::read_to_string(&path).await {
                    Ok(text) => println!("\n{}\n", self.tutor.prime_material(&text).await),
                    Err(e) => println!("Could not read {}: {}", path.display(), e),
                },
                Input::Topics => print_topics(&self.tutor),
                Input::Learn(topic) => println!("\n{}\n", self.tutor.start_topic(&topic)),
                Input::Concept(name) => println!("\n{}\n", self.tutor.learn_concept(&name).await),
                Input::Review => self.review().await?,
                Input::Mastery => print_mastery(&self.tutor),
                Input::State => println!(
                    "State: {} | topic: {} | concept: {}",
                    self.tutor.state(),
                    self.tutor.active_topic().unwrap_or("-"),
                    self.tutor.current_concept().unwrap_or("-"),
                ),
                Input::Stats => {
                    let stats = self.service.audit_stats().await;
                    let recent = self.service.get_audit_log(RECENT_CALLS).await;
                    println!("{}", format_stats(&stats, &recent));
                }
                Input::Reset => {
                    self.tutor.reset_profile();
                    println!("Progress cleared.");
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Walk through the cards due now.
    async fn review(&mut self) -> anyhow::Result<()> {
        let due: Vec<(String, String, String)> = self
            .tutor
            .reviews()
            .due_cards(Utc::now())
            .into_iter()
            .map(|card| (card.id.clone(), card.question.clone(), card.answer.clone()))
            .collect();

        if due.is_empty() {
            println!("No cards are due. Nice work!");
            return Ok(());
        }
        println!("{} card(s) due. Type /quit to stop early, /delete to drop a card.", due.len());

        for (index, (card_id, question, answer)) in due.iter().enumerate() {
            println!("\n[{}/{}] {}", index + 1, due.len(), question);
            if self.prompt("(press enter to see the answer) ").await?.is_none() {
                return Ok(());
            }
            println!("Answer: {}", answer);

            loop {
                let Some(reply) = self.prompt("Rate 1=again 2=hard 3=good 4=easy: ").await? else {
                    return Ok(());
                };
                match reply.trim() {
                    "/quit" => return Ok(()),
                    "/delete" => {
                        self.tutor.delete_card(card_id)?;
                        println!("Card deleted.");
                        break;
                    }
                    rating => match rating.parse::<Rating>() {
                        Ok(rating) => {
                            match self.tutor.review_card(card_id, rating) {
                                Ok(scheduled) => println!("Next review: {}", scheduled.due.format("%Y-%m-%d %H:%M")),
                                Err(e) => warn!(card_id = %card_id, error = %e, "Review not recorded"),
                            }
                            break;
                        }
                        Err(e) => println!("{}", e),
                    },
                }
            }
        }

        println!("\nReview finished.");
        Ok(())
    }

    async fn prompt(&mut self, text: &str) -> anyhow::Result<Option<String>> {
        print!("{}", text);
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?)
    }
}

fn print_topics(tutor: &Orchestrator) {
    let topics = tutor.store().topics();
    if topics.is_empty() {
        println!("No topics stored yet.");
        return;
    }
    println!("Stored topics:");
    for topic in topics {
        println!("  - {}", topic);
    }
}

fn format_stats(stats: &AuditStats, recent: &[AuditEntry]) -> String {
    let mut out = format!(
        "Model calls: {} ({} answered, {} failed), {} tokens",
        stats.total_calls, stats.answered, stats.failed, stats.total_tokens
    );
    for entry in recent {
        let outcome = match (entry.outcome, &entry.error) {
            (Some(CallOutcome::Answered), _) => {
                let tokens = entry.cost.as_ref().map_or(0, |c| c.total_tokens());
                format!("{} tokens", tokens)
            }
            (Some(CallOutcome::Failed), Some(error)) => format!("failed: {}", error),
            (Some(CallOutcome::Failed), None) => "failed".to_string(),
            (None, _) => "pending".to_string(),
        };
        out.push_str(&format!(
            "\n  {}  {:<24} {}",
            entry.requested_at.format("%H:%M:%S"),
            entry.role.to_string(),
            outcome
        ));
    }
    out
}

fn print_mastery(tutor: &Orchestrator) {
    let Some(collection) = tutor.collection() else {
        println!("No topic is active.");
        return;
    };
    println!("Mastery for {}:", collection.topic());
    for id in collection.concept_ids() {
        let marker = if tutor.current_concept() == Some(id.as_str()) { ">" } else { " " };
        println!("{} {:>5.0}%  {}", marker, tutor.profile().mastery(&id) * 100.0, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_said() {
        assert_eq!(Input::parse("  I want to learn Rust "), Input::Say("I want to learn Rust".into()));
        assert_eq!(Input::parse("   "), Input::Empty);
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(Input::parse("/upload notes/ch1.txt"), Input::Upload(PathBuf::from("notes/ch1.txt")));
        assert_eq!(Input::parse("/learn  Rust Closures"), Input::Learn("Rust Closures".into()));
        assert_eq!(Input::parse("/concept Lifetimes"), Input::Concept("Lifetimes".into()));
        assert!(matches!(Input::parse("/learn"), Input::Invalid(_)));
    }

    #[test]
    fn test_bare_commands() {
        assert_eq!(Input::parse("/topics"), Input::Topics);
        assert_eq!(Input::parse("/review"), Input::Review);
        assert_eq!(Input::parse("/stats"), Input::Stats);
        assert_eq!(Input::parse("/exit"), Input::Quit);
        assert!(matches!(Input::parse("/dance"), Input::Invalid(reason) if reason.contains("/dance")));
    }

    #[tokio::test]
    async fn test_stats_report_lists_recent_calls() {
        use mentor_agent::{AgentPort, AgentRole, MockBackend};
        use serde_json::json;

        let backend = Arc::new(MockBackend::new("mock").with_response("YES"));
        let service = AgentService::new(vec![backend]);
        service.complete(AgentRole::FlashcardDecider, json!("User: hi")).await;

        let report = format_stats(&service.audit_stats().await, &service.get_audit_log(RECENT_CALLS).await);
        assert!(report.starts_with("Model calls: 1 (1 answered, 0 failed)"));
        assert_eq!(report.lines().count(), 2);
    }
}
