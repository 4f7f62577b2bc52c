//! Test doubles: a scripted agent port and a simple review scheduler.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use mentor_agent::{AgentPort, AgentReply, AgentRole};

use crate::flashcards::{DeckError, Rating, ReviewScheduler, ScheduledCard};

/// Answers each role from its own queue; an empty queue is a failure.
#[derive(Default)]
pub struct ScriptedAgent {
    replies: Mutex<HashMap<AgentRole, VecDeque<AgentReply>>>,
    contexts: Mutex<Vec<(AgentRole, Value)>>,
}

impl ScriptedAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for a role.
    pub fn reply(self, role: AgentRole, reply: AgentReply) -> Self {
        self.push(role, reply);
        self
    }

    pub fn push(&self, role: AgentRole, reply: AgentReply) {
        self.replies
            .lock()
            .unwrap()
            .entry(role)
            .or_default()
            .push_back(reply);
    }

    /// How many times a role was called.
    pub fn calls(&self, role: AgentRole) -> usize {
        self.contexts
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| *r == role)
            .count()
    }

    /// Context of the most recent call to a role.
    pub fn last_context(&self, role: AgentRole) -> Option<Value> {
        self.contexts
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(r, _)| *r == role)
            .map(|(_, c)| c.clone())
    }
}

#[async_trait]
impl AgentPort for ScriptedAgent {
    async fn complete(&self, role: AgentRole, context: Value) -> AgentReply {
        self.contexts.lock().unwrap().push((role, context));
        self.replies
            .lock()
            .unwrap()
            .get_mut(&role)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| AgentReply::Failure(format!("no scripted reply for {}", role)))
    }
}

/// Interval scheduler for tests: `good`/`easy` double the interval in days,
/// `again`/`hard` make the card due again in a minute.
#[derive(Debug, Default)]
pub struct DayScheduler {
    reviews: u64,
}

impl ReviewScheduler for DayScheduler {
    fn initial_state(&self, now: DateTime<Utc>) -> Value {
        json!({ "due": now.to_rfc3339(), "interval": 0 })
    }

    fn review(&mut self, state: &Value, rating: Rating, now: DateTime<Utc>) -> Result<ScheduledCard, DeckError> {
        let interval = state["interval"].as_i64().unwrap_or(0);
        let (interval, due) = match rating {
            Rating::Again | Rating::Hard => (0, now + Duration::minutes(1)),
            Rating::Good | Rating::Easy => {
                let days = (interval * 2).max(1);
                (days, now + Duration::days(days))
            }
        };
        self.reviews += 1;
        Ok(ScheduledCard {
            state: json!({ "due": due.to_rfc3339(), "interval": interval }),
            due,
        })
    }

    fn due_at(&self, state: &Value) -> Option<DateTime<Utc>> {
        let due = state["due"].as_str()?;
        DateTime::parse_from_rfc3339(due).ok().map(|d| d.with_timezone(&Utc))
    }

    fn snapshot(&self) -> Option<Value> {
        Some(json!({ "reviews": self.reviews }))
    }

    fn restore(&mut self, snapshot: &Value) {
        self.reviews = snapshot["reviews"].as_u64().unwrap_or(0);
    }
}
