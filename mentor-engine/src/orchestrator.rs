//! The dialogue state machine.
//!
//! One [`Orchestrator`] serves one learner. Every user message enters through
//! [`Orchestrator::step`], is routed by the current [`TutorState`], and comes
//! back as the assistant's reply. Handler errors never escape a turn: they are
//! logged and answered with a fixed apology, leaving the state where it was.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use mentor_agent::AgentPort;

use crate::config::EngineConfig;
use crate::flashcards::{
    FlashcardPipeline, Rating, ReviewManager, ReviewScheduler, ScheduledCard, CONVERSATION_CONCEPT,
};
use crate::goal::{BlueprintElicitor, BlueprintStatus, Elicitation, Intent, LearningBlueprint};
use crate::knowledge::{ConceptCollection, KnowledgeStore};
use crate::planner::{Evaluation, MasteryPlanner, NextAction};
use crate::profile::{Turn, UserProfile};
use crate::retry::RetryPolicy;
use crate::strategy::{Dispatch, ResponseStrategy, StrategyDispatcher};
use crate::synthesis::{KnowledgeSynthesizer, SynthesisError};
use crate::types::{EngineError, Result};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Reply used whenever a turn cannot be completed.
pub const APOLOGY: &str = "I seem to be a little confused. Could we try that another way?";

const LIST_TRIGGERS: &[&str] = &[
    "what can you teach",
    "available topics",
    "list topics",
    "knowledge base",
    "知识库",
    "你能教什么",
    "有哪些主题",
];

/// Where the conversation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum TutorState {
    Idle,
    AnalyzingGoal,
    AwaitingPlanConfirmation,
    GeneratingKb,
    Tutoring,
}

impl std::fmt::Display for TutorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TutorState::Idle => "idle",
            TutorState::AnalyzingGoal => "analyzing_goal",
            TutorState::AwaitingPlanConfirmation => "awaiting_plan_confirmation",
            TutorState::GeneratingKb => "generating_kb",
            TutorState::Tutoring => "tutoring",
        };
        f.write_str(name)
    }
}

/// Drives one learner's tutoring session.
pub struct Orchestrator {
    port: Arc<dyn AgentPort>,
    store: KnowledgeStore,
    reviews: ReviewManager,
    planner: MasteryPlanner,
    elicitor: BlueprintElicitor,
    synthesizer: KnowledgeSynthesizer,
    dispatcher: StrategyDispatcher,
    flashcards: FlashcardPipeline,
    profile: UserProfile,
    state: TutorState,
    blueprint: LearningBlueprint,
    collection: Option<ConceptCollection>,
    current_concept: Option<String>,
    /// Uploaded and not yet analyzed
    pending_material: Option<String>,
    /// Analyzed, kept as source for the next synthesis
    source_material: Option<String>,
}

impl Orchestrator {
    /// Create an orchestrator, opening the knowledge store and the learner's deck.
    pub fn new(
        config: EngineConfig,
        port: Arc<dyn AgentPort>,
        scheduler: Box<dyn ReviewScheduler>,
    ) -> Result<Self> {
        config.validate()?;

        let store = KnowledgeStore::open(&config.storage.knowledge_dir, config.resolution.clone())?;
        let reviews = ReviewManager::open(&config.storage.review_dir, &config.user_id, scheduler)?;

        info!(
            user_id = %config.user_id,
            topics = store.topics().len(),
            cards = reviews.len(),
            "Orchestrator ready"
        );

        Ok(Self {
            port,
            store,
            reviews,
            planner: MasteryPlanner::new(config.planner.mastery_threshold),
            elicitor: BlueprintElicitor::new(RetryPolicy::new(config.analysis.max_attempts)),
            synthesizer: KnowledgeSynthesizer::new(RetryPolicy::new(config.synthesis.max_attempts)),
            dispatcher: StrategyDispatcher::new(config.strategy.clone()),
            flashcards: FlashcardPipeline::new(),
            profile: UserProfile::new(config.user_id.clone()),
            state: TutorState::Idle,
            blueprint: LearningBlueprint::default(),
            collection: None,
            current_concept: None,
            pending_material: None,
            source_material: None,
        })
    }

    /// Resume with a previously saved profile.
    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn state(&self) -> TutorState {
        self.state
    }

    pub fn blueprint(&self) -> &LearningBlueprint {
        &self.blueprint
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    pub fn collection(&self) -> Option<&ConceptCollection> {
        self.collection.as_ref()
    }

    pub fn active_topic(&self) -> Option<&str> {
        self.collection.as_ref().map(ConceptCollection::topic)
    }

    pub fn current_concept(&self) -> Option<&str> {
        self.current_concept.as_deref()
    }

    pub fn reviews(&self) -> &ReviewManager {
        &self.reviews
    }

    /// Hand over uploaded material.
    ///
    /// While a goal is being worked out the material is analyzed right away
    /// and the proposed plan returned. Otherwise it waits for the next
    /// goal-analysis turn.
    pub async fn prime_material(&mut self, text: &str) -> String {
        if text.trim().is_empty() {
            return "The material is empty, there is nothing to analyze.".to_string();
        }
        self.pending_material = Some(text.to_string());
        info!(chars = text.chars().count(), state = %self.state, "Material received");

        match self.state {
            TutorState::Idle | TutorState::AnalyzingGoal => {
                let reply = self.handle_goal_analysis("").await;
                self.respond(reply)
            }
            _ => {
                let reply = "Got it. I'll look at this material once we plan your next topic.".to_string();
                self.respond(Ok(reply))
            }
        }
    }

    /// Process one user message and return the reply.
    pub async fn step(&mut self, user_text: &str) -> String {
        debug!(state = %self.state, "Turn received");
        if !user_text.trim().is_empty() {
            self.profile.push_turn(Turn::user(user_text));
        }

        let reply = match self.state {
            TutorState::Idle | TutorState::AnalyzingGoal => self.handle_goal_analysis(user_text).await,
            TutorState::AwaitingPlanConfirmation => self.handle_plan_confirmation(user_text).await,
            TutorState::GeneratingKb => self.generate_and_start().await,
            TutorState::Tutoring => self.handle_tutoring(user_text).await,
        };
        self.respond(reply)
    }

    /// Start tutoring an existing topic by name.
    ///
    /// A topic that cannot be found or opened leaves the session as it was.
    pub fn start_topic(&mut self, name: &str) -> String {
        let canonical = match self.store.check_validity(name) {
            Ok(canonical) => canonical,
            Err(reason) => {
                info!(topic = name, %reason, "Topic not opened");
                return self.respond(Ok(format!("Sorry, I can't open '{}': {}.", name, reason)));
            }
        };

        let reply = match self.store.load(&canonical) {
            Ok(collection) => Ok(self.start_collection(collection).unwrap_or_else(|refusal| refusal)),
            Err(e) => {
                warn!(topic = %canonical, error = %e, "Topic failed to load");
                Ok(format!("Sorry, loading '{}' failed: {}.", canonical, e))
            }
        };
        self.respond(reply)
    }

    /// Add a concept to the active topic and switch to it.
    pub async fn learn_concept(&mut self, name: &str) -> String {
        let reply = self.add_concept(name.trim()).await;
        self.respond(reply)
    }

    /// Record a flashcard review and let it inform mastery of the card's concept.
    pub fn review_card(&mut self, card_id: &str, rating: Rating) -> Result<ScheduledCard> {
        let scheduled = self.reviews.apply_review(card_id, rating, Utc::now())?;

        let concept_id = self
            .reviews
            .get(card_id)
            .map(|card| card.concept_id.clone())
            .filter(|id| id != CONVERSATION_CONCEPT);
        if let Some(concept_id) = concept_id {
            let evaluation = match rating {
                Rating::Again => Evaluation::Incorrect,
                Rating::Hard => Evaluation::PartiallyCorrect,
                Rating::Good | Rating::Easy => Evaluation::Correct,
            };
            self.planner.update_mastery(&mut self.profile, &concept_id, &evaluation);
        }
        Ok(scheduled)
    }

    /// Remove a flashcard from the learner's deck.
    pub fn delete_card(&mut self, card_id: &str) -> Result<bool> {
        Ok(self.reviews.delete_card(card_id)?)
    }

    /// Forget all learning progress and dialogue.
    pub fn reset_profile(&mut self) {
        self.profile.reset();
    }

    /// Record the reply in history, or turn an error into the apology.
    fn respond(&mut self, reply: Result<String>) -> String {
        let text = match reply {
            Ok(text) => text,
            Err(e) => {
                error!(state = %self.state, error = %e, "Turn failed");
                APOLOGY.to_string()
            }
        };
        self.profile.push_turn(Turn::assistant(text.clone()));
        text
    }

    fn transition(&mut self, to: TutorState) {
        if self.state != to {
            info!(from = %self.state, to = %to, "State change");
            self.state = to;
        }
    }

    async fn handle_goal_analysis(&mut self, user_text: &str) -> Result<String> {
        let lower = user_text.to_lowercase();
        if LIST_TRIGGERS.iter().any(|t| lower.contains(t)) {
            return Ok(self.list_topics());
        }

        if let Some(material) = self.pending_material.take() {
            return match self.elicitor.analyze(self.port.as_ref(), &material).await {
                Ok((blueprint, summary)) => {
                    self.blueprint = blueprint;
                    self.source_material = Some(material);
                    self.transition(TutorState::AwaitingPlanConfirmation);
                    Ok(summary)
                }
                Err(e) => {
                    warn!(error = %e, "Material analysis failed");
                    Ok("Sorry, I had trouble analyzing that material. Could you upload it again, \
                        or just tell me what you would like to learn?"
                        .to_string())
                }
            };
        }

        let outcome = self
            .elicitor
            .elicit(
                self.port.as_ref(),
                &mut self.blueprint,
                user_text,
                &self.profile.dialogue_history,
            )
            .await;

        match outcome {
            Elicitation::Complete => {
                self.transition(TutorState::GeneratingKb);
                self.generate_and_start().await
            }
            Elicitation::Ask(question) => Ok(question),
            Elicitation::Unparsed(text) => Ok(text),
            Elicitation::Failed(reason) => {
                warn!(%reason, "Goal elicitation failed");
                Ok("Sorry, I had trouble understanding your learning goal. Could you say that again?"
                    .to_string())
            }
        }
    }

    async fn handle_plan_confirmation(&mut self, user_text: &str) -> Result<String> {
        let intent = self.elicitor.classify_intent(self.port.as_ref(), user_text).await;
        info!(intent = ?intent, "Plan confirmation");

        match intent {
            Intent::Confirm => {
                self.blueprint.confirm();
                self.transition(TutorState::GeneratingKb);
                let result = self.generate_and_start().await?;
                Ok(format!(
                    "Great! I'll build a detailed knowledge base from this plan.\n\n{}",
                    result
                ))
            }
            Intent::Reject => {
                self.blueprint = LearningBlueprint::default();
                self.source_material = None;
                self.transition(TutorState::AnalyzingGoal);
                Ok("Okay, let's adjust the plan. Tell me what you would like to change, \
                    or we can talk about your learning goal from the beginning."
                    .to_string())
            }
            Intent::Unclear => Ok("Sorry, I'm not sure what you mean. Shall we start with this plan, \
                 or would you like to change something?"
                .to_string()),
        }
    }

    async fn generate_and_start(&mut self) -> Result<String> {
        let result = self
            .synthesizer
            .synthesize(
                self.port.as_ref(),
                &mut self.store,
                &self.blueprint,
                self.source_material.as_deref(),
            )
            .await;

        let message = match result {
            Ok(collection) => {
                self.source_material = None;
                match self.start_collection(collection) {
                    Ok(reply) => return Ok(reply),
                    Err(refusal) => refusal,
                }
            }
            Err(SynthesisError::MissingTopic) => {
                "The learning plan has no topic yet, so let's start over.".to_string()
            }
            Err(SynthesisError::Exhausted { attempts, reason }) => {
                warn!(attempts, %reason, "Knowledge base generation exhausted");
                "Sorry, I couldn't build a complete knowledge base for this plan. \
                 Let's go back to planning; refining the learning goal may help."
                    .to_string()
            }
            Err(SynthesisError::Persist(e)) => {
                format!("Sorry, I couldn't save the knowledge base: {}", e)
            }
            Err(e @ SynthesisError::Reload { .. }) => {
                format!("Sorry, the knowledge base was created but could not be opened: {}", e)
            }
        };
        // A new plan must be agreed before the next attempt.
        self.blueprint.status = BlueprintStatus::Incomplete;
        self.transition(TutorState::AnalyzingGoal);
        Ok(message)
    }

    /// Make `collection` active and open its first unmastered concept.
    ///
    /// A collection that cannot be taught is refused with a message and the
    /// session is left untouched.
    fn start_collection(&mut self, collection: ConceptCollection) -> std::result::Result<String, String> {
        let topic = collection.topic().to_string();
        if collection.is_empty() {
            return Err(format!(
                "The knowledge base **{}** has no concepts in it. Shall we plan a new one?",
                topic
            ));
        }

        let concept_ids = collection.concept_ids();
        let first = match self.planner.select_next_action(&self.profile, &concept_ids, None) {
            NextAction::StartNew(id) => id,
            NextAction::Finish => {
                self.collection = Some(collection);
                self.current_concept = None;
                self.transition(TutorState::Idle);
                return Ok(format!(
                    "Congratulations! You have already mastered every concept in **{}**.",
                    topic
                ));
            }
        };

        let Some(concept) = collection.concept(&first) else {
            return Err(format!(
                "Sorry, the concept '{}' in **{}** could not be read. The file may be damaged.",
                first, topic
            ));
        };

        let prompt = concept
            .first_prompt()
            .map(str::to_string)
            .unwrap_or_else(|| format!("What do you already know about {}?", first));

        info!(topic = %topic, concept = %first, "Tutoring started");
        self.collection = Some(collection);
        self.current_concept = Some(first.clone());
        self.transition(TutorState::Tutoring);

        Ok(format!(
            "Let's start learning **{}**, beginning with **{}**.\n\n{}",
            topic, first, prompt
        ))
    }

    async fn handle_tutoring(&mut self, user_text: &str) -> Result<String> {
        let current = match (&self.collection, &self.current_concept) {
            (Some(_), Some(current)) => current.clone(),
            _ => {
                self.transition(TutorState::Idle);
                return Ok("I lost track of what we were studying. Which topic shall we pick up?".to_string());
            }
        };
        let Some(collection) = self.collection.as_ref() else {
            return Ok(APOLOGY.to_string());
        };
        let Some(concept) = collection.concept(&current) else {
            self.transition(TutorState::Idle);
            return Ok(format!("Sorry, I can't find the concept '{}' any more.", current));
        };
        let topic = collection.topic().to_string();
        let concept_ids = collection.concept_ids();

        let added = self
            .flashcards
            .run(
                self.port.as_ref(),
                &self.profile.dialogue_history,
                Some(current.as_str()),
                &mut self.reviews,
            )
            .await;
        let notification = match added {
            0 => String::new(),
            1 => "💳 I created 1 review card for you.\n\n".to_string(),
            n => format!("💳 I broke that down into **{}** review cards for you.\n\n", n),
        };

        let context = StrategyDispatcher::context(
            user_text,
            &current,
            &concept,
            self.profile.mastery(&current),
            &self.profile.dialogue_history,
        );
        let decision = match self.dispatcher.decide(self.port.as_ref(), context).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(error = %e, "No usable strategy decision");
                return Ok(format!("{}{}", notification, APOLOGY));
            }
        };

        if decision.response_strategy == ResponseStrategy::ReviewAndClarify
            && !decision.analysis.trim().is_empty()
        {
            self.profile.log_misconception(&current, decision.analysis.trim());
        }

        let dispatch = self.dispatcher.apply(
            decision.response_strategy,
            &mut self.profile,
            &self.planner,
            &concept_ids,
            &current,
        );
        info!(
            strategy = %decision.response_strategy,
            concept = %current,
            mastery = self.profile.mastery(&current),
            "Strategy applied"
        );

        let text = match dispatch {
            Dispatch::Stay => decision.action.content,
            Dispatch::Advance(next) => {
                let prompt = self
                    .collection
                    .as_ref()
                    .and_then(|c| c.concept(&next))
                    .and_then(|c| c.first_prompt().map(str::to_string))
                    .unwrap_or_default();
                self.current_concept = Some(next.clone());
                format!(
                    "{}\n\nLet's move on to the next concept: **{}**. {}",
                    decision.action.content, next, prompt
                )
                .trim_end()
                .to_string()
            }
            Dispatch::Complete => {
                self.current_concept = None;
                self.transition(TutorState::Idle);
                format!("Wonderful! We have finished learning **{}**.", topic)
            }
        };

        Ok(format!("{}{}", notification, text))
    }

    fn list_topics(&mut self) -> String {
        if let Err(e) = self.store.rescan() {
            warn!(error = %e, "Could not rescan knowledge bases");
        }
        let topics = self.store.topics();
        if topics.is_empty() {
            "My knowledge base is empty right now. Upload some material or tell me a topic \
             and I'll build a new course."
                .to_string()
        } else {
            let items: Vec<String> = topics.iter().map(|t| format!("- **{}**", t)).collect();
            format!(
                "I can currently teach these topics:\n{}\n\nWhich one would you like? You can also \
                 upload material or name a new topic to build a fresh course.",
                items.join("\n")
            )
        }
    }

    async fn add_concept(&mut self, name: &str) -> Result<String> {
        if name.is_empty() {
            return Ok("Which concept would you like to add?".to_string());
        }
        let collection = self.collection.as_ref().ok_or(EngineError::NoActiveTopic)?;
        let topic = collection.topic().to_string();

        let concept = self
            .synthesizer
            .generate_concept(self.port.as_ref(), &topic, name)
            .await?;
        let saved = self.store.add_concept(collection, name, &concept)?;
        self.store.rescan()?;
        let reloaded = self.store.load(&saved.canonical_name)?;

        info!(topic = %topic, concept = name, total = saved.concept_count, "Concept added");
        self.collection = Some(reloaded);
        self.current_concept = Some(name.to_string());
        self.transition(TutorState::Tutoring);

        let prompt = concept.first_prompt().unwrap_or_default();
        Ok(format!(
            "I added **{}** to **{}**.\n\n{}\n\n{}",
            name, topic, concept.definition, prompt
        )
        .trim_end()
        .to_string())
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("user_id", &self.profile.user_id)
            .field("state", &self.state)
            .field("topic", &self.active_topic())
            .field("current_concept", &self.current_concept)
            .finish()
    }
}
