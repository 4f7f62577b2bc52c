//! Knowledge synthesis: from a confirmed blueprint to a stored collection.
//!
//! Each attempt asks the instructional designer for a concept map, checks
//! its shape, checks that every requested sub-topic is covered, and merges
//! the result into the topic's file. A failed check or save costs one
//! attempt.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fmt;
use tracing::{info, warn};

use mentor_agent::{AgentPort, AgentRole, DecodeError};

use crate::goal::LearningBlueprint;
use crate::knowledge::{Concept, ConceptCollection, KnowledgeStore, SavedCollection, StoreError};
use crate::retry::{Attempt, RetryError, RetryPolicy};
use crate::types::{EngineError, Result};

/// Error types for synthesis.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    /// The blueprint names no topic
    #[error("the learning plan has no topic")]
    MissingTopic,

    /// No attempt produced an acceptable collection
    #[error("no acceptable knowledge base after {attempts} attempt(s): {reason}")]
    Exhausted { attempts: u32, reason: String },

    /// The final attempt could not save its result
    #[error("could not save the knowledge base: {0}")]
    Persist(#[source] StoreError),

    /// The save worked but the collection could not be read back
    #[error("knowledge base '{name}' was saved but could not be loaded: {source}")]
    Reload {
        name: String,
        #[source]
        source: StoreError,
    },
}

/// Why a single attempt was rejected.
#[derive(Debug)]
enum Rejection {
    Unparsable(DecodeError),
    InvalidConcept { id: String, reason: String },
    MissingSubTopics(Vec<String>),
    NoConcepts,
    Persist(StoreError),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Unparsable(e) => write!(f, "unparsable reply: {}", e),
            Rejection::InvalidConcept { id, reason } => write!(f, "concept '{}' {}", id, reason),
            Rejection::MissingSubTopics(missing) => {
                write!(f, "missing sub-topics: {}", missing.join(", "))
            }
            Rejection::NoConcepts => f.write_str("no concepts generated"),
            Rejection::Persist(e) => write!(f, "save failed: {}", e),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Draft {
    concepts: Map<String, Value>,
}

/// Turns blueprints into stored concept collections.
#[derive(Debug, Clone)]
pub struct KnowledgeSynthesizer {
    policy: RetryPolicy,
}

impl KnowledgeSynthesizer {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Generate, validate, save and reload a collection for `blueprint`.
    pub async fn synthesize(
        &self,
        port: &dyn AgentPort,
        store: &mut KnowledgeStore,
        blueprint: &LearningBlueprint,
        material: Option<&str>,
    ) -> std::result::Result<ConceptCollection, SynthesisError> {
        let topic = blueprint.topic_name().ok_or(SynthesisError::MissingTopic)?;
        let context = json!({
            "blueprint": blueprint,
            "source_material": material.unwrap_or("none"),
        });

        let saved = {
            let store: &KnowledgeStore = store;
            let context = &context;
            self.policy
                .run(|attempt| async move {
                    info!(topic, attempt = attempt.number, "Generating knowledge base");
                    let reply = port
                        .complete(AgentRole::InstructionalDesigner, context.clone())
                        .await;

                    let concepts = match accept(reply.decode::<Draft>(), &blueprint.sub_topics) {
                        Ok(concepts) => concepts,
                        Err(rejection) => {
                            warn!(topic, attempt = attempt.number, reason = %rejection, "Generated knowledge base rejected");
                            return Attempt::Retry(rejection);
                        }
                    };

                    match store.save_concepts(topic, &concepts) {
                        Ok(saved) => Attempt::Accept(saved),
                        Err(e) => {
                            warn!(topic, attempt = attempt.number, error = %e, "Saving knowledge base failed");
                            Attempt::Retry(Rejection::Persist(e))
                        }
                    }
                })
                .await
        };

        let saved: SavedCollection = match saved {
            Ok(saved) => saved,
            Err(RetryError::Exhausted {
                last: Rejection::Persist(e),
                ..
            }) => return Err(SynthesisError::Persist(e)),
            Err(RetryError::Exhausted { attempts, last }) => {
                return Err(SynthesisError::Exhausted {
                    attempts,
                    reason: last.to_string(),
                })
            }
            Err(RetryError::Aborted { attempt, error }) => {
                return Err(SynthesisError::Exhausted {
                    attempts: attempt,
                    reason: error.to_string(),
                })
            }
        };

        let collection = reopen(store, &saved)?;

        info!(
            topic = collection.topic(),
            concepts = collection.len(),
            "Knowledge base ready"
        );
        Ok(collection)
    }

    /// Ask for a single concept named `name` within `topic`.
    pub async fn generate_concept(
        &self,
        port: &dyn AgentPort,
        topic: &str,
        name: &str,
    ) -> Result<Concept> {
        let context = json!({ "topic": topic, "concept_name": name });
        let context = &context;

        self.policy
            .run(|attempt| async move {
                let reply = port
                    .complete(AgentRole::GuidanceResponder, context.clone())
                    .await;
                let concept = match reply.decode::<Concept>() {
                    Ok(concept) => concept,
                    Err(e) => return Attempt::Retry(EngineError::Decode(e)),
                };
                match concept.validate() {
                    Ok(()) => Attempt::Accept(concept),
                    Err(reason) => {
                        warn!(topic, concept = name, attempt = attempt.number, %reason, "Generated concept rejected");
                        Attempt::Retry(EngineError::InvalidConcept(reason))
                    }
                }
            })
            .await
            .map_err(RetryError::into_inner)
    }
}

impl Default for KnowledgeSynthesizer {
    fn default() -> Self {
        Self::new(RetryPolicy::new(2))
    }
}

/// Refresh the index and read back exactly the file that was written.
fn reopen(store: &mut KnowledgeStore, saved: &SavedCollection) -> std::result::Result<ConceptCollection, SynthesisError> {
    let reload = |source| SynthesisError::Reload {
        name: saved.canonical_name.clone(),
        source,
    };
    store.rescan().map_err(reload)?;
    store.load_path(&saved.path).map_err(reload)
}

/// Syntactic then semantic acceptance of a generated draft.
fn accept(
    draft: std::result::Result<Draft, DecodeError>,
    sub_topics: &[String],
) -> std::result::Result<Vec<(String, Concept)>, Rejection> {
    let draft = draft.map_err(Rejection::Unparsable)?;

    let mut concepts = Vec::with_capacity(draft.concepts.len());
    for (id, value) in draft.concepts {
        let concept: Concept = serde_json::from_value(value).map_err(|e| Rejection::InvalidConcept {
            id: id.clone(),
            reason: e.to_string(),
        })?;
        concept
            .validate()
            .map_err(|reason| Rejection::InvalidConcept { id: id.clone(), reason })?;
        concepts.push((id, concept));
    }

    if sub_topics.is_empty() {
        if concepts.is_empty() {
            return Err(Rejection::NoConcepts);
        }
        return Ok(concepts);
    }

    let missing: Vec<String> = sub_topics
        .iter()
        .filter(|wanted| !concepts.iter().any(|(id, _)| id == *wanted))
        .cloned()
        .collect();
    if missing.is_empty() {
        Ok(concepts)
    } else {
        Err(Rejection::MissingSubTopics(missing))
    }
}
