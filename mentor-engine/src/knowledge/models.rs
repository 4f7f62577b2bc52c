//! Concepts and concept collections.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Difficulty assumed for stored concepts that do not state one.
const DEFAULT_DIFFICULTY: u8 = 3;

/// One teachable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Concept {
    pub definition: String,
    pub example: String,
    /// Guiding questions, at least two
    pub socratic_prompts: Vec<String>,
    /// 1 (easiest) to 5 (hardest)
    pub difficulty: u8,
}

impl Concept {
    /// Check the rules generated concepts must satisfy.
    pub fn validate(&self) -> Result<(), String> {
        if self.socratic_prompts.len() < 2 {
            return Err(format!(
                "needs at least 2 socratic prompts, has {}",
                self.socratic_prompts.len()
            ));
        }
        if !(1..=5).contains(&self.difficulty) {
            return Err(format!("difficulty {} is outside 1..=5", self.difficulty));
        }
        Ok(())
    }

    /// Read a stored concept, filling in whatever is missing.
    ///
    /// Files written by older tools or by hand rarely carry every field, so
    /// this never fails on a JSON object.
    pub fn from_stored(object: &Map<String, Value>) -> Self {
        let text = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let socratic_prompts = object
            .get("socratic_prompts")
            .and_then(Value::as_array)
            .map(|prompts| {
                prompts
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let difficulty = object
            .get("difficulty")
            .and_then(Value::as_i64)
            .map(|d| d.clamp(1, 5) as u8)
            .unwrap_or(DEFAULT_DIFFICULTY);

        Self {
            definition: text("definition"),
            example: text("example"),
            socratic_prompts,
            difficulty,
        }
    }

    pub fn first_prompt(&self) -> Option<&str> {
        self.socratic_prompts.first().map(String::as_str)
    }
}

/// An ordered set of concepts for one topic.
///
/// Values are kept as raw JSON so that lookups can tolerate shapes other
/// writers produce; [`ConceptCollection::concept`] does the conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptCollection {
    topic: String,
    path: PathBuf,
    concepts: Map<String, Value>,
}

impl ConceptCollection {
    pub fn new(topic: impl Into<String>, path: impl Into<PathBuf>, concepts: Map<String, Value>) -> Self {
        Self {
            topic: topic.into(),
            path: path.into(),
            concepts,
        }
    }

    /// Canonical topic name.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// File the collection was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Concept ids in teaching order.
    pub fn concept_ids(&self) -> Vec<String> {
        self.concepts.keys().cloned().collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.concepts.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Look up a concept.
    ///
    /// A value wrapped in a list is unwrapped to its first element when that
    /// element is an object; any other non-object value yields `None`.
    pub fn concept(&self, id: &str) -> Option<Concept> {
        match self.concepts.get(id)? {
            Value::Object(object) => Some(Concept::from_stored(object)),
            Value::Array(items) => match items.first() {
                Some(Value::Object(object)) => Some(Concept::from_stored(object)),
                _ => None,
            },
            _ => None,
        }
    }

    /// All concepts that can be read, in teaching order.
    pub fn concepts(&self) -> Vec<(String, Concept)> {
        self.concepts
            .keys()
            .filter_map(|id| self.concept(id).map(|c| (id.clone(), c)))
            .collect()
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.concepts
    }
}

/// Bring one of the tolerated on-disk shapes into a concept map.
///
/// Accepted shapes:
/// - `{"concepts": {...}}`
/// - `{"concepts_list": [{"name": ..., ...}, ...]}`
/// - a bare `{<id>: {...}}` object
///
/// Returns `None` when the root is not an object.
pub fn normalize_shape(data: Value) -> Option<Map<String, Value>> {
    let Value::Object(mut root) = data else {
        return None;
    };

    if let Some(concepts) = root.remove("concepts") {
        return Some(match concepts {
            Value::Object(map) => map,
            _ => Map::new(),
        });
    }

    if let Some(list) = root.remove("concepts_list") {
        let mut map = Map::new();
        if let Value::Array(items) = list {
            for item in items {
                let name = item.get("name").and_then(Value::as_str).map(str::to_string);
                if let Some(name) = name {
                    map.insert(name, item);
                }
            }
        }
        return Some(map);
    }

    Some(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn concept_json() -> Value {
        json!({
            "definition": "A set closed under addition and scaling",
            "example": "R^2",
            "socratic_prompts": ["What is closure?", "Is R^2 closed?"],
            "difficulty": 2
        })
    }

    #[test]
    fn test_validate() {
        let mut concept: Concept = serde_json::from_value(concept_json()).unwrap();
        assert!(concept.validate().is_ok());

        concept.socratic_prompts.pop();
        assert!(concept.validate().is_err());

        concept.socratic_prompts.push("again?".into());
        concept.difficulty = 6;
        assert!(concept.validate().is_err());
    }

    #[test]
    fn test_from_stored_fills_defaults() {
        let object = json!({"definition": "only this"});
        let concept = Concept::from_stored(object.as_object().unwrap());
        assert_eq!(concept.definition, "only this");
        assert_eq!(concept.example, "");
        assert!(concept.socratic_prompts.is_empty());
        assert_eq!(concept.difficulty, DEFAULT_DIFFICULTY);
    }

    #[test]
    fn test_list_wrapped_lookup() {
        let concepts = json!({
            "Wrapped": [concept_json()],
            "EmptyList": [],
            "Scalar": 3,
            "Plain": concept_json()
        });
        let collection = ConceptCollection::new(
            "Vectors",
            "/tmp/Vectors.json",
            concepts.as_object().unwrap().clone(),
        );

        assert_eq!(collection.concept("Wrapped").unwrap().difficulty, 2);
        assert!(collection.concept("EmptyList").is_none());
        assert!(collection.concept("Scalar").is_none());
        assert!(collection.concept("Missing").is_none());
        assert_eq!(collection.concepts().len(), 2);
        assert_eq!(collection.concept_ids()[0], "Wrapped");
    }

    #[test]
    fn test_normalize_shapes() {
        let canonical = normalize_shape(json!({"concepts": {"A": {}, "B": {}}})).unwrap();
        assert_eq!(canonical.keys().collect::<Vec<_>>(), vec!["A", "B"]);

        let legacy = normalize_shape(json!({
            "concepts_list": [{"name": "Z", "definition": "z"}, {"definition": "nameless"}, {"name": "Y"}]
        }))
        .unwrap();
        assert_eq!(legacy.keys().collect::<Vec<_>>(), vec!["Z", "Y"]);
        assert_eq!(legacy["Z"]["definition"], "z");

        let bare = normalize_shape(json!({"Q": {"definition": "q"}})).unwrap();
        assert!(bare.contains_key("Q"));

        assert!(normalize_shape(json!(["not", "an", "object"])).is_none());
        assert!(normalize_shape(json!({"concepts": null})).unwrap().is_empty());
    }
}
