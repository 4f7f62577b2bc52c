//! File-backed knowledge store.
//!
//! One JSON file per topic under a single directory. The human-readable
//! topic name is derived from the file stem, so the directory listing is
//! the only index.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::fuzzy;
use super::models::{normalize_shape, Concept, ConceptCollection};
use super::StoreError;
use crate::config::ResolutionConfig;

/// Where a save landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedCollection {
    /// Topic name derived from the file actually written
    pub canonical_name: String,
    pub path: PathBuf,
    /// Concepts in the file after the merge
    pub concept_count: usize,
}

/// Why a stored collection is not usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// No topic close enough to the requested name
    NotFound(String),
    /// The file has no content
    Empty,
    /// The file cannot be read or is not JSON
    Unreadable(String),
    /// The root is not a JSON object
    NotAnObject,
    /// There is no `concepts` key
    MissingConcepts,
    /// `concepts` is not an object
    ConceptsNotObject,
    /// `concepts` is an empty object
    NoConcepts,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::NotFound(name) => {
                write!(f, "knowledge base '{}' does not exist or the name does not match", name)
            }
            InvalidReason::Empty => f.write_str("the knowledge base file is empty"),
            InvalidReason::Unreadable(e) => write!(f, "the knowledge base file cannot be read: {}", e),
            InvalidReason::NotAnObject => {
                f.write_str("the top level of the knowledge base must be a JSON object")
            }
            InvalidReason::MissingConcepts => {
                f.write_str("the knowledge base has no 'concepts' key")
            }
            InvalidReason::ConceptsNotObject => f.write_str("'concepts' must be a JSON object"),
            InvalidReason::NoConcepts => f.write_str("'concepts' is empty, there is nothing to learn"),
        }
    }
}

/// Directory of topic files.
#[derive(Debug)]
pub struct KnowledgeStore {
    dir: PathBuf,
    resolution: ResolutionConfig,
    /// canonical topic name -> file
    index: BTreeMap<String, PathBuf>,
}

impl KnowledgeStore {
    /// Open (and create if needed) the store directory.
    pub fn open(dir: impl Into<PathBuf>, resolution: ResolutionConfig) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        let mut store = Self {
            dir,
            resolution,
            index: BTreeMap::new(),
        };
        store.rescan()?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Rebuild the topic index from the directory listing.
    pub fn rescan(&mut self) -> Result<(), StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;

        self.index.clear();
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(&self.dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                self.index.insert(canonical_name(stem), path.clone());
            }
        }

        debug!(dir = %self.dir.display(), topics = ?self.index.keys().collect::<Vec<_>>(), "Scanned knowledge bases");
        Ok(())
    }

    /// Canonical names of all stored topics, sorted.
    pub fn topics(&self) -> Vec<String> {
        self.index.keys().cloned().collect()
    }

    /// The stored topic closest to `name`, if it scores at least `cutoff`.
    pub fn resolve(&self, name: &str, cutoff: f64) -> Option<(&str, &Path)> {
        let matched = fuzzy::best_match(name, self.index.keys().map(String::as_str), cutoff)?;
        self.index
            .get_key_value(matched)
            .map(|(topic, path)| (topic.as_str(), path.as_path()))
    }

    /// Load the collection whose name best matches `name`.
    pub fn load(&self, name: &str) -> Result<ConceptCollection, StoreError> {
        let (topic, path) = self
            .resolve(name, self.resolution.load_cutoff)
            .ok_or_else(|| StoreError::TopicNotFound(name.to_string()))?;
        read_collection(topic, path)
    }

    /// Load the collection stored at an exact path inside the store.
    pub fn load_path(&self, path: &Path) -> Result<ConceptCollection, StoreError> {
        let topic = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(canonical_name)
            .ok_or_else(|| StoreError::TopicNotFound(path.display().to_string()))?;
        read_collection(&topic, path)
    }

    /// Pre-flight check before committing to a topic.
    ///
    /// Rescans, then resolves with the stricter validity cutoff. Returns the
    /// canonical name of a usable collection.
    pub fn check_validity(&mut self, name: &str) -> Result<String, InvalidReason> {
        if let Err(e) = self.rescan() {
            return Err(InvalidReason::Unreadable(e.to_string()));
        }

        let (topic, path) = self
            .resolve(name, self.resolution.validity_cutoff)
            .ok_or_else(|| InvalidReason::NotFound(name.to_string()))?;

        let content = fs::read_to_string(path).map_err(|e| InvalidReason::Unreadable(e.to_string()))?;
        if content.is_empty() {
            return Err(InvalidReason::Empty);
        }
        let data: Value =
            serde_json::from_str(&content).map_err(|e| InvalidReason::Unreadable(e.to_string()))?;

        let Value::Object(root) = data else {
            return Err(InvalidReason::NotAnObject);
        };
        match root.get("concepts") {
            None | Some(Value::Null) => Err(InvalidReason::MissingConcepts),
            Some(Value::Object(concepts)) if concepts.is_empty() => Err(InvalidReason::NoConcepts),
            Some(Value::Object(_)) => Ok(topic.to_string()),
            Some(_) => Err(InvalidReason::ConceptsNotObject),
        }
    }

    /// Merge concepts into the file for `topic` and write it back.
    ///
    /// Same-id concepts are replaced in place; other stored concepts are
    /// kept. The file is always written in the `{"concepts": {...}}` shape.
    pub fn save_concepts(
        &self,
        topic: &str,
        concepts: &[(String, Concept)],
    ) -> Result<SavedCollection, StoreError> {
        let stem = sanitize_file_stem(topic);
        if stem.is_empty() {
            return Err(StoreError::InvalidTopic(topic.to_string()));
        }
        let path = self.dir.join(format!("{}.json", stem));
        self.merge_into(&path, concepts)
    }

    /// Add or replace a single concept in an existing collection's file.
    pub fn add_concept(
        &self,
        collection: &ConceptCollection,
        id: &str,
        concept: &Concept,
    ) -> Result<SavedCollection, StoreError> {
        self.merge_into(collection.path(), &[(id.to_string(), concept.clone())])
    }

    fn merge_into(&self, path: &Path, concepts: &[(String, Concept)]) -> Result<SavedCollection, StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;

        let mut merged = read_existing(path);
        for (id, concept) in concepts {
            let value = serde_json::to_value(concept).map_err(|source| StoreError::Json {
                path: path.to_path_buf(),
                source,
            })?;
            merged.insert(id.clone(), value);
        }
        let concept_count = merged.len();

        let mut document = Map::new();
        document.insert("concepts".to_string(), Value::Object(merged));
        write_pretty(path, &Value::Object(document))?;

        let canonical_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(canonical_name)
            .unwrap_or_default();

        info!(
            topic = %canonical_name,
            path = %path.display(),
            added = concepts.len(),
            total = concept_count,
            "Saved knowledge base"
        );

        Ok(SavedCollection {
            canonical_name,
            path: path.to_path_buf(),
            concept_count,
        })
    }
}

fn read_collection(topic: &str, path: &Path) -> Result<ConceptCollection, StoreError> {
    let content = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    let data: Value = serde_json::from_str(&content).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let concepts = normalize_shape(data).ok_or_else(|| StoreError::NotAnObject(path.to_path_buf()))?;

    info!(topic, path = %path.display(), concepts = concepts.len(), "Loaded knowledge base");
    Ok(ConceptCollection::new(topic, path, concepts))
}

/// Concepts already stored at `path`; an absent or corrupt file counts as empty.
fn read_existing(path: &Path) -> Map<String, Value> {
    let Ok(content) = fs::read_to_string(path) else {
        return Map::new();
    };
    match serde_json::from_str::<Value>(&content) {
        Ok(data) => normalize_shape(data).unwrap_or_default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Existing knowledge base is corrupt, overwriting");
            Map::new()
        }
    }
}

fn write_pretty(path: &Path, value: &Value) -> Result<(), StoreError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, buf).map_err(|e| StoreError::io(path, e))
}

/// Keep alphanumerics, spaces and underscores, then drop trailing whitespace.
pub fn sanitize_file_stem(topic: &str) -> String {
    let kept: String = topic
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '_')
        .collect();
    kept.trim_end().to_string()
}

/// Human-readable topic name for a file stem.
pub fn canonical_name(stem: &str) -> String {
    title_case(&stem.replace('_', " "))
}

/// Upper-case the first cased letter of every word, lower-case the rest.
/// A word starts after any character that is not a cased letter.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_cased = false;
    for c in text.chars() {
        let cased = c.is_uppercase() || c.is_lowercase();
        if cased && previous_cased {
            out.extend(c.to_lowercase());
        } else if cased {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        previous_cased = cased;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn concept(definition: &str) -> Concept {
        Concept {
            definition: definition.to_string(),
            example: format!("an example of {}", definition),
            socratic_prompts: vec!["Why?".into(), "How?".into()],
            difficulty: 2,
        }
    }

    fn open(dir: &TempDir) -> KnowledgeStore {
        KnowledgeStore::open(dir.path(), ResolutionConfig::default()).unwrap()
    }

    #[test]
    fn test_naming_helpers() {
        assert_eq!(sanitize_file_stem("C++ / Rust: basics!  "), "C  Rust basics");
        assert_eq!(sanitize_file_stem("复变函数"), "复变函数");
        assert_eq!(canonical_name("linear_algebra"), "Linear Algebra");
        assert_eq!(canonical_name("SQL basics2go"), "Sql Basics2Go");
        assert_eq!(canonical_name("复变函数"), "复变函数");
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut store = open(&dir);

        let concepts = vec![
            ("Vectors".to_string(), concept("vectors")),
            ("Matrices".to_string(), concept("matrices")),
        ];
        let saved = store.save_concepts("linear algebra", &concepts).unwrap();
        assert_eq!(saved.canonical_name, "Linear Algebra");
        assert_eq!(saved.concept_count, 2);

        store.rescan().unwrap();
        let loaded = store.load(&saved.canonical_name).unwrap();
        assert_eq!(loaded.topic(), "Linear Algebra");
        assert_eq!(loaded.concepts(), concepts);
    }

    #[test]
    fn test_save_merges_and_overrides() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);

        store
            .save_concepts("Graphs", &[("Nodes".into(), concept("old")), ("Edges".into(), concept("edges"))])
            .unwrap();
        let saved = store
            .save_concepts("Graphs", &[("Nodes".into(), concept("new")), ("Paths".into(), concept("paths"))])
            .unwrap();
        assert_eq!(saved.concept_count, 3);

        let written: Value = serde_json::from_str(&fs::read_to_string(&saved.path).unwrap()).unwrap();
        let keys: Vec<_> = written["concepts"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["Nodes", "Edges", "Paths"]);
        assert_eq!(written["concepts"]["Nodes"]["definition"], "new");
    }

    #[test]
    fn test_save_merges_legacy_shapes() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        fs::write(
            dir.path().join("Sets.json"),
            json!({"concepts_list": [{"name": "Union", "definition": "u"}]}).to_string(),
        )
        .unwrap();

        let saved = store.save_concepts("Sets", &[("Intersection".into(), concept("i"))]).unwrap();
        assert_eq!(saved.concept_count, 2);
        let written: Value = serde_json::from_str(&fs::read_to_string(&saved.path).unwrap()).unwrap();
        assert!(written.get("concepts_list").is_none());
        assert!(written["concepts"].get("Union").is_some());
    }

    #[test]
    fn test_save_overwrites_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        fs::write(dir.path().join("Broken.json"), "{ not json").unwrap();

        let saved = store.save_concepts("Broken", &[("A".into(), concept("a"))]).unwrap();
        assert_eq!(saved.concept_count, 1);
    }

    #[test]
    fn test_save_rejects_unusable_topic() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        assert!(matches!(
            store.save_concepts("?!/", &[]),
            Err(StoreError::InvalidTopic(_))
        ));
    }

    #[test]
    fn test_load_tolerates_shapes() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("legacy_topic.json"),
            json!({"concepts_list": [{"name": "First", "definition": "one"}]}).to_string(),
        )
        .unwrap();
        fs::write(
            dir.path().join("flat.json"),
            json!({"Only": {"definition": "flat"}}).to_string(),
        )
        .unwrap();
        let store = open(&dir);

        assert_eq!(store.topics(), vec!["Flat", "Legacy Topic"]);
        let legacy = store.load("Legacy Topic").unwrap();
        assert_eq!(legacy.concept("First").unwrap().definition, "one");
        let flat = store.load("flat").unwrap();
        assert_eq!(flat.concept_ids(), vec!["Only"]);
    }

    #[test]
    fn test_resolution_cutoffs() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Linear Algebra.json"),
            json!({"concepts": {"Vectors": {}}}).to_string(),
        )
        .unwrap();
        let mut store = open(&dir);

        assert_eq!(store.resolve("linear algebr", 0.6).map(|(t, _)| t), Some("Linear Algebra"));
        assert!(store.resolve("quantum foo", 0.6).is_none());
        assert!(matches!(store.load("quantum foo"), Err(StoreError::TopicNotFound(_))));

        assert_eq!(store.check_validity("Linear Algebra").unwrap(), "Linear Algebra");
        assert!(matches!(
            store.check_validity("Lin Alg"),
            Err(InvalidReason::NotFound(_))
        ));
    }

    #[test]
    fn test_validity_reasons() {
        let dir = TempDir::new().unwrap();
        let cases = [
            ("Empty", "".to_string(), InvalidReason::Empty),
            ("Array", "[1, 2]".to_string(), InvalidReason::NotAnObject),
            ("Missing", json!({"other": 1}).to_string(), InvalidReason::MissingConcepts),
            ("Listy", json!({"concepts": [1]}).to_string(), InvalidReason::ConceptsNotObject),
            ("Hollow", json!({"concepts": {}}).to_string(), InvalidReason::NoConcepts),
        ];
        for (name, content, _) in &cases {
            fs::write(dir.path().join(format!("{}.json", name)), content).unwrap();
        }
        fs::write(dir.path().join("Garbled.json"), "{oops").unwrap();
        let mut store = open(&dir);

        for (name, _, expected) in cases {
            assert_eq!(store.check_validity(name).unwrap_err(), expected, "{}", name);
        }
        assert!(matches!(
            store.check_validity("Garbled"),
            Err(InvalidReason::Unreadable(_))
        ));
    }

    #[test]
    fn test_rescan_picks_up_new_files() {
        let dir = TempDir::new().unwrap();
        let mut store = open(&dir);
        assert!(store.topics().is_empty());

        fs::write(dir.path().join("late_arrival.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        store.rescan().unwrap();
        store.rescan().unwrap();
        assert_eq!(store.topics(), vec!["Late Arrival"]);
    }

    #[test]
    fn test_add_concept_uses_collection_file() {
        let dir = TempDir::new().unwrap();
        let mut store = open(&dir);
        store.save_concepts("data_structures", &[("Stack".into(), concept("stack"))]).unwrap();
        store.rescan().unwrap();

        let collection = store.load("Data Structures").unwrap();
        let saved = store.add_concept(&collection, "Queue", &concept("queue")).unwrap();
        assert_eq!(saved.path, collection.path());
        assert_eq!(saved.concept_count, 2);

        let reloaded = store.load("Data Structures").unwrap();
        assert_eq!(reloaded.concept_ids(), vec!["Stack", "Queue"]);
    }

    #[test]
    fn test_load_path_picks_exact_file() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        let snake = store.save_concepts("linear_algebra", &[("Vectors".into(), concept("vectors"))]).unwrap();
        let spaced = store.save_concepts("Linear Algebra", &[("Matrices".into(), concept("matrices"))]).unwrap();
        assert_eq!(snake.canonical_name, spaced.canonical_name);
        assert_ne!(snake.path, spaced.path);

        let first = store.load_path(&snake.path).unwrap();
        let second = store.load_path(&spaced.path).unwrap();
        assert_eq!(first.topic(), "Linear Algebra");
        assert_eq!(first.concept_ids(), vec!["Vectors"]);
        assert_eq!(second.concept_ids(), vec!["Matrices"]);

        assert!(matches!(
            store.load_path(&dir.path().join("missing.json")),
            Err(StoreError::Io { .. })
        ));
    }
}
