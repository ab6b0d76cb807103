pub mod cache;
pub mod loader;
pub mod settings;
pub mod store;

pub use cache::AssetCache;
pub use loader::{parse_knowledge_base, KnowledgeSource, LoadError, Loader, REQUIRED_SECTIONS};
pub use settings::{Settings, SettingsError};
pub use store::{AnswerStore, FileStore, KeyValueStore, MemoryStore, StoreError};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

// --- Types (matching app_data.json) ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
pub struct SymptomRecord {
    /// Likely causes, free text
    pub causes: String,
    /// Suggested actions, free text
    pub actions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
pub struct Question {
    /// Stable identifier, also the persistence key suffix (`toggle_<key>`)
    pub key: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
pub struct ChemicalTest {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
}

/// Symptom records in document order.
///
/// Serialized as a JSON object. A name that appears twice keeps its first
/// position and takes the last record, the way a JSON object literal does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Symptoms(Vec<(String, SymptomRecord)>);

impl Symptoms {
    pub fn get(&self, name: &str) -> Option<&SymptomRecord> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, name: String, record: SymptomRecord) {
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = record,
            None => self.0.push((name, record)),
        }
    }
}

impl FromIterator<(String, SymptomRecord)> for Symptoms {
    fn from_iter<I: IntoIterator<Item = (String, SymptomRecord)>>(iter: I) -> Self {
        let mut symptoms = Symptoms::default();
        for (name, record) in iter {
            symptoms.insert(name, record);
        }
        symptoms
    }
}

impl Serialize for Symptoms {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, record) in &self.0 {
            map.serialize_entry(name, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Symptoms {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SymptomsVisitor;

        impl<'de> Visitor<'de> for SymptomsVisitor {
            type Value = Symptoms;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of symptom name to causes and actions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Symptoms, A::Error> {
                let mut symptoms = Symptoms::default();
                while let Some((name, record)) = access.next_entry::<String, SymptomRecord>()? {
                    symptoms.insert(name, record);
                }
                Ok(symptoms)
            }
        }

        deserializer.deserialize_map(SymptomsVisitor)
    }
}

/// The knowledge base document. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBase {
    #[schemars(with = "BTreeMap<String, SymptomRecord>")]
    pub symptoms: Symptoms,
    /// Checklist questions, in display and summary order
    pub questions: Vec<Question>,
    pub chemical_tests: Vec<ChemicalTest>,
}

impl KnowledgeBase {
    /// Exact, case-sensitive symptom lookup.
    pub fn lookup_symptom(&self, name: &str) -> Option<&SymptomRecord> {
        self.symptoms.get(name)
    }

    pub fn symptom_names(&self) -> impl Iterator<Item = &str> {
        self.symptoms.names()
    }

    pub fn question(&self, key: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.key == key)
    }
}

/// A single checklist answer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, schemars::JsonSchema,
)]
pub enum Answer {
    #[default]
    Yes,
    No,
}

impl Answer {
    pub fn as_str(self) -> &'static str {
        match self {
            Answer::Yes => "Yes",
            Answer::No => "No",
        }
    }

    /// Decode a persisted value. Anything other than the two answer strings is `None`.
    pub fn from_value(value: &serde_json::Value) -> Option<Answer> {
        match value.as_str()? {
            "Yes" => Some(Answer::Yes),
            "No" => Some(Answer::No),
            _ => None,
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Question key -> answer. Keys that are absent read as `Answer::Yes`.
pub type Answers = HashMap<String, Answer>;

pub fn answer_for(answers: &Answers, key: &str) -> Answer {
    answers.get(key).copied().unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentifierField {
    Make,
    Model,
}

impl IdentifierField {
    /// Persistence key, shared with the page's input ids.
    pub fn key(self) -> &'static str {
        match self {
            IdentifierField::Make => "mMake",
            IdentifierField::Model => "mModel",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifiers {
    pub make: String,
    pub model: String,
}

impl Identifiers {
    pub fn set(&mut self, field: IdentifierField, value: String) {
        match field {
            IdentifierField::Make => self.make = value,
            IdentifierField::Model => self.model = value,
        }
    }
}

/// Everything the user has entered on this device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerState {
    pub toggles: Answers,
    pub identifiers: Identifiers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_symptom: Option<String>,
}

// --- Storage ---

/// Resolve the data directory (~/.dwhelper/, or `$DWHELPER_HOME` when set).
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("DWHELPER_HOME") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".dwhelper")
}

/// Write through a temp file + rename so readers never see a half-written file.
pub(crate) fn write_atomic(path: &Path, data: &str) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = dir.join(format!(".{}.tmp", name));
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(causes: &str) -> SymptomRecord {
        SymptomRecord {
            causes: causes.to_string(),
            actions: "-".to_string(),
        }
    }

    #[test]
    fn symptoms_keep_document_order() {
        let raw = r#"{"Streaks": {"causes": "a", "actions": "b"},
                      "Foaming": {"causes": "c", "actions": "d"},
                      "Cloudy glasses": {"causes": "e", "actions": "f"}}"#;
        let symptoms: Symptoms = serde_json::from_str(raw).unwrap();
        let names: Vec<&str> = symptoms.names().collect();
        assert_eq!(names, vec!["Streaks", "Foaming", "Cloudy glasses"]);
    }

    #[test]
    fn repeated_symptom_keeps_position_takes_last_record() {
        let symptoms: Symptoms = vec![
            ("A".to_string(), record("first")),
            ("B".to_string(), record("b")),
            ("A".to_string(), record("second")),
        ]
        .into_iter()
        .collect();
        assert_eq!(symptoms.len(), 2);
        assert_eq!(symptoms.names().next(), Some("A"));
        assert_eq!(symptoms.get("A").unwrap().causes, "second");
    }

    #[test]
    fn symptoms_serialize_as_object() {
        let symptoms: Symptoms = vec![("Z".to_string(), record("z")), ("A".to_string(), record("a"))]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&symptoms).unwrap();
        assert!(json.find("\"Z\"").unwrap() < json.find("\"A\"").unwrap());
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let kb = KnowledgeBase {
            symptoms: vec![("Foaming".to_string(), record("x"))].into_iter().collect(),
            questions: vec![],
            chemical_tests: vec![],
        };
        assert!(kb.lookup_symptom("Foaming").is_some());
        assert!(kb.lookup_symptom("foaming").is_none());
        assert!(kb.lookup_symptom("Foam").is_none());
    }

    #[test]
    fn answer_decodes_only_known_strings() {
        assert_eq!(Answer::from_value(&serde_json::json!("No")), Some(Answer::No));
        assert_eq!(Answer::from_value(&serde_json::json!("Yes")), Some(Answer::Yes));
        assert_eq!(Answer::from_value(&serde_json::json!("no")), None);
        assert_eq!(Answer::from_value(&serde_json::json!(true)), None);
        assert_eq!(serde_json::to_string(&Answer::No).unwrap(), "\"No\"");
    }

    #[test]
    fn absent_answer_reads_yes() {
        let mut answers = Answers::new();
        answers.insert("jets".to_string(), Answer::No);
        assert_eq!(answer_for(&answers, "jets"), Answer::No);
        assert_eq!(answer_for(&answers, "temps"), Answer::Yes);
    }

    #[test]
    fn atomic_write_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        write_atomic(&path, "{\"a\":1}").unwrap();
        write_atomic(&path, "{\"a\":2}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\":2}");
        assert!(!dir.path().join("nested").join(".state.json.tmp").exists());
    }
}
