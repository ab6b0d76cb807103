pub mod advice;
pub mod session;
pub mod summary;

pub use advice::{
    advice_for, compile, AdviceMessage, AdviceReport, ADVICE_TABLE, FINDINGS_HEADING,
    NO_ISSUES_MESSAGE,
};
pub use session::{ChecklistItem, Session, SessionView};
pub use summary::format_summary;

use dwhelper_core::{KnowledgeBase, SymptomRecord};
use serde::Serialize;

/// Exact, case-sensitive symptom lookup. No fuzzy matching.
pub fn lookup_symptom<'a>(kb: &'a KnowledgeBase, name: &str) -> Option<&'a SymptomRecord> {
    kb.lookup_symptom(name)
}

/// Text shown in each dependent region when the knowledge base fails to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadErrorLabels {
    pub symptoms: &'static str,
    pub checklist: &'static str,
    pub chemical_tests: &'static str,
}

pub const LOAD_ERROR_LABELS: LoadErrorLabels = LoadErrorLabels {
    symptoms: "Error loading data",
    checklist: "Could not load checklist questions.",
    chemical_tests: "Could not load chemical tests.",
};
