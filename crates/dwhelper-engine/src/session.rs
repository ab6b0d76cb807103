use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use dwhelper_core::{
    answer_for, Answer, AnswerState, AnswerStore, ChemicalTest, IdentifierField, Identifiers,
    KeyValueStore, KnowledgeBase, SymptomRecord,
};

use crate::advice::AdviceReport;
use crate::summary::format_summary;

/// One checklist row as the page draws it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub key: String,
    /// "<n>. <text>", numbered from 1
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub answer: Answer,
}

/// Everything needed to draw the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub symptoms: Vec<String>,
    pub selected_symptom: Option<String>,
    pub symptom_record: Option<SymptomRecord>,
    pub checklist: Vec<ChecklistItem>,
    pub chemical_tests: Vec<ChemicalTest>,
    pub identifiers: Identifiers,
    pub advice: AdviceReport,
}

/// The user's working session over a loaded knowledge base.
///
/// Every change is written through to the store before the call returns.
pub struct Session<S> {
    kb: Arc<KnowledgeBase>,
    store: AnswerStore<S>,
    state: AnswerState,
}

impl<S: KeyValueStore> Session<S> {
    /// Start a session, restoring whatever was persisted for `kb`.
    pub fn open(kb: Arc<KnowledgeBase>, store: S) -> Self {
        let store = AnswerStore::new(store);
        let state = store.restore_state(&kb);
        debug!(
            questions = state.toggles.len(),
            last_symptom = state.last_symptom.as_deref().unwrap_or(""),
            "session restored"
        );
        Self { kb, store, state }
    }

    pub fn state(&self) -> &AnswerState {
        &self.state
    }

    pub fn into_store(self) -> S {
        self.store.into_inner()
    }

    pub fn advice(&self) -> AdviceReport {
        AdviceReport::compile(&self.kb.questions, &self.state.toggles)
    }

    pub fn selected_symptom(&self) -> Option<(&str, &SymptomRecord)> {
        let name = self.state.last_symptom.as_deref()?;
        self.kb.lookup_symptom(name).map(|record| (name, record))
    }

    /// Record an answer and recompile. Keys not in the checklist are ignored.
    pub fn set_answer(&mut self, question_key: &str, answer: Answer) -> AdviceReport {
        if self.kb.question(question_key).is_none() {
            debug!(question_key, "ignoring answer for unknown question");
            return self.advice();
        }
        self.store.record_toggle(question_key, answer);
        self.state.toggles.insert(question_key.to_string(), answer);
        self.advice()
    }

    /// Select a symptom. `None`, an empty name or an unknown name clears the
    /// selection and leaves the remembered symptom untouched.
    pub fn select_symptom(&mut self, name: Option<&str>) -> Option<SymptomRecord> {
        let Some((name, record)) = name
            .filter(|n| !n.is_empty())
            .and_then(|n| self.kb.lookup_symptom(n).map(|r| (n, r.clone())))
        else {
            self.state.last_symptom = None;
            return None;
        };
        self.store.record_last_symptom(name);
        self.state.last_symptom = Some(name.to_string());
        Some(record)
    }

    /// Record a machine identifier. Returns the stored, trimmed value.
    pub fn set_identifier(&mut self, field: IdentifierField, value: &str) -> String {
        let stored = self.store.record_identifier(field, value);
        self.state.identifiers.set(field, stored.clone());
        stored
    }

    pub fn summary(&self) -> String {
        let selected = self.selected_symptom();
        format_summary(
            &self.state.identifiers,
            &self.kb.questions,
            &self.state.toggles,
            selected.map(|(name, _)| name),
            selected.map(|(_, record)| record),
        )
    }

    pub fn view(&self) -> SessionView {
        let checklist = self
            .kb
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| ChecklistItem {
                key: q.key.clone(),
                label: format!("{}. {}", i + 1, q.text),
                note: q.note.clone(),
                answer: answer_for(&self.state.toggles, &q.key),
            })
            .collect();
        let selected = self.selected_symptom();

        SessionView {
            symptoms: self.kb.symptom_names().map(str::to_string).collect(),
            selected_symptom: selected.map(|(name, _)| name.to_string()),
            symptom_record: selected.map(|(_, record)| record.clone()),
            checklist,
            chemical_tests: self.kb.chemical_tests.clone(),
            identifiers: self.state.identifiers.clone(),
            advice: self.advice(),
        }
    }
}
