use serde::Serialize;

use dwhelper_core::{answer_for, Answer, Answers, Question};

/// Remedial message for each checklist question answered "No".
/// Questions whose key is not listed here produce no advice.
pub const ADVICE_TABLE: &[(&str, &str)] = &[
    ("dosingOn", "Switch on dosing unit."),
    ("dosingWorking", "Repair or calibrate dosing equipment."),
    ("temps", "Verify and adjust wash & rinse temperatures."),
    ("jets", "Clear wash and rinse jets."),
    ("practice", "Improve pre-scraping and racking practices."),
    ("detergent", "Connect correct detergent containers & tubing."),
    ("titration", "Perform detergent titration test."),
];

pub const FINDINGS_HEADING: &str = "Checklist findings";
pub const NO_ISSUES_MESSAGE: &str = "No obvious issues from the checklist.";

pub fn advice_for(question_key: &str) -> Option<&'static str> {
    ADVICE_TABLE
        .iter()
        .find(|(key, _)| *key == question_key)
        .map(|(_, message)| *message)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceMessage {
    pub question_key: String,
    pub message: &'static str,
}

/// Advice for every question answered "No", in question order.
pub fn compile(questions: &[Question], answers: &Answers) -> Vec<AdviceMessage> {
    questions
        .iter()
        .filter(|q| answer_for(answers, &q.key) == Answer::No)
        .filter_map(|q| {
            advice_for(&q.key).map(|message| AdviceMessage {
                question_key: q.key.clone(),
                message,
            })
        })
        .collect()
}

/// Compiled advice plus the headline the panel shows above it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceReport {
    pub headline: &'static str,
    pub findings: Vec<AdviceMessage>,
}

impl AdviceReport {
    pub fn compile(questions: &[Question], answers: &Answers) -> Self {
        Self::from_findings(compile(questions, answers))
    }

    pub fn from_findings(findings: Vec<AdviceMessage>) -> Self {
        let headline = if findings.is_empty() {
            NO_ISSUES_MESSAGE
        } else {
            FINDINGS_HEADING
        };
        Self { headline, findings }
    }

    pub fn is_clear(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn messages(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.findings.iter().map(|f| f.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(key: &str) -> Question {
        Question {
            key: key.to_string(),
            text: format!("{key}?"),
            note: None,
        }
    }

    fn answers(pairs: &[(&str, Answer)]) -> Answers {
        pairs.iter().map(|(k, a)| (k.to_string(), *a)).collect()
    }

    #[test]
    fn follows_question_order_not_table_order() {
        let questions = vec![question("temps"), question("dosingOn")];
        let answers = answers(&[("temps", Answer::No), ("dosingOn", Answer::No)]);
        let messages: Vec<_> = compile(&questions, &answers)
            .into_iter()
            .map(|m| m.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "Verify and adjust wash & rinse temperatures.",
                "Switch on dosing unit."
            ]
        );
    }

    #[test]
    fn is_deterministic() {
        let questions: Vec<_> = ADVICE_TABLE.iter().map(|(k, _)| question(k)).collect();
        let answers = answers(&[("jets", Answer::No), ("titration", Answer::No), ("temps", Answer::Yes)]);
        let first = compile(&questions, &answers);
        assert_eq!(first, compile(&questions, &answers));
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn all_yes_gives_no_issues() {
        let questions: Vec<_> = ADVICE_TABLE.iter().map(|(k, _)| question(k)).collect();
        let all_yes: Answers = ADVICE_TABLE
            .iter()
            .map(|(k, _)| (k.to_string(), Answer::Yes))
            .collect();
        let report = AdviceReport::compile(&questions, &all_yes);
        assert!(report.is_clear());
        assert_eq!(report.headline, NO_ISSUES_MESSAGE);

        // Unanswered questions read as "Yes" too.
        assert!(compile(&questions, &Answers::new()).is_empty());
    }

    #[test]
    fn unknown_key_is_silent() {
        let questions = vec![question("foo"), question("jets")];
        let answers = answers(&[("foo", Answer::No), ("jets", Answer::No)]);
        let report = AdviceReport::compile(&questions, &answers);
        assert_eq!(report.headline, FINDINGS_HEADING);
        assert_eq!(report.messages().collect::<Vec<_>>(), vec!["Clear wash and rinse jets."]);
        assert_eq!(report.findings[0].question_key, "jets");
    }

    #[test]
    fn only_unknown_keys_is_clear() {
        let questions = vec![question("foo")];
        let answers = answers(&[("foo", Answer::No)]);
        assert!(AdviceReport::compile(&questions, &answers).is_clear());
    }

    #[test]
    fn table_covers_seven_keys() {
        assert_eq!(ADVICE_TABLE.len(), 7);
        assert_eq!(advice_for("detergent"), Some("Connect correct detergent containers & tubing."));
        assert_eq!(advice_for("Detergent"), None);
    }
}
