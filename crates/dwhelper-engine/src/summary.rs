use dwhelper_core::{answer_for, Answers, Identifiers, Question, SymptomRecord};

fn or_dash(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        "-"
    } else {
        trimmed
    }
}

/// Plain-text summary for the clipboard.
///
/// Machine identifiers, every question with its answer in checklist order,
/// then the selected symptom. Causes and actions follow only when a symptom
/// is selected and its record is known.
pub fn format_summary(
    identifiers: &Identifiers,
    questions: &[Question],
    answers: &Answers,
    selected_symptom: Option<&str>,
    symptom_record: Option<&SymptomRecord>,
) -> String {
    let mut out = String::with_capacity(512);

    out.push_str("Machine Make: ");
    out.push_str(or_dash(&identifiers.make));
    out.push('\n');
    out.push_str("Machine Model: ");
    out.push_str(or_dash(&identifiers.model));
    out.push_str("\n\n");

    for (i, q) in questions.iter().enumerate() {
        out.push_str(&format!("{}. {} - {}\n", i + 1, q.text, answer_for(answers, &q.key)));
    }

    out.push_str("\n--- Symptom ---\n");
    match selected_symptom.filter(|s| !s.is_empty()) {
        Some(name) => {
            out.push_str(name);
            out.push('\n');
            if let Some(record) = symptom_record {
                out.push_str("\nLikely causes: ");
                out.push_str(&record.causes);
                out.push_str("\nSuggested actions: ");
                out.push_str(&record.actions);
            }
        }
        None => out.push_str("None selected\n"),
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dwhelper_core::Answer;

    fn jets() -> Vec<Question> {
        vec![Question {
            key: "jets".to_string(),
            text: "Jets clear?".to_string(),
            note: None,
        }]
    }

    #[test]
    fn lists_identifiers_answers_and_no_symptom() {
        let identifiers = Identifiers {
            make: "Hobart".to_string(),
            model: String::new(),
        };
        let answers: Answers = [("jets".to_string(), Answer::No)].into_iter().collect();
        let text = format_summary(&identifiers, &jets(), &answers, None, None);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines.contains(&"Machine Make: Hobart"));
        assert!(lines.contains(&"Machine Model: -"));
        assert!(lines.contains(&"1. Jets clear? - No"));
        assert!(lines.contains(&"None selected"));
        assert!(!text.contains("Likely causes"));
    }

    #[test]
    fn exact_layout_with_symptom() {
        let identifiers = Identifiers {
            make: "Winterhalter".to_string(),
            model: "UC-M".to_string(),
        };
        let record = SymptomRecord {
            causes: "Low rinse aid".to_string(),
            actions: "Refill rinse aid".to_string(),
        };
        let text = format_summary(
            &identifiers,
            &jets(),
            &Answers::new(),
            Some("Spotting"),
            Some(&record),
        );
        assert_eq!(
            text,
            "Machine Make: Winterhalter\n\
             Machine Model: UC-M\n\
             \n\
             1. Jets clear? - Yes\n\
             \n\
             --- Symptom ---\n\
             Spotting\n\
             \n\
             Likely causes: Low rinse aid\n\
             Suggested actions: Refill rinse aid"
        );
    }

    #[test]
    fn empty_selection_counts_as_none() {
        let text = format_summary(&Identifiers::default(), &[], &Answers::new(), Some(""), None);
        assert!(text.ends_with("--- Symptom ---\nNone selected\n"));
        assert!(text.starts_with("Machine Make: -\nMachine Model: -\n"));
    }
}
