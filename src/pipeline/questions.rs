//! Question derivation from a brief's missing-information entries.

use super::types::{ContractBrief, InputType, MissingInfo, Priority, Question};

/// Build the questions to present to the end user, one per missing entry.
pub fn questions_from_brief(brief: &ContractBrief) -> Vec<Question> {
    brief
        .missing_info
        .iter()
        .enumerate()
        .map(|(index, info)| Question {
            id: format!("q_{index}"),
            category: info.category.clone(),
            question: question_text(info),
            field_name: info.field.clone(),
            input_type: infer_input_type(&info.field, &info.category),
            options: None,
            required: info.priority == Priority::Bloquant,
            priority: info.priority,
            hint: Some(info.description.clone()),
        })
        .collect()
}

/// Question wording from per-category templates; categories without a
/// template fall back to the raw description.
pub fn question_text(info: &MissingInfo) -> String {
    let description = info.description.to_lowercase();
    match info.category.as_str() {
        "Parties" => format!("Veuillez fournir {description}"),
        "Montants" => format!("Quel est {description} ?"),
        "Durée" | "Dates" | "Adresse" => format!("Quelle est {description} ?"),
        "Conditions" => format!("Précisez {description}"),
        _ => info.description.clone(),
    }
}

/// Infer the input widget from the field name and category.
pub fn infer_input_type(field: &str, category: &str) -> InputType {
    if field.contains("date") || category == "Dates" {
        return InputType::Date;
    }
    if field.contains("montant") || field.contains("prix") || category == "Montants" {
        return InputType::Number;
    }
    if field.contains("description") || field.contains("detail") {
        return InputType::Textarea;
    }
    InputType::Text
}
