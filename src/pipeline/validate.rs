//! Hard-rule validation of collected form data.
//!
//! Strict, code-side checks applied before contract generation. The model
//! never sees data that fails these rules; everything here is pure and
//! deterministic.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::types::{FieldType, FormSchema, RuleType, SchemaRule};

/// Kind of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    Required,
    Format,
    Coherence,
    BusinessRule,
}

/// One validation failure, attached to a field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: ValidationErrorKind,
}

/// Outcome of a validation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Validate form data against the audited schema.
pub fn validate_form_data(form_data: &Map<String, Value>, schema: &FormSchema) -> ValidationResult {
    let mut errors = Vec::new();

    // Required fields; conditionally-required ones are handled below.
    for field in &schema.fields {
        if field.required && field.conditional_on.is_none() && is_empty(form_data.get(&field.id)) {
            errors.push(ValidationError {
                field: field.id.clone(),
                message: format!("Le champ \"{}\" est obligatoire", field.label),
                kind: ValidationErrorKind::Required,
            });
        }
    }

    // Per-field formats.
    for field in &schema.fields {
        let value = match form_data.get(&field.id) {
            Some(value) if !is_empty(Some(value)) => value,
            _ => continue,
        };

        match field.field_type {
            FieldType::Number => {
                match as_number(value) {
                    None => errors.push(ValidationError {
                        field: field.id.clone(),
                        message: format!("\"{}\" doit être un nombre valide", field.label),
                        kind: ValidationErrorKind::Format,
                    }),
                    Some(number) => {
                        if let Some(validation) = &field.validation {
                            if let Some(min) = validation.min {
                                if number < min {
                                    errors.push(ValidationError {
                                        field: field.id.clone(),
                                        message: format!(
                                            "\"{}\" doit être >= {min}",
                                            field.label
                                        ),
                                        kind: ValidationErrorKind::Format,
                                    });
                                }
                            }
                            if let Some(max) = validation.max {
                                if number > max {
                                    errors.push(ValidationError {
                                        field: field.id.clone(),
                                        message: format!(
                                            "\"{}\" doit être <= {max}",
                                            field.label
                                        ),
                                        kind: ValidationErrorKind::Format,
                                    });
                                }
                            }
                        }
                    }
                }
            }
            FieldType::Date => {
                if value.as_str().map(parse_date).unwrap_or(None).is_none() {
                    errors.push(ValidationError {
                        field: field.id.clone(),
                        message: format!("\"{}\" n'est pas une date valide", field.label),
                        kind: ValidationErrorKind::Format,
                    });
                }
            }
            _ => {}
        }

        if let (Some(pattern), Some(text)) = (
            field.validation.as_ref().and_then(|v| v.pattern.as_deref()),
            value.as_str(),
        ) {
            // An unparseable pattern is a schema defect, not user error; skip it.
            if let Ok(regex) = Regex::new(pattern) {
                if !regex.is_match(text) {
                    errors.push(ValidationError {
                        field: field.id.clone(),
                        message: format!(
                            "\"{}\" ne respecte pas le format attendu",
                            field.label
                        ),
                        kind: ValidationErrorKind::Format,
                    });
                }
            }
        }
    }

    errors.extend(validate_date_coherence(form_data));
    errors.extend(validate_amount_coherence(form_data));
    errors.extend(validate_party_coherence(form_data));
    errors.extend(validate_business_rules(form_data, &schema.validation_rules));

    // Conditionally-required fields.
    for field in &schema.fields {
        if let Some(condition) = &field.conditional_on {
            let active = form_data.get(&condition.field) == Some(&condition.value);
            if active && field.required && is_empty(form_data.get(&field.id)) {
                errors.push(ValidationError {
                    field: field.id.clone(),
                    message: format!(
                        "Le champ \"{}\" est obligatoire dans ce contexte",
                        field.label
                    ),
                    kind: ValidationErrorKind::Required,
                });
            }
        }
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
        warnings: Vec::new(),
    }
}

/// Format errors as a bulleted list for display.
pub fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|error| format!("• {}", error.message))
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    }
}

/// Numeric reading of a JSON value; strings parse like user input.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Leading-number reading, so "12 mois" still yields 12.
fn leading_number(value: &Value) -> Option<f64> {
    if let Some(number) = as_number(value) {
        return Some(number);
    }
    let text = value.as_str()?.trim_start();
    let end = text
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || *c == '.' || (*i == 0 && *c == '-'))
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    text[..end].parse::<f64>().ok()
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%d/%m/%Y"))
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

fn date_field(form_data: &Map<String, Value>, key: &str) -> Option<NaiveDate> {
    form_data.get(key).and_then(|v| v.as_str()).and_then(parse_date)
}

fn validate_date_coherence(form_data: &Map<String, Value>) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let date_rules = [
        ("date_debut", "date_fin", "Date de début/fin"),
        ("date_signature", "date_effet", "Date de signature/effet"),
        ("date_naissance", "date_signature", "Date de naissance/signature"),
    ];

    for (start_key, end_key, label) in date_rules {
        if let (Some(start), Some(end)) = (
            date_field(form_data, start_key),
            date_field(form_data, end_key),
        ) {
            if start > end {
                errors.push(ValidationError {
                    field: end_key.to_string(),
                    message: format!(
                        "{label}: la date de fin doit être postérieure à la date de début"
                    ),
                    kind: ValidationErrorKind::Coherence,
                });
            }
        }
    }

    // Specified duration must match the begin/end span, one month tolerance.
    if let (Some(start), Some(end), Some(duration)) = (
        date_field(form_data, "date_debut"),
        date_field(form_data, "date_fin"),
        form_data.get("duree").and_then(leading_number),
    ) {
        let span_months = (end - start).num_days() as f64 / 30.0;
        if (span_months - duration).abs() > 1.0 {
            errors.push(ValidationError {
                field: "duree".to_string(),
                message: "La durée spécifiée ne correspond pas aux dates de début et fin"
                    .to_string(),
                kind: ValidationErrorKind::Coherence,
            });
        }
    }

    errors
}

fn validate_amount_coherence(form_data: &Map<String, Value>) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    const AMOUNT_MARKERS: [&str; 5] = ["montant", "prix", "loyer", "salaire", "remuneration"];
    for (key, value) in form_data {
        if AMOUNT_MARKERS.iter().any(|marker| key.contains(marker)) {
            if let Some(amount) = leading_number(value) {
                if amount < 0.0 {
                    errors.push(ValidationError {
                        field: key.clone(),
                        message: "Le montant doit être positif".to_string(),
                        kind: ValidationErrorKind::Coherence,
                    });
                }
            }
        }
    }

    if let (Some(total), Some(deposit)) = (
        form_data.get("prix_total").and_then(leading_number),
        form_data.get("acompte").and_then(leading_number),
    ) {
        if deposit > total {
            errors.push(ValidationError {
                field: "acompte".to_string(),
                message: "L'acompte ne peut pas être supérieur au prix total".to_string(),
                kind: ValidationErrorKind::Coherence,
            });
        }
    }

    errors
}

fn validate_party_coherence(form_data: &Map<String, Value>) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let parties = [
        ("partie1", "Partie 1"),
        ("partie2", "Partie 2"),
        ("vendeur", "Vendeur"),
        ("acquereur", "Acquéreur"),
        ("bailleur", "Bailleur"),
        ("locataire", "Locataire"),
    ];

    for (prefix, label) in parties {
        let text = |suffix: &str| {
            form_data
                .get(&format!("{prefix}_{suffix}"))
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let nom = text("nom");
        let prenom = text("prenom");
        let adresse = text("adresse");

        // Any identity fragment present means the identity must be complete.
        if nom.is_some() || prenom.is_some() || adresse.is_some() {
            if nom.is_none() {
                errors.push(ValidationError {
                    field: format!("{prefix}_nom"),
                    message: format!("Le nom de {label} est obligatoire"),
                    kind: ValidationErrorKind::Required,
                });
            }
            let raison_sociale = text("raison_sociale");
            let full_name = nom.as_deref().map(|n| n.contains(' ')).unwrap_or(false);
            if prenom.is_none() && raison_sociale.is_none() && !full_name {
                errors.push(ValidationError {
                    field: format!("{prefix}_prenom"),
                    message: format!(
                        "Le prénom de {label} est obligatoire (ou raison sociale si entreprise)"
                    ),
                    kind: ValidationErrorKind::Required,
                });
            }
        }
    }

    errors
}

fn validate_business_rules(
    form_data: &Map<String, Value>,
    rules: &[SchemaRule],
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for rule in rules {
        if !evaluate_rule(rule, form_data) {
            errors.push(ValidationError {
                field: rule.fields.first().cloned().unwrap_or_default(),
                message: rule.error_message.clone(),
                kind: ValidationErrorKind::BusinessRule,
            });
        }
    }

    errors
}

fn evaluate_rule(rule: &SchemaRule, form_data: &Map<String, Value>) -> bool {
    match rule.rule_type {
        RuleType::Required => rule
            .fields
            .iter()
            .all(|field| !is_empty(form_data.get(field))),
        RuleType::Comparison => {
            let Ok(pattern) = Regex::new(r"(\w+)\s*([><=]+)\s*(\w+)") else {
                return true;
            };
            let Some(captures) = pattern.captures(&rule.rule) else {
                return true;
            };
            let left = form_data.get(&captures[1]);
            let right = form_data.get(&captures[3]);
            let (Some(left), Some(right)) = (left, right) else {
                return true; // Skip when either side is missing.
            };
            compare_values(left, &captures[2], right)
        }
        // Coherence/custom rules carry no machine-checkable predicate here.
        RuleType::Coherence | RuleType::Custom => true,
    }
}

fn compare_values(left: &Value, operator: &str, right: &Value) -> bool {
    // Prefer numeric comparison; fall back to string ordering.
    if let (Some(a), Some(b)) = (as_number(left), as_number(right)) {
        return match operator {
            ">" => a > b,
            "<" => a < b,
            ">=" => a >= b,
            "<=" => a <= b,
            "==" => a == b,
            _ => true,
        };
    }
    let (Some(a), Some(b)) = (left.as_str(), right.as_str()) else {
        return true;
    };
    match operator {
        ">" => a > b,
        "<" => a < b,
        ">=" => a >= b,
        "<=" => a <= b,
        "==" => a == b,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{FieldType, FieldValidation, FormField};
    use serde_json::json;

    fn field(id: &str, label: &str, field_type: FieldType, required: bool) -> FormField {
        FormField {
            id: id.to_string(),
            label: label.to_string(),
            field_type,
            required,
            placeholder: None,
            options: None,
            conditional_on: None,
            validation: None,
            section: None,
            hint: None,
        }
    }

    fn form(values: Value) -> Map<String, Value> {
        values.as_object().cloned().unwrap()
    }

    #[test]
    fn test_required_fields() {
        let schema = FormSchema {
            fields: vec![field("loyer", "Loyer mensuel", FieldType::Number, true)],
            ..Default::default()
        };
        let result = validate_form_data(&form(json!({})), &schema);
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].kind, ValidationErrorKind::Required);
        assert!(result.errors[0].message.contains("Loyer mensuel"));
    }

    #[test]
    fn test_number_bounds_and_format() {
        let mut number_field = field("loyer", "Loyer", FieldType::Number, true);
        number_field.validation = Some(FieldValidation {
            min: Some(0.0),
            max: Some(10_000.0),
            pattern: None,
            custom_rule: None,
        });
        let schema = FormSchema {
            fields: vec![number_field],
            ..Default::default()
        };

        let ok = validate_form_data(&form(json!({ "loyer": "850" })), &schema);
        assert!(ok.is_valid);

        let not_a_number = validate_form_data(&form(json!({ "loyer": "huit cents" })), &schema);
        assert!(!not_a_number.is_valid);

        let too_big = validate_form_data(&form(json!({ "loyer": 50_000 })), &schema);
        assert!(!too_big.is_valid);
        assert!(too_big.errors[0].message.contains("<= 10000"));
    }

    #[test]
    fn test_date_format_and_coherence() {
        let schema = FormSchema {
            fields: vec![
                field("date_debut", "Début", FieldType::Date, true),
                field("date_fin", "Fin", FieldType::Date, true),
            ],
            ..Default::default()
        };

        let inverted = validate_form_data(
            &form(json!({ "date_debut": "2026-09-01", "date_fin": "2026-01-01" })),
            &schema,
        );
        assert!(inverted
            .errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::Coherence && e.field == "date_fin"));

        let garbage = validate_form_data(
            &form(json!({ "date_debut": "bientôt", "date_fin": "2026-01-01" })),
            &schema,
        );
        assert!(garbage
            .errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::Format && e.field == "date_debut"));
    }

    #[test]
    fn test_duration_vs_dates_tolerance() {
        let schema = FormSchema::default();
        let coherent = validate_form_data(
            &form(json!({
                "date_debut": "2026-01-01",
                "date_fin": "2027-01-01",
                "duree": "12 mois"
            })),
            &schema,
        );
        assert!(coherent.is_valid);

        let incoherent = validate_form_data(
            &form(json!({
                "date_debut": "2026-01-01",
                "date_fin": "2027-01-01",
                "duree": "3"
            })),
            &schema,
        );
        assert!(incoherent.errors.iter().any(|e| e.field == "duree"));
    }

    #[test]
    fn test_amount_coherence() {
        let schema = FormSchema::default();
        let negative = validate_form_data(&form(json!({ "montant_loyer": -10 })), &schema);
        assert!(negative.errors.iter().any(|e| e.field == "montant_loyer"));

        let deposit = validate_form_data(
            &form(json!({ "prix_total": 1000, "acompte": 1500 })),
            &schema,
        );
        assert!(deposit.errors.iter().any(|e| e.field == "acompte"));
    }

    #[test]
    fn test_party_identity_completeness() {
        let schema = FormSchema::default();
        let partial = validate_form_data(&form(json!({ "vendeur_adresse": "Lyon" })), &schema);
        assert!(partial.errors.iter().any(|e| e.field == "vendeur_nom"));
        assert!(partial.errors.iter().any(|e| e.field == "vendeur_prenom"));

        // Company identified by raison sociale needs no first name.
        let company = validate_form_data(
            &form(json!({ "vendeur_nom": "SCI Horizon", "vendeur_raison_sociale": "SCI Horizon" })),
            &schema,
        );
        assert!(company.is_valid);
    }

    #[test]
    fn test_comparison_rule() {
        let schema = FormSchema {
            validation_rules: vec![SchemaRule {
                id: None,
                rule_type: RuleType::Comparison,
                description: None,
                fields: vec!["date_fin".to_string()],
                rule: "date_fin >= date_debut".to_string(),
                error_message: "La date de fin doit suivre la date de début".to_string(),
            }],
            ..Default::default()
        };

        let failing = validate_form_data(
            &form(json!({ "date_debut": "2026-05-01", "date_fin": "2026-01-01" })),
            &schema,
        );
        assert!(failing
            .errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::BusinessRule));

        // Missing operands skip the rule instead of failing it.
        let skipped = validate_form_data(&form(json!({})), &schema);
        assert!(skipped.is_valid);
    }

    #[test]
    fn test_conditional_required() {
        let mut conditional = field("motif_cdd", "Motif du CDD", FieldType::Text, true);
        conditional.conditional_on = Some(crate::pipeline::types::Conditional {
            field: "type_contrat".to_string(),
            value: json!("CDD"),
        });
        let schema = FormSchema {
            fields: vec![conditional],
            ..Default::default()
        };

        let triggered = validate_form_data(&form(json!({ "type_contrat": "CDD" })), &schema);
        assert!(!triggered.is_valid);

        let dormant = validate_form_data(&form(json!({ "type_contrat": "CDI" })), &schema);
        assert!(dormant.is_valid);
    }

    #[test]
    fn test_format_validation_errors_bullets() {
        let errors = vec![ValidationError {
            field: "loyer".to_string(),
            message: "Le montant doit être positif".to_string(),
            kind: ValidationErrorKind::Coherence,
        }];
        assert_eq!(
            format_validation_errors(&errors),
            "• Le montant doit être positif"
        );
    }
}
