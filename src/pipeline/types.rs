//! Wire types for the contract pipeline.
//!
//! Field names mirror the JSON contract consumed by the web client:
//! camelCase object keys and French enum labels (`"bloquant"`,
//! `"incohérence"`, ...). Model-produced corners stay loose on purpose —
//! generous `#[serde(default)]` keeps a slightly off-shape but usable
//! response from failing the whole step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::provider::TokenUsage;

/// Priority of a missing-information entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Bloquant,
    Important,
    Optionnel,
}

/// Severity of an audit issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Bloquant,
    Important,
    Mineur,
}

/// Category of an audit issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueCategory {
    #[serde(rename = "champ_manquant")]
    ChampManquant,
    #[serde(rename = "incohérence")]
    Incoherence,
    #[serde(rename = "clause_sensible")]
    ClauseSensible,
    #[serde(rename = "validation")]
    Validation,
}

/// The professional driving the flow; adjusts prompt wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfessionalRole {
    Avocat,
    Notaire,
}

impl ProfessionalRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            ProfessionalRole::Avocat => "Avocat",
            ProfessionalRole::Notaire => "Notaire",
        }
    }
}

/// A contract party as identified by the clarification step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Context block of a brief.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefContext {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub objectif: String,
    #[serde(default)]
    pub particularites: Vec<String>,
}

/// A piece of information the contract still needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingInfo {
    pub category: String,
    pub field: String,
    pub description: String,
    pub priority: Priority,
}

/// Structured brief produced by the clarification step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractBrief {
    pub contract_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(default)]
    pub parties: Vec<Party>,
    pub context: BriefContext,
    #[serde(default)]
    pub points_sensibles: Vec<String>,
    #[serde(default)]
    pub annexes_attendues: Vec<String>,
    #[serde(default)]
    pub missing_info: Vec<MissingInfo>,
    #[serde(default)]
    pub provided_info: Map<String, Value>,
}

impl ContractBrief {
    /// Whether any missing entry blocks contract creation outright.
    pub fn has_blocking_missing_info(&self) -> bool {
        self.missing_info
            .iter()
            .any(|info| info.priority == Priority::Bloquant)
    }

    /// Whether the caller must collect more information before proceeding.
    pub fn needs_more_info(&self) -> bool {
        !self.missing_info.is_empty()
    }
}

/// Input widget to present for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    Textarea,
    Number,
    Date,
    Select,
    Radio,
}

/// A question presented to the end user for a missing-information entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub category: String,
    pub question: String,
    pub field_name: String,
    pub input_type: InputType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub required: bool,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Widget type of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    Date,
    Select,
    Radio,
    Checkbox,
    File,
}

/// Declarative constraints attached to a form field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(rename = "customRule", default, skip_serializing_if = "Option::is_none")]
    pub custom_rule: Option<String>,
}

/// Visibility/requirement condition on another field's value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conditional {
    pub field: String,
    pub value: Value,
}

/// One field of the dynamic contract form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_on: Option<Conditional>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Grouping of fields for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<String>,
}

/// Kind of a schema-declared validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Required,
    Comparison,
    Coherence,
    Custom,
}

/// A cross-field validation rule declared by the schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub rule: String,
    #[serde(default)]
    pub error_message: String,
}

/// The dynamic form presented for a given contract type. Revised by the
/// audit step through `correctedSchema`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,
    #[serde(default)]
    pub client_roles: Vec<String>,
    #[serde(default)]
    pub sections: Vec<FormSection>,
    #[serde(default)]
    pub fields: Vec<FormField>,
    #[serde(default)]
    pub validation_rules: Vec<SchemaRule>,
}

/// Fix proposed for an audit issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedFix {
    #[serde(rename = "type")]
    pub fix_type: FixType,
    #[serde(default)]
    pub details: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixType {
    AddField,
    ModifyField,
    AddValidation,
    AddClause,
}

/// A single problem flagged by the audit step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditIssue {
    #[serde(default)]
    pub id: String,
    pub severity: Severity,
    pub category: IssueCategory,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub affected_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<SuggestedFix>,
}

/// Audit payload as the model returns it, before metadata stamping.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawAuditReport {
    #[serde(default)]
    pub issues: Vec<AuditIssue>,
    #[serde(default)]
    pub has_critical_issues: bool,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub corrected_schema: Option<FormSchema>,
}

/// Full audit report with stamped metadata and the derived retry flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub timestamp: DateTime<Utc>,
    pub schema_version: String,
    pub issues: Vec<AuditIssue>,
    pub has_critical_issues: bool,
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_schema: Option<FormSchema>,
    pub should_retry: bool,
}

impl AuditReport {
    pub(crate) fn from_raw(raw: RawAuditReport) -> Self {
        let should_retry = raw.has_critical_issues
            || raw
                .issues
                .iter()
                .any(|issue| issue.severity == Severity::Bloquant);
        Self {
            timestamp: Utc::now(),
            schema_version: "1.0".to_string(),
            issues: raw.issues,
            has_critical_issues: raw.has_critical_issues,
            suggestions: raw.suggestions,
            corrected_schema: raw.corrected_schema,
            should_retry,
        }
    }
}

/// Flat client record attached to a contract party. Every field is
/// optional; data absent here must stay as the placeholder token in the
/// completed contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prenom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nom_naissance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_naissance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lieu_naissance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationalite: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sexe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adresse: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_postal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ville: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pays: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etat_civil: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub situation_matrimoniale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_identite: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numero_identite: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_expiration_identite: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employeur: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adresse_professionnelle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub siret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nom_entreprise: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ville_rcs: Option<String>,
}

impl ClientRecord {
    /// Human-readable lines for prompt construction. The full name line is
    /// always present; every other line only when the field is populated.
    pub fn summary_lines(&self) -> Vec<String> {
        let full_name = format!(
            "{} {}",
            self.prenom.as_deref().unwrap_or(""),
            self.nom.as_deref().unwrap_or("")
        );
        let mut lines = vec![format!("Nom complet: {}", full_name.trim())];

        let optional = [
            ("Nom de naissance", &self.nom_naissance),
            ("Date de naissance", &self.date_naissance),
            ("Lieu de naissance", &self.lieu_naissance),
            ("Nationalité", &self.nationalite),
            ("Sexe", &self.sexe),
            ("Adresse", &self.adresse),
            ("Code postal", &self.code_postal),
            ("Ville", &self.ville),
            ("Pays", &self.pays),
            ("Téléphone", &self.telephone),
            ("Email", &self.email),
            ("État civil", &self.etat_civil),
            ("Situation matrimoniale", &self.situation_matrimoniale),
            ("Type d'identité", &self.type_identite),
            ("Numéro d'identité", &self.numero_identite),
            ("Date d'expiration", &self.date_expiration_identite),
            ("Profession", &self.profession),
            ("Employeur", &self.employeur),
            ("Adresse professionnelle", &self.adresse_professionnelle),
            ("SIRET", &self.siret),
            ("Nom entreprise", &self.nom_entreprise),
            ("Ville RCS", &self.ville_rcs),
        ];
        for (label, value) in optional {
            if let Some(value) = value {
                lines.push(format!("{label}: {value}"));
            }
        }
        lines
    }
}

// ──────────────────────────────────────────────────────────────────────────
// REQUEST / RESPONSE ENVELOPES
// ──────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClarifyRequest {
    pub contract_type: String,
    #[serde(default)]
    pub description: String,
    pub role: ProfessionalRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_answers: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClarifyResponse {
    pub success: bool,
    pub brief: ContractBrief,
    pub needs_more_info: bool,
    pub questions: Vec<Question>,
    pub tokens_used: TokenUsage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRequest {
    pub contract_type: String,
    #[serde(default)]
    pub description: String,
    pub role: ProfessionalRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief: Option<ContractBrief>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaResponse {
    pub schema: FormSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRequest {
    pub schema: FormSchema,
    pub brief: ContractBrief,
    pub contract_type: String,
    pub role: ProfessionalRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResponse {
    pub success: bool,
    pub report: AuditReport,
    pub tokens_used: TokenUsage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contract_type: String,
    #[serde(default)]
    pub form_data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_info: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub contract: String,
    pub tokens: TokenUsage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    pub contract_content: String,
    /// Party label (e.g. "Le Vendeur") → client record. Ordered so prompt
    /// construction is deterministic.
    pub parties_clients: BTreeMap<String, ClientRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteResponse {
    pub completed_contract: String,
}
