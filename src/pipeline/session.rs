//! Generation session state machine.
//!
//! The remote steps are stateless; this session object owns the whole flow
//! for one contract, serializes to JSON, and can be persisted and resumed
//! between steps. Every transition is appended to a history trail.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;
use uuid::Uuid;

use crate::error::PipelineError;

use super::prompts;
use super::steps::ContractPipeline;
use super::types::{
    AuditReport, AuditRequest, ClarifyRequest, ClientRecord, CompleteRequest, ContractBrief,
    FormSchema, GenerateRequest, Priority, ProfessionalRole, Question, SchemaRequest,
};
use super::validate::{self, ValidationResult};

/// Upper bound on audit-correct-reaudit loops. Past it the flow keeps the
/// last schema and proceeds with a warning.
pub const MAX_AUDIT_ITERATIONS: usize = 3;

/// Upper bound on clarification rounds. The answer loop must terminate even
/// if the model keeps flagging blocking gaps.
pub const MAX_CLARIFY_ROUNDS: usize = 5;

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStep {
    Drafting,
    Clarifying,
    AwaitingAnswers,
    BuildingSchema,
    Auditing,
    FillingForm,
    Generating,
    Completing,
    Complete,
}

/// One entry of the session's audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub step: SessionStep,
    pub timestamp: DateTime<Utc>,
    pub action: String,
}

/// Serializable state of one contract-creation flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSession {
    pub id: Uuid,
    pub contract_type: String,
    pub original_request: String,
    pub role: ProfessionalRole,
    pub step: SessionStep,
    pub brief: Option<ContractBrief>,
    pub questions: Vec<Question>,
    pub client_answers: Map<String, Value>,
    pub form_schema: Option<FormSchema>,
    pub audit_report: Option<AuditReport>,
    pub audit_iterations: usize,
    pub clarify_rounds: usize,
    pub form_data: Map<String, Value>,
    pub contract: Option<String>,
    pub completed_contract: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub history: Vec<HistoryEntry>,
}

impl GenerationSession {
    pub fn new(contract_type: &str, original_request: &str, role: ProfessionalRole) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            contract_type: contract_type.to_string(),
            original_request: original_request.to_string(),
            role,
            step: SessionStep::Drafting,
            brief: None,
            questions: Vec::new(),
            client_answers: Map::new(),
            form_schema: None,
            audit_report: None,
            audit_iterations: 0,
            clarify_rounds: 0,
            form_data: Map::new(),
            contract: None,
            completed_contract: None,
            created_at: now,
            updated_at: now,
            history: Vec::new(),
        }
    }

    fn record(&mut self, action: &str) {
        self.updated_at = Utc::now();
        self.history.push(HistoryEntry {
            step: self.step,
            timestamp: self.updated_at,
            action: action.to_string(),
        });
    }

    fn expect_step(&self, expected: SessionStep, operation: &str) -> Result<(), PipelineError> {
        if self.step != expected {
            return Err(PipelineError::Validation(format!(
                "étape invalide pour {operation} (étape actuelle: {:?})",
                self.step
            )));
        }
        Ok(())
    }

    /// Run one clarification round. Moves to `AwaitingAnswers` when the
    /// brief still has gaps, otherwise straight to `BuildingSchema`.
    pub async fn clarify(
        &mut self,
        pipeline: &ContractPipeline,
    ) -> Result<SessionStep, PipelineError> {
        if !matches!(self.step, SessionStep::Drafting | SessionStep::Clarifying) {
            return Err(PipelineError::Validation(format!(
                "étape invalide pour la clarification (étape actuelle: {:?})",
                self.step
            )));
        }
        if self.clarify_rounds >= MAX_CLARIFY_ROUNDS {
            return Err(PipelineError::RetriesExhausted(MAX_CLARIFY_ROUNDS));
        }
        self.clarify_rounds += 1;
        self.step = SessionStep::Clarifying;

        let request = ClarifyRequest {
            contract_type: self.contract_type.clone(),
            description: self.original_request.clone(),
            role: self.role,
            existing_answers: if self.client_answers.is_empty() {
                None
            } else {
                Some(self.client_answers.clone())
            },
        };
        let response = pipeline.clarify(&request).await?;
        self.brief = Some(response.brief);
        self.record("clarification terminée");

        if response.needs_more_info && !response.questions.is_empty() {
            self.questions = response.questions;
            self.step = SessionStep::AwaitingAnswers;
            self.record("questions générées - en attente des réponses");
        } else {
            self.questions.clear();
            self.step = SessionStep::BuildingSchema;
            self.record("brief complet - passage au schéma");
        }
        Ok(self.step)
    }

    /// Merge the end user's answers into the brief. Re-clarifies while
    /// blocking gaps remain, otherwise moves on to schema generation.
    pub async fn submit_answers(
        &mut self,
        pipeline: &ContractPipeline,
        answers: Map<String, Value>,
    ) -> Result<SessionStep, PipelineError> {
        self.expect_step(SessionStep::AwaitingAnswers, "la soumission des réponses")?;
        let brief = self.brief.as_mut().ok_or_else(|| {
            PipelineError::Validation(
                "brief manquant - exécutez d'abord la clarification".to_string(),
            )
        })?;

        for (field, value) in answers {
            brief.provided_info.insert(field.clone(), value.clone());
            self.client_answers.insert(field, value);
        }
        let answered = &self.client_answers;
        brief
            .missing_info
            .retain(|info| !answered.contains_key(&info.field));
        let still_blocked = brief
            .missing_info
            .iter()
            .any(|info| info.priority == Priority::Bloquant);
        self.record("réponses du client enregistrées");

        if still_blocked {
            self.step = SessionStep::Clarifying;
            self.clarify(pipeline).await
        } else {
            self.questions.clear();
            self.step = SessionStep::BuildingSchema;
            self.record("passage à la génération du schéma");
            Ok(self.step)
        }
    }

    /// Generate the form schema from the clarified brief.
    pub async fn build_schema(
        &mut self,
        pipeline: &ContractPipeline,
    ) -> Result<SessionStep, PipelineError> {
        self.expect_step(SessionStep::BuildingSchema, "la génération du schéma")?;
        let brief = self.brief.as_ref().ok_or_else(|| {
            PipelineError::Validation(
                "brief manquant - exécutez d'abord la clarification".to_string(),
            )
        })?;

        let request = SchemaRequest {
            contract_type: self.contract_type.clone(),
            description: prompts::enriched_description(&self.original_request, brief),
            role: self.role,
            brief: Some(brief.clone()),
        };
        let response = pipeline.generate_schema(&request).await?;
        self.form_schema = Some(response.schema);
        self.step = SessionStep::Auditing;
        self.record("schéma généré - passage à l'audit");
        Ok(self.step)
    }

    /// Audit the schema, applying corrections and re-auditing while the
    /// report demands it, bounded by [`MAX_AUDIT_ITERATIONS`].
    pub async fn audit(
        &mut self,
        pipeline: &ContractPipeline,
    ) -> Result<SessionStep, PipelineError> {
        self.expect_step(SessionStep::Auditing, "l'audit")?;

        loop {
            let schema = self.form_schema.clone().ok_or_else(|| {
                PipelineError::Validation("schéma manquant - générez-le d'abord".to_string())
            })?;
            let brief = self.brief.clone().ok_or_else(|| {
                PipelineError::Validation(
                    "brief manquant - exécutez d'abord la clarification".to_string(),
                )
            })?;

            let request = AuditRequest {
                schema,
                brief,
                contract_type: self.contract_type.clone(),
                role: self.role,
            };
            let response = pipeline.audit(&request).await?;
            self.audit_iterations += 1;
            let report = response.report;
            let should_retry = report.should_retry;
            let corrected = report.corrected_schema.clone();
            self.audit_report = Some(report);
            self.record(&format!("audit {} terminé", self.audit_iterations));

            if should_retry && self.audit_iterations < MAX_AUDIT_ITERATIONS {
                if let Some(corrected) = corrected {
                    self.form_schema = Some(corrected);
                    self.record("schéma corrigé appliqué");
                    continue;
                }
                // Nothing to apply; accept the schema as-is.
                break;
            }
            if should_retry {
                warn!(
                    iterations = self.audit_iterations,
                    "audit iteration cap reached, keeping last schema"
                );
                self.record("maximum d'itérations atteint - schéma conservé malgré les problèmes");
            }
            break;
        }

        self.step = SessionStep::FillingForm;
        self.record("audit terminé - prêt pour la saisie");
        Ok(self.step)
    }

    /// Validate the collected form data. The session only advances to
    /// generation when every hard rule passes.
    pub fn validate_form(
        &mut self,
        form_data: Map<String, Value>,
    ) -> Result<ValidationResult, PipelineError> {
        self.expect_step(SessionStep::FillingForm, "la validation du formulaire")?;
        let schema = self.form_schema.as_ref().ok_or_else(|| {
            PipelineError::Validation("schéma manquant - générez-le d'abord".to_string())
        })?;

        let result = validate::validate_form_data(&form_data, schema);
        self.form_data = form_data;
        if result.is_valid {
            self.step = SessionStep::Generating;
            self.record("validation réussie");
        } else {
            self.record(&format!(
                "erreurs de validation détectées:\n{}",
                validate::format_validation_errors(&result.errors)
            ));
        }
        Ok(result)
    }

    /// Draft the contract text from the validated form data.
    pub async fn generate(
        &mut self,
        pipeline: &ContractPipeline,
        client_info: Option<Value>,
    ) -> Result<SessionStep, PipelineError> {
        self.expect_step(SessionStep::Generating, "la génération du contrat")?;

        let request = GenerateRequest {
            contract_type: self.contract_type.clone(),
            form_data: self.form_data.clone(),
            client_info,
        };
        let response = pipeline.generate_contract(&request).await?;
        self.contract = Some(response.contract);
        self.step = SessionStep::Completing;
        self.record("contrat généré avec succès");
        Ok(self.step)
    }

    /// Replace the contract's placeholders with assigned client data.
    pub async fn complete(
        &mut self,
        pipeline: &ContractPipeline,
        parties_clients: BTreeMap<String, ClientRecord>,
    ) -> Result<SessionStep, PipelineError> {
        self.expect_step(SessionStep::Completing, "la complétion du contrat")?;
        let contract = self.contract.clone().ok_or_else(|| {
            PipelineError::Validation("contrat manquant - générez-le d'abord".to_string())
        })?;

        let request = CompleteRequest {
            contract_content: contract,
            parties_clients,
        };
        let response = pipeline.complete(&request).await?;
        self.completed_contract = Some(response.completed_contract);
        self.step = SessionStep::Complete;
        self.record("contrat complété avec les informations clients");
        Ok(self.step)
    }

    /// Persist the session so the flow can be resumed later.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize session")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write session to {}", path.display()))?;
        Ok(())
    }

    /// Load a previously saved session.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read session from {}", path.display()))?;
        serde_json::from_str(&json).context("failed to parse saved session")
    }
}
