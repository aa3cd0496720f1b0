//! Pipeline step execution.
//!
//! Each step is one stateless request/response against the LLM provider;
//! the session (see [`super::session`]) chains them and owns all state.
//! Errors are terminal for the step — no automatic transport retry.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::provider::{ChatOptions, LlmProvider};
use crate::utils::{preview, strip_code_fences};

use super::prompts;
use super::questions::questions_from_brief;
use super::types::{
    AuditReport, AuditRequest, AuditResponse, ClarifyRequest, ClarifyResponse, CompleteRequest,
    CompleteResponse, ContractBrief, FormSchema, GenerateRequest, GenerateResponse, RawAuditReport,
    SchemaRequest, SchemaResponse,
};

const CLARIFY_OPTIONS: ChatOptions = ChatOptions {
    temperature: 0.2,
    max_tokens: 4000,
};
const SCHEMA_OPTIONS: ChatOptions = ChatOptions {
    temperature: 0.3,
    max_tokens: 3000,
};
const AUDIT_OPTIONS: ChatOptions = ChatOptions {
    temperature: 0.1,
    max_tokens: 8000,
};
const GENERATE_OPTIONS: ChatOptions = ChatOptions {
    temperature: 0.3,
    max_tokens: 16000,
};
const COMPLETE_OPTIONS: ChatOptions = ChatOptions {
    temperature: 0.1,
    max_tokens: 4000,
};

/// Stateless executor for the five remote steps.
pub struct ContractPipeline {
    provider: Arc<dyn LlmProvider>,
}

impl ContractPipeline {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Turn a free-text request into a structured brief plus the questions
    /// needed to fill its gaps.
    pub async fn clarify(
        &self,
        request: &ClarifyRequest,
    ) -> Result<ClarifyResponse, PipelineError> {
        info!(
            contract_type = %request.contract_type,
            has_existing_answers = request.existing_answers.is_some(),
            "clarifying contract request"
        );

        let user = prompts::clarify_user(
            &request.contract_type,
            request.role,
            &request.description,
            request.existing_answers.as_ref(),
        );
        let completion = self
            .provider
            .chat(prompts::CLARIFY_SYSTEM, &user, CLARIFY_OPTIONS)
            .await?;
        debug!(brief = preview(&completion.content, 500), "raw brief received");

        let brief: ContractBrief = parse_model_json(&completion.content)?;
        let questions = questions_from_brief(&brief);
        let needs_more_info = brief.needs_more_info();

        Ok(ClarifyResponse {
            success: true,
            brief,
            needs_more_info,
            questions,
            tokens_used: completion.usage,
        })
    }

    /// Generate the dynamic form schema for a contract type.
    pub async fn generate_schema(
        &self,
        request: &SchemaRequest,
    ) -> Result<SchemaResponse, PipelineError> {
        info!(contract_type = %request.contract_type, "generating form schema");

        let user = prompts::schema_user(&request.contract_type, request.role, &request.description);
        let completion = self
            .provider
            .chat(prompts::SCHEMA_SYSTEM, &user, SCHEMA_OPTIONS)
            .await?;
        debug!(schema = preview(&completion.content, 200), "raw schema received");

        let schema: FormSchema = parse_model_json(&completion.content)?;
        Ok(SchemaResponse { schema })
    }

    /// Audit a form schema for completeness and legal quality.
    pub async fn audit(&self, request: &AuditRequest) -> Result<AuditResponse, PipelineError> {
        info!(
            contract_type = %request.contract_type,
            fields = request.schema.fields.len(),
            "auditing form schema"
        );

        let user = prompts::audit_user(
            &request.contract_type,
            request.role,
            &request.brief,
            &request.schema,
        );
        let completion = self
            .provider
            .chat(prompts::AUDIT_SYSTEM, &user, AUDIT_OPTIONS)
            .await?;
        debug!(audit = preview(&completion.content, 500), "raw audit received");

        let raw: RawAuditReport = parse_model_json(&completion.content)?;
        let report = AuditReport::from_raw(raw);
        info!(
            issues = report.issues.len(),
            critical = report.has_critical_issues,
            should_retry = report.should_retry,
            "audit finished"
        );

        Ok(AuditResponse {
            success: true,
            report,
            tokens_used: completion.usage,
        })
    }

    /// Draft the contract text from validated form data. Missing fields
    /// come back as the literal placeholder token.
    pub async fn generate_contract(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, PipelineError> {
        if request.contract_type.trim().is_empty() || request.form_data.is_empty() {
            return Err(PipelineError::Validation(
                "contractType et formData sont requis".to_string(),
            ));
        }
        info!(contract_type = %request.contract_type, "generating contract");

        let system = prompts::generate_system(&request.contract_type);
        let user = prompts::generate_user(
            &request.contract_type,
            &request.form_data,
            request.client_info.as_ref(),
        );
        let completion = self.provider.chat(&system, &user, GENERATE_OPTIONS).await?;

        Ok(GenerateResponse {
            success: true,
            contract: completion.content.trim().to_string(),
            tokens: completion.usage,
        })
    }

    /// Replace placeholder tokens with the matching party data. Fields
    /// absent from a party record stay as the untouched placeholder.
    pub async fn complete(
        &self,
        request: &CompleteRequest,
    ) -> Result<CompleteResponse, PipelineError> {
        if request.contract_content.trim().is_empty() || request.parties_clients.is_empty() {
            return Err(PipelineError::Validation(
                "contractContent et partiesClients requis".to_string(),
            ));
        }
        info!(
            parties = request.parties_clients.len(),
            "completing contract with client data"
        );

        let system = prompts::complete_system(&request.parties_clients);
        let user = prompts::complete_user(&request.contract_content);
        let completion = self.provider.chat(&system, &user, COMPLETE_OPTIONS).await?;

        Ok(CompleteResponse {
            completed_contract: completion.content.trim().to_string(),
        })
    }
}

fn parse_model_json<T: DeserializeOwned>(raw: &str) -> Result<T, PipelineError> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str(cleaned).map_err(|err| {
        warn!(%err, raw = preview(raw, 500), "model response is not the documented JSON shape");
        PipelineError::InvalidFormat
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_json_strips_fences() {
        #[derive(serde::Deserialize)]
        struct Payload {
            ok: bool,
        }
        let parsed: Payload = parse_model_json("```json\n{\"ok\": true}\n```").unwrap();
        assert!(parsed.ok);
    }

    #[test]
    fn test_parse_model_json_reports_invalid_format() {
        let result: Result<serde_json::Value, _> = parse_model_json("désolé, pas de JSON");
        assert!(matches!(result, Err(PipelineError::InvalidFormat)));
        assert_eq!(
            PipelineError::InvalidFormat.to_string(),
            "Format de réponse invalide de l'IA"
        );
    }

    #[test]
    fn test_step_sampling_is_low_temperature() {
        // Determinism-first settings; completion and audit are the strictest.
        assert!(AUDIT_OPTIONS.temperature <= CLARIFY_OPTIONS.temperature);
        assert!(COMPLETE_OPTIONS.temperature <= CLARIFY_OPTIONS.temperature);
        assert!(GENERATE_OPTIONS.max_tokens >= AUDIT_OPTIONS.max_tokens);
    }
}
