#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentIntent {
    AnalyzeInvoice { invoice_id: String },
    FinalizeApproval { workflow_id: String, stage: u8 },
    OverrideStageCount { workflow_id: String, requested_stages: u8 },
    AwardQuote { request_id: String, quote_id: String },
}

impl AgentIntent {
    pub fn action_key(&self) -> &'static str {
        match self {
            Self::AnalyzeInvoice { .. } => "analysis.analyze_invoice",
            Self::FinalizeApproval { .. } => "workflow.finalize_approval",
            Self::OverrideStageCount { .. } => "workflow.override_stage_count",
            Self::AwardQuote { .. } => "transport.award_quote",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Allow,
    Deny { reason_code: &'static str, user_message: String, fallback_path: &'static str },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardrailPolicy {
    pub analysis_enabled: bool,
}

impl Default for GuardrailPolicy {
    fn default() -> Self {
        Self { analysis_enabled: true }
    }
}

impl GuardrailPolicy {
    pub fn evaluate(&self, intent: &AgentIntent) -> GuardrailDecision {
        match intent {
            AgentIntent::AnalyzeInvoice { .. } if self.analysis_enabled => GuardrailDecision::Allow,
            AgentIntent::AnalyzeInvoice { .. } => GuardrailDecision::Deny {
                reason_code: "analysis_disabled",
                user_message: "Invoice analysis is temporarily unavailable. Route the invoice manually."
                    .to_string(),
                fallback_path: "manual_routing",
            },
            AgentIntent::FinalizeApproval { .. } => GuardrailDecision::Deny {
                reason_code: "approval_finalization_disallowed",
                user_message:
                    "The model cannot approve or reject stages. A named approver must act through the workflow."
                        .to_string(),
                fallback_path: "approval_workflow",
            },
            AgentIntent::OverrideStageCount { .. } => GuardrailDecision::Deny {
                reason_code: "stage_count_override_disallowed",
                user_message:
                    "Stage counts are fixed amount-threshold policy; the model cannot change them."
                        .to_string(),
                fallback_path: "approval_router",
            },
            AgentIntent::AwardQuote { .. } => GuardrailDecision::Deny {
                reason_code: "quote_award_disallowed",
                user_message:
                    "The model cannot award transport quotes. Use the weighted comparison endpoint."
                        .to_string(),
                fallback_path: "quote_comparison",
            },
        }
    }
}
