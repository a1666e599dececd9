//! Invoice analysis: prompt assembly and strict-JSON response parsing.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use wegroup_core::approvals::AnalysisSignal;
use wegroup_core::domain::approval::AiRecommendation;
use wegroup_core::domain::invoice::Invoice;

use crate::llm::{ChatCompletionClient, ChatRequest};

const SYSTEM_PROMPT: &str = "You are an accounts-payable analyst for an enterprise platform. \
You assess ingested invoices for plausibility and respond with strict JSON only, no prose. \
Schema: {\"confidence\": number 0..1, \"recommendation\": \"approve\"|\"review\"|\"reject\", \
\"summary\": string, \"anomalies\": [string]}";

/// Parsed model verdict on a single invoice.
#[derive(Clone, Debug, PartialEq)]
pub struct InvoiceAnalysis {
    pub confidence: f64,
    pub recommendation: AiRecommendation,
    pub summary: String,
    pub anomalies: Vec<String>,
}

impl InvoiceAnalysis {
    pub fn signal(&self) -> AnalysisSignal {
        AnalysisSignal {
            confidence: self.confidence,
            recommends_rejection: self.recommendation == AiRecommendation::Reject,
        }
    }
}

pub fn build_invoice_prompt(invoice: &Invoice) -> ChatRequest {
    let user = format!(
        "Assess this invoice.\n\
         vendor: {vendor}\n\
         amount: {amount} {currency}\n\
         source: {source}\n\
         received_at: {received}\n\
         Respond with the JSON schema from the system message.",
        vendor = invoice.vendor_name,
        amount = invoice.total_amount,
        currency = invoice.currency,
        source = invoice.source,
        received = invoice.created_at.to_rfc3339(),
    );

    ChatRequest { system: SYSTEM_PROMPT.to_string(), user, json_only: true }
}

/// Parse the model reply. Code-fence wrapping is tolerated; anything that
/// does not decode into the schema is an integration failure for the
/// caller to surface, never a panic.
pub fn parse_invoice_analysis(raw: &str) -> Result<InvoiceAnalysis> {
    let stripped = strip_code_fences(raw);
    let parsed: RawAnalysis = serde_json::from_str(stripped.trim())
        .with_context(|| format!("ai analysis reply was not valid JSON: {raw}"))?;

    if !(0.0..=1.0).contains(&parsed.confidence) {
        return Err(anyhow!("ai analysis confidence {} outside 0..1", parsed.confidence));
    }

    let recommendation = match parsed.recommendation.trim().to_ascii_lowercase().as_str() {
        "approve" => AiRecommendation::Approve,
        "review" => AiRecommendation::Review,
        "reject" => AiRecommendation::Reject,
        other => return Err(anyhow!("ai analysis recommendation `{other}` is not recognized")),
    };

    Ok(InvoiceAnalysis {
        confidence: parsed.confidence,
        recommendation,
        summary: parsed.summary.unwrap_or_default(),
        anomalies: parsed.anomalies.unwrap_or_default(),
    })
}

/// Analyst facade: one completion round-trip per invoice.
pub struct InvoiceAnalyst<C> {
    client: C,
}

impl<C> InvoiceAnalyst<C>
where
    C: ChatCompletionClient,
{
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub async fn analyze(&self, invoice: &Invoice) -> Result<InvoiceAnalysis> {
        let request = build_invoice_prompt(invoice);
        let reply = self.client.complete(&request).await?;
        parse_invoice_analysis(&reply)
    }
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest)
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    confidence: f64,
    recommendation: String,
    summary: Option<String>,
    anomalies: Option<Vec<String>>,
}
