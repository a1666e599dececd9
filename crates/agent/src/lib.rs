//! AI collaborator - prompt assembly and strict-JSON completion calls
//!
//! This crate owns every interaction with the hosted chat-completion
//! endpoint:
//! - Assemble natural-language prompts from domain records (`analysis`)
//! - Call the endpoint and return the raw completion text (`llm`, `http`)
//! - Parse the model's JSON reply into typed structs (`analysis`)
//! - Enforce guardrails on what the model may influence (`guardrails`)
//!
//! # Safety Principle
//!
//! The model is strictly an analyst. It NEVER finalizes approvals, changes
//! stage counts, or awards quotes. Those are deterministic decisions made
//! by the approval router and the workflow engine in `wegroup-core`.

pub mod analysis;
pub mod guardrails;
pub mod http;
pub mod llm;

pub use analysis::{InvoiceAnalysis, InvoiceAnalyst};
pub use guardrails::{AgentIntent, GuardrailDecision, GuardrailPolicy};
pub use http::HttpChatClient;
pub use llm::{ChatCompletionClient, ChatRequest, ScriptedChatClient};
