//! Approval-stage routing for ingested invoices.
//!
//! Given an invoice amount and the AI analysis signal, decide how many
//! human approval stages (0-3) are required and what outcome the analysis
//! recommends. Thresholds are fixed business policy, kept as named
//! constants; brackets are inclusive of the upper bracket, so an amount of
//! exactly 5 000 routes to the two-stage bracket.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::approval::{AiRecommendation, WorkflowType};

/// Below this amount a sufficiently confident analysis skips human review.
pub const AUTO_APPROVE_AMOUNT_LIMIT: i64 = 500;
/// Upper bound (exclusive) of the single-stage bracket.
pub const SINGLE_STAGE_AMOUNT_LIMIT: i64 = 5_000;
/// Upper bound (exclusive) of the two-stage bracket.
pub const DUAL_STAGE_AMOUNT_LIMIT: i64 = 25_000;

pub const AUTO_APPROVE_CONFIDENCE: f64 = 0.9;
pub const SINGLE_STAGE_CONFIDENCE: f64 = 0.7;
pub const DUAL_STAGE_CONFIDENCE: f64 = 0.8;
pub const TRIPLE_STAGE_CONFIDENCE: f64 = 0.9;

/// Externally-supplied analysis signal consumed by the router. The AI may
/// recommend rejection outright; the router honours that recommendation
/// but always routes at least one human stage to confirm it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSignal {
    pub confidence: f64,
    pub recommends_rejection: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub workflow_type: WorkflowType,
    pub max_approval_level: u8,
    pub recommendation: AiRecommendation,
}

#[derive(Clone, Debug, Default)]
pub struct ApprovalRouter;

impl ApprovalRouter {
    pub fn new() -> Self {
        Self
    }

    pub fn route(&self, amount: Decimal, signal: &AnalysisSignal) -> RoutingDecision {
        let confidence = signal.confidence.clamp(0.0, 1.0);

        let (max_approval_level, policy_recommendation) =
            if amount < Decimal::from(AUTO_APPROVE_AMOUNT_LIMIT)
                && confidence > AUTO_APPROVE_CONFIDENCE
                && !signal.recommends_rejection
            {
                (0, AiRecommendation::Approve)
            } else if amount < Decimal::from(SINGLE_STAGE_AMOUNT_LIMIT) {
                (1, bracket_recommendation(confidence, SINGLE_STAGE_CONFIDENCE))
            } else if amount < Decimal::from(DUAL_STAGE_AMOUNT_LIMIT) {
                (2, bracket_recommendation(confidence, DUAL_STAGE_CONFIDENCE))
            } else {
                (3, bracket_recommendation(confidence, TRIPLE_STAGE_CONFIDENCE))
            };

        let recommendation = if signal.recommends_rejection && max_approval_level > 0 {
            AiRecommendation::Reject
        } else {
            policy_recommendation
        };

        RoutingDecision {
            workflow_type: workflow_type_for_level(max_approval_level),
            max_approval_level,
            recommendation,
        }
    }
}

fn bracket_recommendation(confidence: f64, threshold: f64) -> AiRecommendation {
    if confidence > threshold {
        AiRecommendation::Approve
    } else {
        AiRecommendation::Review
    }
}

fn workflow_type_for_level(max_approval_level: u8) -> WorkflowType {
    match max_approval_level {
        0 => WorkflowType::Automatic,
        1 | 2 => WorkflowType::Hybrid,
        _ => WorkflowType::Manual,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::approval::{AiRecommendation, WorkflowType};

    use super::{AnalysisSignal, ApprovalRouter};

    fn signal(confidence: f64) -> AnalysisSignal {
        AnalysisSignal { confidence, recommends_rejection: false }
    }

    fn route(amount: i64, confidence: f64) -> super::RoutingDecision {
        ApprovalRouter::new().route(Decimal::from(amount), &signal(confidence))
    }

    #[test]
    fn small_confident_invoice_auto_approves() {
        let decision = route(499, 0.95);
        assert_eq!(decision.max_approval_level, 0);
        assert_eq!(decision.workflow_type, WorkflowType::Automatic);
        assert_eq!(decision.recommendation, AiRecommendation::Approve);
    }

    #[test]
    fn small_invoice_with_low_confidence_still_needs_one_stage() {
        let decision = route(499, 0.9);
        assert_eq!(decision.max_approval_level, 1);
        assert_eq!(decision.recommendation, AiRecommendation::Approve);
    }

    #[test]
    fn bracket_boundary_is_inclusive_of_the_upper_bracket() {
        let decision = route(5_000, 0.75);
        assert_eq!(decision.max_approval_level, 2);
        assert_eq!(decision.recommendation, AiRecommendation::Review);
    }

    #[test]
    fn large_invoice_routes_three_manual_stages() {
        let decision = route(25_000, 0.95);
        assert_eq!(decision.max_approval_level, 3);
        assert_eq!(decision.workflow_type, WorkflowType::Manual);
        assert_eq!(decision.recommendation, AiRecommendation::Approve);
    }

    #[test]
    fn high_value_review_when_confidence_at_threshold() {
        // Thresholds are strict: confidence must exceed, not meet, them.
        let decision = route(25_000, 0.9);
        assert_eq!(decision.recommendation, AiRecommendation::Review);
    }

    #[test]
    fn stage_count_is_monotonic_in_amount() {
        let confidence = 0.85;
        let mut previous = 0;
        for amount in [100, 499, 500, 4_999, 5_000, 24_999, 25_000, 1_000_000] {
            let stages = route(amount, confidence).max_approval_level;
            assert!(
                stages >= previous,
                "stage count regressed at amount {amount}: {stages} < {previous}"
            );
            previous = stages;
        }
    }

    #[test]
    fn rejection_signal_overrides_policy_recommendation() {
        let router = ApprovalRouter::new();
        let decision = router.route(
            Decimal::from(10_000),
            &AnalysisSignal { confidence: 0.95, recommends_rejection: true },
        );
        assert_eq!(decision.recommendation, AiRecommendation::Reject);
        assert_eq!(decision.max_approval_level, 2);
    }

    #[test]
    fn rejection_signal_disables_the_zero_stage_path() {
        // A zero-stage route has no human to confirm a rejection, so a
        // rejection signal forces at least one stage even for small amounts.
        let router = ApprovalRouter::new();
        let decision = router.route(
            Decimal::from(100),
            &AnalysisSignal { confidence: 0.95, recommends_rejection: true },
        );
        assert_eq!(decision.max_approval_level, 1);
        assert_eq!(decision.recommendation, AiRecommendation::Reject);
    }

    #[test]
    fn out_of_range_confidence_is_clamped() {
        let decision = route(499, 1.7);
        assert_eq!(decision.max_approval_level, 0);
        let decision = route(1_000, -0.5);
        assert_eq!(decision.recommendation, AiRecommendation::Review);
    }
}
