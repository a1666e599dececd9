//! Weighted comparison of competing transport quotes.
//!
//! Price and transit time are normalized to 0-100 relative to the min/max
//! across the quote set; supplier reliability is taken from the supplier
//! record scaled x100. The linear weighting is an explicit, named profile:
//! historical call sites disagreed on the constants (0.40/0.30/0.30 versus
//! 0.30/0.25/0.30/0.15 with a carbon term), so both live here as presets
//! instead of being inlined and silently reconciled.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::domain::supplier::SupplierId;
use crate::domain::transport::{TransportQuote, TransportQuoteId};

/// Neutral score assigned to quotes that report no carbon figure.
const NEUTRAL_CARBON_SCORE: f64 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightProfile {
    Standard,
    CarbonAware,
}

impl WeightProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::CarbonAware => "carbon_aware",
        }
    }
}

impl FromStr for WeightProfile {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "carbon_aware" | "carbon-aware" => Ok(Self::CarbonAware),
            other => Err(format!("unknown weight profile `{other}` (expected standard|carbon_aware)")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub price: f64,
    pub transit: f64,
    pub reliability: f64,
    pub carbon: f64,
}

impl ScoringWeights {
    pub fn standard() -> Self {
        Self { price: 0.40, transit: 0.30, reliability: 0.30, carbon: 0.0 }
    }

    pub fn carbon_aware() -> Self {
        Self { price: 0.30, transit: 0.25, reliability: 0.30, carbon: 0.15 }
    }

    pub fn for_profile(profile: WeightProfile) -> Self {
        match profile {
            WeightProfile::Standard => Self::standard(),
            WeightProfile::CarbonAware => Self::carbon_aware(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteScore {
    pub quote_id: TransportQuoteId,
    pub supplier_id: SupplierId,
    pub price_score: f64,
    pub transit_score: f64,
    pub reliability_score: f64,
    pub carbon_score: f64,
    pub weighted_total: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteComparison {
    pub profile: WeightProfile,
    pub scores: Vec<QuoteScore>,
    pub recommended_quote_id: TransportQuoteId,
}

#[derive(Clone, Debug)]
pub struct QuoteComparator {
    profile: WeightProfile,
    weights: ScoringWeights,
}

impl QuoteComparator {
    pub fn new(profile: WeightProfile) -> Self {
        Self { profile, weights: ScoringWeights::for_profile(profile) }
    }

    pub fn with_weights(profile: WeightProfile, weights: ScoringWeights) -> Self {
        Self { profile, weights }
    }

    /// Rank a quote set. Returns `None` for an empty set. Ties keep the
    /// first occurrence in input order.
    pub fn compare(
        &self,
        quotes: &[TransportQuote],
        reliability_by_supplier: &HashMap<SupplierId, f64>,
    ) -> Option<QuoteComparison> {
        if quotes.is_empty() {
            return None;
        }

        let prices: Vec<f64> =
            quotes.iter().map(|quote| quote.price.to_f64().unwrap_or(0.0)).collect();
        let transits: Vec<f64> = quotes.iter().map(|quote| quote.transit_time_hours as f64).collect();

        let (price_min, price_max) = min_max(&prices);
        let (transit_min, transit_max) = min_max(&transits);

        let carbon_values: Vec<f64> = quotes.iter().filter_map(|quote| quote.carbon_kg).collect();
        let carbon_bounds = if carbon_values.is_empty() { None } else { Some(min_max(&carbon_values)) };

        let scores: Vec<QuoteScore> = quotes
            .iter()
            .enumerate()
            .map(|(index, quote)| {
                let price_score = normalize_inverse(prices[index], price_min, price_max);
                let transit_score = normalize_inverse(transits[index], transit_min, transit_max);
                let reliability_score = reliability_by_supplier
                    .get(&quote.supplier_id)
                    .copied()
                    .unwrap_or(0.0)
                    .clamp(0.0, 1.0)
                    * 100.0;
                let carbon_score = match (quote.carbon_kg, carbon_bounds) {
                    (Some(value), Some((min, max))) => normalize_inverse(value, min, max),
                    _ => NEUTRAL_CARBON_SCORE,
                };

                let weighted_total = price_score * self.weights.price
                    + transit_score * self.weights.transit
                    + reliability_score * self.weights.reliability
                    + carbon_score * self.weights.carbon;

                QuoteScore {
                    quote_id: quote.id.clone(),
                    supplier_id: quote.supplier_id.clone(),
                    price_score,
                    transit_score,
                    reliability_score,
                    carbon_score,
                    weighted_total,
                }
            })
            .collect();

        let recommended = scores
            .iter()
            .reduce(|best, candidate| {
                if candidate.weighted_total > best.weighted_total {
                    candidate
                } else {
                    best
                }
            })?
            .quote_id
            .clone();

        Some(QuoteComparison { profile: self.profile, scores, recommended_quote_id: recommended })
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for value in values {
        min = min.min(*value);
        max = max.max(*value);
    }
    (min, max)
}

/// Lower is better: the minimum maps to 100, the maximum to 0. A
/// degenerate set (min == max) scores 100 for everyone.
fn normalize_inverse(value: f64, min: f64, max: f64) -> f64 {
    if (max - min).abs() < f64::EPSILON {
        return 100.0;
    }
    100.0 - (value - min) / (max - min) * 100.0
}
