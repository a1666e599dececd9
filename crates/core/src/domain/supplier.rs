use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::tenant::TenantId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SupplierId(pub String);

/// Transport supplier. `reliability_score` (0.0..=1.0) and the delivery
/// counters are inputs to quote scoring; there is no lifecycle beyond CRUD.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: SupplierId,
    pub tenant_id: TenantId,
    pub name: String,
    pub reliability_score: f64,
    pub total_deliveries: u32,
    pub on_time_deliveries: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Supplier {
    /// On-time ratio from the historical counters, `None` with no history.
    pub fn on_time_ratio(&self) -> Option<f64> {
        if self.total_deliveries == 0 {
            return None;
        }
        Some(f64::from(self.on_time_deliveries) / f64::from(self.total_deliveries))
    }
}
