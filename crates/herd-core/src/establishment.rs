//! Establishment: the root scope for animals, lots, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Establishment {
  pub establishment_id: Uuid,
  pub name:             String,
  pub created_at:       DateTime<Utc>,
}
