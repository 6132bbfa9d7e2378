//! Lots (land parcels) and their cultivation sub-ledger.
//!
//! Lots never store which animals graze them; occupancy is always computed by
//! filtering animals on their current lot reference.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CropState {
  #[default]
  Fallow,
  Planted,
  /// Dried down and awaiting harvest.
  HarvestPending,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LaborActivity {
  Planting,
  Spraying,
  Fertilizing,
  /// Pre-harvest dry-down spray; ends the growing cycle.
  Desiccation,
  Harvest,
  Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
  pub lot_id:           Uuid,
  pub establishment_id: Uuid,
  pub name:             String,
  pub area_ha:          f64,
  pub state:            CropState,
  pub crop:             Option<String>,
  pub created_at:       DateTime<Utc>,
}

impl Lot {
  /// Advance the cultivation state for a labor of kind `activity`.
  pub fn apply_labor(&mut self, activity: LaborActivity, crop: Option<&str>) -> Result<()> {
    match activity {
      LaborActivity::Planting => {
        let crop = crop
          .map(str::trim)
          .filter(|c| !c.is_empty())
          .ok_or_else(|| Error::InvalidValue {
            field: "crop",
            value: String::new(),
          })?;
        self.state = CropState::Planted;
        self.crop = Some(crop.to_owned());
      }
      LaborActivity::Desiccation => {
        if self.state == CropState::Planted {
          self.state = CropState::HarvestPending;
        }
      }
      LaborActivity::Harvest => {
        self.state = CropState::Fallow;
        self.crop = None;
      }
      LaborActivity::Spraying | LaborActivity::Fertilizing | LaborActivity::Other => {}
    }
    Ok(())
  }
}

/// Input to [`crate::herd::Herd::create_lot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLot {
  pub name:    String,
  #[serde(default)]
  pub area_ha: f64,
}

/// A cultivation operation performed on a lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Labor {
  pub labor_id:         Uuid,
  pub lot_id:           Uuid,
  pub establishment_id: Uuid,
  pub activity:         LaborActivity,
  pub crop:             Option<String>,
  pub detail:           String,
  pub cost:             Option<f64>,
  pub performed_on:     NaiveDate,
  pub recorded_at:      DateTime<Utc>,
}

/// Input to [`crate::herd::Herd::record_labor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLabor {
  pub activity:     LaborActivity,
  pub crop:         Option<String>,
  #[serde(default)]
  pub detail:       String,
  pub cost:         Option<f64>,
  /// Defaults to today.
  pub performed_on: Option<NaiveDate>,
}
