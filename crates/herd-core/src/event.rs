//! Event types: the append-only history of every animal.
//!
//! An event is written once, by the engine, together with the animal update
//! it caused. Only its date, result, and detail text may be amended later,
//! and amending never replays the lifecycle rules.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{
  Error, Result,
  animal::{ServiceMode, Sex},
  performance::parse_weight,
};

// ─── Payload sub-types ───────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PregnancyOutcome {
  Pregnant,
  Open,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeighInValue {
  /// Weight parsed from the free-text reading, in the unit the farm uses.
  pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceValue {
  pub mode:  ServiceMode,
  /// Empty for assisted services.
  pub sires: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthValue {
  pub calf_id:      Uuid,
  pub calf_tag:     String,
  pub calf_sex:     Sex,
  pub birth_weight: Option<f64>,
}

/// Vaccination, deworming, and supplementation payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreatmentValue {
  pub product: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleValue {
  pub price:       f64,
  pub destination: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathValue {
  pub cause: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveValue {
  pub from_lot: Option<Uuid>,
  pub to_lot:   Option<Uuid>,
}

/// Females whose service link dropped a sire as a side effect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseValue {
  pub released: Vec<Uuid>,
}

// ─── EventKind ───────────────────────────────────────────────────────────────

/// The typed payload of an event. The variant name serves as the
/// `event_type` discriminant stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventKind {
  Intake,
  WeighIn(WeighInValue),
  PregnancyCheck(PregnancyOutcome),
  Service(ServiceValue),
  Birth(BirthValue),
  Illness,
  Injury,
  Recovery,
  Castration,
  Vaccination(TreatmentValue),
  Deworming(TreatmentValue),
  Supplementation(TreatmentValue),
  SetAside(ReleaseValue),
  Sale(SaleValue),
  Death(DeathValue),
  Restore,
  Deletion(ReleaseValue),
  Move(MoveValue),
  /// Escape hatch for bulk operations that carry only a label.
  Note { label: String },
}

impl EventKind {
  /// The discriminant string stored in the `event_type` column.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn discriminant(&self) -> &'static str {
    match self {
      Self::Intake => "intake",
      Self::WeighIn(_) => "weigh_in",
      Self::PregnancyCheck(_) => "pregnancy_check",
      Self::Service(_) => "service",
      Self::Birth(_) => "birth",
      Self::Illness => "illness",
      Self::Injury => "injury",
      Self::Recovery => "recovery",
      Self::Castration => "castration",
      Self::Vaccination(_) => "vaccination",
      Self::Deworming(_) => "deworming",
      Self::Supplementation(_) => "supplementation",
      Self::SetAside(_) => "set_aside",
      Self::Sale(_) => "sale",
      Self::Death(_) => "death",
      Self::Restore => "restore",
      Self::Deletion(_) => "deletion",
      Self::Move(_) => "move",
      Self::Note { .. } => "note",
    }
  }

  /// Every discriminant, for validating filter parameters.
  pub const DISCRIMINANTS: &'static [&'static str] = &[
    "intake",
    "weigh_in",
    "pregnancy_check",
    "service",
    "birth",
    "illness",
    "injury",
    "recovery",
    "castration",
    "vaccination",
    "deworming",
    "supplementation",
    "set_aside",
    "sale",
    "death",
    "restore",
    "deletion",
    "move",
    "note",
  ];

  /// Serialise the inner payload (without the type tag) for the
  /// `payload_json` database column. Unit variants yield `null`.
  pub fn to_json(&self) -> Result<serde_json::Value> {
    let full = serde_json::to_value(self)?;
    Ok(full.get("data").cloned().unwrap_or(serde_json::Value::Null))
  }

  /// Deserialise from the discriminant string and JSON payload stored in the
  /// database.
  pub fn from_parts(discriminant: &str, data: serde_json::Value) -> Result<Self> {
    if !Self::DISCRIMINANTS.contains(&discriminant) {
      return Err(Error::UnknownEventType(discriminant.to_owned()));
    }
    let wrapped = if data.is_null() {
      serde_json::json!({ "type": discriminant })
    } else {
      serde_json::json!({ "type": discriminant, "data": data })
    };
    Ok(serde_json::from_value(wrapped)?)
  }

  pub fn weight(&self) -> Option<f64> {
    match self {
      Self::WeighIn(v) => Some(v.weight),
      _ => None,
    }
  }
}

// ─── Event ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
  pub event_id:         Uuid,
  pub establishment_id: Uuid,
  pub animal_id:        Uuid,
  /// The calendar day the event happened on the farm.
  pub occurred_on:      NaiveDate,
  /// Creation timestamp; breaks ties between events on the same day.
  pub recorded_at:      DateTime<Utc>,
  pub kind:             EventKind,
  pub result:           String,
  pub detail:           String,
  pub cost:             Option<f64>,
  pub recorded_by:      Option<String>,
}

impl Event {
  /// Ledger order: event date, then creation order.
  pub fn ledger_key(&self) -> (NaiveDate, DateTime<Utc>) {
    (self.occurred_on, self.recorded_at)
  }
}

/// Input to [`crate::herd::Herd::amend_event`]. Fields left `None` keep their
/// recorded value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventAmendment {
  pub occurred_on: Option<NaiveDate>,
  pub result:      Option<String>,
  pub detail:      Option<String>,
}

impl EventAmendment {
  /// A corrected weigh-in result also rewrites the recorded weight, so that
  /// performance figures read the corrected value.
  pub fn apply_to(self, event: &mut Event) -> Result<()> {
    if let Some(result) = self.result {
      if let EventKind::WeighIn(value) = &mut event.kind {
        value.weight = parse_weight(&result).ok_or_else(|| Error::InvalidValue {
          field: "weight",
          value: result.clone(),
        })?;
      }
      event.result = result;
    }
    if let Some(date) = self.occurred_on {
      event.occurred_on = date;
    }
    if let Some(detail) = self.detail {
      event.detail = detail;
    }
    Ok(())
  }
}
