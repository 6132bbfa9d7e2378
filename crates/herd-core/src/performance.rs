//! Average daily weight gain (ADPV) between consecutive weigh-ins.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::registry::Ledger;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightReading {
  pub event_id:    Uuid,
  pub occurred_on: NaiveDate,
  pub weight:      f64,
}

/// Gain per day from `previous` to `current`, rounded to three decimals.
///
/// Returns `None` when the readings are on the same day or out of order; the
/// figure is then undefined rather than zero or infinite.
pub fn daily_gain(previous: &WeightReading, current: &WeightReading) -> Option<f64> {
  let days = (current.occurred_on - previous.occurred_on).num_days();
  if days <= 0 {
    return None;
  }
  let gain = (current.weight - previous.weight) / days as f64;
  Some((gain * 1000.0).round() / 1000.0)
}

/// Parse a free-text weight such as `"312"`, `"312.5 kg"`, or `"312,5"`.
///
/// Takes the leading number and ignores any trailing unit.
pub fn parse_weight(text: &str) -> Option<f64> {
  let text = text.trim();
  let end = text
    .char_indices()
    .find(|(_, c)| !(c.is_ascii_digit() || *c == '.' || *c == ','))
    .map_or(text.len(), |(i, _)| i);
  let number = text[..end].replace(',', ".");
  let weight: f64 = number.parse().ok()?;
  (weight.is_finite() && weight > 0.0).then_some(weight)
}

/// Latest weight and the gain between the two most recent weigh-ins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
  pub animal_id:  Uuid,
  pub latest:     Option<WeightReading>,
  pub previous:   Option<WeightReading>,
  pub daily_gain: Option<f64>,
}

pub fn analyze(ledger: &Ledger, animal_id: Uuid) -> Performance {
  let mut readings = ledger.weight_readings(animal_id);
  let latest = readings.pop();
  let previous = readings.pop();
  let daily_gain = match (&previous, &latest) {
    (Some(p), Some(l)) => daily_gain(p, l),
    _ => None,
  };
  Performance { animal_id, latest, previous, daily_gain }
}
