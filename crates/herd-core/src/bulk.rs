//! Bulk operations: one event definition applied to a selection of animals.
//!
//! Eligibility is decided per target with the same rules as the single-animal
//! path. Narrowing is never silent: the caller must accept the exclusions
//! before anything is written.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  engine::{Action, ActionKind, Draft, RecordRequest, check_action},
  registry::Registry,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BulkAction {
  Castration,
  Sale {
    price:       Option<f64>,
    destination: Option<String>,
  },
  Move {
    lot_id: Option<Uuid>,
  },
  Vaccination {
    product: Option<String>,
  },
  Deworming {
    product: Option<String>,
  },
  Supplementation {
    product: Option<String>,
  },
  /// Any other group treatment, recorded as a labelled note.
  Generic {
    #[serde(default)]
    label: String,
  },
}

impl BulkAction {
  pub fn kind(&self) -> ActionKind { self.to_action().kind() }

  /// The single-animal action applied to each target.
  pub fn to_action(&self) -> Action {
    match self.clone() {
      Self::Castration => Action::Castration,
      Self::Sale { price, destination } => Action::Sale { price, destination },
      Self::Move { lot_id } => Action::Move { lot_id },
      Self::Vaccination { product } => Action::Vaccination { product },
      Self::Deworming { product } => Action::Deworming { product },
      Self::Supplementation { product } => Action::Supplementation { product },
      Self::Generic { label } => Action::Note { label },
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkRequest {
  pub animal_ids:        Vec<Uuid>,
  pub occurred_on:       NaiveDate,
  pub action:            BulkAction,
  #[serde(default)]
  pub detail:            String,
  pub cost:              Option<f64>,
  #[serde(default)]
  pub confirmed:         bool,
  /// Proceed with the eligible subset after being told about exclusions.
  #[serde(default)]
  pub accept_exclusions: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
  pub animal_id: Uuid,
  pub reason:    String,
}

/// The outcome of filtering a selection, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Eligibility {
  pub eligible: Vec<Uuid>,
  pub excluded: Vec<Exclusion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetResult {
  pub animal_id: Uuid,
  pub event_id:  Uuid,
}

/// Split the selection into eligible and excluded targets. Duplicate ids
/// count once.
pub fn eligibility(
  registry: &Registry,
  establishment_id: Uuid,
  request: &BulkRequest,
) -> Eligibility {
  let kind = request.action.kind();
  let mut result = Eligibility::default();
  let mut seen = Vec::with_capacity(request.animal_ids.len());

  for &id in &request.animal_ids {
    if seen.contains(&id) {
      continue;
    }
    seen.push(id);

    let verdict = match registry.get(id) {
      None => Err(Error::AnimalNotFound(id)),
      Some(a) if a.establishment_id != establishment_id => {
        Err(Error::WrongEstablishment { entity: "animal", id })
      }
      Some(a) => check_action(a, kind),
    };
    match verdict {
      Ok(()) => result.eligible.push(id),
      Err(e) => result.excluded.push(Exclusion { animal_id: id, reason: e.to_string() }),
    }
  }
  result
}

/// Stage one event per eligible target on `draft`.
///
/// Rejects the batch when nothing is eligible, when exclusions have not been
/// accepted, or when the caller has not confirmed. Any per-target failure
/// aborts the whole batch; the draft must then be discarded.
pub fn plan(draft: &mut Draft<'_>, request: &BulkRequest) -> Result<Vec<TargetResult>> {
  let kind = request.action.kind();
  let Eligibility { eligible, excluded } =
    eligibility(draft.registry(), draft.context().establishment_id, request);

  if eligible.is_empty() {
    return Err(Error::NoEligibleTargets(kind));
  }
  if !excluded.is_empty() && !request.accept_exclusions {
    return Err(Error::PartialEligibility {
      eligible: eligible.len(),
      excluded: excluded.len(),
    });
  }
  if !request.confirmed {
    return Err(Error::ConfirmationRequired(format!("bulk {kind}")));
  }

  let action = request.action.to_action();
  eligible
    .into_iter()
    .map(|animal_id| {
      let single = RecordRequest {
        animal_id,
        occurred_on: request.occurred_on,
        action: action.clone(),
        detail: request.detail.clone(),
        cost: request.cost,
        confirmed: true,
      };
      let event_id = draft.record(&single)?;
      Ok(TargetResult { animal_id, event_id })
    })
    .collect()
}
