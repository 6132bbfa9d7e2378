//! Error types for `herd-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{
  animal::{Category, Sex, Status},
  engine::ActionKind,
};

#[derive(Debug, Error)]
pub enum Error {
  // ── Validation ──────────────────────────────────────────────────────────
  #[error("{action} requires `{field}`")]
  MissingField {
    action: ActionKind,
    field:  &'static str,
  },

  #[error("invalid {field}: {value:?}")]
  InvalidValue { field: &'static str, value: String },

  #[error("tag {0:?} is already in use")]
  DuplicateTag(String),

  #[error("{action} is not valid for a {sex} {category}")]
  CategoryMismatch {
    action:   ActionKind,
    category: Category,
    sex:      Sex,
  },

  #[error("{category} must be {expected}, got {sex}")]
  SexMismatch {
    category: Category,
    expected: Sex,
    sex:      Sex,
  },

  #[error("{action} is not valid while the animal is {status}")]
  InvalidTransition { action: ActionKind, status: Status },

  #[error("status {status} is inconsistent with category {category}")]
  InconsistentStatus { status: Status, category: Category },

  #[error("animal {0} is already castrated")]
  AlreadyCastrated(Uuid),

  #[error("a castrated animal cannot be recorded as {0}")]
  CastratedSire(Category),

  #[error("animal {0} has left the herd; restore it before correcting its record")]
  ArchivedAnimal(Uuid),

  #[error("sire {0} is not a registered animal")]
  UnknownSire(Uuid),

  #[error("sire {sire} cannot serve: {reason}")]
  SireUnavailable { sire: Uuid, reason: &'static str },

  // ── Confirmation and eligibility ────────────────────────────────────────
  #[error("{0} requires explicit confirmation")]
  ConfirmationRequired(String),

  #[error(
    "{excluded} selected animals are not eligible; confirm to proceed with \
     the remaining {eligible}"
  )]
  PartialEligibility { eligible: usize, excluded: usize },

  #[error("no selected animal is eligible for {0}")]
  NoEligibleTargets(ActionKind),

  // ── Lookup ──────────────────────────────────────────────────────────────
  #[error("establishment not found: {0}")]
  EstablishmentNotFound(Uuid),

  #[error("animal not found: {0}")]
  AnimalNotFound(Uuid),

  #[error("event not found: {0}")]
  EventNotFound(Uuid),

  #[error("lot not found: {0}")]
  LotNotFound(Uuid),

  #[error("labor record not found: {0}")]
  LaborNotFound(Uuid),

  #[error("{entity} {id} belongs to another establishment")]
  WrongEstablishment { entity: &'static str, id: Uuid },

  #[error("establishment {0} still owns animals or lots")]
  EstablishmentNotEmpty(Uuid),

  // ── Encoding and storage ────────────────────────────────────────────────
  #[error("unknown event type discriminant: {0:?}")]
  UnknownEventType(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Whether the error was raised before any write was attempted because the
  /// request itself is unacceptable.
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Self::MissingField { .. }
        | Self::InvalidValue { .. }
        | Self::DuplicateTag(_)
        | Self::CategoryMismatch { .. }
        | Self::SexMismatch { .. }
        | Self::InvalidTransition { .. }
        | Self::InconsistentStatus { .. }
        | Self::AlreadyCastrated(_)
        | Self::CastratedSire(_)
        | Self::ArchivedAnimal(_)
        | Self::UnknownSire(_)
        | Self::SireUnavailable { .. }
    )
  }

  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::EstablishmentNotFound(_)
        | Self::AnimalNotFound(_)
        | Self::EventNotFound(_)
        | Self::LotNotFound(_)
        | Self::LaborNotFound(_)
        | Self::WrongEstablishment { .. }
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
