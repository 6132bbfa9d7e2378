//! The `HerdStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `herd-store-sqlite`).
//! The [`crate::herd::Herd`] service and the HTTP layer depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  animal::{Animal, Status},
  establishment::Establishment,
  event::Event,
  lot::{Labor, Lot},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`HerdStore::list_animals`].
#[derive(Debug, Clone)]
pub struct AnimalQuery {
  pub establishment_id: Uuid,
  /// Empty means any status, deleted included.
  pub statuses:         Vec<Status>,
  pub parent_id:        Option<Uuid>,
  pub lot_id:           Option<Uuid>,
}

impl AnimalQuery {
  /// Every animal of the establishment.
  pub fn establishment(establishment_id: Uuid) -> Self {
    Self {
      establishment_id,
      statuses: Vec::new(),
      parent_id: None,
      lot_id: None,
    }
  }
}

/// Parameters for [`HerdStore::list_events`]. Results are in ledger order:
/// event date, then creation order.
#[derive(Debug, Clone)]
pub struct EventQuery {
  pub establishment_id: Uuid,
  pub animal_id:        Option<Uuid>,
  /// Restrict to these `event_type` discriminants.
  pub event_types:      Vec<String>,
  /// Newest first instead of oldest first.
  pub descending:       bool,
  pub limit:            Option<usize>,
}

impl EventQuery {
  pub fn establishment(establishment_id: Uuid) -> Self {
    Self {
      establishment_id,
      animal_id: None,
      event_types: Vec::new(),
      descending: false,
      limit: None,
    }
  }

  pub fn animal(establishment_id: Uuid, animal_id: Uuid) -> Self {
    Self { animal_id: Some(animal_id), ..Self::establishment(establishment_id) }
  }
}

// ─── Changeset ───────────────────────────────────────────────────────────────

/// Everything one engine operation wants written. Backends must apply it
/// all-or-nothing.
#[derive(Debug, Clone, Default)]
pub struct Changeset {
  pub inserted: Vec<Animal>,
  pub updated:  Vec<Animal>,
  pub events:   Vec<Event>,
}

impl Changeset {
  pub fn is_empty(&self) -> bool {
    self.inserted.is_empty() && self.updated.is_empty() && self.events.is_empty()
  }

  /// The staged state of an animal touched by this changeset.
  pub fn animal(&self, id: Uuid) -> Option<&Animal> {
    self
      .inserted
      .iter()
      .chain(&self.updated)
      .find(|a| a.animal_id == id)
  }

  pub fn event(&self, id: Uuid) -> Option<&Event> {
    self.events.iter().find(|e| e.event_id == id)
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a herd ledger backend.
///
/// Animal state and the events that changed it are only ever written together
/// through [`HerdStore::commit`]. Lookups return `None` for missing ids; the
/// caller decides whether that is an error.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait HerdStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Establishments ────────────────────────────────────────────────────

  fn add_establishment(
    &self,
    establishment: Establishment,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_establishment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Establishment>, Self::Error>> + Send + '_;

  /// All establishments, oldest first.
  fn list_establishments(
    &self,
  ) -> impl Future<Output = Result<Vec<Establishment>, Self::Error>> + Send + '_;

  fn update_establishment(
    &self,
    establishment: Establishment,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Returns `false` if nothing was deleted.
  fn delete_establishment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Animals and events ────────────────────────────────────────────────

  fn get_animal(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Animal>, Self::Error>> + Send + '_;

  fn list_animals(
    &self,
    query: AnimalQuery,
  ) -> impl Future<Output = Result<Vec<Animal>, Self::Error>> + Send + '_;

  fn get_event(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  fn list_events(
    &self,
    query: EventQuery,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  /// Overwrite an event's date, result, and detail. Other fields are ignored.
  fn update_event(
    &self,
    event: Event,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Returns `false` if nothing was deleted.
  fn delete_event(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Apply a [`Changeset`] in a single transaction.
  fn commit(
    &self,
    changes: Changeset,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Lots and labor ────────────────────────────────────────────────────

  fn insert_lot(&self, lot: Lot) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_lot(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Lot>, Self::Error>> + Send + '_;

  /// Lots of one establishment, by name.
  fn list_lots(
    &self,
    establishment_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Lot>, Self::Error>> + Send + '_;

  /// Delete a lot together with its labor records, and clear the lot
  /// reference of every animal standing on it. Returns `false` if the lot
  /// did not exist.
  fn delete_lot(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Insert a labor record and write the lot state it produced, together.
  fn record_labor(
    &self,
    labor: Labor,
    lot: Lot,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_labor(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Labor>, Self::Error>> + Send + '_;

  /// Labor records of one lot, newest first.
  fn list_labors(
    &self,
    lot_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Labor>, Self::Error>> + Send + '_;

  fn delete_labor(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
