//! The [`Herd`] service: every core operation, scoped by a [`Context`] and
//! backed by any [`HerdStore`].
//!
//! Writes follow one pattern: load the establishment's registry, stage the
//! change on a [`Draft`], then hand the resulting [`Changeset`] to the store
//! in a single commit. A request that fails validation never reaches the
//! store.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoEnumIterator as _};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Context, Error, Result,
  animal::{Animal, AnimalCorrection, NewAnimal, Status, tag_sort_key},
  bulk::{self, BulkRequest, Eligibility, Exclusion, TargetResult},
  engine::{self, Action, ActionKind, Draft, RecordRequest},
  establishment::Establishment,
  event::{Event, EventAmendment, EventKind},
  lineage::{self, Lineage},
  lot::{Labor, Lot, NewLabor, NewLot},
  occupancy::{self, EstablishmentOccupancy, LotOccupancy},
  performance::{self, Performance, WeightReading},
  registry::{Ledger, Registry},
  store::{AnimalQuery, Changeset, EventQuery, HerdStore},
  summary::HerdSummary,
};

/// Default page size of the activity feed.
pub const RECENT_EVENTS_LIMIT: usize = 50;

/// Which animals a listing shows. Deleted animals are never listed.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnimalView {
  /// Animals still in the herd.
  #[default]
  Herd,
  /// Sold and deceased animals.
  Exits,
  All,
}

impl AnimalView {
  pub fn statuses(self) -> Vec<Status> {
    Status::iter()
      .filter(|s| match self {
        Self::Herd => !s.is_exited(),
        Self::Exits => matches!(s, Status::Sold | Status::Deceased),
        Self::All => *s != Status::Deleted,
      })
      .collect()
  }
}

/// The result of recording one event.
#[derive(Debug, Clone, Serialize)]
pub struct Recorded {
  pub event:      Event,
  /// Secondary events written alongside, e.g. a newborn's birth weight.
  pub follow_ups: Vec<Event>,
  /// Every animal created or changed, the subject included.
  pub animals:    Vec<Animal>,
  /// Gain since the previous weigh-in, for weigh-ins only.
  pub daily_gain: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkOutcome {
  pub results:  Vec<TargetResult>,
  pub excluded: Vec<Exclusion>,
  pub animals:  Vec<Animal>,
}

pub struct Herd<S> {
  store: S,
}

fn backend<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
  Error::Store(Box::new(e))
}

fn scoped(ctx: &Context, entity: &'static str, id: Uuid, owner: Uuid) -> Result<()> {
  if owner == ctx.establishment_id {
    Ok(())
  } else {
    Err(Error::WrongEstablishment { entity, id })
  }
}

fn required_name(field: &'static str, name: &str) -> Result<String> {
  let trimmed = name.trim();
  if trimmed.is_empty() {
    return Err(Error::InvalidValue { field, value: name.to_owned() });
  }
  Ok(trimmed.to_owned())
}

fn confirm(confirmed: bool, what: &str) -> Result<()> {
  if confirmed {
    Ok(())
  } else {
    Err(Error::ConfirmationRequired(what.to_owned()))
  }
}

impl<S: HerdStore> Herd<S> {
  pub fn new(store: S) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  // ── Establishments ────────────────────────────────────────────────────

  pub async fn create_establishment(&self, name: &str) -> Result<Establishment> {
    let establishment = Establishment {
      establishment_id: Uuid::new_v4(),
      name:             required_name("name", name)?,
      created_at:       Utc::now(),
    };
    self
      .store
      .add_establishment(establishment.clone())
      .await
      .map_err(backend)?;
    info!(
      establishment = %establishment.establishment_id,
      name = %establishment.name,
      "establishment created"
    );
    Ok(establishment)
  }

  pub async fn list_establishments(&self) -> Result<Vec<Establishment>> {
    self.store.list_establishments().await.map_err(backend)
  }

  pub async fn establishment(&self, id: Uuid) -> Result<Establishment> {
    self
      .store
      .get_establishment(id)
      .await
      .map_err(backend)?
      .ok_or(Error::EstablishmentNotFound(id))
  }

  pub async fn rename_establishment(&self, id: Uuid, name: &str) -> Result<Establishment> {
    let mut establishment = self.establishment(id).await?;
    establishment.name = required_name("name", name)?;
    self
      .store
      .update_establishment(establishment.clone())
      .await
      .map_err(backend)?;
    info!(establishment = %id, name = %establishment.name, "establishment renamed");
    Ok(establishment)
  }

  /// Only an establishment without animals or lots can be deleted.
  pub async fn delete_establishment(&self, id: Uuid, confirmed: bool) -> Result<()> {
    confirm(confirmed, "establishment deletion")?;
    self.establishment(id).await?;

    let animals = self
      .store
      .list_animals(AnimalQuery::establishment(id))
      .await
      .map_err(backend)?;
    let lots = self.store.list_lots(id).await.map_err(backend)?;
    if !animals.is_empty() || !lots.is_empty() {
      warn!(establishment = %id, "refusing to delete a non-empty establishment");
      return Err(Error::EstablishmentNotEmpty(id));
    }

    self.store.delete_establishment(id).await.map_err(backend)?;
    info!(establishment = %id, "establishment deleted");
    Ok(())
  }

  // ── Internals ─────────────────────────────────────────────────────────

  async fn registry(&self, ctx: &Context) -> Result<Registry> {
    self.establishment(ctx.establishment_id).await?;
    let animals = self
      .store
      .list_animals(AnimalQuery::establishment(ctx.establishment_id))
      .await
      .map_err(backend)?;
    Ok(Registry::new(animals))
  }

  async fn commit(&self, draft: Draft<'_>) -> Result<Changeset> {
    let changes = draft.into_changeset();
    debug!(
      inserted = changes.inserted.len(),
      updated = changes.updated.len(),
      events = changes.events.len(),
      "committing changeset"
    );
    self.store.commit(changes.clone()).await.map_err(backend)?;
    Ok(changes)
  }

  // ── Animals ───────────────────────────────────────────────────────────

  /// Register an animal that enters the herd from outside.
  pub async fn register_animal(&self, ctx: &Context, new: NewAnimal) -> Result<Animal> {
    let registry = self.registry(ctx).await?;
    if let Some(lot_id) = new.lot_id {
      self.lot(ctx, lot_id).await?;
    }

    let now = Utc::now();
    let mut draft = Draft::new(ctx, registry, now);
    let id = draft
      .register(&new, now.date_naive())
      .inspect_err(|e| warn!(tag = %new.tag, error = %e, "intake rejected"))?;
    let changes = self.commit(draft).await?;

    let animal = changes.animal(id).cloned().ok_or(Error::AnimalNotFound(id))?;
    info!(tag = %animal.tag, category = %animal.category, "animal registered");
    Ok(animal)
  }

  /// Amend identity fields. Writes no event.
  pub async fn correct_animal(
    &self,
    ctx: &Context,
    id: Uuid,
    correction: AnimalCorrection,
  ) -> Result<Animal> {
    let registry = self.registry(ctx).await?;
    let mut draft = Draft::new(ctx, registry, Utc::now());
    let animal = draft
      .correct(id, &correction)
      .inspect_err(|e| warn!(animal = %id, error = %e, "correction rejected"))?;
    self.commit(draft).await?;
    info!(tag = %animal.tag, "animal record corrected");
    Ok(animal)
  }

  /// Any animal of the establishment, deleted ones included.
  pub async fn animal(&self, ctx: &Context, id: Uuid) -> Result<Animal> {
    let animal = self
      .store
      .get_animal(id)
      .await
      .map_err(backend)?
      .ok_or(Error::AnimalNotFound(id))?;
    scoped(ctx, "animal", id, animal.establishment_id)?;
    Ok(animal)
  }

  /// Animals in `view`, ordered by tag.
  pub async fn list_animals(&self, ctx: &Context, view: AnimalView) -> Result<Vec<Animal>> {
    self.establishment(ctx.establishment_id).await?;
    let query = AnimalQuery {
      statuses: view.statuses(),
      ..AnimalQuery::establishment(ctx.establishment_id)
    };
    let mut animals = self.store.list_animals(query).await.map_err(backend)?;
    animals.sort_by_key(|a| tag_sort_key(&a.tag));
    Ok(animals)
  }

  pub async fn available_actions(&self, ctx: &Context, id: Uuid) -> Result<Vec<ActionKind>> {
    let animal = self.animal(ctx, id).await?;
    Ok(engine::available_actions(&animal))
  }

  pub async fn lineage(&self, ctx: &Context, id: Uuid) -> Result<Lineage> {
    let registry = self.registry(ctx).await?;
    lineage::trace(&registry, id)
  }

  pub async fn performance(&self, ctx: &Context, id: Uuid) -> Result<Performance> {
    self.animal(ctx, id).await?;
    let ledger = self.ledger(EventQuery::animal(ctx.establishment_id, id)).await?;
    Ok(performance::analyze(&ledger, id))
  }

  pub async fn summary(&self, ctx: &Context) -> Result<HerdSummary> {
    let registry = self.registry(ctx).await?;
    Ok(HerdSummary::of(&registry))
  }

  // ── Events ────────────────────────────────────────────────────────────

  async fn ledger(&self, query: EventQuery) -> Result<Ledger> {
    let events = self.store.list_events(query).await.map_err(backend)?;
    Ok(Ledger::new(events))
  }

  /// Record one event against one animal.
  pub async fn record(&self, ctx: &Context, request: RecordRequest) -> Result<Recorded> {
    let registry = self.registry(ctx).await?;
    if let Action::Move { lot_id: Some(lot_id) } = &request.action {
      self.lot(ctx, *lot_id).await?;
    }

    let previous = match request.action {
      Action::WeighIn { .. } => self
        .ledger(EventQuery::animal(ctx.establishment_id, request.animal_id))
        .await?
        .latest_reading(request.animal_id),
      _ => None,
    };

    let mut draft = Draft::new(ctx, registry, Utc::now());
    let event_id = draft.record(&request).inspect_err(|e| {
      warn!(
        animal = %request.animal_id,
        action = %request.action.kind(),
        error = %e,
        "event rejected"
      )
    })?;
    let changes = self.commit(draft).await?;

    let event = changes.event(event_id).cloned().ok_or(Error::EventNotFound(event_id))?;
    let daily_gain = previous.zip(event.kind.weight()).and_then(|(prev, weight)| {
      let current = WeightReading {
        event_id,
        occurred_on: event.occurred_on,
        weight,
      };
      performance::daily_gain(&prev, &current)
    });

    let Changeset { inserted, updated, events } = changes;
    let tag = updated
      .iter()
      .find(|a| a.animal_id == event.animal_id)
      .map_or("", |a| a.tag.as_str());
    info!(
      event_type = event.kind.discriminant(),
      tag,
      affected = inserted.len() + updated.len(),
      "event recorded"
    );

    Ok(Recorded {
      follow_ups: events.into_iter().filter(|e| e.event_id != event_id).collect(),
      animals: inserted.into_iter().chain(updated).collect(),
      event,
      daily_gain,
    })
  }

  /// Events of one animal, newest first.
  pub async fn animal_history(&self, ctx: &Context, id: Uuid) -> Result<Vec<Event>> {
    self.animal(ctx, id).await?;
    let query = EventQuery {
      descending: true,
      ..EventQuery::animal(ctx.establishment_id, id)
    };
    self.store.list_events(query).await.map_err(backend)
  }

  /// The establishment's latest events, optionally restricted to some
  /// event types.
  pub async fn recent_events(
    &self,
    ctx: &Context,
    event_types: Vec<String>,
    limit: Option<usize>,
  ) -> Result<Vec<Event>> {
    self.establishment(ctx.establishment_id).await?;
    if let Some(unknown) = event_types
      .iter()
      .find(|t| !EventKind::DISCRIMINANTS.contains(&t.as_str()))
    {
      return Err(Error::UnknownEventType(unknown.clone()));
    }
    let query = EventQuery {
      event_types,
      descending: true,
      limit: Some(limit.unwrap_or(RECENT_EVENTS_LIMIT)),
      ..EventQuery::establishment(ctx.establishment_id)
    };
    self.store.list_events(query).await.map_err(backend)
  }

  async fn event(&self, ctx: &Context, id: Uuid) -> Result<Event> {
    let event = self
      .store
      .get_event(id)
      .await
      .map_err(backend)?
      .ok_or(Error::EventNotFound(id))?;
    scoped(ctx, "event", id, event.establishment_id)?;
    Ok(event)
  }

  /// Correct an event's date, result, or detail. Animal state is left as it
  /// was computed when the event was first recorded.
  pub async fn amend_event(
    &self,
    ctx: &Context,
    id: Uuid,
    amendment: EventAmendment,
  ) -> Result<Event> {
    let mut event = self.event(ctx, id).await?;
    amendment
      .apply_to(&mut event)
      .inspect_err(|e| warn!(event = %id, error = %e, "amendment rejected"))?;
    self.store.update_event(event.clone()).await.map_err(backend)?;
    info!(event = %id, event_type = event.kind.discriminant(), "event amended");
    Ok(event)
  }

  /// Remove an event from the ledger. Animal state is not rolled back.
  pub async fn delete_event(&self, ctx: &Context, id: Uuid, confirmed: bool) -> Result<()> {
    confirm(confirmed, "event deletion")?;
    let event = self.event(ctx, id).await?;
    self.store.delete_event(id).await.map_err(backend)?;
    info!(event = %id, event_type = event.kind.discriminant(), "event deleted");
    Ok(())
  }

  // ── Bulk ──────────────────────────────────────────────────────────────

  /// Which of the selected animals the bulk action would apply to.
  pub async fn bulk_preview(&self, ctx: &Context, request: &BulkRequest) -> Result<Eligibility> {
    let registry = self.registry(ctx).await?;
    Ok(bulk::eligibility(&registry, ctx.establishment_id, request))
  }

  /// Apply one event definition to every eligible animal in a single commit.
  pub async fn bulk(&self, ctx: &Context, request: BulkRequest) -> Result<BulkOutcome> {
    let registry = self.registry(ctx).await?;
    if let bulk::BulkAction::Move { lot_id: Some(lot_id) } = &request.action {
      self.lot(ctx, *lot_id).await?;
    }

    let excluded = bulk::eligibility(&registry, ctx.establishment_id, &request).excluded;
    let mut draft = Draft::new(ctx, registry, Utc::now());
    let results = bulk::plan(&mut draft, &request).inspect_err(|e| {
      warn!(
        action = %request.action.kind(),
        selected = request.animal_ids.len(),
        error = %e,
        "bulk operation rejected"
      )
    })?;
    let changes = self.commit(draft).await?;

    info!(
      action = %request.action.kind(),
      applied = results.len(),
      excluded = excluded.len(),
      "bulk operation recorded"
    );
    Ok(BulkOutcome {
      results,
      excluded,
      animals: changes.inserted.into_iter().chain(changes.updated).collect(),
    })
  }

  // ── Lots and labor ────────────────────────────────────────────────────

  pub async fn create_lot(&self, ctx: &Context, new: NewLot) -> Result<Lot> {
    self.establishment(ctx.establishment_id).await?;
    if !new.area_ha.is_finite() || new.area_ha < 0.0 {
      return Err(Error::InvalidValue { field: "area_ha", value: new.area_ha.to_string() });
    }
    let lot = Lot {
      lot_id:           Uuid::new_v4(),
      establishment_id: ctx.establishment_id,
      name:             required_name("name", &new.name)?,
      area_ha:          new.area_ha,
      state:            Default::default(),
      crop:             None,
      created_at:       Utc::now(),
    };
    self.store.insert_lot(lot.clone()).await.map_err(backend)?;
    info!(lot = %lot.lot_id, name = %lot.name, "lot created");
    Ok(lot)
  }

  pub async fn lot(&self, ctx: &Context, id: Uuid) -> Result<Lot> {
    let lot = self
      .store
      .get_lot(id)
      .await
      .map_err(backend)?
      .ok_or(Error::LotNotFound(id))?;
    scoped(ctx, "lot", id, lot.establishment_id)?;
    Ok(lot)
  }

  pub async fn lots(&self, ctx: &Context) -> Result<Vec<Lot>> {
    self.establishment(ctx.establishment_id).await?;
    self.store.list_lots(ctx.establishment_id).await.map_err(backend)
  }

  /// Delete a lot and its labor records. Animals on it become unassigned.
  pub async fn delete_lot(&self, ctx: &Context, id: Uuid, confirmed: bool) -> Result<()> {
    confirm(confirmed, "lot deletion")?;
    let lot = self.lot(ctx, id).await?;
    self.store.delete_lot(id).await.map_err(backend)?;
    info!(lot = %id, name = %lot.name, "lot deleted");
    Ok(())
  }

  /// Record a cultivation operation and advance the lot's crop state.
  pub async fn record_labor(
    &self,
    ctx: &Context,
    lot_id: Uuid,
    new: NewLabor,
  ) -> Result<(Labor, Lot)> {
    let mut lot = self.lot(ctx, lot_id).await?;
    lot
      .apply_labor(new.activity, new.crop.as_deref())
      .inspect_err(|e| warn!(lot = %lot_id, error = %e, "labor rejected"))?;

    let now = Utc::now();
    let crop = new
      .crop
      .as_deref()
      .map(str::trim)
      .filter(|c| !c.is_empty())
      .map(str::to_owned);
    let labor = Labor {
      labor_id: Uuid::new_v4(),
      lot_id,
      establishment_id: ctx.establishment_id,
      activity: new.activity,
      crop,
      detail: new.detail.trim().to_owned(),
      cost: new.cost,
      performed_on: new.performed_on.unwrap_or_else(|| now.date_naive()),
      recorded_at: now,
    };
    self
      .store
      .record_labor(labor.clone(), lot.clone())
      .await
      .map_err(backend)?;
    info!(lot = %lot.name, activity = %labor.activity, state = %lot.state, "labor recorded");
    Ok((labor, lot))
  }

  /// Labor records of a lot, newest first.
  pub async fn labors(&self, ctx: &Context, lot_id: Uuid) -> Result<Vec<Labor>> {
    self.lot(ctx, lot_id).await?;
    self.store.list_labors(lot_id).await.map_err(backend)
  }

  pub async fn delete_labor(&self, ctx: &Context, id: Uuid, confirmed: bool) -> Result<()> {
    confirm(confirmed, "labor deletion")?;
    let labor = self
      .store
      .get_labor(id)
      .await
      .map_err(backend)?
      .ok_or(Error::LaborNotFound(id))?;
    scoped(ctx, "labor", id, labor.establishment_id)?;
    self.store.delete_labor(id).await.map_err(backend)?;
    info!(labor = %id, activity = %labor.activity, "labor deleted");
    Ok(())
  }

  pub async fn lot_occupancy(&self, ctx: &Context, lot_id: Uuid) -> Result<LotOccupancy> {
    self.lot(ctx, lot_id).await?;
    let registry = self.registry(ctx).await?;
    Ok(occupancy::lot_occupancy(&registry, lot_id))
  }

  pub async fn occupancy(&self, ctx: &Context) -> Result<EstablishmentOccupancy> {
    let registry = self.registry(ctx).await?;
    let lots = self.store.list_lots(ctx.establishment_id).await.map_err(backend)?;
    Ok(occupancy::establishment_occupancy(&registry, &lots))
  }
}
