//! The state transition engine.
//!
//! A [`Draft`] works on a private copy of the establishment's [`Registry`].
//! Each recorded action is validated in full, applied to the copy, and
//! appended as one event. Nothing reaches the store until the caller turns
//! the draft into a [`Changeset`] and commits it, so a rejected request leaves
//! no trace.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator as _};
use uuid::Uuid;

use crate::{
  Context, Error, Result,
  animal::{
    Animal, AnimalCorrection, Category, Condition, NewAnimal, Origin, ServiceLink,
    ServiceMode, Sex, Status,
  },
  event::{
    BirthValue, DeathValue, Event, EventKind, MoveValue, PregnancyOutcome,
    ReleaseValue, SaleValue, ServiceValue, TreatmentValue, WeighInValue,
  },
  performance::parse_weight,
  registry::Registry,
  store::Changeset,
};

// ─── Actions ─────────────────────────────────────────────────────────────────

/// The kinds of action the engine understands.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
  Intake,
  WeighIn,
  PregnancyCheck,
  Service,
  Birth,
  Illness,
  Injury,
  Recovery,
  Castration,
  Vaccination,
  Deworming,
  Supplementation,
  SetAside,
  Sale,
  Death,
  Restore,
  Deletion,
  Move,
  Note,
}

impl ActionKind {
  /// Exits and reversals of exits must carry an explicit confirmation.
  pub fn requires_confirmation(self) -> bool {
    matches!(self, Self::Sale | Self::Death | Self::Deletion | Self::Restore)
  }
}

/// An event request: the action to record plus its type-specific fields.
///
/// Fields are optional where the caller may omit them so that the engine,
/// not the deserializer, reports exactly which one is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
  WeighIn {
    #[serde(default)]
    weight: String,
  },
  PregnancyCheck {
    outcome: Option<PregnancyOutcome>,
  },
  Service {
    mode:  Option<ServiceMode>,
    #[serde(default)]
    sires: Vec<Uuid>,
  },
  Birth {
    #[serde(default)]
    calf_tag:     String,
    calf_sex:     Option<Sex>,
    birth_weight: Option<String>,
  },
  Illness,
  Injury,
  Recovery,
  Castration,
  Vaccination {
    product: Option<String>,
  },
  Deworming {
    product: Option<String>,
  },
  Supplementation {
    product: Option<String>,
  },
  SetAside,
  Sale {
    price:       Option<f64>,
    destination: Option<String>,
  },
  Death {
    #[serde(default)]
    cause: String,
  },
  Restore,
  Deletion,
  Move {
    lot_id: Option<Uuid>,
  },
  Note {
    #[serde(default)]
    label: String,
  },
}

impl Action {
  pub fn kind(&self) -> ActionKind {
    match self {
      Self::WeighIn { .. } => ActionKind::WeighIn,
      Self::PregnancyCheck { .. } => ActionKind::PregnancyCheck,
      Self::Service { .. } => ActionKind::Service,
      Self::Birth { .. } => ActionKind::Birth,
      Self::Illness => ActionKind::Illness,
      Self::Injury => ActionKind::Injury,
      Self::Recovery => ActionKind::Recovery,
      Self::Castration => ActionKind::Castration,
      Self::Vaccination { .. } => ActionKind::Vaccination,
      Self::Deworming { .. } => ActionKind::Deworming,
      Self::Supplementation { .. } => ActionKind::Supplementation,
      Self::SetAside => ActionKind::SetAside,
      Self::Sale { .. } => ActionKind::Sale,
      Self::Death { .. } => ActionKind::Death,
      Self::Restore => ActionKind::Restore,
      Self::Deletion => ActionKind::Deletion,
      Self::Move { .. } => ActionKind::Move,
      Self::Note { .. } => ActionKind::Note,
    }
  }
}

/// Input to [`Draft::record`] and [`crate::herd::Herd::record`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordRequest {
  pub animal_id:   Uuid,
  pub occurred_on: NaiveDate,
  pub action:      Action,
  #[serde(default)]
  pub detail:      String,
  pub cost:        Option<f64>,
  /// Caller's explicit go-ahead for sales, deaths, deletions, and restores.
  #[serde(default)]
  pub confirmed:   bool,
}

impl RecordRequest {
  pub fn new(animal_id: Uuid, occurred_on: NaiveDate, action: Action) -> Self {
    Self {
      animal_id,
      occurred_on,
      action,
      detail: String::new(),
      cost: None,
      confirmed: false,
    }
  }

  pub fn confirmed(mut self) -> Self {
    self.confirmed = true;
    self
  }

  pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
    self.detail = detail.into();
    self
  }
}

// ─── Eligibility ─────────────────────────────────────────────────────────────

/// Check that `kind` may be recorded for `animal` in its current category and
/// status. Exited animals accept only a restore (and a deletion, unless they
/// are already deleted).
pub fn check_action(animal: &Animal, kind: ActionKind) -> Result<()> {
  let invalid = || Error::InvalidTransition { action: kind, status: animal.status };
  let mismatch = || Error::CategoryMismatch {
    action:   kind,
    category: animal.category,
    sex:      animal.sex,
  };

  if animal.status.is_exited() {
    return match kind {
      ActionKind::Restore => Ok(()),
      ActionKind::Deletion if animal.status != Status::Deleted => Ok(()),
      _ => Err(invalid()),
    };
  }

  match kind {
    ActionKind::Intake | ActionKind::Restore => Err(invalid()),
    ActionKind::PregnancyCheck | ActionKind::Service | ActionKind::Birth
      if !animal.category.is_breeding_female() =>
    {
      Err(mismatch())
    }
    ActionKind::Castration => {
      if animal.sex != Sex::Male || !animal.category.is_castratable() {
        Err(mismatch())
      } else if animal.castrated {
        Err(Error::AlreadyCastrated(animal.animal_id))
      } else {
        Ok(())
      }
    }
    ActionKind::SetAside if !animal.category.is_sire() => Err(mismatch()),
    ActionKind::SetAside if animal.status == Status::SetAside => Err(invalid()),
    _ => Ok(()),
  }
}

/// The actions a caller may offer for `animal` right now.
pub fn available_actions(animal: &Animal) -> Vec<ActionKind> {
  ActionKind::iter()
    .filter(|kind| check_action(animal, *kind).is_ok())
    .collect()
}

/// The sex an animal of `category` must have, given what the caller supplied.
fn resolve_sex(category: Category, sex: Option<Sex>) -> Result<Sex> {
  match (category.fixed_sex(), sex) {
    (Some(fixed), None) => Ok(fixed),
    (Some(fixed), Some(given)) if fixed == given => Ok(given),
    (Some(fixed), Some(given)) => Err(Error::SexMismatch {
      category,
      expected: fixed,
      sex: given,
    }),
    (None, Some(given)) => Ok(given),
    (None, None) => Err(Error::MissingField {
      action: ActionKind::Intake,
      field:  "sex",
    }),
  }
}

fn non_empty(text: &str) -> Option<String> {
  let text = text.trim();
  (!text.is_empty()).then(|| text.to_owned())
}

fn product_label(product: &Option<String>) -> (TreatmentValue, String) {
  let product = product.as_deref().and_then(non_empty);
  let result = product.clone().unwrap_or_else(|| "applied".to_owned());
  (TreatmentValue { product }, result)
}

// ─── Draft ───────────────────────────────────────────────────────────────────

/// A follow-up event staged by an action, written after its primary event.
struct FollowUp {
  animal_id: Uuid,
  kind:      EventKind,
  result:    String,
  detail:    String,
}

/// A unit of work against one establishment's registry.
pub struct Draft<'c> {
  ctx:      &'c Context,
  registry: Registry,
  now:      DateTime<Utc>,
  inserted: Vec<Uuid>,
  updated:  BTreeSet<Uuid>,
  events:   Vec<Event>,
}

impl<'c> Draft<'c> {
  pub fn new(ctx: &'c Context, registry: Registry, now: DateTime<Utc>) -> Self {
    Self {
      ctx,
      registry,
      now,
      inserted: Vec::new(),
      updated: BTreeSet::new(),
      events: Vec::new(),
    }
  }

  pub fn context(&self) -> &Context { self.ctx }

  /// The working copy, including everything staged so far.
  pub fn registry(&self) -> &Registry { &self.registry }

  pub fn is_empty(&self) -> bool {
    self.inserted.is_empty() && self.updated.is_empty() && self.events.is_empty()
  }

  /// Hand the staged inserts, updates, and events over for a single commit.
  pub fn into_changeset(self) -> Changeset {
    let Self { registry, inserted, updated, events, .. } = self;
    let pick = |id: &Uuid| registry.get(*id).cloned();
    Changeset {
      inserted: inserted.iter().filter_map(pick).collect(),
      updated: updated.iter().filter_map(pick).collect(),
      events,
    }
  }

  fn subject(&self, id: Uuid) -> Result<Animal> {
    let animal = self.registry.get(id).ok_or(Error::AnimalNotFound(id))?;
    if animal.establishment_id != self.ctx.establishment_id {
      return Err(Error::WrongEstablishment { entity: "animal", id });
    }
    Ok(animal.clone())
  }

  fn stage(&mut self, animal: Animal) {
    if !self.inserted.contains(&animal.animal_id) {
      self.updated.insert(animal.animal_id);
    }
    self.registry.insert(animal);
  }

  fn stage_new(&mut self, animal: Animal) {
    self.inserted.push(animal.animal_id);
    self.registry.insert(animal);
  }

  fn append(
    &mut self,
    animal_id: Uuid,
    occurred_on: NaiveDate,
    kind: EventKind,
    result: String,
    detail: String,
    cost: Option<f64>,
  ) -> Uuid {
    // Strictly increasing creation times keep same-day events in order.
    let recorded_at = self.now + Duration::microseconds(self.events.len() as i64);
    let event = Event {
      event_id: Uuid::new_v4(),
      establishment_id: self.ctx.establishment_id,
      animal_id,
      occurred_on,
      recorded_at,
      kind,
      result,
      detail,
      cost,
      recorded_by: self.ctx.actor.clone(),
    };
    let id = event.event_id;
    self.events.push(event);
    id
  }

  // ── Intake and correction ─────────────────────────────────────────────

  /// Register a new animal and open its history with an intake event.
  pub fn register(&mut self, new: &NewAnimal, today: NaiveDate) -> Result<Uuid> {
    let tag = non_empty(&new.tag).ok_or(Error::MissingField {
      action: ActionKind::Intake,
      field:  "tag",
    })?;
    if self.registry.tag_taken(&tag, None) {
      return Err(Error::DuplicateTag(tag));
    }
    let sex = resolve_sex(new.category, new.sex)?;
    let intake_date = new.intake_date.unwrap_or(today);

    let animal = Animal {
      animal_id: Uuid::new_v4(),
      establishment_id: self.ctx.establishment_id,
      tag,
      category: new.category,
      sex,
      status: Status::Active,
      conditions: BTreeSet::new(),
      castrated: false,
      origin: Origin::Intake,
      birth_date: new.birth_date,
      intake_date: Some(intake_date),
      parent_id: None,
      lot_id: new.lot_id,
      service_link: None,
      disposition: None,
      created_at: self.now,
    };
    let id = animal.animal_id;
    self.stage_new(animal);
    self.append(
      id,
      intake_date,
      EventKind::Intake,
      "intake".to_owned(),
      new.detail.trim().to_owned(),
      None,
    );
    Ok(id)
  }

  /// Amend identity fields. Writes no event.
  pub fn correct(&mut self, id: Uuid, correction: &AnimalCorrection) -> Result<Animal> {
    let mut animal = self.subject(id)?;
    if animal.status.is_exited() {
      return Err(Error::ArchivedAnimal(id));
    }

    if let Some(tag) = &correction.tag {
      let tag = non_empty(tag).ok_or_else(|| Error::InvalidValue {
        field: "tag",
        value: tag.clone(),
      })?;
      if self.registry.tag_taken(&tag, Some(id)) {
        return Err(Error::DuplicateTag(tag));
      }
      animal.tag = tag;
    }

    if let Some(category) = correction.category {
      if animal.castrated && category.requires_intact() {
        return Err(Error::CastratedSire(category));
      }
      animal.category = category;
    }
    animal.sex = match animal.category.fixed_sex() {
      Some(fixed) => {
        let given = correction.sex.unwrap_or(animal.sex);
        if given != fixed {
          return Err(Error::SexMismatch {
            category: animal.category,
            expected: fixed,
            sex:      given,
          });
        }
        fixed
      }
      None => correction.sex.unwrap_or(animal.sex),
    };
    if !animal.status.is_consistent_with(animal.category) {
      return Err(Error::InconsistentStatus {
        status:   animal.status,
        category: animal.category,
      });
    }

    if let Some(date) = correction.birth_date {
      animal.birth_date = Some(date);
    }
    if let Some(date) = correction.intake_date {
      animal.intake_date = Some(date);
    }

    self.stage(animal.clone());
    Ok(animal)
  }

  // ── Events ────────────────────────────────────────────────────────────

  /// Validate `request`, apply its derived-state changes to the working copy,
  /// and append its event. Returns the id of the primary event.
  pub fn record(&mut self, request: &RecordRequest) -> Result<Uuid> {
    let kind = request.action.kind();
    if kind.requires_confirmation() && !request.confirmed {
      return Err(Error::ConfirmationRequired(kind.to_string()));
    }

    let mut animal = self.subject(request.animal_id)?;
    check_action(&animal, kind)?;

    let date = request.occurred_on;
    let mut follow_up = None;

    let (event_kind, result) = match &request.action {
      Action::WeighIn { weight } => {
        let value = parse_weight(weight).ok_or_else(|| {
          if weight.trim().is_empty() {
            Error::MissingField { action: kind, field: "weight" }
          } else {
            Error::InvalidValue { field: "weight", value: weight.clone() }
          }
        })?;
        (
          EventKind::WeighIn(WeighInValue { weight: value }),
          weight.trim().to_owned(),
        )
      }

      Action::PregnancyCheck { outcome } => {
        let outcome = outcome.ok_or(Error::MissingField { action: kind, field: "outcome" })?;
        animal.status = match outcome {
          PregnancyOutcome::Pregnant => Status::Pregnant,
          PregnancyOutcome::Open => Status::Open,
        };
        (EventKind::PregnancyCheck(outcome), outcome.to_string())
      }

      Action::Service { mode, sires } => {
        let mode = mode.ok_or(Error::MissingField { action: kind, field: "mode" })?;
        match mode {
          ServiceMode::Natural => {
            let (sires, tags) = self.enlist_sires(sires)?;
            animal.service_link = Some(ServiceLink::Natural { sires: sires.clone() });
            (
              EventKind::Service(ServiceValue { mode, sires }),
              format!("natural: {}", tags.join(", ")),
            )
          }
          ServiceMode::Assisted => {
            animal.service_link = Some(ServiceLink::Assisted);
            (
              EventKind::Service(ServiceValue { mode, sires: Vec::new() }),
              "assisted".to_owned(),
            )
          }
        }
      }

      Action::Birth { calf_tag, calf_sex, birth_weight } => {
        let tag = non_empty(calf_tag).ok_or(Error::MissingField {
          action: kind,
          field:  "calf_tag",
        })?;
        if self.registry.tag_taken(&tag, None) {
          return Err(Error::DuplicateTag(tag));
        }
        let sex = calf_sex.ok_or(Error::MissingField { action: kind, field: "calf_sex" })?;
        let birth_weight = birth_weight
          .as_deref()
          .and_then(non_empty)
          .map(|w| {
            parse_weight(&w).ok_or(Error::InvalidValue { field: "birth_weight", value: w })
          })
          .transpose()?;

        let calf = Animal {
          animal_id: Uuid::new_v4(),
          establishment_id: self.ctx.establishment_id,
          tag: tag.clone(),
          category: Category::Calf,
          sex,
          status: Status::Active,
          conditions: BTreeSet::new(),
          castrated: false,
          origin: Origin::Born,
          birth_date: Some(date),
          intake_date: Some(date),
          parent_id: Some(animal.animal_id),
          lot_id: animal.lot_id,
          service_link: None,
          disposition: None,
          created_at: self.now,
        };
        let calf_id = calf.animal_id;
        self.stage_new(calf);

        if let Some(weight) = birth_weight {
          follow_up = Some(FollowUp {
            animal_id: calf_id,
            kind:      EventKind::WeighIn(WeighInValue { weight }),
            result:    weight.to_string(),
            detail:    "birth weight".to_owned(),
          });
        }

        animal.status = Status::Open;
        animal.service_link = None;
        if animal.category == Category::Heifer {
          animal.category = Category::Cow;
        }
        (
          EventKind::Birth(BirthValue {
            calf_id,
            calf_tag: tag.clone(),
            calf_sex: sex,
            birth_weight,
          }),
          format!("calf {tag} ({sex})"),
        )
      }

      Action::Illness => {
        animal.conditions.insert(Condition::Sick);
        (EventKind::Illness, Condition::Sick.to_string())
      }

      Action::Injury => {
        animal.conditions.insert(Condition::Injured);
        (EventKind::Injury, Condition::Injured.to_string())
      }

      // Recovery means fully healthy, not the removal of a single condition.
      Action::Recovery => {
        animal.conditions.clear();
        (EventKind::Recovery, animal.condition_label())
      }

      Action::Castration => {
        animal.castrated = true;
        (EventKind::Castration, "done".to_owned())
      }

      Action::Vaccination { product } => {
        let (value, result) = product_label(product);
        (EventKind::Vaccination(value), result)
      }

      Action::Deworming { product } => {
        let (value, result) = product_label(product);
        (EventKind::Deworming(value), result)
      }

      Action::Supplementation { product } => {
        let (value, result) = product_label(product);
        (EventKind::Supplementation(value), result)
      }

      Action::SetAside => {
        animal.status = Status::SetAside;
        let released = self.release_sire(animal.animal_id);
        (EventKind::SetAside(ReleaseValue { released }), "set aside".to_owned())
      }

      Action::Sale { price, destination } => {
        let price = price.ok_or(Error::MissingField { action: kind, field: "price" })?;
        if !price.is_finite() || price <= 0.0 {
          return Err(Error::InvalidValue { field: "price", value: price.to_string() });
        }
        let destination = destination.as_deref().and_then(non_empty);
        animal.status = Status::Sold;
        animal.disposition = Some(match &destination {
          Some(dest) => format!("${price:.2} to {dest}"),
          None => format!("${price:.2}"),
        });
        self.release_sire(animal.animal_id);
        (EventKind::Sale(SaleValue { price, destination }), Status::Sold.to_string())
      }

      Action::Death { cause } => {
        let cause = non_empty(cause).ok_or(Error::MissingField { action: kind, field: "cause" })?;
        animal.status = Status::Deceased;
        animal.disposition = Some(cause.clone());
        self.release_sire(animal.animal_id);
        (EventKind::Death(DeathValue { cause }), Status::Deceased.to_string())
      }

      Action::Restore => {
        if animal.status == Status::Deleted
          && self.registry.tag_taken(&animal.tag, Some(animal.animal_id))
        {
          return Err(Error::DuplicateTag(animal.tag));
        }
        animal.status = Status::Active;
        animal.disposition = None;
        (EventKind::Restore, "restored".to_owned())
      }

      Action::Deletion => {
        animal.status = Status::Deleted;
        let released = self.release_sire(animal.animal_id);
        (EventKind::Deletion(ReleaseValue { released }), "deleted".to_owned())
      }

      Action::Move { lot_id } => {
        let from_lot = animal.lot_id;
        animal.lot_id = *lot_id;
        let result = lot_id.map_or_else(|| "unassigned".to_owned(), |l| l.to_string());
        (EventKind::Move(MoveValue { from_lot, to_lot: *lot_id }), result)
      }

      Action::Note { label } => {
        let label = non_empty(label).ok_or(Error::MissingField { action: kind, field: "label" })?;
        (EventKind::Note { label: label.clone() }, label)
      }
    };

    let animal_id = animal.animal_id;
    self.stage(animal);
    let event_id = self.append(
      animal_id,
      date,
      event_kind,
      result,
      request.detail.trim().to_owned(),
      request.cost,
    );
    if let Some(f) = follow_up {
      self.append(f.animal_id, date, f.kind, f.result, f.detail, None);
    }
    Ok(event_id)
  }

  /// Validate every referenced sire, then mark them in service. Returns the
  /// de-duplicated ids and their tags.
  fn enlist_sires(&mut self, requested: &[Uuid]) -> Result<(Vec<Uuid>, Vec<String>)> {
    let mut sires: Vec<Uuid> = Vec::new();
    for id in requested {
      if !sires.contains(id) {
        sires.push(*id);
      }
    }
    if sires.is_empty() {
      return Err(Error::MissingField { action: ActionKind::Service, field: "sires" });
    }

    let mut enlisted = Vec::with_capacity(sires.len());
    for id in &sires {
      let sire = self
        .registry
        .get(*id)
        .filter(|s| s.establishment_id == self.ctx.establishment_id)
        .ok_or(Error::UnknownSire(*id))?;
      if !sire.category.is_sire() {
        return Err(Error::SireUnavailable { sire: *id, reason: "not a bull" });
      }
      if sire.castrated {
        return Err(Error::SireUnavailable { sire: *id, reason: "castrated" });
      }
      if sire.status.is_exited() {
        return Err(Error::SireUnavailable { sire: *id, reason: "no longer in the herd" });
      }
      enlisted.push(sire.clone());
    }

    let tags = enlisted.iter().map(|s| s.tag.clone()).collect();
    for mut sire in enlisted {
      sire.status = Status::InService;
      self.stage(sire);
    }
    Ok((sires, tags))
  }

  /// Remove `sire` from every female's service link, clearing links that are
  /// left without a sire. Returns the females touched.
  fn release_sire(&mut self, sire: Uuid) -> Vec<Uuid> {
    let linked = self.registry.linked_to_sire(sire);
    for id in &linked {
      if let Some(mut female) = self.registry.get(*id).cloned() {
        female.service_link = female.service_link.and_then(|l| l.without_sire(sire));
        self.stage(female);
      }
    }
    linked
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fixtures::{EST, animal, ctx, day};

  fn draft<'c>(ctx: &'c Context, animals: &[Animal]) -> Draft<'c> {
    Draft::new(ctx, Registry::new(animals.iter().cloned()), Utc::now())
  }

  // ── Birth ─────────────────────────────────────────────────────────────

  #[test]
  fn birth_promotes_heifer_and_creates_calf() {
    let ctx = ctx();
    let bull = animal("B1", Category::Bull, Sex::Male);
    let mut heifer = animal("H1", Category::Heifer, Sex::Female);
    heifer.status = Status::Pregnant;
    heifer.service_link = Some(ServiceLink::Natural { sires: vec![bull.animal_id] });
    heifer.lot_id = Some(Uuid::new_v4());

    let mut d = draft(&ctx, &[bull, heifer.clone()]);
    let request = RecordRequest::new(
      heifer.animal_id,
      day(3),
      Action::Birth {
        calf_tag:     "C-100".into(),
        calf_sex:     Some(Sex::Female),
        birth_weight: Some("32 kg".into()),
      },
    );
    d.record(&request).unwrap();
    let cs = d.into_changeset();

    let mother = cs.animal(heifer.animal_id).unwrap();
    assert_eq!(mother.status, Status::Open);
    assert_eq!(mother.category, Category::Cow);
    assert!(mother.service_link.is_none());

    assert_eq!(cs.inserted.len(), 1);
    let calf = &cs.inserted[0];
    assert_eq!(calf.parent_id, Some(heifer.animal_id));
    assert_eq!(calf.category, Category::Calf);
    assert_eq!(calf.lot_id, heifer.lot_id);
    assert_eq!(calf.birth_date, Some(day(3)));

    assert_eq!(cs.events.len(), 2);
    assert!(matches!(cs.events[0].kind, EventKind::Birth(_)));
    assert_eq!(cs.events[1].animal_id, calf.animal_id);
    assert_eq!(cs.events[1].kind.weight(), Some(32.0));
  }

  #[test]
  fn birth_with_duplicate_tag_is_rejected() {
    let ctx = ctx();
    let cow = animal("V1", Category::Cow, Sex::Female);
    let other = animal("c-7", Category::Calf, Sex::Male);

    let mut d = draft(&ctx, &[cow.clone(), other]);
    let err = d
      .record(&RecordRequest::new(
        cow.animal_id,
        day(1),
        Action::Birth {
          calf_tag:     "C-7".into(),
          calf_sex:     Some(Sex::Male),
          birth_weight: None,
        },
      ))
      .unwrap_err();
    assert!(matches!(err, Error::DuplicateTag(t) if t == "C-7"));
    assert!(d.is_empty());
  }

  #[test]
  fn birth_without_calf_tag_is_rejected() {
    let ctx = ctx();
    let cow = animal("V1", Category::Cow, Sex::Female);
    let mut d = draft(&ctx, &[cow.clone()]);
    let err = d
      .record(&RecordRequest::new(
        cow.animal_id,
        day(1),
        Action::Birth { calf_tag: " ".into(), calf_sex: Some(Sex::Male), birth_weight: None },
      ))
      .unwrap_err();
    assert!(matches!(err, Error::MissingField { field: "calf_tag", .. }));
  }

  // ── Reproduction ──────────────────────────────────────────────────────

  #[test]
  fn pregnancy_check_sets_status() {
    let ctx = ctx();
    let cow = animal("V1", Category::Cow, Sex::Female);
    let mut d = draft(&ctx, &[cow.clone()]);
    d.record(&RecordRequest::new(
      cow.animal_id,
      day(1),
      Action::PregnancyCheck { outcome: Some(PregnancyOutcome::Pregnant) },
    ))
    .unwrap();
    assert_eq!(d.registry().get(cow.animal_id).unwrap().status, Status::Pregnant);
  }

  #[test]
  fn pregnancy_check_on_male_is_rejected() {
    let ctx = ctx();
    let bull = animal("B1", Category::Bull, Sex::Male);
    let mut d = draft(&ctx, &[bull.clone()]);
    let err = d
      .record(&RecordRequest::new(
        bull.animal_id,
        day(1),
        Action::PregnancyCheck { outcome: Some(PregnancyOutcome::Open) },
      ))
      .unwrap_err();
    assert!(matches!(err, Error::CategoryMismatch { action: ActionKind::PregnancyCheck, .. }));
  }

  #[test]
  fn natural_service_without_sires_is_rejected() {
    let ctx = ctx();
    let cow = animal("V1", Category::Cow, Sex::Female);
    let mut d = draft(&ctx, &[cow.clone()]);
    let err = d
      .record(&RecordRequest::new(
        cow.animal_id,
        day(1),
        Action::Service { mode: Some(ServiceMode::Natural), sires: vec![] },
      ))
      .unwrap_err();
    assert!(matches!(err, Error::MissingField { field: "sires", .. }));
    assert!(d.is_empty());
  }

  #[test]
  fn repeated_service_overwrites_link_and_enlists_sires() {
    let ctx = ctx();
    let b1 = animal("B1", Category::Bull, Sex::Male);
    let b2 = animal("B2", Category::Bull, Sex::Male);
    let cow = animal("V1", Category::Cow, Sex::Female);
    let mut d = draft(&ctx, &[b1.clone(), b2.clone(), cow.clone()]);

    let service = |sires: Vec<Uuid>| {
      RecordRequest::new(
        cow.animal_id,
        day(1),
        Action::Service { mode: Some(ServiceMode::Natural), sires },
      )
    };
    d.record(&service(vec![b1.animal_id])).unwrap();
    d.record(&service(vec![b2.animal_id, b2.animal_id])).unwrap();

    let cow = d.registry().get(cow.animal_id).unwrap();
    assert_eq!(
      cow.service_link,
      Some(ServiceLink::Natural { sires: vec![b2.animal_id] })
    );
    assert_eq!(d.registry().get(b1.animal_id).unwrap().status, Status::InService);
    assert_eq!(d.registry().get(b2.animal_id).unwrap().status, Status::InService);
  }

  #[test]
  fn service_rejects_non_bull_and_unknown_sires() {
    let ctx = ctx();
    let young = animal("YB", Category::YoungBull, Sex::Male);
    let cow = animal("V1", Category::Cow, Sex::Female);
    let mut d = draft(&ctx, &[young.clone(), cow.clone()]);

    let err = d
      .record(&RecordRequest::new(
        cow.animal_id,
        day(1),
        Action::Service { mode: Some(ServiceMode::Natural), sires: vec![young.animal_id] },
      ))
      .unwrap_err();
    assert!(matches!(err, Error::SireUnavailable { .. }));

    let ghost = Uuid::new_v4();
    let err = d
      .record(&RecordRequest::new(
        cow.animal_id,
        day(1),
        Action::Service { mode: Some(ServiceMode::Natural), sires: vec![ghost] },
      ))
      .unwrap_err();
    assert!(matches!(err, Error::UnknownSire(id) if id == ghost));
  }

  #[test]
  fn set_aside_unlinks_sire_from_every_female() {
    let ctx = ctx();
    let sire = animal("B1", Category::Bull, Sex::Male);
    let other = animal("B2", Category::Bull, Sex::Male);
    let mut f1 = animal("F1", Category::Cow, Sex::Female);
    f1.service_link = Some(ServiceLink::Natural { sires: vec![sire.animal_id] });
    let mut f2 = animal("F2", Category::Cow, Sex::Female);
    f2.service_link =
      Some(ServiceLink::Natural { sires: vec![sire.animal_id, other.animal_id] });

    let mut d = draft(&ctx, &[sire.clone(), other.clone(), f1.clone(), f2.clone()]);
    d.record(&RecordRequest::new(sire.animal_id, day(2), Action::SetAside)).unwrap();
    let cs = d.into_changeset();

    assert_eq!(cs.animal(sire.animal_id).unwrap().status, Status::SetAside);
    assert!(cs.animal(f1.animal_id).unwrap().service_link.is_none());
    assert_eq!(
      cs.animal(f2.animal_id).unwrap().service_link,
      Some(ServiceLink::Natural { sires: vec![other.animal_id] })
    );
    match &cs.events[0].kind {
      EventKind::SetAside(v) => assert_eq!(v.released.len(), 2),
      other => panic!("unexpected event {other:?}"),
    }
  }

  // ── Health ────────────────────────────────────────────────────────────

  #[test]
  fn recovery_clears_every_condition() {
    let ctx = ctx();
    let cow = animal("V1", Category::Cow, Sex::Female);
    let mut d = draft(&ctx, &[cow.clone()]);
    for action in [Action::Illness, Action::Injury, Action::Illness] {
      d.record(&RecordRequest::new(cow.animal_id, day(1), action)).unwrap();
    }
    assert_eq!(d.registry().get(cow.animal_id).unwrap().conditions.len(), 2);

    d.record(&RecordRequest::new(cow.animal_id, day(2), Action::Recovery)).unwrap();
    let cow = d.registry().get(cow.animal_id).unwrap();
    assert!(cow.conditions.is_empty());
    assert_eq!(cow.condition_label(), "healthy");
  }

  #[test]
  fn castration_only_for_uncastrated_males() {
    let ctx = ctx();
    let heifer_calf = animal("C1", Category::Calf, Sex::Female);
    let bull_calf = animal("C2", Category::Calf, Sex::Male);
    let mut d = draft(&ctx, &[heifer_calf.clone(), bull_calf.clone()]);

    let err = d
      .record(&RecordRequest::new(heifer_calf.animal_id, day(1), Action::Castration))
      .unwrap_err();
    assert!(matches!(err, Error::CategoryMismatch { .. }));

    d.record(&RecordRequest::new(bull_calf.animal_id, day(1), Action::Castration)).unwrap();
    let calf = d.registry().get(bull_calf.animal_id).unwrap();
    assert!(calf.castrated);
    assert_eq!(calf.status, Status::Active);

    let err = d
      .record(&RecordRequest::new(bull_calf.animal_id, day(2), Action::Castration))
      .unwrap_err();
    assert!(matches!(err, Error::AlreadyCastrated(_)));
  }

  // ── Exits ─────────────────────────────────────────────────────────────

  #[test]
  fn exits_require_confirmation() {
    let ctx = ctx();
    let cow = animal("V1", Category::Cow, Sex::Female);
    let mut d = draft(&ctx, &[cow.clone()]);
    let err = d
      .record(&RecordRequest::new(
        cow.animal_id,
        day(1),
        Action::Death { cause: "lightning".into() },
      ))
      .unwrap_err();
    assert!(matches!(err, Error::ConfirmationRequired(_)));
    assert!(d.is_empty());
  }

  #[test]
  fn sale_requires_price_and_records_disposition() {
    let ctx = ctx();
    let cow = animal("V1", Category::Cow, Sex::Female);
    let mut d = draft(&ctx, &[cow.clone()]);

    let err = d
      .record(
        &RecordRequest::new(cow.animal_id, day(1), Action::Sale { price: None, destination: None })
          .confirmed(),
      )
      .unwrap_err();
    assert!(matches!(err, Error::MissingField { field: "price", .. }));

    d.record(
      &RecordRequest::new(
        cow.animal_id,
        day(1),
        Action::Sale { price: Some(950.0), destination: Some("feedlot".into()) },
      )
      .confirmed(),
    )
    .unwrap();
    let cow = d.registry().get(cow.animal_id).unwrap();
    assert_eq!(cow.status, Status::Sold);
    assert_eq!(cow.disposition.as_deref(), Some("$950.00 to feedlot"));
  }

  #[test]
  fn restore_clears_disposition_and_resale_needs_fresh_price() {
    let ctx = ctx();
    let mut cow = animal("V1", Category::Cow, Sex::Female);
    cow.status = Status::Sold;
    cow.disposition = Some("$950.00".into());
    let mut d = draft(&ctx, &[cow.clone()]);

    d.record(&RecordRequest::new(cow.animal_id, day(5), Action::Restore).confirmed())
      .unwrap();
    let restored = d.registry().get(cow.animal_id).unwrap();
    assert_eq!(restored.status, Status::Active);
    assert!(restored.disposition.is_none());

    let err = d
      .record(
        &RecordRequest::new(cow.animal_id, day(6), Action::Sale { price: None, destination: None })
          .confirmed(),
      )
      .unwrap_err();
    assert!(matches!(err, Error::MissingField { field: "price", .. }));
  }

  #[test]
  fn exited_animals_only_accept_restore() {
    let ctx = ctx();
    let mut cow = animal("V1", Category::Cow, Sex::Female);
    cow.status = Status::Deceased;
    let mut d = draft(&ctx, &[cow.clone()]);
    let err = d
      .record(&RecordRequest::new(
        cow.animal_id,
        day(1),
        Action::WeighIn { weight: "400".into() },
      ))
      .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { status: Status::Deceased, .. }));

    let err = d
      .record(&RecordRequest::new(Uuid::new_v4(), day(1), Action::Recovery))
      .unwrap_err();
    assert!(matches!(err, Error::AnimalNotFound(_)));
  }

  #[test]
  fn restore_of_deleted_animal_checks_tag_reuse() {
    let ctx = ctx();
    let mut old = animal("T-1", Category::Cow, Sex::Female);
    old.status = Status::Deleted;
    let new = animal("t-1", Category::Heifer, Sex::Female);
    let mut d = draft(&ctx, &[old.clone(), new]);
    let err = d
      .record(&RecordRequest::new(old.animal_id, day(1), Action::Restore).confirmed())
      .unwrap_err();
    assert!(matches!(err, Error::DuplicateTag(_)));
  }

  #[test]
  fn deleting_a_sire_releases_its_females() {
    let ctx = ctx();
    let sire = animal("B1", Category::Bull, Sex::Male);
    let mut cow = animal("V1", Category::Cow, Sex::Female);
    cow.service_link = Some(ServiceLink::Natural { sires: vec![sire.animal_id] });
    let mut d = draft(&ctx, &[sire.clone(), cow.clone()]);
    d.record(&RecordRequest::new(sire.animal_id, day(1), Action::Deletion).confirmed())
      .unwrap();
    assert_eq!(d.registry().get(sire.animal_id).unwrap().status, Status::Deleted);
    assert!(d.registry().get(cow.animal_id).unwrap().service_link.is_none());
  }

  // ── Intake and correction ─────────────────────────────────────────────

  #[test]
  fn register_fixes_sex_from_category() {
    let ctx = ctx();
    let mut d = draft(&ctx, &[]);
    let new = NewAnimal {
      tag:         "V9".into(),
      category:    Category::Cow,
      sex:         None,
      birth_date:  None,
      intake_date: None,
      lot_id:      None,
      detail:      String::new(),
    };
    let id = d.register(&new, day(9)).unwrap();
    let cow = d.registry().get(id).unwrap();
    assert_eq!(cow.sex, Sex::Female);
    assert_eq!(cow.intake_date, Some(day(9)));
    assert_eq!(cow.establishment_id, EST);

    let err = d
      .register(&NewAnimal { tag: "v9".into(), ..new.clone() }, day(9))
      .unwrap_err();
    assert!(matches!(err, Error::DuplicateTag(_)));

    let err = d
      .register(
        &NewAnimal { tag: "B7".into(), category: Category::Bull, sex: Some(Sex::Female), ..new.clone() },
        day(9),
      )
      .unwrap_err();
    assert!(matches!(err, Error::SexMismatch { .. }));

    let err = d
      .register(&NewAnimal { tag: "C7".into(), category: Category::Calf, ..new }, day(9))
      .unwrap_err();
    assert!(matches!(err, Error::MissingField { field: "sex", .. }));
  }

  #[test]
  fn correction_keeps_status_consistent() {
    let ctx = ctx();
    let mut cow = animal("V1", Category::Cow, Sex::Female);
    cow.status = Status::Pregnant;
    let mut d = draft(&ctx, &[cow.clone()]);

    let err = d
      .correct(
        cow.animal_id,
        &AnimalCorrection { category: Some(Category::Calf), ..Default::default() },
      )
      .unwrap_err();
    assert!(matches!(err, Error::InconsistentStatus { .. }));

    let fixed = d
      .correct(
        cow.animal_id,
        &AnimalCorrection { tag: Some(" V-01 ".into()), ..Default::default() },
      )
      .unwrap();
    assert_eq!(fixed.tag, "V-01");
    assert!(d.into_changeset().events.is_empty());
  }

  #[test]
  fn castrated_male_cannot_become_a_sire() {
    let ctx = ctx();
    let calf = animal("C1", Category::Calf, Sex::Male);
    let mut d = draft(&ctx, &[calf.clone()]);
    d.record(&RecordRequest::new(calf.animal_id, day(1), Action::Castration)).unwrap();

    for category in [Category::Bull, Category::WorkingMale] {
      let err = d
        .correct(calf.animal_id, &AnimalCorrection {
          category: Some(category),
          ..Default::default()
        })
        .unwrap_err();
      assert!(matches!(err, Error::CastratedSire(c) if c == category));
    }

    let steer = d
      .correct(calf.animal_id, &AnimalCorrection {
        category: Some(Category::YoungBull),
        ..Default::default()
      })
      .unwrap();
    assert!(steer.castrated);
  }

  #[test]
  fn service_rejects_castrated_sire() {
    let ctx = ctx();
    let mut steer = animal("B9", Category::Bull, Sex::Male);
    steer.castrated = true;
    let cow = animal("V1", Category::Cow, Sex::Female);
    let mut d = draft(&ctx, &[steer.clone(), cow.clone()]);

    let err = d
      .record(&RecordRequest::new(
        cow.animal_id,
        day(1),
        Action::Service { mode: Some(ServiceMode::Natural), sires: vec![steer.animal_id] },
      ))
      .unwrap_err();
    assert!(matches!(err, Error::SireUnavailable { reason: "castrated", .. }));
    assert!(d.is_empty());
  }

  #[test]
  fn exited_animals_reject_corrections_until_restored() {
    let ctx = ctx();
    let mut cow = animal("V1", Category::Cow, Sex::Female);
    cow.status = Status::Sold;
    let mut d = draft(&ctx, &[cow.clone()]);
    let correction = AnimalCorrection { tag: Some("V-2".into()), ..Default::default() };

    let err = d.correct(cow.animal_id, &correction).unwrap_err();
    assert!(matches!(err, Error::ArchivedAnimal(id) if id == cow.animal_id));

    d.record(&RecordRequest::new(cow.animal_id, day(2), Action::Restore).confirmed())
      .unwrap();
    assert_eq!(d.correct(cow.animal_id, &correction).unwrap().tag, "V-2");
  }

  #[test]
  fn offered_actions_follow_category_and_status() {
    let calf = animal("C1", Category::Calf, Sex::Male);
    let offered = available_actions(&calf);
    assert!(offered.contains(&ActionKind::Castration));
    assert!(!offered.contains(&ActionKind::PregnancyCheck));
    assert!(!offered.contains(&ActionKind::Intake));

    let bull = animal("B1", Category::Bull, Sex::Male);
    assert!(available_actions(&bull).contains(&ActionKind::SetAside));

    let mut sold = animal("V1", Category::Cow, Sex::Female);
    sold.status = Status::Sold;
    assert_eq!(
      available_actions(&sold),
      vec![ActionKind::Restore, ActionKind::Deletion]
    );
  }
}
