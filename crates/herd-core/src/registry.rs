//! In-memory projections of one establishment: the animal [`Registry`] and
//! the event [`Ledger`].
//!
//! Both are loaded from a [`crate::store::HerdStore`] and are read-only views
//! except through the engine's draft, which works on a private copy.

use std::collections::{BTreeMap, HashMap, HashSet};

use uuid::Uuid;

use crate::{
  animal::{Animal, normalize_tag},
  event::Event,
  performance::WeightReading,
};

// ─── Registry ────────────────────────────────────────────────────────────────

/// Every animal of one establishment, deleted ones included, with a secondary
/// index from parent to children. Children hold the only stored reference.
#[derive(Debug, Clone, Default)]
pub struct Registry {
  animals:  BTreeMap<Uuid, Animal>,
  children: HashMap<Uuid, Vec<Uuid>>,
}

impl Registry {
  pub fn new(animals: impl IntoIterator<Item = Animal>) -> Self {
    let mut registry = Self::default();
    for animal in animals {
      registry.insert(animal);
    }
    registry
  }

  pub fn get(&self, id: Uuid) -> Option<&Animal> { self.animals.get(&id) }

  pub fn len(&self) -> usize { self.animals.len() }

  pub fn is_empty(&self) -> bool { self.animals.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = &Animal> { self.animals.values() }

  /// Animals that have not left the herd.
  pub fn active(&self) -> impl Iterator<Item = &Animal> {
    self.animals.values().filter(|a| a.is_active())
  }

  pub fn children_of(&self, parent: Uuid) -> impl Iterator<Item = &Animal> {
    self
      .children
      .get(&parent)
      .into_iter()
      .flatten()
      .filter_map(|id| self.animals.get(id))
  }

  /// Whether `tag` is held by a non-deleted animal other than `except`.
  pub fn tag_taken(&self, tag: &str, except: Option<Uuid>) -> bool {
    let wanted = normalize_tag(tag);
    self.animals.values().any(|a| {
      Some(a.animal_id) != except
        && a.status != crate::animal::Status::Deleted
        && normalize_tag(&a.tag) == wanted
    })
  }

  /// Females whose service link currently names `sire`.
  pub fn linked_to_sire(&self, sire: Uuid) -> Vec<Uuid> {
    self
      .animals
      .values()
      .filter(|a| a.service_link.as_ref().is_some_and(|l| l.references(sire)))
      .map(|a| a.animal_id)
      .collect()
  }

  /// The chain of known ancestors, nearest first. Stops at an unknown parent
  /// and never revisits an animal.
  pub fn ancestors(&self, id: Uuid) -> Vec<&Animal> {
    let mut seen = HashSet::from([id]);
    let mut chain = Vec::new();
    let mut cursor = self.get(id).and_then(|a| a.parent_id);
    while let Some(parent_id) = cursor {
      if !seen.insert(parent_id) {
        break;
      }
      let Some(parent) = self.get(parent_id) else { break };
      chain.push(parent);
      cursor = parent.parent_id;
    }
    chain
  }

  /// Insert or replace an animal, keeping the parent index in step.
  pub fn insert(&mut self, animal: Animal) {
    if let Some(old) = self.animals.get(&animal.animal_id)
      && old.parent_id != animal.parent_id
      && let Some(parent) = old.parent_id
      && let Some(siblings) = self.children.get_mut(&parent)
    {
      siblings.retain(|c| *c != animal.animal_id);
    }
    if let Some(parent) = animal.parent_id {
      let siblings = self.children.entry(parent).or_default();
      if !siblings.contains(&animal.animal_id) {
        siblings.push(animal.animal_id);
      }
    }
    self.animals.insert(animal.animal_id, animal);
  }
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// Events in ledger order: event date, then creation order.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
  events: Vec<Event>,
}

impl Ledger {
  pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
    let mut events: Vec<Event> = events.into_iter().collect();
    events.sort_by_key(Event::ledger_key);
    Self { events }
  }

  pub fn events(&self) -> &[Event] { &self.events }

  pub fn for_animal(&self, animal_id: Uuid) -> impl Iterator<Item = &Event> {
    self.events.iter().filter(move |e| e.animal_id == animal_id)
  }

  /// Weigh-in readings for one animal, oldest first.
  pub fn weight_readings(&self, animal_id: Uuid) -> Vec<WeightReading> {
    self
      .for_animal(animal_id)
      .filter_map(|e| {
        e.kind.weight().map(|weight| WeightReading {
          event_id: e.event_id,
          occurred_on: e.occurred_on,
          weight,
        })
      })
      .collect()
  }

  /// The most recent weigh-in by event date.
  pub fn latest_reading(&self, animal_id: Uuid) -> Option<WeightReading> {
    self.weight_readings(animal_id).pop()
  }
}
