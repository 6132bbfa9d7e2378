//! Parent and children of an animal, derived from the registry's parent index.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  animal::{Sex, Status, tag_sort_key},
  registry::Registry,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildSummary {
  pub animal_id: Uuid,
  pub tag:       String,
  pub sex:       Sex,
  pub status:    Status,
  /// False for children that have been sold, died, or were deleted. They are
  /// still listed.
  pub active:    bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AncestorSummary {
  pub animal_id: Uuid,
  pub tag:       String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lineage {
  pub animal_id:  Uuid,
  pub parent_id:  Option<Uuid>,
  /// `"unknown"` when there is no parent reference or it cannot be resolved.
  pub parent_tag: String,
  /// Nearest first.
  pub ancestors:  Vec<AncestorSummary>,
  pub children:   Vec<ChildSummary>,
}

pub const UNKNOWN_PARENT: &str = "unknown";

pub fn trace(registry: &Registry, animal_id: Uuid) -> Result<Lineage> {
  let animal = registry.get(animal_id).ok_or(Error::AnimalNotFound(animal_id))?;

  let parent_tag = animal
    .parent_id
    .and_then(|p| registry.get(p))
    .map_or_else(|| UNKNOWN_PARENT.to_owned(), |p| p.tag.clone());

  let ancestors = registry
    .ancestors(animal_id)
    .into_iter()
    .map(|a| AncestorSummary { animal_id: a.animal_id, tag: a.tag.clone() })
    .collect();

  let mut children: Vec<ChildSummary> = registry
    .children_of(animal_id)
    .map(|c| ChildSummary {
      animal_id: c.animal_id,
      tag:       c.tag.clone(),
      sex:       c.sex,
      status:    c.status,
      active:    c.is_active(),
    })
    .collect();
  children.sort_by_key(|c| tag_sort_key(&c.tag));

  Ok(Lineage {
    animal_id,
    parent_id: animal.parent_id,
    parent_tag,
    ancestors,
    children,
  })
}
