//! Which active animals stand on which lot. Read-only.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  animal::{Animal, tag_sort_key},
  lot::Lot,
  registry::Registry,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotOccupancy {
  pub lot_id:  Uuid,
  pub count:   usize,
  pub animals: Vec<Animal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotCount {
  pub lot_id: Uuid,
  pub name:   String,
  pub count:  usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstablishmentOccupancy {
  pub lots:       Vec<LotCount>,
  /// Active animals with no lot, or whose lot no longer exists.
  pub unassigned: usize,
}

pub fn lot_occupancy(registry: &Registry, lot_id: Uuid) -> LotOccupancy {
  let mut animals: Vec<Animal> = registry
    .active()
    .filter(|a| a.lot_id == Some(lot_id))
    .cloned()
    .collect();
  animals.sort_by_key(|a| tag_sort_key(&a.tag));
  LotOccupancy { lot_id, count: animals.len(), animals }
}

pub fn establishment_occupancy(registry: &Registry, lots: &[Lot]) -> EstablishmentOccupancy {
  let lots: Vec<LotCount> = lots
    .iter()
    .map(|lot| LotCount {
      lot_id: lot.lot_id,
      name:   lot.name.clone(),
      count:  registry.active().filter(|a| a.lot_id == Some(lot.lot_id)).count(),
    })
    .collect();
  let placed: usize = lots.iter().map(|l| l.count).sum();
  let unassigned = registry.active().count() - placed;
  EstablishmentOccupancy { lots, unassigned }
}
