//! Headline herd figures.

use serde::{Deserialize, Serialize};

use crate::{
  animal::{Category, Status},
  registry::Registry,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HerdSummary {
  pub total:            usize,
  pub breeding_females: usize,
  pub pregnant:         usize,
  /// Pregnant share of breeding females, as a rounded percentage.
  pub pregnancy_rate:   u32,
  pub sick:             usize,
  pub calves:           usize,
  pub sires_in_service: usize,
  pub sires_set_aside:  usize,
}

impl HerdSummary {
  pub fn of(registry: &Registry) -> Self {
    let mut s = Self::default();
    for animal in registry.active() {
      s.total += 1;
      if animal.category.is_breeding_female() {
        s.breeding_females += 1;
      }
      match animal.status {
        Status::Pregnant => s.pregnant += 1,
        Status::InService => s.sires_in_service += 1,
        Status::SetAside => s.sires_set_aside += 1,
        _ => {}
      }
      if animal.is_sick() {
        s.sick += 1;
      }
      if animal.category == Category::Calf {
        s.calves += 1;
      }
    }
    if s.breeding_females > 0 {
      s.pregnancy_rate =
        (s.pregnant as f64 * 100.0 / s.breeding_females as f64).round() as u32;
    }
    s
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    animal::{Condition, Sex},
    fixtures::animal,
  };

  #[test]
  fn rates_are_over_breeding_females_only() {
    let mut p1 = animal("V1", Category::Cow, Sex::Female);
    p1.status = Status::Pregnant;
    let v2 = animal("V2", Category::Cow, Sex::Female);
    let v3 = animal("V3", Category::Heifer, Sex::Female);
    let mut bull = animal("B1", Category::Bull, Sex::Male);
    bull.status = Status::InService;
    let mut calf = animal("C1", Category::Calf, Sex::Male);
    calf.conditions.insert(Condition::Sick);
    let mut sold = animal("V4", Category::Cow, Sex::Female);
    sold.status = Status::Sold;

    let s = HerdSummary::of(&Registry::new([p1, v2, v3, bull, calf, sold]));
    assert_eq!(s.total, 5);
    assert_eq!(s.breeding_females, 3);
    assert_eq!(s.pregnant, 1);
    assert_eq!(s.pregnancy_rate, 33);
    assert_eq!(s.sick, 1);
    assert_eq!(s.calves, 1);
    assert_eq!(s.sires_in_service, 1);
  }

  #[test]
  fn empty_herd_has_zero_rate() {
    assert_eq!(HerdSummary::of(&Registry::default()), HerdSummary::default());
  }
}
