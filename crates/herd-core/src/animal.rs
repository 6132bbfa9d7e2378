//! Animal records and the fixed vocabularies that describe them.
//!
//! An animal's status, conditions, castration flag, lot, and service link are
//! derived state: they change only when the engine records an event. Identity
//! fields (tag, category, sex, dates) may be corrected directly.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

// ─── Vocabularies ────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
  /// Mature breeding female.
  Cow,
  /// Young breeding female; promoted to [`Category::Cow`] at first birth.
  Heifer,
  /// Mature intact male; the only category that can serve as a sire.
  Bull,
  /// Young intact male, still growing.
  YoungBull,
  /// Intact male kept for work rather than breeding.
  WorkingMale,
  /// Juvenile of either sex.
  Calf,
}

impl Category {
  /// The sex implied by the category, if any. Calves are the only category
  /// whose sex is chosen freely.
  pub fn fixed_sex(self) -> Option<Sex> {
    match self {
      Self::Cow | Self::Heifer => Some(Sex::Female),
      Self::Bull | Self::YoungBull | Self::WorkingMale => Some(Sex::Male),
      Self::Calf => None,
    }
  }

  pub fn is_breeding_female(self) -> bool {
    matches!(self, Self::Cow | Self::Heifer)
  }

  pub fn is_sire(self) -> bool { matches!(self, Self::Bull) }

  /// Categories that only an intact male can hold.
  pub fn requires_intact(self) -> bool { matches!(self, Self::Bull | Self::WorkingMale) }

  /// Juveniles and growing males may be castrated.
  pub fn is_castratable(self) -> bool {
    matches!(self, Self::Calf | Self::YoungBull)
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Sex {
  Female,
  Male,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Status {
  Active,
  Pregnant,
  /// Checked and found not pregnant, or freshly calved.
  Open,
  /// A bull currently linked to at least one service.
  InService,
  /// A bull retired from service duty.
  SetAside,
  Sold,
  Deceased,
  /// Soft-deleted; hidden from every listing but kept for audit.
  Deleted,
}

impl Status {
  /// Sold, deceased, and deleted animals have left the herd.
  pub fn is_exited(self) -> bool {
    matches!(self, Self::Sold | Self::Deceased | Self::Deleted)
  }

  /// Whether an animal of `category` may hold this status.
  pub fn is_consistent_with(self, category: Category) -> bool {
    match self {
      Self::Pregnant | Self::Open => category.is_breeding_female(),
      Self::InService | Self::SetAside => category.is_sire(),
      _ => true,
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Condition {
  Sick,
  Injured,
}

/// How the animal entered the registry.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Origin {
  Intake,
  Born,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ServiceMode {
  Natural,
  Assisted,
}

// ─── Service link ────────────────────────────────────────────────────────────

/// The sires associated with a female's pending or confirmed mating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ServiceLink {
  /// Never empty: removing the last sire clears the link instead.
  Natural { sires: Vec<Uuid> },
  Assisted,
}

impl ServiceLink {
  pub fn sires(&self) -> &[Uuid] {
    match self {
      Self::Natural { sires } => sires,
      Self::Assisted => &[],
    }
  }

  pub fn references(&self, sire: Uuid) -> bool { self.sires().contains(&sire) }

  /// Drop `sire` from the link. Returns `None` when no sire remains.
  pub fn without_sire(self, sire: Uuid) -> Option<Self> {
    match self {
      Self::Natural { mut sires } => {
        sires.retain(|s| *s != sire);
        if sires.is_empty() {
          None
        } else {
          Some(Self::Natural { sires })
        }
      }
      Self::Assisted => Some(Self::Assisted),
    }
  }
}

// ─── Animal ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
  pub animal_id:        Uuid,
  pub establishment_id: Uuid,
  /// Human-assigned ear tag. Unique among non-deleted animals of the
  /// establishment, compared case-insensitively.
  pub tag:              String,
  pub category:         Category,
  pub sex:              Sex,
  pub status:           Status,
  pub conditions:       BTreeSet<Condition>,
  pub castrated:        bool,
  pub origin:           Origin,
  pub birth_date:       Option<NaiveDate>,
  pub intake_date:      Option<NaiveDate>,
  /// The mother, for animals born in the herd.
  pub parent_id:        Option<Uuid>,
  pub lot_id:           Option<Uuid>,
  pub service_link:     Option<ServiceLink>,
  /// Sale or death summary; set on exit and cleared by a restore.
  pub disposition:      Option<String>,
  pub created_at:       DateTime<Utc>,
}

impl Animal {
  pub fn is_active(&self) -> bool { !self.status.is_exited() }

  pub fn is_castration_eligible(&self) -> bool {
    self.sex == Sex::Male && self.category.is_castratable() && !self.castrated
  }

  pub fn is_sick(&self) -> bool { self.conditions.contains(&Condition::Sick) }

  /// Display form of the condition set; an empty set reads as "healthy".
  pub fn condition_label(&self) -> String {
    if self.conditions.is_empty() {
      "healthy".to_owned()
    } else {
      self
        .conditions
        .iter()
        .map(Condition::to_string)
        .collect::<Vec<_>>()
        .join(", ")
    }
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::herd::Herd::register_animal`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAnimal {
  pub tag:         String,
  pub category:    Category,
  /// Required for calves; must match the category otherwise, if given.
  pub sex:         Option<Sex>,
  pub birth_date:  Option<NaiveDate>,
  /// Defaults to today.
  pub intake_date: Option<NaiveDate>,
  pub lot_id:      Option<Uuid>,
  #[serde(default)]
  pub detail:      String,
}

/// Input to [`crate::herd::Herd::correct_animal`]. Only identity fields can
/// be corrected; derived state changes through events alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimalCorrection {
  pub tag:         Option<String>,
  pub category:    Option<Category>,
  pub sex:         Option<Sex>,
  pub birth_date:  Option<NaiveDate>,
  pub intake_date: Option<NaiveDate>,
}

// ─── Tags ────────────────────────────────────────────────────────────────────

/// The comparison form of a tag.
pub fn normalize_tag(tag: &str) -> String { tag.trim().to_lowercase() }

/// Sort key that orders `"A-2"` before `"A-10"`: tags are compared by their
/// embedded digits first, then lexically.
pub fn tag_sort_key(tag: &str) -> (u64, String) {
  let digits: String = tag.chars().filter(char::is_ascii_digit).collect();
  let number = digits.parse().unwrap_or(0);
  (number, normalize_tag(tag))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn numeric_tags_sort_by_value() {
    let mut tags = vec!["A-10", "A-2", "b-1", "X"];
    tags.sort_by_key(|t| tag_sort_key(t));
    assert_eq!(tags, ["X", "b-1", "A-2", "A-10"]);
  }

  #[test]
  fn removing_last_sire_clears_link() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    let link = ServiceLink::Natural { sires: vec![a, b] };
    let link = link.without_sire(a).unwrap();
    assert_eq!(link.sires(), &[b]);
    assert!(link.without_sire(b).is_none());
  }

  #[test]
  fn assisted_link_survives_sire_removal() {
    let link = ServiceLink::Assisted.without_sire(Uuid::new_v4());
    assert_eq!(link, Some(ServiceLink::Assisted));
  }

  #[test]
  fn reproductive_statuses_require_matching_category() {
    assert!(Status::Pregnant.is_consistent_with(Category::Heifer));
    assert!(!Status::Pregnant.is_consistent_with(Category::Bull));
    assert!(Status::SetAside.is_consistent_with(Category::Bull));
    assert!(!Status::InService.is_consistent_with(Category::YoungBull));
    assert!(Status::Sold.is_consistent_with(Category::Calf));
  }

  #[test]
  fn vocabulary_round_trips_through_strings() {
    assert_eq!(Category::YoungBull.to_string(), "young_bull");
    assert_eq!("set_aside".parse::<Status>().unwrap(), Status::SetAside);
  }
}
