//! Shared builders for unit tests.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  Context,
  animal::{Animal, Category, Origin, Sex, Status},
  event::{Event, EventKind, WeighInValue},
};

pub const EST: Uuid = Uuid::from_u128(0x5eed_0000_0000_0000_0000_0000_0000_0001);

pub fn ctx() -> Context { Context::new(EST).with_actor("tester") }

pub fn day(n: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 6, n).unwrap() }

/// An active, healthy animal of `EST`.
pub fn animal(tag: &str, category: Category, sex: Sex) -> Animal {
  Animal {
    animal_id: Uuid::new_v4(),
    establishment_id: EST,
    tag: tag.to_owned(),
    category,
    sex,
    status: Status::Active,
    conditions: BTreeSet::new(),
    castrated: false,
    origin: Origin::Intake,
    birth_date: None,
    intake_date: Some(day(1)),
    parent_id: None,
    lot_id: None,
    service_link: None,
    disposition: None,
    created_at: Utc::now(),
  }
}

pub fn event_on(animal: &Animal, occurred_on: NaiveDate, kind: EventKind) -> Event {
  Event {
    event_id: Uuid::new_v4(),
    establishment_id: animal.establishment_id,
    animal_id: animal.animal_id,
    occurred_on,
    recorded_at: Utc::now(),
    kind,
    result: String::new(),
    detail: String::new(),
    cost: None,
    recorded_by: None,
  }
}

pub fn weigh_in(animal: &Animal, occurred_on: NaiveDate, weight: f64) -> Event {
  let mut event =
    event_on(animal, occurred_on, EventKind::WeighIn(WeighInValue { weight }));
  event.result = weight.to_string();
  event
}
