//! Encoding and decoding between domain types and the plain-text columns
//! stored in SQLite.
//!
//! Timestamps are RFC 3339 strings with a fixed microsecond precision so that
//! they sort lexically. Calendar dates are `YYYY-MM-DD`. Vocabularies use
//! their snake_case names; condition sets and service links are compact JSON.
//!
//! Each `Raw*` type is both the row read back from a query and the bundle of
//! owned parameters moved into a write closure.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use herd_core::{
  animal::Animal,
  establishment::Establishment,
  event::{Event, EventKind},
  lot::{Labor, Lot},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<&str>) -> Result<Option<Uuid>> {
  s.map(decode_uuid).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|_| Error::Decode { column: "timestamp", value: s.to_owned() })
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|_| Error::Decode { column: "date", value: s.to_owned() })
}

fn decode_opt_date(s: Option<&str>) -> Result<Option<NaiveDate>> {
  s.map(decode_date).transpose()
}

/// Parse a vocabulary value from its stored snake_case name.
pub fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::Decode { column, value: s.to_owned() })
}

// ─── Establishment ───────────────────────────────────────────────────────────

pub struct RawEstablishment {
  pub establishment_id: String,
  pub name:             String,
  pub created_at:       String,
}

impl RawEstablishment {
  pub const COLUMNS: &'static str = "establishment_id, name, created_at";

  pub fn encode(e: &Establishment) -> Self {
    Self {
      establishment_id: encode_uuid(e.establishment_id),
      name:             e.name.clone(),
      created_at:       encode_dt(e.created_at),
    }
  }

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      establishment_id: row.get(0)?,
      name:             row.get(1)?,
      created_at:       row.get(2)?,
    })
  }

  pub fn into_establishment(self) -> Result<Establishment> {
    Ok(Establishment {
      establishment_id: decode_uuid(&self.establishment_id)?,
      name:             self.name,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

// ─── Animal ──────────────────────────────────────────────────────────────────

pub struct RawAnimal {
  pub animal_id:        String,
  pub establishment_id: String,
  pub tag:              String,
  pub category:         String,
  pub sex:              String,
  pub status:           String,
  pub conditions:       String,
  pub castrated:        bool,
  pub origin:           String,
  pub birth_date:       Option<String>,
  pub intake_date:      Option<String>,
  pub parent_id:        Option<String>,
  pub lot_id:           Option<String>,
  pub service_link:     Option<String>,
  pub disposition:      Option<String>,
  pub created_at:       String,
}

impl RawAnimal {
  pub const COLUMNS: &'static str = "animal_id, establishment_id, tag, category, sex, status, \
                             conditions, castrated, origin, birth_date, intake_date, \
                             parent_id, lot_id, service_link, disposition, created_at";

  pub fn encode(a: &Animal) -> Result<Self> {
    Ok(Self {
      animal_id:        encode_uuid(a.animal_id),
      establishment_id: encode_uuid(a.establishment_id),
      tag:              a.tag.clone(),
      category:         a.category.to_string(),
      sex:              a.sex.to_string(),
      status:           a.status.to_string(),
      conditions:       serde_json::to_string(&a.conditions)?,
      castrated:        a.castrated,
      origin:           a.origin.to_string(),
      birth_date:       a.birth_date.map(encode_date),
      intake_date:      a.intake_date.map(encode_date),
      parent_id:        a.parent_id.map(encode_uuid),
      lot_id:           a.lot_id.map(encode_uuid),
      service_link:     a.service_link.as_ref().map(serde_json::to_string).transpose()?,
      disposition:      a.disposition.clone(),
      created_at:       encode_dt(a.created_at),
    })
  }

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      animal_id:        row.get(0)?,
      establishment_id: row.get(1)?,
      tag:              row.get(2)?,
      category:         row.get(3)?,
      sex:              row.get(4)?,
      status:           row.get(5)?,
      conditions:       row.get(6)?,
      castrated:        row.get(7)?,
      origin:           row.get(8)?,
      birth_date:       row.get(9)?,
      intake_date:      row.get(10)?,
      parent_id:        row.get(11)?,
      lot_id:           row.get(12)?,
      service_link:     row.get(13)?,
      disposition:      row.get(14)?,
      created_at:       row.get(15)?,
    })
  }

  pub fn into_animal(self) -> Result<Animal> {
    Ok(Animal {
      animal_id:        decode_uuid(&self.animal_id)?,
      establishment_id: decode_uuid(&self.establishment_id)?,
      tag:              self.tag,
      category:         decode_enum("category", &self.category)?,
      sex:              decode_enum("sex", &self.sex)?,
      status:           decode_enum("status", &self.status)?,
      conditions:       serde_json::from_str(&self.conditions)?,
      castrated:        self.castrated,
      origin:           decode_enum("origin", &self.origin)?,
      birth_date:       decode_opt_date(self.birth_date.as_deref())?,
      intake_date:      decode_opt_date(self.intake_date.as_deref())?,
      parent_id:        decode_opt_uuid(self.parent_id.as_deref())?,
      lot_id:           decode_opt_uuid(self.lot_id.as_deref())?,
      service_link:     self
        .service_link
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?,
      disposition:      self.disposition,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

// ─── Event ───────────────────────────────────────────────────────────────────

pub struct RawEvent {
  pub event_id:         String,
  pub establishment_id: String,
  pub animal_id:        String,
  pub occurred_on:      String,
  pub recorded_at:      String,
  pub event_type:       String,
  pub payload_json:     String,
  pub result:           String,
  pub detail:           String,
  pub cost:             Option<f64>,
  pub recorded_by:      Option<String>,
}

impl RawEvent {
  pub const COLUMNS: &'static str = "event_id, establishment_id, animal_id, occurred_on, recorded_at, \
                             event_type, payload_json, result, detail, cost, recorded_by";

  pub fn encode(e: &Event) -> Result<Self> {
    Ok(Self {
      event_id:         encode_uuid(e.event_id),
      establishment_id: encode_uuid(e.establishment_id),
      animal_id:        encode_uuid(e.animal_id),
      occurred_on:      encode_date(e.occurred_on),
      recorded_at:      encode_dt(e.recorded_at),
      event_type:       e.kind.discriminant().to_owned(),
      payload_json:     e.kind.to_json()?.to_string(),
      result:           e.result.clone(),
      detail:           e.detail.clone(),
      cost:             e.cost,
      recorded_by:      e.recorded_by.clone(),
    })
  }

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:         row.get(0)?,
      establishment_id: row.get(1)?,
      animal_id:        row.get(2)?,
      occurred_on:      row.get(3)?,
      recorded_at:      row.get(4)?,
      event_type:       row.get(5)?,
      payload_json:     row.get(6)?,
      result:           row.get(7)?,
      detail:           row.get(8)?,
      cost:             row.get(9)?,
      recorded_by:      row.get(10)?,
    })
  }

  pub fn into_event(self) -> Result<Event> {
    let payload: serde_json::Value = serde_json::from_str(&self.payload_json)?;
    Ok(Event {
      event_id:         decode_uuid(&self.event_id)?,
      establishment_id: decode_uuid(&self.establishment_id)?,
      animal_id:        decode_uuid(&self.animal_id)?,
      occurred_on:      decode_date(&self.occurred_on)?,
      recorded_at:      decode_dt(&self.recorded_at)?,
      kind:             EventKind::from_parts(&self.event_type, payload)?,
      result:           self.result,
      detail:           self.detail,
      cost:             self.cost,
      recorded_by:      self.recorded_by,
    })
  }
}

// ─── Lot and labor ───────────────────────────────────────────────────────────

pub struct RawLot {
  pub lot_id:           String,
  pub establishment_id: String,
  pub name:             String,
  pub area_ha:          f64,
  pub state:            String,
  pub crop:             Option<String>,
  pub created_at:       String,
}

impl RawLot {
  pub const COLUMNS: &'static str = "lot_id, establishment_id, name, area_ha, state, crop, created_at";

  pub fn encode(l: &Lot) -> Self {
    Self {
      lot_id:           encode_uuid(l.lot_id),
      establishment_id: encode_uuid(l.establishment_id),
      name:             l.name.clone(),
      area_ha:          l.area_ha,
      state:            l.state.to_string(),
      crop:             l.crop.clone(),
      created_at:       encode_dt(l.created_at),
    }
  }

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      lot_id:           row.get(0)?,
      establishment_id: row.get(1)?,
      name:             row.get(2)?,
      area_ha:          row.get(3)?,
      state:            row.get(4)?,
      crop:             row.get(5)?,
      created_at:       row.get(6)?,
    })
  }

  pub fn into_lot(self) -> Result<Lot> {
    Ok(Lot {
      lot_id:           decode_uuid(&self.lot_id)?,
      establishment_id: decode_uuid(&self.establishment_id)?,
      name:             self.name,
      area_ha:          self.area_ha,
      state:            decode_enum("state", &self.state)?,
      crop:             self.crop,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawLabor {
  pub labor_id:         String,
  pub lot_id:           String,
  pub establishment_id: String,
  pub activity:         String,
  pub crop:             Option<String>,
  pub detail:           String,
  pub cost:             Option<f64>,
  pub performed_on:     String,
  pub recorded_at:      String,
}

impl RawLabor {
  pub const COLUMNS: &'static str = "labor_id, lot_id, establishment_id, activity, crop, detail, cost, \
                             performed_on, recorded_at";

  pub fn encode(l: &Labor) -> Self {
    Self {
      labor_id:         encode_uuid(l.labor_id),
      lot_id:           encode_uuid(l.lot_id),
      establishment_id: encode_uuid(l.establishment_id),
      activity:         l.activity.to_string(),
      crop:             l.crop.clone(),
      detail:           l.detail.clone(),
      cost:             l.cost,
      performed_on:     encode_date(l.performed_on),
      recorded_at:      encode_dt(l.recorded_at),
    }
  }

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      labor_id:         row.get(0)?,
      lot_id:           row.get(1)?,
      establishment_id: row.get(2)?,
      activity:         row.get(3)?,
      crop:             row.get(4)?,
      detail:           row.get(5)?,
      cost:             row.get(6)?,
      performed_on:     row.get(7)?,
      recorded_at:      row.get(8)?,
    })
  }

  pub fn into_labor(self) -> Result<Labor> {
    Ok(Labor {
      labor_id:         decode_uuid(&self.labor_id)?,
      lot_id:           decode_uuid(&self.lot_id)?,
      establishment_id: decode_uuid(&self.establishment_id)?,
      activity:         decode_enum("activity", &self.activity)?,
      crop:             self.crop,
      detail:           self.detail,
      cost:             self.cost,
      performed_on:     decode_date(&self.performed_on)?,
      recorded_at:      decode_dt(&self.recorded_at)?,
    })
  }
}
