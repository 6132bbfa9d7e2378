//! [`SqliteStore`]: the SQLite implementation of [`HerdStore`].

use std::path::Path;

use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter};
use tracing::debug;
use uuid::Uuid;

use herd_core::{
  animal::Animal,
  establishment::Establishment,
  event::Event,
  lot::{Labor, Lot},
  store::{AnimalQuery, Changeset, EventQuery, HerdStore},
};

use crate::{
  Result,
  encode::{RawAnimal, RawEstablishment, RawEvent, RawLabor, RawLot, encode_date, encode_uuid},
  schema::SCHEMA,
};

// ─── Row writers ─────────────────────────────────────────────────────────────
//
// Plain functions over a connection so they run the same inside or outside a
// transaction (`Transaction` derefs to `Connection`).

fn insert_animal(conn: &Connection, a: &RawAnimal) -> rusqlite::Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO animals ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, \
       ?13, ?14, ?15, ?16)",
      RawAnimal::COLUMNS
    ),
    params![
      a.animal_id,
      a.establishment_id,
      a.tag,
      a.category,
      a.sex,
      a.status,
      a.conditions,
      a.castrated,
      a.origin,
      a.birth_date,
      a.intake_date,
      a.parent_id,
      a.lot_id,
      a.service_link,
      a.disposition,
      a.created_at,
    ],
  )?;
  Ok(())
}

fn update_animal(conn: &Connection, a: &RawAnimal) -> rusqlite::Result<()> {
  let changed = conn.execute(
    "UPDATE animals SET
       tag = ?2, category = ?3, sex = ?4, status = ?5, conditions = ?6,
       castrated = ?7, birth_date = ?8, intake_date = ?9, parent_id = ?10,
       lot_id = ?11, service_link = ?12, disposition = ?13
     WHERE animal_id = ?1",
    params![
      a.animal_id,
      a.tag,
      a.category,
      a.sex,
      a.status,
      a.conditions,
      a.castrated,
      a.birth_date,
      a.intake_date,
      a.parent_id,
      a.lot_id,
      a.service_link,
      a.disposition,
    ],
  )?;
  if changed == 0 {
    return Err(rusqlite::Error::QueryReturnedNoRows);
  }
  Ok(())
}

fn insert_event(conn: &Connection, e: &RawEvent) -> rusqlite::Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO events ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
      RawEvent::COLUMNS
    ),
    params![
      e.event_id,
      e.establishment_id,
      e.animal_id,
      e.occurred_on,
      e.recorded_at,
      e.event_type,
      e.payload_json,
      e.result,
      e.detail,
      e.cost,
      e.recorded_by,
    ],
  )?;
  Ok(())
}

fn write_lot(conn: &Connection, l: &RawLot) -> rusqlite::Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO lots ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
       ON CONFLICT(lot_id) DO UPDATE SET
         name = excluded.name, area_ha = excluded.area_ha,
         state = excluded.state, crop = excluded.crop",
      RawLot::COLUMNS
    ),
    params![
      l.lot_id,
      l.establishment_id,
      l.name,
      l.area_ha,
      l.state,
      l.crop,
      l.created_at
    ],
  )?;
  Ok(())
}

fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }

// ─── Store ───────────────────────────────────────────────────────────────────

/// A herd ledger backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let conn = tokio_rusqlite::Connection::open(&path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    debug!(path = %path.display(), "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single-row lookup by id.
  async fn find_one<R, F>(&self, sql: String, id: Uuid, map: F) -> Result<Option<R>>
  where
    R: Send + 'static,
    F: FnOnce(&rusqlite::Row<'_>) -> rusqlite::Result<R> + Send + 'static,
  {
    let id = encode_uuid(id);
    Ok(
      self
        .conn
        .call(move |conn| Ok(conn.query_row(&sql, params![id], map).optional()?))
        .await?,
    )
  }

  /// Run a delete by id. Returns whether a row was removed.
  async fn delete_one(&self, sql: &'static str, id: Uuid) -> Result<bool> {
    let id = encode_uuid(id);
    let removed = self
      .conn
      .call(move |conn| Ok(conn.execute(sql, params![id])?))
      .await?;
    Ok(removed > 0)
  }
}

// ─── HerdStore impl ──────────────────────────────────────────────────────────

impl HerdStore for SqliteStore {
  type Error = crate::Error;

  // ── Establishments ────────────────────────────────────────────────────────

  async fn add_establishment(&self, establishment: Establishment) -> Result<()> {
    let raw = RawEstablishment::encode(&establishment);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO establishments (establishment_id, name, created_at)
           VALUES (?1, ?2, ?3)",
          params![raw.establishment_id, raw.name, raw.created_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_establishment(&self, id: Uuid) -> Result<Option<Establishment>> {
    let sql = format!(
      "SELECT {} FROM establishments WHERE establishment_id = ?1",
      RawEstablishment::COLUMNS
    );
    self
      .find_one(sql, id, RawEstablishment::from_row)
      .await?
      .map(RawEstablishment::into_establishment)
      .transpose()
  }

  async fn list_establishments(&self) -> Result<Vec<Establishment>> {
    let raws: Vec<RawEstablishment> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM establishments ORDER BY created_at",
          RawEstablishment::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawEstablishment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawEstablishment::into_establishment).collect()
  }

  async fn update_establishment(&self, establishment: Establishment) -> Result<()> {
    let raw = RawEstablishment::encode(&establishment);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE establishments SET name = ?2 WHERE establishment_id = ?1",
          params![raw.establishment_id, raw.name],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_establishment(&self, id: Uuid) -> Result<bool> {
    self
      .delete_one("DELETE FROM establishments WHERE establishment_id = ?1", id)
      .await
  }

  // ── Animals and events ────────────────────────────────────────────────────

  async fn get_animal(&self, id: Uuid) -> Result<Option<Animal>> {
    let sql = format!("SELECT {} FROM animals WHERE animal_id = ?1", RawAnimal::COLUMNS);
    self
      .find_one(sql, id, RawAnimal::from_row)
      .await?
      .map(RawAnimal::into_animal)
      .transpose()
  }

  async fn list_animals(&self, query: AnimalQuery) -> Result<Vec<Animal>> {
    let mut sql = format!(
      "SELECT {} FROM animals WHERE establishment_id = ?",
      RawAnimal::COLUMNS
    );
    let mut args = vec![encode_uuid(query.establishment_id)];

    if !query.statuses.is_empty() {
      sql.push_str(&format!(" AND status IN ({})", placeholders(query.statuses.len())));
      args.extend(query.statuses.iter().map(ToString::to_string));
    }
    if let Some(parent) = query.parent_id {
      sql.push_str(" AND parent_id = ?");
      args.push(encode_uuid(parent));
    }
    if let Some(lot) = query.lot_id {
      sql.push_str(" AND lot_id = ?");
      args.push(encode_uuid(lot));
    }
    sql.push_str(" ORDER BY created_at");

    let raws: Vec<RawAnimal> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(args.iter()), RawAnimal::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawAnimal::into_animal).collect()
  }

  async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
    let sql = format!("SELECT {} FROM events WHERE event_id = ?1", RawEvent::COLUMNS);
    self
      .find_one(sql, id, RawEvent::from_row)
      .await?
      .map(RawEvent::into_event)
      .transpose()
  }

  async fn list_events(&self, query: EventQuery) -> Result<Vec<Event>> {
    let mut sql = format!(
      "SELECT {} FROM events WHERE establishment_id = ?",
      RawEvent::COLUMNS
    );
    let mut args = vec![encode_uuid(query.establishment_id)];

    if let Some(animal) = query.animal_id {
      sql.push_str(" AND animal_id = ?");
      args.push(encode_uuid(animal));
    }
    if !query.event_types.is_empty() {
      sql.push_str(&format!(" AND event_type IN ({})", placeholders(query.event_types.len())));
      args.extend(query.event_types);
    }
    let direction = if query.descending { "DESC" } else { "ASC" };
    sql.push_str(&format!(
      " ORDER BY occurred_on {direction}, recorded_at {direction}"
    ));
    if let Some(limit) = query.limit {
      sql.push_str(&format!(" LIMIT {limit}"));
    }

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(args.iter()), RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn update_event(&self, event: Event) -> Result<()> {
    let id = encode_uuid(event.event_id);
    let occurred_on = encode_date(event.occurred_on);
    let payload = event.kind.to_json()?.to_string();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE events SET occurred_on = ?2, payload_json = ?3, result = ?4, detail = ?5 \
           WHERE event_id = ?1",
          params![id, occurred_on, payload, event.result, event.detail],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_event(&self, id: Uuid) -> Result<bool> {
    self.delete_one("DELETE FROM events WHERE event_id = ?1", id).await
  }

  async fn commit(&self, changes: Changeset) -> Result<()> {
    let inserted = changes
      .inserted
      .iter()
      .map(RawAnimal::encode)
      .collect::<Result<Vec<_>>>()?;
    let updated = changes
      .updated
      .iter()
      .map(RawAnimal::encode)
      .collect::<Result<Vec<_>>>()?;
    let events = changes
      .events
      .iter()
      .map(RawEvent::encode)
      .collect::<Result<Vec<_>>>()?;

    let counts = (inserted.len(), updated.len(), events.len());
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for animal in &inserted {
          insert_animal(&tx, animal)?;
        }
        for animal in &updated {
          update_animal(&tx, animal)?;
        }
        for event in &events {
          insert_event(&tx, event)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    debug!(
      inserted = counts.0,
      updated = counts.1,
      events = counts.2,
      "changeset committed"
    );
    Ok(())
  }

  // ── Lots and labor ────────────────────────────────────────────────────────

  async fn insert_lot(&self, lot: Lot) -> Result<()> {
    let raw = RawLot::encode(&lot);
    self
      .conn
      .call(move |conn| {
        write_lot(conn, &raw)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_lot(&self, id: Uuid) -> Result<Option<Lot>> {
    let sql = format!("SELECT {} FROM lots WHERE lot_id = ?1", RawLot::COLUMNS);
    self
      .find_one(sql, id, RawLot::from_row)
      .await?
      .map(RawLot::into_lot)
      .transpose()
  }

  async fn list_lots(&self, establishment_id: Uuid) -> Result<Vec<Lot>> {
    let id = encode_uuid(establishment_id);
    let raws: Vec<RawLot> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM lots WHERE establishment_id = ?1 ORDER BY name",
          RawLot::COLUMNS
        ))?;
        let rows = stmt
          .query_map(params![id], RawLot::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawLot::into_lot).collect()
  }

  async fn delete_lot(&self, id: Uuid) -> Result<bool> {
    let id = encode_uuid(id);
    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("UPDATE animals SET lot_id = NULL WHERE lot_id = ?1", params![id])?;
        tx.execute("DELETE FROM labors WHERE lot_id = ?1", params![id])?;
        let removed = tx.execute("DELETE FROM lots WHERE lot_id = ?1", params![id])?;
        tx.commit()?;
        Ok(removed)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn record_labor(&self, labor: Labor, lot: Lot) -> Result<()> {
    let labor = RawLabor::encode(&labor);
    let lot = RawLot::encode(&lot);
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          &format!(
            "INSERT INTO labors ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            RawLabor::COLUMNS
          ),
          params![
            labor.labor_id,
            labor.lot_id,
            labor.establishment_id,
            labor.activity,
            labor.crop,
            labor.detail,
            labor.cost,
            labor.performed_on,
            labor.recorded_at,
          ],
        )?;
        write_lot(&tx, &lot)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_labor(&self, id: Uuid) -> Result<Option<Labor>> {
    let sql = format!("SELECT {} FROM labors WHERE labor_id = ?1", RawLabor::COLUMNS);
    self
      .find_one(sql, id, RawLabor::from_row)
      .await?
      .map(RawLabor::into_labor)
      .transpose()
  }

  async fn list_labors(&self, lot_id: Uuid) -> Result<Vec<Labor>> {
    let id = encode_uuid(lot_id);
    let raws: Vec<RawLabor> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM labors WHERE lot_id = ?1 ORDER BY performed_on DESC, recorded_at DESC",
          RawLabor::COLUMNS
        ))?;
        let rows = stmt
          .query_map(params![id], RawLabor::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawLabor::into_labor).collect()
  }

  async fn delete_labor(&self, id: Uuid) -> Result<bool> {
    self.delete_one("DELETE FROM labors WHERE labor_id = ?1", id).await
  }
}
