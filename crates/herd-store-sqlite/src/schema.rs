//! SQL schema for the herd SQLite store.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS establishments (
    establishment_id TEXT PRIMARY KEY,
    name             TEXT NOT NULL,
    created_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS lots (
    lot_id           TEXT PRIMARY KEY,
    establishment_id TEXT NOT NULL REFERENCES establishments(establishment_id),
    name             TEXT NOT NULL,
    area_ha          REAL NOT NULL DEFAULT 0,
    state            TEXT NOT NULL DEFAULT 'fallow',
    crop             TEXT,
    created_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS animals (
    animal_id        TEXT PRIMARY KEY,
    establishment_id TEXT NOT NULL REFERENCES establishments(establishment_id),
    tag              TEXT NOT NULL,
    category         TEXT NOT NULL,
    sex              TEXT NOT NULL,
    status           TEXT NOT NULL,
    conditions       TEXT NOT NULL DEFAULT '[]',  -- JSON array
    castrated        INTEGER NOT NULL DEFAULT 0,
    origin           TEXT NOT NULL,
    birth_date       TEXT,                        -- YYYY-MM-DD
    intake_date      TEXT,
    parent_id        TEXT REFERENCES animals(animal_id),
    lot_id           TEXT REFERENCES lots(lot_id),
    service_link     TEXT,                        -- JSON or NULL
    disposition      TEXT,
    created_at       TEXT NOT NULL
);

-- Tag uniqueness among animals that are not soft-deleted.
CREATE UNIQUE INDEX IF NOT EXISTS animals_tag_idx
    ON animals(establishment_id, lower(tag)) WHERE status != 'deleted';
CREATE INDEX IF NOT EXISTS animals_parent_idx ON animals(parent_id);
CREATE INDEX IF NOT EXISTS animals_lot_idx    ON animals(lot_id);

CREATE TABLE IF NOT EXISTS events (
    event_id         TEXT PRIMARY KEY,
    establishment_id TEXT NOT NULL REFERENCES establishments(establishment_id),
    animal_id        TEXT NOT NULL REFERENCES animals(animal_id),
    occurred_on      TEXT NOT NULL,   -- YYYY-MM-DD
    recorded_at      TEXT NOT NULL,   -- RFC 3339 UTC, microsecond precision
    event_type       TEXT NOT NULL,   -- discriminant of EventKind
    payload_json     TEXT NOT NULL,   -- inner payload only; 'null' for unit kinds
    result           TEXT NOT NULL DEFAULT '',
    detail           TEXT NOT NULL DEFAULT '',
    cost             REAL,
    recorded_by      TEXT
);

CREATE INDEX IF NOT EXISTS events_animal_idx ON events(animal_id);
CREATE INDEX IF NOT EXISTS events_order_idx  ON events(establishment_id, occurred_on, recorded_at);

CREATE TABLE IF NOT EXISTS labors (
    labor_id         TEXT PRIMARY KEY,
    lot_id           TEXT NOT NULL REFERENCES lots(lot_id),
    establishment_id TEXT NOT NULL REFERENCES establishments(establishment_id),
    activity         TEXT NOT NULL,
    crop             TEXT,
    detail           TEXT NOT NULL DEFAULT '',
    cost             REAL,
    performed_on     TEXT NOT NULL,
    recorded_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS labors_lot_idx ON labors(lot_id);

PRAGMA user_version = 1;
";
