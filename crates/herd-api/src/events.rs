//! Handlers for ledger endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/animals/:id/events` | One animal's history, newest first |
//! | `POST`   | `/animals/:id/events` | Body: [`RecordBody`]; returns 201 + [`Recorded`] |
//! | `GET`    | `/events` | Activity feed; optional `?types=birth,sale&limit=20` |
//! | `PATCH`  | `/events/:id` | Body: [`EventAmendment`] |
//! | `DELETE` | `/events/:id` | `?confirm=true` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use chrono::NaiveDate;
use herd_core::{
  engine::{Action, RecordRequest},
  event::{Event, EventAmendment},
  herd::Recorded,
  store::HerdStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, Confirm, context, error::Result};

// ─── Animal history ──────────────────────────────────────────────────────────

/// `GET /animals/:id/events`
pub async fn history<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path((eid, id)): Path<(Uuid, Uuid)>,
  headers: HeaderMap,
) -> Result<Json<Vec<Event>>> {
  let ctx = context(eid, &headers);
  Ok(Json(state.herd.animal_history(&ctx, id).await?))
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A [`RecordRequest`] without the animal id, which comes from the path.
#[derive(Debug, Deserialize)]
pub struct RecordBody {
  pub occurred_on: NaiveDate,
  pub action:      Action,
  #[serde(default)]
  pub detail:      String,
  pub cost:        Option<f64>,
  #[serde(default)]
  pub confirmed:   bool,
}

/// `POST /animals/:id/events`
pub async fn record<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path((eid, id)): Path<(Uuid, Uuid)>,
  headers: HeaderMap,
  Json(body): Json<RecordBody>,
) -> Result<impl IntoResponse> {
  let ctx = context(eid, &headers);
  let request = RecordRequest {
    animal_id:   id,
    occurred_on: body.occurred_on,
    action:      body.action,
    detail:      body.detail,
    cost:        body.cost,
    confirmed:   body.confirmed,
  };
  let _guard = state.write().await;
  let recorded: Recorded = state.herd.record(&ctx, request).await?;
  Ok((StatusCode::CREATED, Json(recorded)))
}

// ─── Activity feed ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RecentParams {
  /// Comma-separated event type discriminants.
  pub types: Option<String>,
  pub limit: Option<usize>,
}

/// `GET /events[?types=...][&limit=...]`
pub async fn recent<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path(eid): Path<Uuid>,
  Query(params): Query<RecentParams>,
  headers: HeaderMap,
) -> Result<Json<Vec<Event>>> {
  let ctx = context(eid, &headers);
  let types = params
    .types
    .as_deref()
    .unwrap_or_default()
    .split(',')
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .map(str::to_owned)
    .collect();
  Ok(Json(state.herd.recent_events(&ctx, types, params.limit).await?))
}

// ─── Correction ──────────────────────────────────────────────────────────────

/// `PATCH /events/:id`
pub async fn amend<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path((eid, id)): Path<(Uuid, Uuid)>,
  headers: HeaderMap,
  Json(body): Json<EventAmendment>,
) -> Result<Json<Event>> {
  let ctx = context(eid, &headers);
  let _guard = state.write().await;
  Ok(Json(state.herd.amend_event(&ctx, id, body).await?))
}

/// `DELETE /events/:id?confirm=true`
pub async fn remove<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path((eid, id)): Path<(Uuid, Uuid)>,
  Query(params): Query<Confirm>,
  headers: HeaderMap,
) -> Result<StatusCode> {
  let ctx = context(eid, &headers);
  let _guard = state.write().await;
  state.herd.delete_event(&ctx, id, params.confirm).await?;
  Ok(StatusCode::NO_CONTENT)
}
