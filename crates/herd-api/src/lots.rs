//! Handlers for lots and their labor sub-ledger.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/lots` | Ordered by name |
//! | `POST`   | `/lots` | Body: [`NewLot`]; returns 201 |
//! | `DELETE` | `/lots/:id` | `?confirm=true`; animals on the lot become unassigned |
//! | `GET`    | `/lots/:id/labors` | Newest first |
//! | `POST`   | `/lots/:id/labors` | Body: [`NewLabor`]; returns 201 + labor and updated lot |
//! | `DELETE` | `/labors/:id` | `?confirm=true` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use herd_core::{
  lot::{Labor, Lot, NewLabor, NewLot},
  store::HerdStore,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{AppState, Confirm, context, error::Result};

/// `GET /lots`
pub async fn list<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path(eid): Path<Uuid>,
  headers: HeaderMap,
) -> Result<Json<Vec<Lot>>> {
  let ctx = context(eid, &headers);
  Ok(Json(state.herd.lots(&ctx).await?))
}

/// `POST /lots`
pub async fn create<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path(eid): Path<Uuid>,
  headers: HeaderMap,
  Json(body): Json<NewLot>,
) -> Result<impl IntoResponse> {
  let ctx = context(eid, &headers);
  let _guard = state.write().await;
  let lot = state.herd.create_lot(&ctx, body).await?;
  Ok((StatusCode::CREATED, Json(lot)))
}

/// `DELETE /lots/:id?confirm=true`
pub async fn remove<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path((eid, id)): Path<(Uuid, Uuid)>,
  Query(params): Query<Confirm>,
  headers: HeaderMap,
) -> Result<StatusCode> {
  let ctx = context(eid, &headers);
  let _guard = state.write().await;
  state.herd.delete_lot(&ctx, id, params.confirm).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /lots/:id/labors`
pub async fn labors<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path((eid, id)): Path<(Uuid, Uuid)>,
  headers: HeaderMap,
) -> Result<Json<Vec<Labor>>> {
  let ctx = context(eid, &headers);
  Ok(Json(state.herd.labors(&ctx, id).await?))
}

#[derive(Debug, Serialize)]
pub struct LaborRecorded {
  pub labor: Labor,
  pub lot:   Lot,
}

/// `POST /lots/:id/labors`
pub async fn record_labor<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path((eid, id)): Path<(Uuid, Uuid)>,
  headers: HeaderMap,
  Json(body): Json<NewLabor>,
) -> Result<impl IntoResponse> {
  let ctx = context(eid, &headers);
  let _guard = state.write().await;
  let (labor, lot) = state.herd.record_labor(&ctx, id, body).await?;
  Ok((StatusCode::CREATED, Json(LaborRecorded { labor, lot })))
}

/// `DELETE /labors/:id?confirm=true`
pub async fn remove_labor<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path((eid, id)): Path<(Uuid, Uuid)>,
  Query(params): Query<Confirm>,
  headers: HeaderMap,
) -> Result<StatusCode> {
  let ctx = context(eid, &headers);
  let _guard = state.write().await;
  state.herd.delete_labor(&ctx, id, params.confirm).await?;
  Ok(StatusCode::NO_CONTENT)
}
