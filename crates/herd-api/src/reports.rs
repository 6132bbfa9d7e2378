//! Read-only herd reports: lot occupancy and the herd summary.

use axum::{
  Json,
  extract::{Path, State},
  http::HeaderMap,
};
use herd_core::{
  occupancy::{EstablishmentOccupancy, LotOccupancy},
  store::HerdStore,
  summary::HerdSummary,
};
use uuid::Uuid;

use crate::{AppState, context, error::Result};

/// `GET /lots/:id/occupancy`
pub async fn lot_occupancy<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path((eid, id)): Path<(Uuid, Uuid)>,
  headers: HeaderMap,
) -> Result<Json<LotOccupancy>> {
  let ctx = context(eid, &headers);
  Ok(Json(state.herd.lot_occupancy(&ctx, id).await?))
}

/// `GET /occupancy`
pub async fn occupancy<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path(eid): Path<Uuid>,
  headers: HeaderMap,
) -> Result<Json<EstablishmentOccupancy>> {
  let ctx = context(eid, &headers);
  Ok(Json(state.herd.occupancy(&ctx).await?))
}

/// `GET /summary`
pub async fn summary<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path(eid): Path<Uuid>,
  headers: HeaderMap,
) -> Result<Json<HerdSummary>> {
  let ctx = context(eid, &headers);
  Ok(Json(state.herd.summary(&ctx).await?))
}
