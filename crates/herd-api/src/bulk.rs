//! Handlers for bulk operations.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/bulk/preview` | Body: [`BulkRequest`]; eligible ids and exclusions, no writes |
//! | `POST` | `/bulk` | Body: [`BulkRequest`]; 409 with counts until `accept_exclusions` |

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use herd_core::{
  bulk::{BulkRequest, Eligibility},
  store::HerdStore,
};
use uuid::Uuid;

use crate::{AppState, context, error::Result};

/// `POST /bulk/preview`
pub async fn preview<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path(eid): Path<Uuid>,
  headers: HeaderMap,
  Json(body): Json<BulkRequest>,
) -> Result<Json<Eligibility>> {
  let ctx = context(eid, &headers);
  Ok(Json(state.herd.bulk_preview(&ctx, &body).await?))
}

/// `POST /bulk`
pub async fn apply<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path(eid): Path<Uuid>,
  headers: HeaderMap,
  Json(body): Json<BulkRequest>,
) -> Result<impl IntoResponse> {
  let ctx = context(eid, &headers);
  let _guard = state.write().await;
  let outcome = state.herd.bulk(&ctx, body).await?;
  Ok((StatusCode::CREATED, Json(outcome)))
}
