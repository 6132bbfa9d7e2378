//! Handlers for `/establishments` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/establishments` | Ordered by creation |
//! | `POST`   | `/establishments` | Body: `{"name":"..."}` |
//! | `PATCH`  | `/establishments/:eid` | Body: `{"name":"..."}` |
//! | `DELETE` | `/establishments/:eid` | `?confirm=true`; 409 while animals or lots remain |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use herd_core::{establishment::Establishment, store::HerdStore};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, Confirm, error::Result};

#[derive(Debug, Deserialize)]
pub struct NameBody {
  pub name: String,
}

/// `GET /establishments`
pub async fn list<S: HerdStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Establishment>>> {
  Ok(Json(state.herd.list_establishments().await?))
}

/// `POST /establishments`
pub async fn create<S: HerdStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<NameBody>,
) -> Result<impl IntoResponse> {
  let _guard = state.write().await;
  let establishment = state.herd.create_establishment(&body.name).await?;
  Ok((StatusCode::CREATED, Json(establishment)))
}

/// `PATCH /establishments/:eid`
pub async fn rename<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path(eid): Path<Uuid>,
  Json(body): Json<NameBody>,
) -> Result<Json<Establishment>> {
  let _guard = state.write().await;
  Ok(Json(state.herd.rename_establishment(eid, &body.name).await?))
}

/// `DELETE /establishments/:eid?confirm=true`
pub async fn remove<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path(eid): Path<Uuid>,
  Query(params): Query<Confirm>,
) -> Result<StatusCode> {
  let _guard = state.write().await;
  state.herd.delete_establishment(eid, params.confirm).await?;
  Ok(StatusCode::NO_CONTENT)
}
