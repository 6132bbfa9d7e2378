//! Handlers for `/establishments/:eid/animals` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/animals` | Optional `?view=herd\|exits\|all` (default `herd`) |
//! | `POST`  | `/animals` | Body: [`NewAnimal`]; returns 201 |
//! | `GET`   | `/animals/:id` | Deleted animals included |
//! | `PATCH` | `/animals/:id` | Body: [`AnimalCorrection`] |
//! | `GET`   | `/animals/:id/lineage` | Parent, ancestors, children |
//! | `GET`   | `/animals/:id/actions` | Event types currently accepted |
//! | `GET`   | `/animals/:id/performance` | Latest weight and daily gain |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use herd_core::{
  animal::{Animal, AnimalCorrection, NewAnimal},
  engine::ActionKind,
  herd::AnimalView,
  lineage::Lineage,
  performance::Performance,
  store::HerdStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, context, error::Result};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub view: AnimalView,
}

/// `GET /animals[?view=<view>]`
pub async fn list<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path(eid): Path<Uuid>,
  Query(params): Query<ListParams>,
  headers: HeaderMap,
) -> Result<Json<Vec<Animal>>> {
  let ctx = context(eid, &headers);
  Ok(Json(state.herd.list_animals(&ctx, params.view).await?))
}

/// `POST /animals`
pub async fn register<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path(eid): Path<Uuid>,
  headers: HeaderMap,
  Json(body): Json<NewAnimal>,
) -> Result<impl IntoResponse> {
  let ctx = context(eid, &headers);
  let _guard = state.write().await;
  let animal = state.herd.register_animal(&ctx, body).await?;
  Ok((StatusCode::CREATED, Json(animal)))
}

/// `GET /animals/:id`
pub async fn get_one<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path((eid, id)): Path<(Uuid, Uuid)>,
  headers: HeaderMap,
) -> Result<Json<Animal>> {
  let ctx = context(eid, &headers);
  Ok(Json(state.herd.animal(&ctx, id).await?))
}

/// `PATCH /animals/:id`
pub async fn correct<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path((eid, id)): Path<(Uuid, Uuid)>,
  headers: HeaderMap,
  Json(body): Json<AnimalCorrection>,
) -> Result<Json<Animal>> {
  let ctx = context(eid, &headers);
  let _guard = state.write().await;
  Ok(Json(state.herd.correct_animal(&ctx, id, body).await?))
}

/// `GET /animals/:id/lineage`
pub async fn lineage<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path((eid, id)): Path<(Uuid, Uuid)>,
  headers: HeaderMap,
) -> Result<Json<Lineage>> {
  let ctx = context(eid, &headers);
  Ok(Json(state.herd.lineage(&ctx, id).await?))
}

/// `GET /animals/:id/actions`
pub async fn actions<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path((eid, id)): Path<(Uuid, Uuid)>,
  headers: HeaderMap,
) -> Result<Json<Vec<ActionKind>>> {
  let ctx = context(eid, &headers);
  Ok(Json(state.herd.available_actions(&ctx, id).await?))
}

/// `GET /animals/:id/performance`
pub async fn performance<S: HerdStore>(
  State(state): State<AppState<S>>,
  Path((eid, id)): Path<(Uuid, Uuid)>,
  headers: HeaderMap,
) -> Result<Json<Performance>> {
  let ctx = context(eid, &headers);
  Ok(Json(state.herd.performance(&ctx, id).await?))
}
