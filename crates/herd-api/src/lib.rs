//! JSON REST API for herd records.
//!
//! Exposes an axum [`Router`] backed by any [`herd_core::store::HerdStore`].
//! Every route below `/establishments/{eid}` runs in the [`Context`] of that
//! establishment, with the optional `x-actor` header as the recording actor.
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", herd_api::api_router(store))
//! ```

pub mod animals;
pub mod bulk;
pub mod error;
pub mod establishments;
pub mod events;
pub mod lots;
pub mod reports;

use std::sync::Arc;

use axum::{
  Router,
  http::HeaderMap,
  routing::{delete, get, patch, post},
};
use herd_core::{Context, Herd, store::HerdStore};
use serde::Deserialize;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

pub use error::ApiError;

/// Header carrying the free-text identity of whoever records the change.
pub const ACTOR_HEADER: &str = "x-actor";

/// Shared handler state: the service plus the lock that serializes writes.
pub struct AppState<S> {
  pub herd: Arc<Herd<S>>,
  writer:   Arc<Mutex<()>>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      herd:   Arc::clone(&self.herd),
      writer: Arc::clone(&self.writer),
    }
  }
}

impl<S: HerdStore> AppState<S> {
  pub fn new(store: S) -> Self {
    Self {
      herd:   Arc::new(Herd::new(store)),
      writer: Arc::new(Mutex::new(())),
    }
  }

  /// Held for the duration of every state-changing handler.
  pub(crate) async fn write(&self) -> MutexGuard<'_, ()> { self.writer.lock().await }
}

/// Build the operation context for establishment `eid` from request headers.
pub(crate) fn context(eid: Uuid, headers: &HeaderMap) -> Context {
  let ctx = Context::new(eid);
  match headers
    .get(ACTOR_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|v| !v.is_empty())
  {
    Some(actor) => ctx.with_actor(actor),
    None => ctx,
  }
}

/// `?confirm=true` on destructive routes.
#[derive(Debug, Default, Deserialize)]
pub struct Confirm {
  #[serde(default)]
  pub confirm: bool,
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: S) -> Router<()>
where
  S: HerdStore + 'static,
{
  Router::new()
    // Establishments
    .route(
      "/establishments",
      get(establishments::list::<S>).post(establishments::create::<S>),
    )
    .route(
      "/establishments/{eid}",
      patch(establishments::rename::<S>).delete(establishments::remove::<S>),
    )
    // Animals
    .route(
      "/establishments/{eid}/animals",
      get(animals::list::<S>).post(animals::register::<S>),
    )
    .route(
      "/establishments/{eid}/animals/{id}",
      get(animals::get_one::<S>).patch(animals::correct::<S>),
    )
    .route(
      "/establishments/{eid}/animals/{id}/events",
      get(events::history::<S>).post(events::record::<S>),
    )
    .route("/establishments/{eid}/animals/{id}/lineage", get(animals::lineage::<S>))
    .route("/establishments/{eid}/animals/{id}/actions", get(animals::actions::<S>))
    .route(
      "/establishments/{eid}/animals/{id}/performance",
      get(animals::performance::<S>),
    )
    // Bulk
    .route("/establishments/{eid}/bulk/preview", post(bulk::preview::<S>))
    .route("/establishments/{eid}/bulk", post(bulk::apply::<S>))
    // Ledger
    .route("/establishments/{eid}/events", get(events::recent::<S>))
    .route(
      "/establishments/{eid}/events/{id}",
      patch(events::amend::<S>).delete(events::remove::<S>),
    )
    // Lots and labor
    .route(
      "/establishments/{eid}/lots",
      get(lots::list::<S>).post(lots::create::<S>),
    )
    .route("/establishments/{eid}/lots/{id}", delete(lots::remove::<S>))
    .route(
      "/establishments/{eid}/lots/{id}/labors",
      get(lots::labors::<S>).post(lots::record_labor::<S>),
    )
    .route("/establishments/{eid}/labors/{id}", delete(lots::remove_labor::<S>))
    // Reports
    .route(
      "/establishments/{eid}/lots/{id}/occupancy",
      get(reports::lot_occupancy::<S>),
    )
    .route("/establishments/{eid}/occupancy", get(reports::occupancy::<S>))
    .route("/establishments/{eid}/summary", get(reports::summary::<S>))
    .with_state(AppState::new(store))
}
