//! The explicit scope threaded into every core operation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who is acting, and within which establishment.
///
/// Every read and write is scoped to exactly one establishment; records
/// owned by another establishment are rejected rather than silently read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
  pub establishment_id: Uuid,
  /// Free-text identity of the person recording; copied onto every event.
  pub actor:            Option<String>,
}

impl Context {
  pub fn new(establishment_id: Uuid) -> Self {
    Self { establishment_id, actor: None }
  }

  pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
    self.actor = Some(actor.into());
    self
  }
}
