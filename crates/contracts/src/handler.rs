//! EventHandler trait - producer-facing surface of the sink
//!
//! Mirrors a watch/list informer: individual add/update/delete
//! notifications plus a marker once a full listing has been delivered.

use crate::{ContractError, Event, EventList};

/// Event notification interface
///
/// Implementors take ownership of the events they are handed.
#[trait_variant::make(EventHandler: Send)]
pub trait LocalEventHandler {
    /// A new event was observed
    ///
    /// # Errors
    /// Returns an error when the receiving side has stopped
    async fn on_add(&self, event: Event) -> Result<(), ContractError>;

    /// An existing event changed (`old` is `None` when it was never seen)
    async fn on_update(&self, old: Option<Event>, new: Event) -> Result<(), ContractError>;

    /// An event was deleted
    async fn on_delete(&self, event: &Event) -> Result<(), ContractError>;

    /// A full listing completed
    async fn on_list(&self, list: &EventList) -> Result<(), ContractError>;
}
