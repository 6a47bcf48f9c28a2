// src/engine/pump.rs

use tracing::{debug, warn};

use crate::engine::{Engine, TickReport};

impl Engine {
    /// Run one pump tick: drain every active watch handle and route its
    /// events in arrival order.
    ///
    /// Handles are visited in registration order; directories registered
    /// during this tick are first drained on the next one. A handle that
    /// cannot be drained is logged once and then skipped; it is never
    /// re-subscribed automatically.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        for handle in self.registry.handles() {
            if self.registry.is_invalidated(handle) {
                continue;
            }
            let events = match self.registry.drain_pending(handle) {
                Ok(events) => events,
                Err(e) => {
                    warn!(%handle, "skipping watch handle: {e}");
                    report.broken_handles += 1;
                    continue;
                }
            };
            if events.is_empty() {
                continue;
            }

            debug!(
                %handle,
                dir = ?self.registry.resolve_directory(handle),
                count = events.len(),
                "draining events"
            );
            report.events += events.len();
            for event in &events {
                self.route_event(event, &mut report);
            }
        }

        report
    }
}
