//! Host port conflict detection.
//!
//! The engine scan is point-in-time: a container created between the scan and
//! our own bind still wins, and the engine then fails our start call. The
//! in-process reservation table only shortens that window for requests served
//! by this process.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use dockyard_common::{ContainerEngine, Result};
use std::sync::Arc;
use tracing::debug;

pub struct PortConflictChecker {
    engine: Arc<dyn ContainerEngine>,
}

impl PortConflictChecker {
    pub fn new(engine: Arc<dyn ContainerEngine>) -> Self {
        Self { engine }
    }

    /// Returns true if any container, running or stopped, publishes `port`.
    ///
    /// The list call only carries ports for running containers, so every
    /// other container is inspected for its configured bindings.
    pub async fn is_allocated(&self, port: u16) -> Result<bool> {
        let containers = self.engine.list_containers().await?;

        if let Some(container) = containers
            .iter()
            .find(|container| container.published_ports.contains(&port))
        {
            debug!(host_port = port, container_id = %container.id, "Host port already published");
            return Ok(true);
        }

        for container in containers.iter().filter(|container| !container.running) {
            let details = self.engine.inspect_container(&container.id).await?;
            if details.bound_ports.contains(&port) {
                debug!(host_port = port, container_id = %container.id, "Host port bound by stopped container");
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Host ports claimed by in-flight create requests.
#[derive(Clone, Default)]
pub struct PortReservations {
    ports: Arc<DashMap<u16, ()>>,
}

impl PortReservations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `port`, or returns `None` if another request holds it.
    pub fn reserve(&self, port: u16) -> Option<PortReservation> {
        match self.ports.entry(port) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(PortReservation {
                    port,
                    ports: self.ports.clone(),
                })
            }
        }
    }

    pub fn is_reserved(&self, port: u16) -> bool {
        self.ports.contains_key(&port)
    }
}

/// Releases its port when dropped.
#[derive(Debug)]
pub struct PortReservation {
    port: u16,
    ports: Arc<DashMap<u16, ()>>,
}

impl PortReservation {
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for PortReservation {
    fn drop(&mut self) {
        self.ports.remove(&self.port);
    }
}
