//! Container engine access for Dockyard: the bollard client adapter, host port
//! conflict detection and the request-level [`ContainerService`].

// Re-export dependencies potentially needed by consumers (like the server)
pub use bollard;
pub use dockyard_common as common;

pub mod docker;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use docker::DockerEngine;
pub use ports::{PortConflictChecker, PortReservation, PortReservations};
pub use service::{ContainerService, DEFAULT_IMAGE};
