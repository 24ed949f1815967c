// Re-export dependencies used in public interfaces of common types

use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of engine nanocpus in one CPU core.
pub const NANO_CPUS_PER_CORE: i64 = 1_000_000_000;

/// Message returned to callers when a requested host port is taken.
pub const PORT_ALLOCATED_MESSAGE: &str = "Port is already allocated";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DockyardError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Port is already allocated")]
    PortAllocated(u16),

    #[error("{0}")]
    Connection(String),

    #[error("{0}")]
    Engine(String),
}

impl DockyardError {
    /// True for errors caused by the caller rather than the engine.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DockyardError::InvalidInput(_) | DockyardError::PortAllocated(_)
        )
    }
}

// Define the primary Result type for Dockyard operations
pub type Result<T> = std::result::Result<T, DockyardError>;

/// Validated input for provisioning a new container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateContainerRequest {
    pub ram_bytes: i64,
    pub cpu_cores: i64,
    pub host_port: u16,
}

/// Validated input for resizing an existing container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceUpdateRequest {
    pub ram_bytes: i64,
    pub cpu_cores: i64,
}

/// Limits in the engine's own units. Swap is pinned to the memory limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    pub memory: i64,
    pub memory_swap: i64,
    pub nano_cpus: i64,
}

impl ResourceLimits {
    pub fn from_cores(ram_bytes: i64, cpu_cores: i64) -> Result<Self> {
        let nano_cpus = cpu_cores
            .checked_mul(NANO_CPUS_PER_CORE)
            .ok_or_else(|| DockyardError::InvalidInput("Invalid input for CPU".to_string()))?;

        Ok(Self {
            memory: ram_bytes,
            memory_swap: ram_bytes,
            nano_cpus,
        })
    }
}

impl TryFrom<&CreateContainerRequest> for ResourceLimits {
    type Error = DockyardError;

    fn try_from(req: &CreateContainerRequest) -> Result<Self> {
        Self::from_cores(req.ram_bytes, req.cpu_cores)
    }
}

impl TryFrom<&ResourceUpdateRequest> for ResourceLimits {
    type Error = DockyardError;

    fn try_from(req: &ResourceUpdateRequest) -> Result<Self> {
        Self::from_cores(req.ram_bytes, req.cpu_cores)
    }
}

/// A single container-port to host-port mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortBinding {
    pub container_port: String,
    pub host_ip: String,
    pub host_port: u16,
}

impl PortBinding {
    /// Maps the fixed internal `80/tcp` to `host_port` on all interfaces.
    pub fn http(host_port: u16) -> Self {
        Self {
            container_port: "80/tcp".to_string(),
            host_ip: "0.0.0.0".to_string(),
            host_port,
        }
    }
}

/// Everything the engine needs to create a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationSpec {
    pub image: String,
    pub limits: ResourceLimits,
    pub binding: PortBinding,
}

/// A container as returned by the engine's list call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineContainer {
    pub id: String,
    pub names: Vec<String>,
    /// Host-side ports only; unpublished container ports are omitted.
    /// Engines report these for running containers alone.
    pub published_ports: Vec<u16>,
    pub running: bool,
}

/// The subset of an engine inspect response this service reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerDetails {
    pub id: String,
    pub nano_cpus: i64,
    pub memory: i64,
    /// One address per attached network, in whatever order the engine yields them.
    pub network_addresses: Vec<String>,
    /// Host ports from the container's configured bindings, kept while it is stopped.
    pub bound_ports: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerCreationResult {
    pub container_id: String,
    pub ip_address: String,
}

/// CPU and memory as reported to callers. `cpu` is truncated to whole cores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerResourceView {
    pub cpu: i64,
    pub ram: i64,
}

impl From<&ContainerDetails> for ContainerResourceView {
    fn from(details: &ContainerDetails) -> Self {
        Self {
            cpu: details.nano_cpus / NANO_CPUS_PER_CORE,
            ram: details.memory,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSummary {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Names")]
    pub names: Vec<String>,
}

impl From<EngineContainer> for ContainerSummary {
    fn from(container: EngineContainer) -> Self {
        Self {
            id: container.id,
            names: container.names,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopResult {
    pub message: String,
}

impl StopResult {
    pub fn stopped() -> Self {
        Self {
            message: "Container stopped successfully".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

impl From<&DockyardError> for ErrorPayload {
    fn from(err: &DockyardError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// Management API of a local container engine.
///
/// Every method is a single engine round trip; implementations hold no
/// container state of their own.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Lists all containers, including stopped ones.
    async fn list_containers(&self) -> Result<Vec<EngineContainer>>;

    /// Creates a container and returns its engine-assigned ID.
    async fn create_container(&self, spec: &CreationSpec) -> Result<String>;

    async fn start_container(&self, id: &str) -> Result<()>;

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails>;

    async fn update_resources(&self, id: &str, limits: &ResourceLimits) -> Result<()>;

    /// Stops a container with the engine's default grace period.
    async fn stop_container(&self, id: &str) -> Result<()>;
}
