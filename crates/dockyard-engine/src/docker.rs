//! Bollard-backed implementation of [`ContainerEngine`].
//!
//! One client handle is shared by every request. It is connected lazily,
//! version-negotiated once, and dropped again whenever a call fails below the
//! engine's HTTP layer so that the next request reconnects.

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions,
    StartContainerOptions, StopContainerOptions, UpdateContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::models::{HostConfig, PortBinding as BollardPortBinding, PortMap};
use bollard::{Docker, API_DEFAULT_VERSION};
use dockyard_common::{
    ContainerDetails, ContainerEngine, CreationSpec, DockyardError, EngineContainer,
    ResourceLimits, Result,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Timeout in seconds for explicitly addressed HTTP endpoints.
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
enum Endpoint {
    /// `DOCKER_HOST` or the platform's default socket.
    LocalDefaults,
    Http(String),
}

pub struct DockerEngine {
    endpoint: Endpoint,
    client: RwLock<Option<Docker>>,
}

impl DockerEngine {
    /// Creates an unconnected engine using the environment's defaults.
    pub fn new() -> Self {
        Self {
            endpoint: Endpoint::LocalDefaults,
            client: RwLock::new(None),
        }
    }

    /// Creates an unconnected engine for a TCP endpoint such as `http://10.0.0.5:2375`.
    pub fn with_http(addr: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::Http(addr.into()),
            client: RwLock::new(None),
        }
    }

    /// Connects now instead of on the first request.
    pub async fn connect(&self) -> Result<()> {
        self.client().await.map(|_| ())
    }

    pub async fn is_connected(&self) -> bool {
        self.client.read().await.is_some()
    }

    async fn client(&self) -> Result<Docker> {
        if let Some(docker) = self.client.read().await.as_ref() {
            return Ok(docker.clone());
        }

        let mut guard = self.client.write().await;
        if let Some(docker) = guard.as_ref() {
            return Ok(docker.clone());
        }

        let docker = match &self.endpoint {
            Endpoint::LocalDefaults => Docker::connect_with_local_defaults(),
            Endpoint::Http(addr) => {
                Docker::connect_with_http(addr, HTTP_CONNECT_TIMEOUT_SECS, API_DEFAULT_VERSION)
            }
        }
        .map_err(|e| DockyardError::Connection(e.to_string()))?;

        let docker = docker
            .negotiate_version()
            .await
            .map_err(|e| DockyardError::Connection(e.to_string()))?;

        info!(endpoint = ?self.endpoint, "Connected to container engine");
        *guard = Some(docker.clone());
        Ok(docker)
    }

    /// Classifies a bollard error, forgetting the client on transport failures.
    async fn classify(&self, err: BollardError) -> DockyardError {
        match err {
            BollardError::DockerResponseServerError { .. } => DockyardError::Engine(err.to_string()),
            other => {
                warn!(error = %other, "Container engine transport failure; dropping client");
                *self.client.write().await = None;
                DockyardError::Connection(other.to_string())
            }
        }
    }
}

impl Default for DockerEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn container_config(spec: &CreationSpec) -> Config<String> {
    let mut port_bindings: PortMap = HashMap::new();
    port_bindings.insert(
        spec.binding.container_port.clone(),
        Some(vec![BollardPortBinding {
            host_ip: Some(spec.binding.host_ip.clone()),
            host_port: Some(spec.binding.host_port.to_string()),
        }]),
    );

    let host_config = HostConfig {
        memory: Some(spec.limits.memory),
        memory_swap: Some(spec.limits.memory_swap),
        nano_cpus: Some(spec.limits.nano_cpus),
        port_bindings: Some(port_bindings),
        ..Default::default()
    };

    Config {
        image: Some(spec.image.clone()),
        host_config: Some(host_config),
        ..Default::default()
    }
}

fn engine_container(value: bollard::models::ContainerSummary) -> EngineContainer {
    let published_ports = value
        .ports
        .unwrap_or_default()
        .into_iter()
        .filter_map(|port| port.public_port)
        .collect();

    EngineContainer {
        id: value.id.unwrap_or_default(),
        names: value.names.unwrap_or_default(),
        published_ports,
        running: value.state.as_deref() == Some("running"),
    }
}

/// Host ports named by a binding map. Unparseable or empty entries are skipped.
fn bound_host_ports(bindings: &PortMap) -> Vec<u16> {
    let mut ports: Vec<u16> = bindings
        .values()
        .flatten()
        .flatten()
        .filter_map(|binding| binding.host_port.as_deref())
        .filter_map(|port| port.parse().ok())
        .filter(|port| *port != 0)
        .collect();
    ports.sort_unstable();
    ports.dedup();
    ports
}

fn container_details(value: bollard::models::ContainerInspectResponse) -> ContainerDetails {
    let (nano_cpus, memory, bound_ports) = value
        .host_config
        .map(|hc| {
            (
                hc.nano_cpus.unwrap_or(0),
                hc.memory.unwrap_or(0),
                hc.port_bindings.as_ref().map(bound_host_ports).unwrap_or_default(),
            )
        })
        .unwrap_or_default();

    let network_addresses = value
        .network_settings
        .and_then(|settings| settings.networks)
        .map(|networks| {
            networks
                .into_values()
                .map(|endpoint| endpoint.ip_address.unwrap_or_default())
                .collect()
        })
        .unwrap_or_default();

    ContainerDetails {
        id: value.id.unwrap_or_default(),
        nano_cpus,
        memory,
        network_addresses,
        bound_ports,
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    #[instrument(skip(self))]
    async fn list_containers(&self) -> Result<Vec<EngineContainer>> {
        let docker = self.client().await?;
        let options = ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        };

        match docker.list_containers(Some(options)).await {
            Ok(containers) => {
                debug!(count = containers.len(), "Listed containers");
                Ok(containers.into_iter().map(engine_container).collect())
            }
            Err(e) => Err(self.classify(e).await),
        }
    }

    #[instrument(skip(self, spec), fields(image = %spec.image, host_port = spec.binding.host_port))]
    async fn create_container(&self, spec: &CreationSpec) -> Result<String> {
        let docker = self.client().await?;

        match docker
            .create_container(None::<CreateContainerOptions<String>>, container_config(spec))
            .await
        {
            Ok(response) => {
                for warning in &response.warnings {
                    warn!(container_id = %response.id, %warning, "Engine warning on create");
                }
                Ok(response.id)
            }
            Err(e) => Err(self.classify(e).await),
        }
    }

    #[instrument(skip(self))]
    async fn start_container(&self, id: &str) -> Result<()> {
        let docker = self.client().await?;

        match docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) => Err(self.classify(e).await),
        }
    }

    #[instrument(skip(self))]
    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails> {
        let docker = self.client().await?;

        match docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
        {
            Ok(response) => Ok(container_details(response)),
            Err(e) => Err(self.classify(e).await),
        }
    }

    #[instrument(skip(self, limits))]
    async fn update_resources(&self, id: &str, limits: &ResourceLimits) -> Result<()> {
        let docker = self.client().await?;
        let options = UpdateContainerOptions::<String> {
            memory: Some(limits.memory),
            memory_swap: Some(limits.memory_swap),
            nano_cpus: Some(limits.nano_cpus),
            ..Default::default()
        };

        match docker.update_container(id, options).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.classify(e).await),
        }
    }

    #[instrument(skip(self))]
    async fn stop_container(&self, id: &str) -> Result<()> {
        let docker = self.client().await?;

        match docker.stop_container(id, None::<StopContainerOptions>).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.classify(e).await),
        }
    }
}
