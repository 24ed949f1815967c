/// Test utilities: an in-memory engine and environment checks
use async_trait::async_trait;
use dockyard_common::{
    ContainerDetails, ContainerEngine, CreationSpec, DockyardError, EngineContainer,
    ResourceLimits, Result,
};
use std::collections::HashMap;
use std::process::Command;
use tokio::sync::Mutex;

pub fn has_docker() -> bool {
    // Check if docker command exists
    Command::new("docker")
        .arg("info")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Macro to skip tests when requirements aren't met
#[macro_export]
macro_rules! require_docker {
    () => {
        if !$crate::test_utils::has_docker() {
            eprintln!("Test ignored: Docker not available");
            return;
        }
    };
}

/// Engine operations, used to record calls and to inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Create,
    Start,
    Inspect,
    Update,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCall {
    pub operation: Operation,
    pub container_id: Option<String>,
}

#[derive(Debug, Clone)]
struct MockContainer {
    id: String,
    names: Vec<String>,
    /// Configured host ports; only published while running.
    bound_ports: Vec<u16>,
    running: bool,
    limits: ResourceLimits,
    network_addresses: Vec<String>,
}

#[derive(Debug, Default)]
struct MockState {
    containers: Vec<MockContainer>,
    calls: Vec<EngineCall>,
    failures: HashMap<Operation, DockyardError>,
    created: u64,
}

/// In-memory [`ContainerEngine`] that behaves like a single-host engine.
///
/// Host ports are checked at start time, as the real engine binds them then.
/// The list call reports ports for running containers only; inspect always
/// returns the configured bindings.
/// Stopping an already stopped container succeeds unless a failure is injected.
#[derive(Debug, Default)]
pub struct MockEngine {
    state: Mutex<MockState>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a container that this service did not create.
    pub async fn add_container(&self, id: &str, names: &[&str], ports: &[u16], running: bool) {
        let mut state = self.state.lock().await;
        state.containers.push(MockContainer {
            id: id.to_string(),
            names: names.iter().map(|n| n.to_string()).collect(),
            bound_ports: ports.to_vec(),
            running,
            limits: ResourceLimits {
                memory: 0,
                memory_swap: 0,
                nano_cpus: 0,
            },
            network_addresses: vec!["172.17.0.2".to_string()],
        });
    }

    /// Sets raw limits on a seeded container, e.g. fractional nanocpus.
    pub async fn set_limits(&self, id: &str, limits: ResourceLimits) {
        let mut state = self.state.lock().await;
        if let Some(container) = state.containers.iter_mut().find(|c| c.id == id) {
            container.limits = limits;
        }
    }

    /// Makes every later call of `operation` fail with `error`.
    pub async fn fail_on(&self, operation: Operation, error: DockyardError) {
        self.state.lock().await.failures.insert(operation, error);
    }

    pub async fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn call_count(&self, operation: Operation) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    pub async fn container_count(&self) -> usize {
        self.state.lock().await.containers.len()
    }

    pub async fn is_running(&self, id: &str) -> Option<bool> {
        let state = self.state.lock().await;
        state.containers.iter().find(|c| c.id == id).map(|c| c.running)
    }

    fn record(state: &mut MockState, operation: Operation, container_id: Option<&str>) -> Result<()> {
        state.calls.push(EngineCall {
            operation,
            container_id: container_id.map(str::to_string),
        });
        match state.failures.get(&operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn no_such_container(id: &str) -> DockyardError {
        DockyardError::Engine(format!(
            "Docker responded with status code 404: No such container: {id}"
        ))
    }
}

#[async_trait]
impl ContainerEngine for MockEngine {
    async fn list_containers(&self) -> Result<Vec<EngineContainer>> {
        let mut state = self.state.lock().await;
        Self::record(&mut state, Operation::List, None)?;

        Ok(state
            .containers
            .iter()
            .map(|c| EngineContainer {
                id: c.id.clone(),
                names: c.names.clone(),
                published_ports: if c.running { c.bound_ports.clone() } else { Vec::new() },
                running: c.running,
            })
            .collect())
    }

    async fn create_container(&self, spec: &CreationSpec) -> Result<String> {
        let mut state = self.state.lock().await;
        Self::record(&mut state, Operation::Create, None)?;

        state.created += 1;
        let id = format!("{:064x}", state.created);
        let address = format!("172.17.0.{}", state.created + 10);
        let name = format!("/mock_{}", state.created);
        state.containers.push(MockContainer {
            id: id.clone(),
            names: vec![name],
            bound_ports: vec![spec.binding.host_port],
            running: false,
            limits: spec.limits,
            network_addresses: vec![address],
        });
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        Self::record(&mut state, Operation::Start, Some(id))?;

        let ports = match state.containers.iter().find(|c| c.id == id) {
            Some(container) => container.bound_ports.clone(),
            None => return Err(Self::no_such_container(id)),
        };
        let bound_elsewhere = state.containers.iter().any(|c| {
            c.id != id && c.running && c.bound_ports.iter().any(|p| ports.contains(p))
        });
        if bound_elsewhere {
            return Err(DockyardError::Engine(
                "Docker responded with status code 500: driver failed programming external connectivity: port is already allocated".to_string(),
            ));
        }

        if let Some(container) = state.containers.iter_mut().find(|c| c.id == id) {
            container.running = true;
        }
        Ok(())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails> {
        let mut state = self.state.lock().await;
        Self::record(&mut state, Operation::Inspect, Some(id))?;

        state
            .containers
            .iter()
            .find(|c| c.id == id)
            .map(|c| ContainerDetails {
                id: c.id.clone(),
                nano_cpus: c.limits.nano_cpus,
                memory: c.limits.memory,
                network_addresses: c.network_addresses.clone(),
                bound_ports: c.bound_ports.clone(),
            })
            .ok_or_else(|| Self::no_such_container(id))
    }

    async fn update_resources(&self, id: &str, limits: &ResourceLimits) -> Result<()> {
        let mut state = self.state.lock().await;
        Self::record(&mut state, Operation::Update, Some(id))?;

        match state.containers.iter_mut().find(|c| c.id == id) {
            Some(container) => {
                container.limits = *limits;
                Ok(())
            }
            None => Err(Self::no_such_container(id)),
        }
    }

    async fn stop_container(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        Self::record(&mut state, Operation::Stop, Some(id))?;

        match state.containers.iter_mut().find(|c| c.id == id) {
            Some(container) => {
                container.running = false;
                Ok(())
            }
            None => Err(Self::no_such_container(id)),
        }
    }
}
