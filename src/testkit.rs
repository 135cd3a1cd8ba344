//! Scripted [`ContainerRuntime`] shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bollard::container::{Config, LogOutput};
use bollard::errors::Error as DockerError;
use bollard::models::{CreateImageInfo, Network};
use bytes::Bytes;
use futures_util::stream;

use crate::runtime::{ContainerRuntime, LogStream, PullStream};

/// A daemon-side failure with a given message.
pub(crate) fn server_error(message: &str) -> DockerError {
    DockerError::DockerResponseServerError {
        status_code: 500,
        message: message.to_string(),
    }
}

/// A network the way the daemon would list it.
pub(crate) fn network(name: &str, id: &str) -> Network {
    Network {
        name: Some(name.to_string()),
        id: Some(id.to_string()),
        ..Default::default()
    }
}

/// A log frame carrying `text` on stdout.
pub(crate) fn stdout_frame(text: &str) -> Result<LogOutput, DockerError> {
    Ok(LogOutput::StdOut {
        message: Bytes::copy_from_slice(text.as_bytes()),
    })
}

/// In-memory runtime double. Records every call in a journal, hands out
/// sequential container ids (`id-0`, `id-1`, ...), and serves scripted
/// log frames and failure injections.
#[derive(Default)]
pub(crate) struct MockRuntime {
    calls: Mutex<Vec<String>>,
    networks: Mutex<Vec<Network>>,
    logs: Mutex<HashMap<String, Vec<Result<LogOutput, DockerError>>>>,
    hanging: Mutex<HashSet<String>>,
    failing_stops: Mutex<HashSet<String>>,
    failing_connects: Mutex<HashSet<String>>,
    failing_network_removals: Mutex<HashSet<String>>,
    failing_pulls: Mutex<HashSet<String>>,
    configs: Mutex<HashMap<String, Config<String>>>,
    created: Mutex<u32>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// The journal of runtime calls so far, e.g. `create db`, `stop id-0`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// The config the container with `name` was created with.
    pub fn config_for(&self, name: &str) -> Config<String> {
        self.configs.lock().unwrap()[name].clone()
    }

    pub fn add_network(&self, network: Network) {
        self.networks.lock().unwrap().push(network);
    }

    /// Scripts the log frames served for container `id`; unscripted
    /// containers have empty logs.
    pub fn script_logs(&self, id: &str, frames: Vec<Result<LogOutput, DockerError>>) {
        self.logs.lock().unwrap().insert(id.to_string(), frames);
    }

    /// Makes the log stream for `id` never yield and never end.
    pub fn hang_logs(&self, id: &str) {
        self.hanging.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_stop(&self, id: &str) {
        self.failing_stops.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_connect(&self, network_id: &str) {
        self.failing_connects
            .lock()
            .unwrap()
            .insert(network_id.to_string());
    }

    pub fn fail_network_removal(&self, id: &str) {
        self.failing_network_removals
            .lock()
            .unwrap()
            .insert(id.to_string());
    }

    pub fn fail_pull(&self, image: &str) {
        self.failing_pulls.lock().unwrap().insert(image.to_string());
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    fn pull_image(&self, image: &str) -> PullStream {
        self.record(format!("pull {image}"));
        let records: Vec<Result<CreateImageInfo, DockerError>> =
            if self.failing_pulls.lock().unwrap().contains(image) {
                vec![Err(server_error("manifest unknown"))]
            } else {
                vec![Ok(CreateImageInfo {
                    status: Some(format!("Pulling from {image}")),
                    ..Default::default()
                })]
            };
        Box::pin(stream::iter(records))
    }

    async fn create_container(
        &self,
        name: &str,
        config: Config<String>,
    ) -> Result<String, DockerError> {
        self.record(format!("create {name}"));
        let mut created = self.created.lock().unwrap();
        let id = format!("id-{}", *created);
        *created += 1;
        self.configs.lock().unwrap().insert(name.to_string(), config);
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> Result<(), DockerError> {
        self.record(format!("start {id}"));
        Ok(())
    }

    fn logs_stream(&self, id: &str) -> LogStream {
        self.record(format!("logs {id}"));
        if self.hanging.lock().unwrap().contains(id) {
            return Box::pin(stream::pending::<Result<LogOutput, DockerError>>());
        }
        let frames = self.logs.lock().unwrap().remove(id).unwrap_or_default();
        Box::pin(stream::iter(frames))
    }

    async fn stop_container(&self, id: &str, grace: Duration) -> Result<(), DockerError> {
        self.record(format!("stop {id} grace={}", grace.as_secs()));
        if self.failing_stops.lock().unwrap().contains(id) {
            return Err(server_error("stop failed"));
        }
        Ok(())
    }

    async fn remove_container(&self, id: &str) -> Result<(), DockerError> {
        self.record(format!("remove {id}"));
        Ok(())
    }

    async fn list_networks(&self) -> Result<Vec<Network>, DockerError> {
        self.record("list-networks".to_string());
        Ok(self.networks.lock().unwrap().clone())
    }

    async fn create_network(&self, name: &str) -> Result<String, DockerError> {
        self.record(format!("create-network {name}"));
        let id = format!("net-{name}");
        self.networks.lock().unwrap().push(network(name, &id));
        Ok(id)
    }

    async fn connect_network(
        &self,
        network_id: &str,
        container_id: &str,
    ) -> Result<(), DockerError> {
        self.record(format!("connect {network_id} {container_id}"));
        if self.failing_connects.lock().unwrap().contains(network_id) {
            return Err(server_error("connect failed"));
        }
        Ok(())
    }

    async fn remove_network(&self, id: &str) -> Result<(), DockerError> {
        self.record(format!("remove-network {id}"));
        if self.failing_network_removals.lock().unwrap().contains(id) {
            return Err(server_error("network has active endpoints"));
        }
        Ok(())
    }
}
