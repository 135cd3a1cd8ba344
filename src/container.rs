//! Container descriptions and their translation into Docker create calls.

use std::collections::HashMap;
use std::fmt;

use bollard::models::{Mount, MountTypeEnum, PortBinding};
use serde::{Deserialize, Serialize};

/// Host address published ports bind to.
const BIND_ALL: &str = "0.0.0.0";

/// A request to run a container.
///
/// The spec is immutable once handed to the controller; the `name` is the
/// unique key under which the started container is tracked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Container name, unique per controller.
    pub name: String,
    /// Image reference, e.g. `postgres:16-alpine`.
    pub image: String,
    /// Bind mounts, applied in order.
    #[serde(default)]
    pub mounts: Vec<MountSpec>,
    /// Published ports, container port to host port. TCP only.
    #[serde(default)]
    pub ports: HashMap<u16, u16>,
    /// Command run instead of the image default. Empty means image default.
    #[serde(default)]
    pub command: Vec<String>,
    /// Environment entries in `KEY=value` form.
    #[serde(default)]
    pub env: Vec<String>,
    /// Names of runtime networks the container joins after starting.
    #[serde(default)]
    pub networks: Vec<String>,
}

/// A single bind mount of a host path into the container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountSpec {
    /// Host path.
    pub source: String,
    /// Path inside the container.
    pub target: String,
    #[serde(default)]
    pub read_only: bool,
    /// Consistency hint passed through to the runtime, e.g. `"default"`.
    #[serde(default)]
    pub consistency: Option<String>,
}

impl ContainerSpec {
    /// A spec with just a name and image; remaining fields start empty.
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            mounts: Vec::new(),
            ports: HashMap::new(),
            command: Vec::new(),
            env: Vec::new(),
            networks: Vec::new(),
        }
    }

    /// Exposed-port and binding maps in the shape the create call wants.
    ///
    /// Every `(container, host)` entry publishes `0.0.0.0:host` to
    /// `container/tcp`.
    pub(crate) fn port_bindings(
        &self,
    ) -> (
        HashMap<String, HashMap<(), ()>>,
        HashMap<String, Option<Vec<PortBinding>>>,
    ) {
        let mut exposed = HashMap::new();
        let mut bindings = HashMap::new();
        for (&container_port, &host_port) in &self.ports {
            let key = format!("{container_port}/tcp");
            exposed.insert(key.clone(), HashMap::new());
            bindings.insert(
                key,
                Some(vec![PortBinding {
                    host_ip: Some(BIND_ALL.to_string()),
                    host_port: Some(host_port.to_string()),
                }]),
            );
        }
        (exposed, bindings)
    }

    /// The spec's mounts as Docker mount structures.
    pub(crate) fn bind_mounts(&self) -> Vec<Mount> {
        self.mounts
            .iter()
            .map(|mount| Mount {
                source: Some(mount.source.clone()),
                target: Some(mount.target.clone()),
                typ: Some(MountTypeEnum::BIND),
                read_only: Some(mount.read_only),
                consistency: mount.consistency.clone(),
                ..Default::default()
            })
            .collect()
    }
}

impl fmt::Display for ContainerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.image)
    }
}

/// A container the controller successfully started.
///
/// Exists from a successful start until shutdown; owned by the controller's
/// registry.
#[derive(Debug, Clone)]
pub struct RunningContainer {
    /// Runtime-assigned identifier.
    pub id: String,
    /// The spec the container was started from.
    pub spec: ContainerSpec,
}

impl RunningContainer {
    pub fn name(&self) -> &str {
        &self.spec.name
    }
}

impl fmt::Display for RunningContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.spec.name, self.spec.image, self.id)
    }
}
