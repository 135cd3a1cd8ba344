//! Container lifecycle orchestration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bollard::container::Config;
use bollard::models::HostConfig;
use bollard::Docker;
use futures_util::StreamExt;
use tokio::sync::oneshot;

use crate::container::{ContainerSpec, RunningContainer};
use crate::error::Error;
use crate::image::PullProgress;
use crate::monitor::{follow_logs, ReadySignal};
use crate::network::attach_networks;
use crate::runtime::{ContainerRuntime, DockerRuntime};

/// Grace period a container gets to stop on its own before the runtime
/// kills it. Independent of any caller-supplied deadline.
const STOP_GRACE: Duration = Duration::from_secs(30);

/// Starts, tracks, and tears down disposable containers.
///
/// The controller owns the registry of running containers and of the
/// networks it created. All mutating operations take `&mut self`: a single
/// logical owner (typically a test harness) drives the controller
/// sequentially, and concurrent use requires external synchronization.
pub struct DockerController {
    runtime: Arc<dyn ContainerRuntime>,
    running: HashMap<String, RunningContainer>,
    networks: HashMap<String, String>,
}

impl DockerController {
    /// Builds a controller on top of any [`ContainerRuntime`].
    pub fn new(runtime: impl ContainerRuntime + 'static) -> Self {
        Self {
            runtime: Arc::new(runtime),
            running: HashMap::new(),
            networks: HashMap::new(),
        }
    }

    /// Connects to the local Docker daemon with default socket settings.
    pub fn connect() -> Result<Self, Error> {
        let docker = Docker::connect_with_socket_defaults().map_err(|err| {
            log::error!("Unable to create Docker client: {err}");
            Error::Connection(err)
        })?;
        Ok(Self::new(DockerRuntime::new(docker)))
    }

    /// Pulls `image` unless the daemon already has it, logging progress
    /// records as they stream in.
    pub async fn ensure_image(&self, image: &str) -> Result<(), Error> {
        let mut progress = self.runtime.pull_image(image);
        while let Some(record) = progress.next().await {
            match record {
                Ok(info) => log::info!("{}", PullProgress(&info)),
                Err(err) => {
                    log::error!("Unable to ensure image {image} exists: {err}");
                    return Err(Error::Image {
                        image: image.to_string(),
                        source: err,
                    });
                }
            }
        }
        Ok(())
    }

    /// Creates the named network unless it already exists.
    ///
    /// Only networks actually created here are recorded for
    /// [`cleanup_networks`](Self::cleanup_networks); pre-existing ones are
    /// left untouched. Listing and creating are not atomic, so concurrent
    /// calls for the same name can still race.
    pub async fn ensure_network(&mut self, name: &str) -> Result<(), Error> {
        if self.networks.contains_key(name) {
            return Ok(());
        }
        let networks = self.runtime.list_networks().await.map_err(|err| {
            log::error!("Unable to list networks: {err}");
            Error::ListNetworks(err)
        })?;
        if networks.iter().any(|n| n.name.as_deref() == Some(name)) {
            log::debug!("Network {name} already exists");
            return Ok(());
        }

        let id = self.runtime.create_network(name).await.map_err(|err| {
            log::error!("Unable to create network {name}: {err}");
            Error::Network {
                op: "create",
                name: name.to_string(),
                source: err,
            }
        })?;
        log::info!("Created network {name} ({id})");
        self.networks.insert(name.to_string(), id);
        Ok(())
    }

    /// Creates and starts a container, then follows its logs in the
    /// background.
    ///
    /// Returns as soon as the container is started and the log follower is
    /// launched. Readiness is reported through the returned [`ReadySignal`]
    /// once a log line contains `ready_marker` (an empty marker never
    /// matches); callers wanting a bound on readiness apply their own
    /// deadline via [`ReadySignal::wait_timeout`].
    ///
    /// The container is registered under its spec name before networks are
    /// attached, so even an attach failure leaves it reachable by
    /// [`shutdown`](Self::shutdown) and [`shutdown_all`](Self::shutdown_all).
    /// Names must be unique among running containers.
    pub async fn start(
        &mut self,
        spec: ContainerSpec,
        ready_marker: &str,
    ) -> Result<ReadySignal, Error> {
        if self.running.contains_key(&spec.name) {
            log::error!("Container {} is already running", spec.name);
            return Err(Error::DuplicateName(spec.name));
        }

        let (exposed_ports, port_bindings) = spec.port_bindings();
        let host_config = HostConfig {
            mounts: Some(spec.bind_mounts()),
            port_bindings: Some(port_bindings),
            ..Default::default()
        };
        let config = Config {
            image: Some(spec.image.clone()),
            cmd: (!spec.command.is_empty()).then(|| spec.command.clone()),
            env: Some(spec.env.clone()),
            exposed_ports: Some(exposed_ports),
            tty: Some(false),
            host_config: Some(host_config),
            ..Default::default()
        };

        let id = self
            .runtime
            .create_container(&spec.name, config)
            .await
            .map_err(|err| {
                log::error!("Unable to create container {spec}: {err}");
                Error::Container {
                    op: "create",
                    name: spec.name.clone(),
                    source: err,
                }
            })?;

        self.runtime.start_container(&id).await.map_err(|err| {
            log::error!("Unable to start container {spec}: {err}");
            Error::Container {
                op: "start",
                name: spec.name.clone(),
                source: err,
            }
        })?;

        let container = RunningContainer {
            id: id.clone(),
            spec,
        };
        let name = container.name().to_string();
        log::info!("Started container {container}");
        // registered before network attach so cleanup can always find it
        self.running.insert(name.clone(), container.clone());

        if !container.spec.networks.is_empty() {
            attach_networks(self.runtime.as_ref(), &container).await?;
        }

        let (ready_tx, ready_rx) = oneshot::channel();
        tokio::spawn(follow_logs(
            Arc::clone(&self.runtime),
            id,
            name,
            ready_tx,
            ready_marker.to_string(),
        ));

        Ok(ReadySignal::new(ready_rx))
    }

    /// Stops and removes one running container by name.
    ///
    /// The stop uses a fixed 30-second grace period. A stop failure leaves
    /// the container registered and skips removal; storage is only removed
    /// once the container actually stopped.
    pub async fn shutdown(&mut self, name: &str) -> Result<(), Error> {
        let container = self
            .running
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotRunning(name.to_string()))?;
        log::info!("Trying to shutdown {container}...");

        self.runtime
            .stop_container(&container.id, STOP_GRACE)
            .await
            .map_err(|err| {
                log::error!("Unable to shutdown container {container}: {err}");
                Error::Container {
                    op: "shutdown",
                    name: container.name().to_string(),
                    source: err,
                }
            })?;

        self.running.remove(name);

        self.runtime
            .remove_container(&container.id)
            .await
            .map_err(|err| {
                log::error!("Unable to remove container {container}: {err}");
                Error::Container {
                    op: "remove",
                    name: container.name().to_string(),
                    source: err,
                }
            })?;

        Ok(())
    }

    /// Shuts down every container currently registered.
    ///
    /// Every container is attempted once even when earlier ones fail; all
    /// failures come back in one [`Error::Aggregate`]. Iteration order is
    /// unspecified.
    pub async fn shutdown_all(&mut self) -> Result<(), Error> {
        let names: Vec<String> = self.running.keys().cloned().collect();
        let mut errors = Vec::new();
        for name in names {
            if let Err(err) = self.shutdown(&name).await {
                errors.push(err);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Aggregate {
                context: "shutting down all containers",
                errors,
            })
        }
    }

    /// Removes every network created through
    /// [`ensure_network`](Self::ensure_network), aggregating failures like
    /// [`shutdown_all`](Self::shutdown_all).
    pub async fn cleanup_networks(&mut self) -> Result<(), Error> {
        let mut errors = Vec::new();
        for (name, id) in std::mem::take(&mut self.networks) {
            if let Err(err) = self.runtime.remove_network(&id).await {
                log::error!("Unable to remove network {name}: {err}");
                errors.push(Error::Network {
                    op: "remove",
                    name,
                    source: err,
                });
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Aggregate {
                context: "cleaning up networks",
                errors,
            })
        }
    }

    /// Containers currently tracked as running.
    pub fn running(&self) -> impl Iterator<Item = &RunningContainer> {
        self.running.values()
    }

    /// Whether a container with this name is tracked as running.
    pub fn is_running(&self, name: &str) -> bool {
        self.running.contains_key(name)
    }
}
