//! Disposable Docker containers for integration tests.
//!
//! `dockhand` drives a local Docker daemon through a small lifecycle
//! controller: pull images, start containers described by [`ContainerSpec`],
//! follow their logs in the background until a readiness marker appears,
//! attach them to shared networks, and tear everything down again with
//! aggregated failure reporting.
//!
//! ```no_run
//! use std::time::Duration;
//! use dockhand::{ContainerSpec, DockerController, ReadyOutcome};
//!
//! # async fn run() -> Result<(), dockhand::Error> {
//! let mut controller = DockerController::connect()?;
//! controller.ensure_image("postgres:16-alpine").await?;
//!
//! let mut spec = ContainerSpec::new("db", "postgres:16-alpine");
//! spec.ports.insert(5432, 15432);
//! spec.env.push("POSTGRES_PASSWORD=secret".to_string());
//!
//! let ready = controller.start(spec, "database system is ready").await?;
//! assert_eq!(
//!     ready.wait_timeout(Duration::from_secs(30)).await,
//!     ReadyOutcome::Ready
//! );
//!
//! controller.shutdown_all().await?;
//! # Ok(())
//! # }
//! ```
//!
//! The controller assumes a single logical owner driving it sequentially;
//! it holds no state beyond process memory.

mod container;
mod controller;
mod error;
mod image;
mod lines;
mod manifest;
mod monitor;
mod network;
mod runtime;
#[cfg(test)]
mod testkit;

pub use container::{ContainerSpec, MountSpec, RunningContainer};
pub use controller::DockerController;
pub use error::Error;
pub use lines::{read_lines, LineSplitter};
pub use manifest::parse_manifest;
pub use monitor::{ReadyOutcome, ReadySignal};
pub use runtime::{ContainerRuntime, DockerRuntime, LogStream, PullStream};
