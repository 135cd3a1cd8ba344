//! Declarative container fleets.

use crate::container::ContainerSpec;
use crate::error::Error;

/// Parses a JSON array of container specs.
///
/// Lets a harness keep its environment description in a file instead of
/// building specs in code:
///
/// ```json
/// [
///   {"name": "db", "image": "postgres:16-alpine", "ports": {"5432": 15432}},
///   {"name": "cache", "image": "redis:7-alpine", "networks": ["backend"]}
/// ]
/// ```
///
/// Unset fields take their defaults; unknown fields are ignored.
pub fn parse_manifest(manifest: &str) -> Result<Vec<ContainerSpec>, Error> {
    Ok(serde_json::from_str(manifest)?)
}
