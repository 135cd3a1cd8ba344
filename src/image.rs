//! Rendering of image-pull progress records.

use std::fmt;

use bollard::models::CreateImageInfo;

/// Formats one pull progress record the way `docker pull` prints it:
/// `<layer> <status> <progress>`, or just the status for records that are
/// not tied to a layer.
pub(crate) struct PullProgress<'a>(pub &'a CreateImageInfo);

impl fmt::Display for PullProgress<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self.0.status.as_deref().unwrap_or_default();
        match self.0.id.as_deref() {
            Some(id) if !id.is_empty() => {
                write!(f, "{id} {status}")?;
                if let Some(progress) = self.0.progress.as_deref() {
                    write!(f, " {progress}")?;
                }
                Ok(())
            }
            _ => write!(f, "{status}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_records_lead_with_the_layer_id() {
        let info = CreateImageInfo {
            id: Some("3.9.11-alpine3.14".to_string()),
            status: Some("Downloading".to_string()),
            progress: Some("12MB/50MB".to_string()),
            ..Default::default()
        };
        assert_eq!(
            PullProgress(&info).to_string(),
            "3.9.11-alpine3.14 Downloading 12MB/50MB"
        );
    }

    #[test]
    fn status_only_records_stay_bare() {
        let info = CreateImageInfo {
            status: Some("Status: Image is up to date for alpine:3.20".to_string()),
            ..Default::default()
        };
        assert_eq!(
            PullProgress(&info).to_string(),
            "Status: Image is up to date for alpine:3.20"
        );
    }

    #[test]
    fn missing_progress_is_omitted() {
        let info = CreateImageInfo {
            id: Some("abc123".to_string()),
            status: Some("Pull complete".to_string()),
            ..Default::default()
        };
        assert_eq!(PullProgress(&info).to_string(), "abc123 Pull complete");
    }
}
