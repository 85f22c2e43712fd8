//! Cluster workload client seam.
//!
//! The hub only ever deletes task pods; scheduling lives elsewhere.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Pod '{0}' not found")]
    NotFound(String),

    #[error("Cluster request for pod '{pod}' failed: {reason}")]
    Request { pod: String, reason: String },
}

pub trait PodClient: Send + Sync {
    fn delete(&self, pod: &str) -> Result<(), ClusterError>;
}

/// Deletes a pod, treating an already-missing pod as deleted.
pub fn delete_pod(client: &dyn PodClient, pod: &str) -> Result<(), ClusterError> {
    match client.delete(pod) {
        Err(ClusterError::NotFound(_)) => {
            tracing::debug!(pod, "Pod already gone");
            Ok(())
        }
        other => other,
    }
}

/// Client for running without a cluster. Every delete succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPodClient;

impl PodClient for NoopPodClient {
    fn delete(&self, pod: &str) -> Result<(), ClusterError> {
        tracing::debug!(pod, "Pod delete skipped, no cluster configured");
        Ok(())
    }
}
