use std::path::PathBuf;

use thiserror::Error;

use crate::cluster::ClusterError;
use crate::db::DatabaseError;

/// Failure reaping a single row. The row is left as it was.
#[derive(Error, Debug)]
pub enum ReapError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Failed to remove '{path}': {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cluster error: {0}")]
    Cluster(#[from] ClusterError),
}
