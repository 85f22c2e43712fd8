use thiserror::Error;

use crate::assessment::AssessmentError;
use crate::cluster::ClusterError;
use crate::db::DatabaseError;
use crate::logging::LoggingError;
use crate::reaper::ReapError;
use crate::secret::SecretError;
use crate::seed::SeedError;
use crate::settings::SettingsError;

#[derive(Error, Debug)]
pub enum HubError {
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Secret error: {0}")]
    Secret(#[from] SecretError),

    #[error("Cluster error: {0}")]
    Cluster(#[from] ClusterError),

    #[error("Reaper error: {0}")]
    Reap(#[from] ReapError),

    #[error("Seed error: {0}")]
    Seed(#[from] SeedError),

    #[error("Assessment error: {0}")]
    Assessment(#[from] AssessmentError),
}

pub type Result<T> = std::result::Result<T, HubError>;
