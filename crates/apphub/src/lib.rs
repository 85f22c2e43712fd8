pub mod assessment;
pub mod cluster;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod reaper;
pub mod secret;
pub mod seed;
pub mod settings;

pub use assessment::{
    ApplicationResolver, ArchetypeResolver, AssessmentError, MembershipResolver,
    QuestionnaireResolver, TagResolver,
};
pub use db::{Database, DatabaseError};
pub use error::{HubError, Result};
pub use lifecycle::{CancelToken, Manager, Runnable};
pub use reaper::{ReapError, Supervisor};
pub use seed::{SeedError, Seeder};
pub use settings::{Settings, SettingsError};
