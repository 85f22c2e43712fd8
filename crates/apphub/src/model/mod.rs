//! Persisted entities.
//!
//! Plain data; behaviour lives in the `assessment`, `reaper` and `secret`
//! modules and persistence in `db`.

pub mod assessment;
pub mod catalog;
pub mod identity;
pub mod inventory;
pub mod storage;
pub mod task;

pub use assessment::{
    Answer, Assessment, AssessmentOwner, CategorizedTag, Question, Questionnaire, Risk,
    RiskMessages, Section, Status, Thresholds,
};
pub use catalog::{JobFunction, Rule, RuleSet, Target, TargetLabel};
pub use identity::Identity;
pub use inventory::{
    Application, Archetype, Repository, Stakeholder, StakeholderGroup, Tag, TagCategory,
};
pub use storage::{Bucket, File};
pub use task::{Attachment, GroupMode, Task, TaskEvent, TaskGroup, TaskReport, TaskState, Ttl};
