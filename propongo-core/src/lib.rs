pub mod aggregation;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod groups;
pub mod ledger;
pub mod models;
pub mod money;
pub mod preview;
pub mod qualifications;
pub mod scope;
pub mod storage;
pub mod timeline;
pub mod upgrade;

// Re-export commonly used types
pub use aggregation::{partition, summarize, BudgetSummary, GroupSummary, Partition, SummaryRow};
pub use config::{get_config_path, resolve_store_path, AppConfig, HelpResource};
pub use db::{create_backend, BackendType, BlobStore};
pub use error::{ProposalError, ProposalResult};
pub use ledger::NewLineItem;
pub use models::{
    BudgetSection,
    CustomSection,
    DeliverableDates,
    Group,
    LineItem,
    ProposalDocument,
    QualificationsSection,
    ScopeSection,
    TeamMember,
    Testimonial,
    Updated,
    DEFAULT_GROUP_NAME,
};
pub use preview::ProposalPreview;
pub use storage::{ProposalStorage, PROPOSAL_KEY};
pub use timeline::{derive as derive_timeline, ChartDataset, ChartItem};
pub use upgrade::LoadOutcome;
