pub mod entity_repo;
pub mod event_repo;
pub mod funnel_repo;
pub mod gateway;
pub mod legacy_repo;
pub mod report_pipelines;
pub mod report_repo;
pub mod space_desk_repo;

pub use entity_repo::{EntityKind, EntityRepository};
pub use event_repo::EventRepository;
pub use funnel_repo::FunnelRepository;
pub use gateway::{GatewayEnvironment, MongoGateway};
pub use legacy_repo::LegacyRepository;
pub use report_repo::ReportRepository;
pub use space_desk_repo::{GroupChanges, LastMessage, SpaceDeskRepository};
