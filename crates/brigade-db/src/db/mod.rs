pub mod audit;
pub mod company;
pub mod member;
pub mod notification;
pub mod plan;
pub mod project;
pub mod subscription;
pub mod task;
pub mod transaction;
pub mod trial;

pub use audit::AuditLogRepository;
pub use company::CompanyRepository;
pub use member::MemberRepository;
pub use notification::NotificationRepository;
pub use plan::PlanRepository;
pub use project::ProjectRepository;
pub use subscription::SubscriptionRepository;
pub use task::TaskRepository;
pub use trial::TrialRepository;
