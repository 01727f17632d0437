pub mod admin;
pub mod blobs;
pub mod exchange;
pub mod follow_up;
pub mod locks;
pub mod quota;

pub use admin::AdminService;
pub use blobs::BlobStore;
pub use exchange::{ExchangeProtocol, ResolvedFile, ServedFile};
pub use follow_up::FollowUpScheduler;
pub use locks::{KeyGuard, KeyedLocks};
pub use quota::QuotaEnforcer;
