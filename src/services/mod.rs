pub mod auth;
pub mod content;
pub mod file;
pub mod quota;
pub mod reconcile;
pub mod share;
pub mod user;
pub mod vault;

pub use auth::{AuthService, IdentityProvider};
pub use content::ContentLedger;
pub use file::FileService;
pub use quota::QuotaLedger;
pub use reconcile::{Reconciler, SweepReport};
pub use share::ShareService;
pub use user::UserService;
pub use vault::{VaultEngine, VaultLimits};
