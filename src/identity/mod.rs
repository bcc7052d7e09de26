//! Sessions, users, roles and the guards built on them.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod session;
mod provider;
mod authorizer;
mod role;
mod role_gate;
mod user;

pub use principal::Principal;
pub use session::{Session, SessionToken, SessionStore, SessionManager};
pub use provider::{LocalAuthProvider, LoginRequest, LoginResponse, ensure_bootstrap_admin};
pub use authorizer::{Decision, authorize, require_role};
pub use role::{Role, UnknownRole, ANY_ROLE, STAFF, ADMINS, SUPER_ADMINS};
pub use role_gate::RoleGate;
pub use user::{User, UserStore, normalize_email};
