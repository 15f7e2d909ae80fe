pub mod permit;
pub mod user;

pub use permit::{NewPermit, Permit, PermitScope};
pub use user::{timestamp_now, NewUser, Role, User, UserUpdate, MAX_NAME_LENGTH};
