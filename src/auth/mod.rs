pub mod authentication;
pub mod gate;
pub mod permissions;
pub mod session;
pub mod user;

pub use authentication::*;
pub use permissions::*;
pub use session::*;
pub use user::*;
