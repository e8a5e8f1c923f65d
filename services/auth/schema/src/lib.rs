//! sea-orm entities owned by the auth service.

pub mod login_codes;
pub mod users;
