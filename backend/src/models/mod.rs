pub mod common;
pub mod member;
pub mod organization;
pub mod user;
