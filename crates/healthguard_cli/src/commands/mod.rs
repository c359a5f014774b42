//! CLI command implementations.

pub mod backup;
pub mod init_admin;
pub mod inspect;
pub mod password;
