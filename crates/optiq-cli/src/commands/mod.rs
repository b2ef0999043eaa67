//! CLI command implementations.

pub mod backends;
pub mod cancel;
pub mod check;
pub mod common;
pub mod encode;
pub mod result;
pub mod run;
pub mod status;
pub mod version;
