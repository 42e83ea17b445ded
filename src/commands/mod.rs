pub mod capture;
pub mod convert;
pub mod profile;
pub mod record;
pub mod replay;
pub mod utils;

#[cfg(test)]
#[path = "../commands_test.rs"]
mod commands_test;
