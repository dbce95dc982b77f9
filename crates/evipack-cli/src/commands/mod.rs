//! CLI subcommand implementations.

pub mod inspect;
pub mod keygen;
pub mod list;
pub mod pack;
pub mod verify;
