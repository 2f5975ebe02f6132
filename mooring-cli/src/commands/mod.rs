//! CLI subcommands driving the lifecycle controller.

pub mod down;
pub mod pull;
pub mod status;
pub mod up;
