//! # reqsync-container
//!
//! Container-side orchestration over external tools:
//!
//! - [`freeze`]: build an image and capture `pip freeze` per interpreter
//! - [`prime`]: prime `ansible-test` sanity virtual environments
//! - [`install`]: install and validate requirements per interpreter
//!
//! Every process goes through a [`CommandRunner`], so the sequencing can be
//! exercised without Docker, git or Python.

pub mod display;
pub mod error;
pub mod freeze;
pub mod install;
pub mod pip;
pub mod prebuild;
pub mod prime;
pub mod runner;

pub use error::ContainerError;
pub use runner::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
