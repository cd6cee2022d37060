pub mod diff;
pub mod freeze;
pub mod prime;
pub mod requirements;
pub mod update;
