//! Ports: the coordinator's API and the collaborators it drives.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
