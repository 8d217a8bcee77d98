//! # OC-06 Oracle Coordinator
//!
//! The public face of the system. Consumers register agreements and open
//! requests, reporting nodes answer them, and the coordinator settles
//! payment and calls the consumer back.
//!
//! ## Architecture
//!
//! ```text
//!              OracleCoordinatorApi        TokenReceiver
//!                        \                    /
//!                     ┌──────────────────────────┐
//!                     │    OracleCoordinator     │
//!                     │ registry  tracker ledger │
//!                     └──────────────────────────┘
//!                       /       |        |      \
//!             TokenLedger  CallbackDispatcher  Clock  EventPublisher
//! ```
//!
//! ## Funding
//!
//! Funds only enter through the token ledger's transfer hook, and only as
//! a [`TransferTicket`] the token ledger issued for that transfer. The
//! sender and amount credited are what redeeming the ticket returns. The
//! attached [`TransferInstruction`] decides what they pay for; any sender
//! or amount it claims is ignored.

pub mod adapters;
pub mod config;
pub mod deployment;
pub mod errors;
pub mod events;
pub mod instruction;
pub mod ports;
pub mod service;

pub use config::CoordinatorConfig;
pub use deployment::{InMemoryCoordinator, InMemoryDeployment};
pub use errors::CoordinatorError;
pub use events::{CallbackStatus, CoordinatorEvent};
pub use instruction::TransferInstruction;
pub use ports::{
    CallbackDispatcher, CallbackError, CallbackInvocation, Clock, EventPublisher, Fulfillment,
    FulfillmentReceipt, OracleCoordinatorApi, PrepaidRequest, ReceivedTransfer, TokenError,
    TokenLedger, TokenReceiver, TransferTicket,
};
pub use service::{OracleCoordinator, SolvencyReport};
