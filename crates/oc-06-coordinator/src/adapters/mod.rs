//! In-process adapters for the outbound ports.

pub mod callbacks;
pub mod clock;
pub mod event_bus;
pub mod in_memory_token;

pub use callbacks::{ConsumerContract, ContractCallbackDispatcher};
pub use clock::{ManualClock, SystemClock};
pub use event_bus::{EventSubscription, InMemoryEventBus};
pub use in_memory_token::InMemoryTokenLedger;
