//! A coordinator wired to the in-memory adapters.

use crate::adapters::{
    ContractCallbackDispatcher, InMemoryEventBus, InMemoryTokenLedger, ManualClock,
};
use crate::config::CoordinatorConfig;
use crate::ports::TokenReceiver;
use crate::service::OracleCoordinator;
use oc_01_signature_verification::EcdsaVerifier;
use std::sync::{Arc, Weak};

/// Coordinator over in-memory token ledger, contracts, clock and bus.
pub type InMemoryCoordinator = OracleCoordinator<
    InMemoryTokenLedger,
    ContractCallbackDispatcher,
    ManualClock,
    InMemoryEventBus,
>;

/// A coordinator and handles to every adapter it drives.
pub struct InMemoryDeployment {
    pub coordinator: Arc<InMemoryCoordinator>,
    pub token: Arc<InMemoryTokenLedger>,
    pub callbacks: Arc<ContractCallbackDispatcher>,
    pub clock: Arc<ManualClock>,
    pub events: Arc<InMemoryEventBus>,
}

impl InMemoryDeployment {
    /// Wire everything up, with the coordinator installed as the token
    /// ledger's receiver for `config.coordinator_account`.
    pub fn new(config: CoordinatorConfig, now: u64) -> Self {
        let token = Arc::new(InMemoryTokenLedger::new());
        let callbacks = Arc::new(ContractCallbackDispatcher::new());
        let clock = Arc::new(ManualClock::new(now));
        let events = Arc::new(InMemoryEventBus::with_capacity(config.event_capacity));
        let account = config.coordinator_account;

        let coordinator = Arc::new(OracleCoordinator::new(
            config,
            Arc::new(EcdsaVerifier::new()),
            Arc::clone(&token),
            Arc::clone(&callbacks),
            Arc::clone(&clock),
            Arc::clone(&events),
        ));
        let weak = Arc::downgrade(&coordinator);
        let receiver: Weak<dyn TokenReceiver> = weak;
        token.register_receiver(account, receiver);

        Self {
            coordinator,
            token,
            callbacks,
            clock,
            events,
        }
    }
}
