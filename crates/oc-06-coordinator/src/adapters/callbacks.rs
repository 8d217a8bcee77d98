//! # Consumer Contracts
//!
//! A table of consumer contracts by address. Contracts can be removed at
//! any time, including while a request that names them is still open.

use crate::ports::{CallbackDispatcher, CallbackError, CallbackInvocation};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{format_address, Address, RequestId, U256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A consumer that receives final values.
#[async_trait]
pub trait ConsumerContract: Send + Sync {
    /// Handle a final value sent to `selector`. `Err` reverts the call.
    async fn fulfill(
        &self,
        selector: [u8; 4],
        request_id: RequestId,
        value: U256,
    ) -> Result<(), String>;
}

/// Dispatches callbacks to deployed consumer contracts.
#[derive(Default)]
pub struct ContractCallbackDispatcher {
    contracts: RwLock<HashMap<Address, Arc<dyn ConsumerContract>>>,
}

impl ContractCallbackDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deploy(&self, address: Address, contract: Arc<dyn ConsumerContract>) {
        self.contracts.write().insert(address, contract);
    }

    /// Remove the contract at `address`. Returns whether one was there.
    pub fn destruct(&self, address: &Address) -> bool {
        self.contracts.write().remove(address).is_some()
    }

    pub fn is_deployed(&self, address: &Address) -> bool {
        self.contracts.read().contains_key(address)
    }
}

#[async_trait]
impl CallbackDispatcher for ContractCallbackDispatcher {
    async fn dispatch(&self, invocation: CallbackInvocation) -> Result<(), CallbackError> {
        let target = invocation.target.address;
        let contract = self
            .contracts
            .read()
            .get(&target)
            .cloned()
            .ok_or(CallbackError::MissingTarget(target))?;

        debug!(
            target = %format_address(&target),
            request_id = %invocation.request_id,
            "dispatching callback"
        );
        contract
            .fulfill(
                invocation.target.function_selector,
                invocation.request_id,
                invocation.value,
            )
            .await
            .map_err(CallbackError::Reverted)
    }
}
