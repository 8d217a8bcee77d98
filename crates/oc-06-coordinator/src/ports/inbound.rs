//! # Inbound Ports (Driving Ports / API)
//!
//! What requesters, reporting nodes and the token ledger call.

use crate::errors::CoordinatorError;
use crate::events::CallbackStatus;
use crate::ports::outbound::TransferTicket;
use async_trait::async_trait;
use oc_01_signature_verification::EcdsaSignature;
use oc_02_agreement_registry::ServiceAgreement;
use oc_04_request_lifecycle::{CallbackTarget, OracleRequest};
use oc_05_settlement_ledger::{AccountBalance, Distribution};
use shared_types::{Address, AgreementId, Report, RequestId, U256};
use std::sync::Arc;

/// A request paid from the requester's withdrawable balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepaidRequest {
    pub agreement_id: AgreementId,
    pub callback: CallbackTarget,
    pub payment: U256,
    pub data_version: U256,
    pub data: Vec<u8>,
}

/// What happened to an accepted report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentReceipt {
    /// The accepted report with its rank.
    pub report: Report,
    /// Set when this report completed the request.
    pub fulfillment: Option<Fulfillment>,
}

/// Final value, who got paid, and whether the consumer took it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fulfillment {
    pub value: U256,
    pub distribution: Distribution,
    pub callback: CallbackStatus,
}

impl FulfillmentReceipt {
    /// Whether this report completed the request.
    pub fn is_fulfilled(&self) -> bool {
        self.fulfillment.is_some()
    }
}

/// Coordinator API.
#[async_trait]
pub trait OracleCoordinatorApi: Send + Sync {
    /// Store an agreement signed by every listed oracle.
    ///
    /// Re-submitting identical content returns the same id without a second
    /// `NewServiceAgreement` event.
    async fn initiate_service_agreement(
        &self,
        agreement: ServiceAgreement,
        signatures: Vec<EcdsaSignature>,
    ) -> Result<AgreementId, CoordinatorError>;

    /// Open a request paid from `requester`'s withdrawable balance.
    async fn oracle_request_from_balance(
        &self,
        requester: Address,
        request: PrepaidRequest,
    ) -> Result<RequestId, CoordinatorError>;

    /// Accept `node`'s report; on the final report, settle and call back.
    async fn fulfill_oracle_request(
        &self,
        node: Address,
        request_id: RequestId,
        value: U256,
    ) -> Result<FulfillmentReceipt, CoordinatorError>;

    /// Send `amount` of `account`'s withdrawable balance to `recipient`.
    async fn withdraw(
        &self,
        account: Address,
        recipient: Address,
        amount: U256,
    ) -> Result<(), CoordinatorError>;

    /// Move uncommitted escrow back to withdrawable.
    async fn release_escrow(&self, account: Address, amount: U256) -> Result<(), CoordinatorError>;

    fn get_agreement(&self, id: &AgreementId) -> Result<Arc<ServiceAgreement>, CoordinatorError>;

    fn get_request(&self, id: &RequestId) -> Result<OracleRequest, CoordinatorError>;

    fn balance_of(&self, account: &Address) -> AccountBalance;
}

/// Transfer hook the token ledger invokes after moving funds to the
/// coordinator with `transfer_with_data`.
///
/// The ticket is the only evidence of the transfer; sender and amount are
/// whatever redeeming it at the token ledger returns. An `Err` makes the
/// ledger revert the transfer.
#[async_trait]
pub trait TokenReceiver: Send + Sync {
    async fn on_token_transfer(
        &self,
        ticket: TransferTicket,
        data: Vec<u8>,
    ) -> Result<(), CoordinatorError>;
}
