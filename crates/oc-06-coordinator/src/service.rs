//! # Oracle Coordinator Service
//!
//! Wires the registry, the request tracker and the settlement ledger behind
//! [`OracleCoordinatorApi`], and drives the external token ledger, consumer
//! callbacks and event bus through the outbound ports.
//!
//! ## Locking
//!
//! | Lock | Guards | Order |
//! |------|--------|-------|
//! | request mutex | one request's reports and state | 1 |
//! | `ledger` | all balances | 2 |
//! | tracker table | request map and counter | 3 |
//!
//! No lock is held across a call into the token ledger, a consumer callback
//! or the event bus. Opening a request funds it and inserts it under one
//! `ledger` guard, so committed escrow is never visible without its request.
//!
//! ## Fulfillment
//!
//! ```text
//! stage report (checks)  ->  commit on a copy  ->  distribute payment  ->  swap copy in
//!           \_____________ request mutex held, all-or-nothing ____________/
//! then, unlocked: events  ->  callback (spawned, timeout)  ->  CallbackFailed if it failed
//! ```

use crate::config::CoordinatorConfig;
use crate::errors::CoordinatorError;
use crate::events::{CallbackStatus, CoordinatorEvent};
use crate::instruction::TransferInstruction;
use crate::ports::{
    CallbackDispatcher, CallbackError, CallbackInvocation, Clock, EventPublisher, Fulfillment,
    FulfillmentReceipt, OracleCoordinatorApi, PrepaidRequest, ReceivedTransfer, TokenError,
    TokenLedger, TokenReceiver, TransferTicket,
};
use async_trait::async_trait;
use oc_01_signature_verification::{EcdsaSignature, EcdsaVerifier, SignatureVerificationApi};
use oc_02_agreement_registry::{
    compute_agreement_id, AgreementLookup, AgreementRegistry, RegistryConfig, ServiceAgreement,
};
use oc_04_request_lifecycle::{
    CallbackTarget, FulfillmentOutcome, LifecycleError, NewRequest, OracleRequest,
    RequestTracker,
};
use oc_05_settlement_ledger::{AccountBalance, Distribution, SettlementLedger};
use oc_telemetry::{
    metric_inc, time_histogram, AGREEMENTS_REGISTERED, AGREEMENTS_REJECTED, CALLBACK_FAILURES,
    FULFILLMENT_DURATION, INBOUND_TRANSFERS, PAYOUTS, REPORTS_ACCEPTED, REPORTS_REJECTED,
    REQUESTS_FULFILLED, REQUESTS_OPENED, WITHDRAWALS,
};
use parking_lot::Mutex;
use shared_types::{format_address, Address, AgreementId, Categorized, RequestId, U256};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Coordinator's own view of its books against the token ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolvencyReport {
    /// Funds the ledger accounts for.
    pub held: U256,
    /// Coordinator's balance at the token ledger.
    pub token_balance: U256,
}

impl SolvencyReport {
    /// Tokens held beyond what the ledger owes (direct transfers, timed-out withdrawals).
    pub fn surplus(&self) -> U256 {
        self.token_balance.saturating_sub(self.held)
    }
}

/// Where the payment for a new request comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Funding {
    /// Tokens that arrived with the request.
    Transfer,
    /// The requester's withdrawable balance.
    Prepaid,
}

impl Funding {
    fn label(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Prepaid => "prepaid",
        }
    }
}

/// Result of the locked part of a report.
struct Settled {
    outcome: FulfillmentOutcome,
    distribution: Option<Distribution>,
    callback: CallbackTarget,
}

/// The oracle coordinator.
pub struct OracleCoordinator<T, D, K, P, V = EcdsaVerifier>
where
    T: TokenLedger,
    D: CallbackDispatcher,
    K: Clock,
    P: EventPublisher,
    V: SignatureVerificationApi,
{
    config: CoordinatorConfig,
    registry: AgreementRegistry<V>,
    tracker: RequestTracker,
    ledger: Mutex<SettlementLedger>,
    token: Arc<T>,
    callbacks: Arc<D>,
    clock: Arc<K>,
    events: Arc<P>,
}

impl<T, D, K, P, V> OracleCoordinator<T, D, K, P, V>
where
    T: TokenLedger + 'static,
    D: CallbackDispatcher + 'static,
    K: Clock,
    P: EventPublisher,
    V: SignatureVerificationApi,
{
    /// Create a coordinator with empty books.
    pub fn new(
        config: CoordinatorConfig,
        verifier: Arc<V>,
        token: Arc<T>,
        callbacks: Arc<D>,
        clock: Arc<K>,
        events: Arc<P>,
    ) -> Self {
        let registry = AgreementRegistry::new(
            RegistryConfig {
                max_oracles: config.max_oracles,
            },
            verifier,
        );

        Self {
            config,
            registry,
            tracker: RequestTracker::new(),
            ledger: Mutex::new(SettlementLedger::new()),
            token,
            callbacks,
            clock,
            events,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Id an agreement would be stored under.
    pub fn compute_agreement_id(&self, agreement: &ServiceAgreement) -> AgreementId {
        compute_agreement_id(agreement)
    }

    /// Requests opened so far.
    pub fn request_count(&self) -> usize {
        self.tracker.len()
    }

    /// Compare the books with the token ledger.
    ///
    /// Fails if the ledger's internal sums disagree or the token ledger holds
    /// less than the coordinator owes.
    pub async fn check_solvency(&self) -> Result<SolvencyReport, CoordinatorError> {
        let token_balance = self.observe_token_balance().await?;
        let held = {
            let ledger = self.ledger.lock();
            ledger.check_conservation()?;
            ledger.total_held()
        };

        if token_balance < held {
            error!(%held, %token_balance, "coordinator is insolvent");
            return Err(CoordinatorError::Insolvent {
                held,
                balance: token_balance,
            });
        }
        Ok(SolvencyReport {
            held,
            token_balance,
        })
    }

    async fn observe_token_balance(&self) -> Result<U256, CoordinatorError> {
        tokio::time::timeout(
            self.config.transfer_timeout,
            self.token.balance_of(self.config.coordinator_account),
        )
        .await
        .map_err(|_| CoordinatorError::TokenLedgerTimedOut)?
        .map_err(CoordinatorError::from)
    }

    async fn emit(&self, event: CoordinatorEvent) {
        let name = event.name();
        let receivers = self.events.publish(event).await;
        debug!(event = name, receivers, "event emitted");
    }

    // =========================================================================
    // INBOUND TRANSFERS
    // =========================================================================

    /// Exchange a hook's ticket for the transfer the token ledger recorded.
    async fn redeem(&self, ticket: &TransferTicket) -> Result<ReceivedTransfer, CoordinatorError> {
        let redeemed = tokio::time::timeout(
            self.config.transfer_timeout,
            self.token
                .redeem_ticket(self.config.coordinator_account, ticket),
        )
        .await
        .map_err(|_| CoordinatorError::TokenLedgerTimedOut)?;

        match redeemed {
            Ok(transfer) => Ok(transfer),
            Err(TokenError::UnknownTicket(id)) => {
                Err(CoordinatorError::UnverifiedTransfer { ticket: id })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Credit a redeemed transfer as `instruction` directs.
    ///
    /// An error after redemption leaves the books as they were, and the
    /// token ledger then reverts the transfer.
    async fn credit_inbound(
        &self,
        transfer: ReceivedTransfer,
        instruction: TransferInstruction,
    ) -> Result<(), CoordinatorError> {
        let (sender, amount) = (transfer.from, transfer.amount);

        match instruction {
            TransferInstruction::DepositFunds {
                claimed_account,
                claimed_amount,
            } => {
                if claimed_account != sender || claimed_amount != amount {
                    warn!(
                        sender = %format_address(&sender),
                        claimed = %format_address(&claimed_account),
                        %amount,
                        %claimed_amount,
                        "deposit claims differ from the transfer, using transfer figures"
                    );
                }

                self.ledger.lock().deposit(&sender, amount)?;

                info!(account = %format_address(&sender), %amount, "funds deposited");
                self.emit(CoordinatorEvent::FundsDeposited {
                    account: sender,
                    amount,
                })
                .await;
                Ok(())
            }
            TransferInstruction::OracleRequest {
                claimed_sender,
                claimed_payment,
                agreement_id,
                callback,
                data_version,
                data,
            } => {
                if claimed_sender != sender || claimed_payment != amount {
                    warn!(
                        sender = %format_address(&sender),
                        claimed = %format_address(&claimed_sender),
                        %amount,
                        %claimed_payment,
                        "request claims differ from the transfer, using transfer figures"
                    );
                }

                let new = NewRequest {
                    agreement_id,
                    callback,
                    requester: sender,
                    paid: amount,
                    data_version,
                    data,
                };
                let request = self.open_funded(new, Funding::Transfer)?;
                self.announce_request(&request).await;
                Ok(())
            }
        }
    }

    /// Fund and open a request under one ledger guard.
    fn open_funded(
        &self,
        new: NewRequest,
        funding: Funding,
    ) -> Result<OracleRequest, CoordinatorError> {
        self.precheck_request(&new.agreement_id, new.paid)?;
        let (requester, paid) = (new.requester, new.paid);

        let mut ledger = self.ledger.lock();
        match funding {
            Funding::Transfer => ledger.fund_request(&requester, paid)?,
            Funding::Prepaid => ledger.commit_from_balance(&requester, paid)?,
        }

        match self.tracker.open(&self.registry, new, self.clock.now()) {
            Ok(request) => {
                metric_inc!(REQUESTS_OPENED, &[funding.label()]);
                Ok(request)
            }
            Err(e) => {
                match funding {
                    Funding::Transfer => ledger.revert_funding(&requester, paid)?,
                    Funding::Prepaid => ledger.revert_commitment(&requester, paid)?,
                }
                Err(e.into())
            }
        }
    }

    /// Agreement exists and `paid` covers it; checked before any funds move.
    fn precheck_request(
        &self,
        agreement_id: &AgreementId,
        paid: U256,
    ) -> Result<(), CoordinatorError> {
        let agreement = self
            .registry
            .agreement(agreement_id)
            .ok_or(LifecycleError::UnknownAgreement(*agreement_id))?;
        if paid < agreement.payment {
            return Err(LifecycleError::InsufficientPayment {
                required: agreement.payment,
                paid,
            }
            .into());
        }
        Ok(())
    }

    async fn announce_request(&self, request: &OracleRequest) {
        self.emit(CoordinatorEvent::OracleRequest {
            request_id: request.id,
            agreement_id: request.agreement_id,
            requester: request.requester,
            payment: request.payment,
            callback: request.callback,
            data_version: request.data_version,
            data: request.data.clone(),
        })
        .await;
    }

    // =========================================================================
    // REPORTS
    // =========================================================================

    /// The locked part of a report. Either everything applies or nothing does.
    fn settle_report(
        &self,
        node: Address,
        request_id: &RequestId,
        value: U256,
    ) -> Result<Settled, CoordinatorError> {
        let _timer = time_histogram!(FULFILLMENT_DURATION);
        let handle = self.tracker.handle(request_id)?;
        let mut request = handle.lock();
        let agreement = self
            .registry
            .agreement(&request.agreement_id)
            .ok_or(LifecycleError::UnknownAgreement(request.agreement_id))?;

        let staged = request.stage_report(&agreement, node, value)?;
        let ranked = staged.ranked_nodes().to_vec();
        let completes = staged.completes();

        let mut next = request.clone();
        let outcome = next.commit(staged)?;

        let distribution = if completes {
            Some(self.ledger.lock().distribute(
                request.id,
                &request.requester,
                request.payment,
                &ranked,
            )?)
        } else {
            None
        };

        *request = next;
        Ok(Settled {
            outcome,
            distribution,
            callback: request.callback,
        })
    }

    /// Run the consumer callback on its own task, bounded by the timeout.
    async fn deliver(&self, invocation: CallbackInvocation) -> CallbackStatus {
        let dispatcher = Arc::clone(&self.callbacks);
        let mut task = tokio::spawn(async move { dispatcher.dispatch(invocation).await });

        match tokio::time::timeout(self.config.callback_timeout, &mut task).await {
            Ok(Ok(Ok(()))) => CallbackStatus::Delivered,
            Ok(Ok(Err(CallbackError::Reverted(reason)))) => CallbackStatus::Reverted(reason),
            Ok(Ok(Err(CallbackError::MissingTarget(_)))) => CallbackStatus::MissingTarget,
            Ok(Err(join_error)) => {
                if !join_error.is_panic() {
                    warn!(error = %join_error, "callback task cancelled");
                }
                CallbackStatus::Panicked
            }
            Err(_) => {
                task.abort();
                CallbackStatus::TimedOut
            }
        }
    }
}

#[async_trait]
impl<T, D, K, P, V> OracleCoordinatorApi for OracleCoordinator<T, D, K, P, V>
where
    T: TokenLedger + 'static,
    D: CallbackDispatcher + 'static,
    K: Clock,
    P: EventPublisher,
    V: SignatureVerificationApi,
{
    #[instrument(skip(self, agreement, signatures), fields(oracles = agreement.oracles.len()))]
    async fn initiate_service_agreement(
        &self,
        agreement: ServiceAgreement,
        signatures: Vec<EcdsaSignature>,
    ) -> Result<AgreementId, CoordinatorError> {
        let oracles = agreement.oracles.clone();
        let payment = agreement.payment;

        let registration = match self.registry.register(agreement, &signatures, self.clock.now()) {
            Ok(registration) => registration,
            Err(e) => {
                metric_inc!(AGREEMENTS_REJECTED, &[e.category().as_str()]);
                warn!(error = %e, "agreement rejected");
                return Err(e.into());
            }
        };

        if registration.fresh {
            metric_inc!(AGREEMENTS_REGISTERED);
            self.emit(CoordinatorEvent::NewServiceAgreement {
                agreement_id: registration.id,
                oracles,
                payment,
            })
            .await;
        }
        Ok(registration.id)
    }

    #[instrument(skip(self, requester, request), fields(requester = %format_address(&requester)))]
    async fn oracle_request_from_balance(
        &self,
        requester: Address,
        request: PrepaidRequest,
    ) -> Result<RequestId, CoordinatorError> {
        let new = NewRequest {
            agreement_id: request.agreement_id,
            callback: request.callback,
            requester,
            paid: request.payment,
            data_version: request.data_version,
            data: request.data,
        };
        let opened = self.open_funded(new, Funding::Prepaid)?;

        self.announce_request(&opened).await;
        Ok(opened.id)
    }

    #[instrument(
        skip(self, node, request_id, value),
        fields(node = %format_address(&node), request_id = %request_id)
    )]
    async fn fulfill_oracle_request(
        &self,
        node: Address,
        request_id: RequestId,
        value: U256,
    ) -> Result<FulfillmentReceipt, CoordinatorError> {
        let settled = match self.settle_report(node, &request_id, value) {
            Ok(settled) => settled,
            Err(e) => {
                metric_inc!(REPORTS_REJECTED, &[e.category().as_str()]);
                debug!(error = %e, "report rejected");
                return Err(e);
            }
        };

        metric_inc!(REPORTS_ACCEPTED);
        let report = settled.outcome.report().clone();
        self.emit(CoordinatorEvent::ReportAccepted {
            request_id,
            node,
            rank: report.received_order,
        })
        .await;

        let (value, distribution) = match (settled.outcome, settled.distribution) {
            (FulfillmentOutcome::Fulfilled { value, .. }, Some(distribution)) => {
                (value, distribution)
            }
            _ => {
                return Ok(FulfillmentReceipt {
                    report,
                    fulfillment: None,
                })
            }
        };

        metric_inc!(REQUESTS_FULFILLED);
        PAYOUTS.inc_by(distribution.payouts.len() as f64);
        info!(%value, paid_out = %distribution.paid_out(), "request fulfilled");
        self.emit(CoordinatorEvent::RequestFulfilled { request_id, value })
            .await;

        let status = self
            .deliver(CallbackInvocation {
                target: settled.callback,
                request_id,
                value,
            })
            .await;
        if !status.is_delivered() {
            metric_inc!(CALLBACK_FAILURES, &[status.kind()]);
            warn!(status = status.kind(), "consumer callback failed");
            self.emit(CoordinatorEvent::CallbackFailed {
                request_id,
                status: status.clone(),
            })
            .await;
        }

        Ok(FulfillmentReceipt {
            report,
            fulfillment: Some(Fulfillment {
                value,
                distribution,
                callback: status,
            }),
        })
    }

    #[instrument(skip(self, account, recipient), fields(
        account = %format_address(&account),
        recipient = %format_address(&recipient)
    ))]
    async fn withdraw(
        &self,
        account: Address,
        recipient: Address,
        amount: U256,
    ) -> Result<(), CoordinatorError> {
        if let Err(e) = self.ledger.lock().withdraw(&account, amount) {
            metric_inc!(WITHDRAWALS, &["rejected"]);
            return Err(e.into());
        }

        let transfer = tokio::time::timeout(
            self.config.transfer_timeout,
            self.token
                .transfer(self.config.coordinator_account, recipient, amount),
        )
        .await;

        match transfer {
            Ok(Ok(())) => {
                metric_inc!(WITHDRAWALS, &["success"]);
                info!(%amount, "withdrawal sent");
                self.emit(CoordinatorEvent::FundsWithdrawn {
                    account,
                    recipient,
                    amount,
                })
                .await;
                Ok(())
            }
            Ok(Err(e)) => {
                metric_inc!(WITHDRAWALS, &["failed"]);
                warn!(error = %e, "withdrawal transfer failed, restoring balance");
                self.ledger.lock().restore_withdrawal(&account, amount)?;
                Err(e.into())
            }
            Err(_) => {
                metric_inc!(WITHDRAWALS, &["timed_out"]);
                error!(%amount, "withdrawal transfer timed out, balance stays debited");
                Err(CoordinatorError::TransferTimedOut { recipient, amount })
            }
        }
    }

    #[instrument(skip(self, account), fields(account = %format_address(&account)))]
    async fn release_escrow(&self, account: Address, amount: U256) -> Result<(), CoordinatorError> {
        self.ledger.lock().release(&account, amount)?;
        debug!(%amount, "escrow released");
        Ok(())
    }

    fn get_agreement(&self, id: &AgreementId) -> Result<Arc<ServiceAgreement>, CoordinatorError> {
        Ok(self.registry.get(id)?)
    }

    fn get_request(&self, id: &RequestId) -> Result<OracleRequest, CoordinatorError> {
        Ok(self.tracker.get(id)?)
    }

    fn balance_of(&self, account: &Address) -> AccountBalance {
        self.ledger.lock().balance(account)
    }
}

#[async_trait]
impl<T, D, K, P, V> TokenReceiver for OracleCoordinator<T, D, K, P, V>
where
    T: TokenLedger + 'static,
    D: CallbackDispatcher + 'static,
    K: Clock,
    P: EventPublisher,
    V: SignatureVerificationApi,
{
    #[instrument(skip(self, ticket, data), fields(ticket = ticket.id, bytes = data.len()))]
    async fn on_token_transfer(
        &self,
        ticket: TransferTicket,
        data: Vec<u8>,
    ) -> Result<(), CoordinatorError> {
        let instruction = match TransferInstruction::decode(&data) {
            Ok(instruction) => instruction,
            Err(e) => {
                metric_inc!(INBOUND_TRANSFERS, &["invalid", "rejected"]);
                warn!(error = %e, "undecodable transfer instruction");
                return Err(e);
            }
        };

        let kind = instruction.kind();
        let credited = match self.redeem(&ticket).await {
            Ok(transfer) => self.credit_inbound(transfer, instruction).await,
            Err(e) => Err(e),
        };
        match credited {
            Ok(()) => {
                metric_inc!(INBOUND_TRANSFERS, &[kind, "accepted"]);
                Ok(())
            }
            Err(e) => {
                metric_inc!(INBOUND_TRANSFERS, &[kind, "rejected"]);
                warn!(error = %e, instruction = kind, "inbound transfer rejected");
                Err(e)
            }
        }
    }
}
