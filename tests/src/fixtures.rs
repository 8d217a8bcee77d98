//! Shared setup for integration and exploit tests.

use oc_01_signature_verification::test_helpers::TestNode;
use oc_01_signature_verification::EcdsaSignature;
use oc_02_agreement_registry::{compute_agreement_id, ServiceAgreement};
use oc_03_aggregation::AggregatorKind;
use oc_04_request_lifecycle::{derive_request_id, CallbackTarget};
use oc_06_coordinator::adapters::ConsumerContract;
use oc_06_coordinator::{
    CoordinatorConfig, InMemoryCoordinator, InMemoryDeployment, OracleCoordinatorApi,
    TokenError, TokenLedger, TransferInstruction,
};
use shared_types::{Address, AgreementId, RequestId, U256};
use std::sync::{Arc, Once};

pub const NOW: u64 = 1_700_000_000;
pub const REQUESTER: Address = [0xEE; 20];
pub const CONSUMER: Address = [0xCC; 20];
pub const SELECTOR: [u8; 4] = [0x4e, 0x2e, 0x1f, 0x3a];

static LOGGING: Once = Once::new();

/// Install the log subscriber once per test binary. Output is off unless
/// `OC_CONSOLE_OUTPUT` turns it on.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let mut config = oc_telemetry::TelemetryConfig::from_env();
        if std::env::var("OC_CONSOLE_OUTPUT").is_err() {
            config.console_output = false;
        }
        // Another harness may already own the global subscriber.
        let _ = oc_telemetry::init_logging(&config);
    });
}

/// Agreement over `nodes` with the aggregator their count calls for.
pub fn agreement_for(nodes: &[TestNode], payment: U256) -> ServiceAgreement {
    ServiceAgreement {
        oracles: nodes.iter().map(|n| n.address).collect(),
        aggregator: if nodes.len() == 1 {
            AggregatorKind::PassThrough
        } else {
            AggregatorKind::Mean
        },
        payment,
        expiration_secs: U256::from(300),
        end_at: NOW + 86_400,
        request_digest: [0x5e; 32],
    }
}

/// Every node's signature over the agreement id, in oracle order.
pub fn sign_all(nodes: &[TestNode], agreement: &ServiceAgreement) -> Vec<EcdsaSignature> {
    let id = compute_agreement_id(agreement);
    nodes.iter().map(|n| n.sign_payload(id.as_bytes())).collect()
}

pub fn callback() -> CallbackTarget {
    CallbackTarget {
        address: CONSUMER,
        function_selector: SELECTOR,
    }
}

/// Payload for a transfer that opens a request, claims included.
pub fn request_payload(
    agreement_id: AgreementId,
    claimed_sender: Address,
    claimed_payment: U256,
) -> Vec<u8> {
    TransferInstruction::OracleRequest {
        claimed_sender,
        claimed_payment,
        agreement_id,
        callback: callback(),
        data_version: U256::one(),
        data: b"{\"pair\":\"ETH/USD\"}".to_vec(),
    }
    .encode()
    .expect("instruction encodes")
}

pub fn deposit_payload(claimed_account: Address, claimed_amount: U256) -> Vec<u8> {
    TransferInstruction::DepositFunds {
        claimed_account,
        claimed_amount,
    }
    .encode()
    .expect("instruction encodes")
}

/// A deployment with one registered agreement.
pub struct Scenario {
    pub deployment: InMemoryDeployment,
    pub nodes: Vec<TestNode>,
    pub agreement_id: AgreementId,
    pub payment: U256,
}

impl Scenario {
    /// Register an agreement over `node_count` fresh nodes.
    pub async fn new(node_count: u8, payment: u64) -> Self {
        Self::with_config(node_count, payment, CoordinatorConfig::default()).await
    }

    pub async fn with_config(node_count: u8, payment: u64, config: CoordinatorConfig) -> Self {
        init_test_logging();
        let deployment = InMemoryDeployment::new(config, NOW);
        let nodes: Vec<TestNode> = (1..=node_count).map(TestNode::from_seed).collect();
        let payment = U256::from(payment);
        let agreement = agreement_for(&nodes, payment);
        let signatures = sign_all(&nodes, &agreement);

        let agreement_id = deployment
            .coordinator
            .initiate_service_agreement(agreement, signatures)
            .await
            .expect("agreement registers");

        Self {
            deployment,
            nodes,
            agreement_id,
            payment,
        }
    }

    pub fn coordinator(&self) -> &Arc<InMemoryCoordinator> {
        &self.deployment.coordinator
    }

    pub fn coordinator_account(&self) -> Address {
        self.coordinator().config().coordinator_account
    }

    pub fn deploy_consumer(&self, contract: Arc<dyn ConsumerContract>) {
        self.deployment.callbacks.deploy(CONSUMER, contract);
    }

    /// Mint `amount` to `from` and send it with `payload` attached.
    pub async fn send(
        &self,
        from: Address,
        amount: U256,
        payload: Vec<u8>,
    ) -> Result<(), TokenError> {
        self.deployment.token.mint(from, amount);
        self.deployment
            .token
            .transfer_with_data(from, self.coordinator_account(), amount, payload)
            .await
    }

    /// Open a request paying exactly the agreement's payment.
    pub async fn fund_request(&self) -> RequestId {
        self.fund_request_with(REQUESTER, self.payment)
            .await
            .expect("request opens")
    }

    pub async fn fund_request_with(
        &self,
        requester: Address,
        amount: U256,
    ) -> Result<RequestId, TokenError> {
        let nonce = self.coordinator().request_count() as u64;
        self.send(
            requester,
            amount,
            request_payload(self.agreement_id, requester, amount),
        )
        .await?;
        Ok(derive_request_id(&self.agreement_id, nonce))
    }
}
