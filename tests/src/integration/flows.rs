//! # Request Flows
//!
//! 1. **Register → fund → report → fulfill** with one and three nodes
//! 2. **Order-weighted settlement**: 5P/9, 3P/9, P/9 for three nodes
//! 3. **Withdrawal** of earned funds through the token ledger
//! 4. **Prepaid requests** from a deposit
//! 5. **Refusals** leave every balance untouched

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use async_trait::async_trait;
    use oc_01_signature_verification::test_helpers::TestNode;
    use oc_02_agreement_registry::RegistryError;
    use oc_04_request_lifecycle::{LifecycleError, RequestState};
    use oc_06_coordinator::adapters::ConsumerContract;
    use oc_06_coordinator::{
        CallbackStatus, CoordinatorError, CoordinatorEvent, OracleCoordinatorApi,
        PrepaidRequest, TokenLedger,
    };
    use parking_lot::Mutex;
    use shared_types::{RequestId, U256};
    use std::sync::Arc;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Consumer that records every value it receives.
    #[derive(Default)]
    struct RecordingConsumer {
        received: Mutex<Vec<(RequestId, U256)>>,
    }

    #[async_trait]
    impl ConsumerContract for RecordingConsumer {
        async fn fulfill(
            &self,
            selector: [u8; 4],
            request_id: RequestId,
            value: U256,
        ) -> Result<(), String> {
            if selector != SELECTOR {
                return Err("unknown selector".into());
            }
            self.received.lock().push((request_id, value));
            Ok(())
        }
    }

    // =============================================================================
    // HAPPY PATHS
    // =============================================================================

    #[tokio::test]
    async fn test_single_node_request_is_answered_and_paid() {
        let scenario = Scenario::new(1, 100).await;
        let consumer = Arc::new(RecordingConsumer::default());
        scenario.deploy_consumer(consumer.clone());
        let node = &scenario.nodes[0];

        let request_id = scenario.fund_request().await;
        let receipt = scenario
            .coordinator()
            .fulfill_oracle_request(node.address, request_id, U256::from(3_150))
            .await
            .unwrap();

        assert!(receipt.is_fulfilled());
        assert_eq!(receipt.report.received_order, 1);
        assert_eq!(
            consumer.received.lock().as_slice(),
            &[(request_id, U256::from(3_150))]
        );

        let request = scenario.coordinator().get_request(&request_id).unwrap();
        assert_eq!(request.state, RequestState::Fulfilled);
        assert_eq!(request.answer, Some(U256::from(3_150)));
        assert_eq!(
            scenario.coordinator().balance_of(&node.address).withdrawable,
            U256::from(100)
        );
        assert!(scenario.coordinator().balance_of(&REQUESTER).escrowed.is_zero());
        scenario.coordinator().check_solvency().await.unwrap();
    }

    #[tokio::test]
    async fn test_three_nodes_split_by_report_order() {
        let scenario = Scenario::new(3, 900).await;
        let consumer = Arc::new(RecordingConsumer::default());
        scenario.deploy_consumer(consumer.clone());
        let request_id = scenario.fund_request().await;
        let (a, b, c) = (&scenario.nodes[0], &scenario.nodes[1], &scenario.nodes[2]);
        let coordinator = scenario.coordinator();

        // Reported in the order C, A, B. Until B reports nothing is paid or delivered.
        for (node, value) in [(c, 30u64), (a, 10)] {
            let receipt = coordinator
                .fulfill_oracle_request(node.address, request_id, U256::from(value))
                .await
                .unwrap();
            assert!(!receipt.is_fulfilled());
            assert!(consumer.received.lock().is_empty());
            for n in &scenario.nodes {
                assert!(coordinator.balance_of(&n.address).withdrawable.is_zero());
            }
            let requester = coordinator.balance_of(&REQUESTER);
            assert_eq!(requester.committed, U256::from(900));
            assert_eq!(requester.escrowed, U256::from(900));
            assert!(coordinator.get_request(&request_id).unwrap().is_open());
        }

        let receipt = coordinator
            .fulfill_oracle_request(b.address, request_id, U256::from(20))
            .await
            .unwrap();
        assert!(receipt.is_fulfilled());
        assert_eq!(
            consumer.received.lock().as_slice(),
            &[(request_id, U256::from(20))]
        );

        assert_eq!(coordinator.balance_of(&c.address).withdrawable, U256::from(500));
        assert_eq!(coordinator.balance_of(&a.address).withdrawable, U256::from(300));
        assert_eq!(coordinator.balance_of(&b.address).withdrawable, U256::from(100));
        assert!(coordinator.balance_of(&REQUESTER).committed.is_zero());
        assert_eq!(
            coordinator.get_request(&request_id).unwrap().answer,
            Some(U256::from(20))
        );
        coordinator.check_solvency().await.unwrap();
    }

    #[tokio::test]
    async fn test_split_remainder_stays_releasable_with_requester() {
        let scenario = Scenario::new(3, 1_000).await;
        scenario.deploy_consumer(Arc::new(RecordingConsumer::default()));
        let request_id = scenario.fund_request().await;

        let mut last = None;
        for node in &scenario.nodes {
            last = Some(
                scenario
                    .coordinator()
                    .fulfill_oracle_request(node.address, request_id, U256::from(7))
                    .await
                    .unwrap(),
            );
        }

        let fulfillment = last.unwrap().fulfillment.unwrap();
        let amounts: Vec<U256> = fulfillment
            .distribution
            .payouts
            .iter()
            .map(|p| p.amount)
            .collect();
        assert_eq!(amounts, vec![U256::from(555), U256::from(333), U256::from(111)]);
        assert_eq!(fulfillment.distribution.remainder, U256::one());

        let requester = scenario.coordinator().balance_of(&REQUESTER);
        assert_eq!(requester.escrowed, U256::one());
        assert!(requester.committed.is_zero());

        scenario
            .coordinator()
            .release_escrow(REQUESTER, U256::one())
            .await
            .unwrap();
        scenario
            .coordinator()
            .withdraw(REQUESTER, REQUESTER, U256::one())
            .await
            .unwrap();
        scenario.coordinator().check_solvency().await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_report_changes_nothing() {
        let scenario = Scenario::new(3, 900).await;
        scenario.deploy_consumer(Arc::new(RecordingConsumer::default()));
        let request_id = scenario.fund_request().await;
        let coordinator = scenario.coordinator();
        let (a, b, c) = (&scenario.nodes[0], &scenario.nodes[1], &scenario.nodes[2]);

        coordinator
            .fulfill_oracle_request(a.address, request_id, U256::from(1))
            .await
            .unwrap();
        coordinator
            .fulfill_oracle_request(b.address, request_id, U256::from(2))
            .await
            .unwrap();
        let before = coordinator.get_request(&request_id).unwrap();

        let err = coordinator
            .fulfill_oracle_request(b.address, request_id, U256::from(999))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoordinatorError::Lifecycle(LifecycleError::DuplicateReport { .. })
        ));
        assert_eq!(coordinator.get_request(&request_id).unwrap(), before);

        let receipt = coordinator
            .fulfill_oracle_request(c.address, request_id, U256::from(3))
            .await
            .unwrap();
        assert_eq!(receipt.report.received_order, 3);
        assert_eq!(receipt.fulfillment.unwrap().value, U256::from(2));
    }

    #[tokio::test]
    async fn test_report_after_fulfillment_is_refused() {
        let scenario = Scenario::new(1, 10).await;
        scenario.deploy_consumer(Arc::new(RecordingConsumer::default()));
        let request_id = scenario.fund_request().await;
        let node = &scenario.nodes[0];

        scenario
            .coordinator()
            .fulfill_oracle_request(node.address, request_id, U256::from(1))
            .await
            .unwrap();
        let err = scenario
            .coordinator()
            .fulfill_oracle_request(node.address, request_id, U256::from(2))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CoordinatorError::Lifecycle(LifecycleError::RequestClosed(_))
        ));
        assert_eq!(
            scenario.coordinator().balance_of(&node.address).withdrawable,
            U256::from(10)
        );
    }

    #[tokio::test]
    async fn test_events_follow_the_lifecycle() {
        let scenario = Scenario::new(2, 40).await;
        scenario.deploy_consumer(Arc::new(RecordingConsumer::default()));
        let mut events = scenario.deployment.events.subscribe();

        let request_id = scenario.fund_request().await;
        for node in &scenario.nodes {
            scenario
                .coordinator()
                .fulfill_oracle_request(node.address, request_id, U256::from(5))
                .await
                .unwrap();
        }

        let events = events.drain();
        let names: Vec<_> = events.iter().map(|e| e.name()).collect();
        assert_eq!(
            names,
            vec!["OracleRequest", "ReportAccepted", "ReportAccepted", "RequestFulfilled"]
        );
        assert!(events.iter().all(|e| e.request_id() == Some(request_id)));
        assert!(matches!(
            &events[0],
            CoordinatorEvent::OracleRequest { payment, requester, .. }
                if *payment == U256::from(40) && *requester == REQUESTER
        ));
    }

    // =============================================================================
    // FUNDS IN AND OUT
    // =============================================================================

    #[tokio::test]
    async fn test_withdraw_moves_tokens_to_recipient() {
        let scenario = Scenario::new(1, 50).await;
        scenario.deploy_consumer(Arc::new(RecordingConsumer::default()));
        let request_id = scenario.fund_request().await;
        let node = &scenario.nodes[0];
        let cold_wallet = [0x77; 20];

        scenario
            .coordinator()
            .fulfill_oracle_request(node.address, request_id, U256::from(1))
            .await
            .unwrap();
        scenario
            .coordinator()
            .withdraw(node.address, cold_wallet, U256::from(30))
            .await
            .unwrap();

        let token = &scenario.deployment.token;
        assert_eq!(token.balance_of(cold_wallet).await.unwrap(), U256::from(30));
        assert_eq!(
            token.balance_of(scenario.coordinator_account()).await.unwrap(),
            U256::from(20)
        );
        assert_eq!(
            scenario.coordinator().balance_of(&node.address).withdrawable,
            U256::from(20)
        );

        let err = scenario
            .coordinator()
            .withdraw(node.address, cold_wallet, U256::from(21))
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::Settlement(_)));
        scenario.coordinator().check_solvency().await.unwrap();
    }

    #[tokio::test]
    async fn test_prepaid_request_from_deposit() {
        let scenario = Scenario::new(1, 60).await;
        scenario.deploy_consumer(Arc::new(RecordingConsumer::default()));
        scenario
            .send(REQUESTER, U256::from(100), deposit_payload(REQUESTER, U256::from(100)))
            .await
            .unwrap();

        let request_id = scenario
            .coordinator()
            .oracle_request_from_balance(
                REQUESTER,
                PrepaidRequest {
                    agreement_id: scenario.agreement_id,
                    callback: callback(),
                    payment: U256::from(60),
                    data_version: U256::one(),
                    data: vec![],
                },
            )
            .await
            .unwrap();

        // Committed escrow cannot be pulled back while the request is open.
        assert!(scenario
            .coordinator()
            .release_escrow(REQUESTER, U256::from(60))
            .await
            .is_err());

        scenario
            .coordinator()
            .fulfill_oracle_request(scenario.nodes[0].address, request_id, U256::from(8))
            .await
            .unwrap();

        let requester = scenario.coordinator().balance_of(&REQUESTER);
        assert_eq!(requester.withdrawable, U256::from(40));
        assert!(requester.escrowed.is_zero());
        scenario.coordinator().check_solvency().await.unwrap();
    }

    #[tokio::test]
    async fn test_prepaid_request_needs_balance() {
        let scenario = Scenario::new(1, 60).await;
        let err = scenario
            .coordinator()
            .oracle_request_from_balance(
                REQUESTER,
                PrepaidRequest {
                    agreement_id: scenario.agreement_id,
                    callback: callback(),
                    payment: U256::from(60),
                    data_version: U256::one(),
                    data: vec![],
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CoordinatorError::Settlement(_)));
        assert_eq!(scenario.coordinator().request_count(), 0);
    }

    // =============================================================================
    // AGREEMENTS
    // =============================================================================

    #[tokio::test]
    async fn test_expired_agreement_is_refused() {
        let scenario = Scenario::new(1, 10).await;
        let nodes = vec![TestNode::from_seed(40)];
        let mut agreement = agreement_for(&nodes, U256::from(10));
        agreement.end_at = NOW;
        let signatures = sign_all(&nodes, &agreement);

        let err = scenario
            .coordinator()
            .initiate_service_agreement(agreement, signatures)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoordinatorError::Registry(RegistryError::ExpiredAgreement { .. })
        ));
    }

    #[tokio::test]
    async fn test_agreement_expires_with_the_clock() {
        let scenario = Scenario::new(1, 10).await;
        let nodes = vec![TestNode::from_seed(41)];
        let agreement = agreement_for(&nodes, U256::from(10));
        let signatures = sign_all(&nodes, &agreement);

        scenario.deployment.clock.set(agreement.end_at + 1);
        assert!(scenario
            .coordinator()
            .initiate_service_agreement(agreement, signatures)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_resubmitted_agreement_is_idempotent() {
        let scenario = Scenario::new(2, 40).await;
        let mut events = scenario.deployment.events.subscribe();
        let agreement = agreement_for(&scenario.nodes, U256::from(40));
        let signatures = sign_all(&scenario.nodes, &agreement);

        let id = scenario
            .coordinator()
            .initiate_service_agreement(agreement.clone(), signatures)
            .await
            .unwrap();

        assert_eq!(id, scenario.agreement_id);
        assert_eq!(scenario.coordinator().compute_agreement_id(&agreement), id);
        assert!(events.drain().is_empty());
    }

    #[tokio::test]
    async fn test_callback_status_reported_when_consumer_missing() {
        let scenario = Scenario::new(1, 10).await;
        let request_id = scenario.fund_request().await;

        let receipt = scenario
            .coordinator()
            .fulfill_oracle_request(scenario.nodes[0].address, request_id, U256::from(4))
            .await
            .unwrap();
        assert_eq!(
            receipt.fulfillment.unwrap().callback,
            CallbackStatus::MissingTarget
        );
    }
}
