//! # Malicious Consumers
//!
//! A consumer's callback is the one piece of foreign code the coordinator
//! runs. Whatever it does, the request must end fulfilled and the nodes
//! paid:
//!
//! - **Revert**: returns an error
//! - **Panic**: unwinds inside the callback
//! - **Hang**: never returns
//! - **Re-entrancy**: calls back into the coordinator mid-callback
//! - **Self-destruct**: vanishes before the answer arrives

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use async_trait::async_trait;
    use oc_04_request_lifecycle::{LifecycleError, RequestState};
    use oc_06_coordinator::adapters::ConsumerContract;
    use oc_06_coordinator::{
        CallbackStatus, CoordinatorConfig, CoordinatorError, CoordinatorEvent,
        InMemoryCoordinator, OracleCoordinatorApi,
    };
    use parking_lot::Mutex;
    use shared_types::{Address, RequestId, U256};
    use std::sync::{Arc, Weak};
    use std::time::Duration;

    struct Reverting;

    #[async_trait]
    impl ConsumerContract for Reverting {
        async fn fulfill(&self, _: [u8; 4], _: RequestId, _: U256) -> Result<(), String> {
            Err("require(false)".into())
        }
    }

    struct Panicking;

    #[async_trait]
    impl ConsumerContract for Panicking {
        async fn fulfill(&self, _: [u8; 4], _: RequestId, _: U256) -> Result<(), String> {
            panic!("consumer blew up");
        }
    }

    struct Hanging;

    #[async_trait]
    impl ConsumerContract for Hanging {
        async fn fulfill(&self, _: [u8; 4], _: RequestId, _: U256) -> Result<(), String> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    /// Tries to report again and to drain the requester from inside the callback.
    struct Reentrant {
        coordinator: Mutex<Weak<InMemoryCoordinator>>,
        node: Address,
        outcomes: Mutex<Vec<Result<(), CoordinatorError>>>,
    }

    #[async_trait]
    impl ConsumerContract for Reentrant {
        async fn fulfill(&self, _: [u8; 4], request_id: RequestId, _: U256) -> Result<(), String> {
            let Some(coordinator) = self.coordinator.lock().upgrade() else {
                return Err("coordinator gone".into());
            };

            let again = coordinator
                .fulfill_oracle_request(self.node, request_id, U256::from(1))
                .await
                .map(|_| ());
            let drain = coordinator
                .withdraw(REQUESTER, [0xBA; 20], U256::one())
                .await;

            let mut outcomes = self.outcomes.lock();
            outcomes.push(again);
            outcomes.push(drain);
            Ok(())
        }
    }

    /// Fulfil a one-node request and check the settlement survived.
    async fn fulfil_against(scenario: &Scenario) -> CallbackStatus {
        let request_id = scenario.fund_request().await;
        let node = scenario.nodes[0].address;

        let receipt = scenario
            .coordinator()
            .fulfill_oracle_request(node, request_id, U256::from(42))
            .await
            .expect("report accepted whatever the consumer does");

        let request = scenario.coordinator().get_request(&request_id).unwrap();
        assert_eq!(request.state, RequestState::Fulfilled);
        assert_eq!(
            scenario.coordinator().balance_of(&node).withdrawable,
            scenario.payment
        );
        scenario.coordinator().check_solvency().await.unwrap();

        receipt.fulfillment.unwrap().callback
    }

    #[tokio::test]
    async fn test_reverting_consumer_cannot_block_payment() {
        let scenario = Scenario::new(1, 10).await;
        scenario.deploy_consumer(Arc::new(Reverting));
        let mut events = scenario.deployment.events.subscribe();

        let status = fulfil_against(&scenario).await;
        assert_eq!(status, CallbackStatus::Reverted("require(false)".into()));
        assert!(events.drain().iter().any(|e| matches!(
            e,
            CoordinatorEvent::CallbackFailed { status: CallbackStatus::Reverted(_), .. }
        )));
    }

    #[tokio::test]
    async fn test_panicking_consumer_is_contained() {
        let scenario = Scenario::new(1, 10).await;
        scenario.deploy_consumer(Arc::new(Panicking));

        assert_eq!(fulfil_against(&scenario).await, CallbackStatus::Panicked);
    }

    #[tokio::test]
    async fn test_hanging_consumer_is_cut_off() {
        let config = CoordinatorConfig {
            callback_timeout: Duration::from_millis(50),
            ..CoordinatorConfig::default()
        };
        let scenario = Scenario::with_config(1, 10, config).await;
        scenario.deploy_consumer(Arc::new(Hanging));

        let status = tokio::time::timeout(Duration::from_secs(5), fulfil_against(&scenario))
            .await
            .expect("fulfillment returns despite the hang");
        assert_eq!(status, CallbackStatus::TimedOut);
    }

    #[tokio::test]
    async fn test_reentrant_consumer_sees_settled_state() {
        let scenario = Scenario::new(1, 10).await;
        let consumer = Arc::new(Reentrant {
            coordinator: Mutex::new(Arc::downgrade(scenario.coordinator())),
            node: scenario.nodes[0].address,
            outcomes: Mutex::new(Vec::new()),
        });
        scenario.deploy_consumer(consumer.clone());

        assert_eq!(fulfil_against(&scenario).await, CallbackStatus::Delivered);

        let outcomes = consumer.outcomes.lock();
        assert!(matches!(
            outcomes[0],
            Err(CoordinatorError::Lifecycle(LifecycleError::RequestClosed(_)))
        ));
        assert!(matches!(outcomes[1], Err(CoordinatorError::Settlement(_))));
    }

    #[tokio::test]
    async fn test_self_destructed_consumer_still_settles() {
        let scenario = Scenario::new(1, 10).await;
        scenario.deploy_consumer(Arc::new(Reverting));
        assert!(scenario.deployment.callbacks.destruct(&CONSUMER));

        assert_eq!(fulfil_against(&scenario).await, CallbackStatus::MissingTarget);
    }
}
