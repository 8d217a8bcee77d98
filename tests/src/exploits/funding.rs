//! # Funding Attacks
//!
//! The instruction attached to a transfer carries sender and amount fields
//! that anyone can fill in. Only the token ledger's own figures may reach
//! the books.
//!
//! - **Inflated payment claim**: claims more than was sent
//! - **Deposit to someone else**: names a victim's account
//! - **Forged notification**: calls the hook without moving tokens
//! - **Surplus grab**: claims tokens sent to the coordinator without a hook
//! - **Hook-window race**: calls the hook while a victim's transfer is in flight
//! - **Garbage payload**: undecodable instruction

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use async_trait::async_trait;
    use oc_06_coordinator::{
        CoordinatorError, InMemoryCoordinator, OracleCoordinatorApi, TokenError, TokenLedger,
        TokenReceiver, TransferTicket,
    };
    use parking_lot::Mutex;
    use shared_types::U256;
    use std::sync::{Arc, Weak};

    const ATTACKER: [u8; 20] = [0xAD; 20];
    const VICTIM: [u8; 20] = [0x1C; 20];

    fn guessed_ticket(id: u64) -> TransferTicket {
        TransferTicket {
            id,
            nonce: [0; 32],
        }
    }

    /// Sits in front of the coordinator's hook and lets the attacker act
    /// while a victim's transfer is in flight. The attacker knows the
    /// ticket id, which is sequential, but never sees the nonce.
    struct HookWindow {
        coordinator: Arc<InMemoryCoordinator>,
        attacker_result: Mutex<Option<Result<(), CoordinatorError>>>,
    }

    #[async_trait]
    impl TokenReceiver for HookWindow {
        async fn on_token_transfer(
            &self,
            ticket: TransferTicket,
            data: Vec<u8>,
        ) -> Result<(), CoordinatorError> {
            let stolen = self
                .coordinator
                .on_token_transfer(
                    guessed_ticket(ticket.id),
                    deposit_payload(ATTACKER, U256::from(100)),
                )
                .await;
            *self.attacker_result.lock() = Some(stolen);
            self.coordinator.on_token_transfer(ticket, data).await
        }
    }

    #[tokio::test]
    async fn test_inflated_claim_records_actual_payment() {
        let scenario = Scenario::new(1, 100).await;
        let nonce = scenario.coordinator().request_count() as u64;

        scenario
            .send(
                ATTACKER,
                U256::from(100),
                request_payload(scenario.agreement_id, ATTACKER, U256::from(1_000_000)),
            )
            .await
            .unwrap();

        let request_id =
            oc_04_request_lifecycle::derive_request_id(&scenario.agreement_id, nonce);
        let request = scenario.coordinator().get_request(&request_id).unwrap();
        assert_eq!(request.payment, U256::from(100));
        assert_eq!(
            scenario.coordinator().balance_of(&ATTACKER).escrowed,
            U256::from(100)
        );
    }

    #[tokio::test]
    async fn test_underpayment_with_big_claim_is_reverted() {
        let scenario = Scenario::new(1, 100).await;

        let err = scenario
            .send(
                ATTACKER,
                U256::from(1),
                request_payload(scenario.agreement_id, ATTACKER, U256::from(100)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, TokenError::ReceiverRejected(_)));
        assert_eq!(scenario.coordinator().request_count(), 0);
        assert_eq!(
            scenario.deployment.token.balance_of(ATTACKER).await.unwrap(),
            U256::from(1)
        );
        scenario.coordinator().check_solvency().await.unwrap();
    }

    #[tokio::test]
    async fn test_claimed_requester_cannot_be_impersonated() {
        let scenario = Scenario::new(1, 100).await;

        scenario
            .send(
                ATTACKER,
                U256::from(100),
                request_payload(scenario.agreement_id, VICTIM, U256::from(100)),
            )
            .await
            .unwrap();

        assert!(scenario.coordinator().balance_of(&VICTIM).escrowed.is_zero());
        assert_eq!(
            scenario.coordinator().balance_of(&ATTACKER).committed,
            U256::from(100)
        );
    }

    #[tokio::test]
    async fn test_deposit_credits_sender_not_claimed_account() {
        let scenario = Scenario::new(1, 100).await;

        scenario
            .send(ATTACKER, U256::from(5), deposit_payload(VICTIM, U256::from(5_000)))
            .await
            .unwrap();

        assert!(scenario.coordinator().balance_of(&VICTIM).withdrawable.is_zero());
        assert_eq!(
            scenario.coordinator().balance_of(&ATTACKER).withdrawable,
            U256::from(5)
        );
        scenario.coordinator().check_solvency().await.unwrap();
    }

    #[tokio::test]
    async fn test_forged_notification_without_tokens() {
        let scenario = Scenario::new(1, 100).await;

        let err = scenario
            .coordinator()
            .on_token_transfer(guessed_ticket(0), deposit_payload(ATTACKER, U256::from(1_000)))
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::UnverifiedTransfer { .. }));

        let err = scenario
            .coordinator()
            .on_token_transfer(
                guessed_ticket(1),
                request_payload(scenario.agreement_id, ATTACKER, U256::from(100)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::UnverifiedTransfer { .. }));
        assert_eq!(scenario.coordinator().request_count(), 0);
    }

    #[tokio::test]
    async fn test_forged_notification_cannot_claim_existing_funds() {
        let scenario = Scenario::new(1, 100).await;
        scenario
            .send(VICTIM, U256::from(100), deposit_payload(VICTIM, U256::from(100)))
            .await
            .unwrap();

        // The victim's ticket was id 0 and is spent.
        for id in 0..4 {
            let err = scenario
                .coordinator()
                .on_token_transfer(guessed_ticket(id), deposit_payload(ATTACKER, U256::from(100)))
                .await
                .unwrap_err();
            assert!(matches!(err, CoordinatorError::UnverifiedTransfer { .. }));
        }
        assert!(scenario.coordinator().balance_of(&ATTACKER).withdrawable.is_zero());
        assert_eq!(
            scenario.coordinator().balance_of(&VICTIM).withdrawable,
            U256::from(100)
        );
    }

    #[tokio::test]
    async fn test_plain_transfer_surplus_cannot_be_claimed() {
        let scenario = Scenario::new(1, 100).await;
        scenario.deployment.token.mint(VICTIM, U256::from(100));
        scenario
            .deployment
            .token
            .transfer(VICTIM, scenario.coordinator_account(), U256::from(100))
            .await
            .unwrap();

        let err = scenario
            .coordinator()
            .on_token_transfer(guessed_ticket(0), deposit_payload(ATTACKER, U256::from(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::UnverifiedTransfer { .. }));
        assert!(scenario.coordinator().balance_of(&ATTACKER).withdrawable.is_zero());

        let solvency = scenario.coordinator().check_solvency().await.unwrap();
        assert!(solvency.held.is_zero());
        assert_eq!(solvency.surplus(), U256::from(100));
    }

    #[tokio::test]
    async fn test_hook_window_race_cannot_steal_transfer() {
        let scenario = Scenario::new(1, 100).await;
        let window = Arc::new(HookWindow {
            coordinator: Arc::clone(scenario.coordinator()),
            attacker_result: Mutex::new(None),
        });
        let weak = Arc::downgrade(&window);
        let receiver: Weak<dyn TokenReceiver> = weak;
        scenario
            .deployment
            .token
            .register_receiver(scenario.coordinator_account(), receiver);

        scenario
            .send(VICTIM, U256::from(100), deposit_payload(VICTIM, U256::from(100)))
            .await
            .unwrap();

        let attacker_result = window.attacker_result.lock().take().unwrap();
        assert!(matches!(
            attacker_result,
            Err(CoordinatorError::UnverifiedTransfer { ticket: 0 })
        ));
        assert!(scenario.coordinator().balance_of(&ATTACKER).withdrawable.is_zero());
        assert_eq!(
            scenario.coordinator().balance_of(&VICTIM).withdrawable,
            U256::from(100)
        );

        let solvency = scenario.coordinator().check_solvency().await.unwrap();
        assert_eq!(solvency.held, U256::from(100));
        assert_eq!(solvency.token_balance, U256::from(100));
        assert_eq!(scenario.deployment.token.outstanding_tickets(), 0);
    }

    #[tokio::test]
    async fn test_garbage_payload_is_returned() {
        let scenario = Scenario::new(1, 100).await;

        let err = scenario
            .send(ATTACKER, U256::from(7), b"not an instruction".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::ReceiverRejected(_)));
        assert_eq!(
            scenario.deployment.token.balance_of(ATTACKER).await.unwrap(),
            U256::from(7)
        );
    }

    #[tokio::test]
    async fn test_unknown_agreement_is_returned() {
        let scenario = Scenario::new(1, 100).await;
        let bogus = shared_types::AgreementId([0x99; 32]);

        let payload = request_payload(bogus, ATTACKER, U256::from(100));
        assert!(scenario.send(ATTACKER, U256::from(100), payload).await.is_err());
        assert!(scenario.coordinator().balance_of(&ATTACKER).escrowed.is_zero());
    }
}
