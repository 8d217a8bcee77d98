//! # Agreement Identity
//!
//! The id is keccak256 over fixed-width 32-byte words, so any client can
//! rebuild it byte-for-byte:
//!
//! ```text
//! payment || expiration_secs || end_at || oracle_1 .. oracle_n || request_digest || aggregator_tag
//! ```
//!
//! Integers are big-endian; addresses are left-padded with zeros.

use super::entities::ServiceAgreement;
use oc_01_signature_verification::keccak256;
use shared_types::{Address, AgreementId, U256};

const WORD: usize = 32;

fn u256_word(value: U256) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    value.to_big_endian(&mut word);
    word
}

fn address_word(address: &Address) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - address.len()..].copy_from_slice(address);
    word
}

/// Content-addressed id of an agreement.
pub fn compute_agreement_id(agreement: &ServiceAgreement) -> AgreementId {
    let mut preimage = Vec::with_capacity(WORD * (agreement.oracles.len() + 5));
    preimage.extend_from_slice(&u256_word(agreement.payment));
    preimage.extend_from_slice(&u256_word(agreement.expiration_secs));
    preimage.extend_from_slice(&u256_word(U256::from(agreement.end_at)));
    for oracle in &agreement.oracles {
        preimage.extend_from_slice(&address_word(oracle));
    }
    preimage.extend_from_slice(&agreement.request_digest);
    preimage.extend_from_slice(&u256_word(U256::from(agreement.aggregator.tag())));

    AgreementId(keccak256(&preimage))
}
