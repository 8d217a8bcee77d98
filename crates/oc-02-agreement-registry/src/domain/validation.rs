//! Structural checks that need no cryptography and no clock.

use super::entities::{RegistryConfig, ServiceAgreement};
use super::errors::RegistryError;
use shared_types::{U256, ZERO_ADDRESS};
use std::collections::HashSet;

/// Reject malformed agreements before any signature work.
pub fn validate_structure(
    agreement: &ServiceAgreement,
    signature_count: usize,
    config: &RegistryConfig,
) -> Result<(), RegistryError> {
    let n = agreement.oracles.len();

    if n == 0 {
        return Err(RegistryError::EmptyOracleSet);
    }
    if n > config.max_oracles {
        return Err(RegistryError::TooManyOracles {
            count: n,
            max: config.max_oracles,
        });
    }

    let mut seen = HashSet::with_capacity(n);
    for oracle in &agreement.oracles {
        if *oracle == ZERO_ADDRESS {
            return Err(RegistryError::ZeroAddressOracle);
        }
        if !seen.insert(oracle) {
            return Err(RegistryError::DuplicateOracle(*oracle));
        }
    }

    if signature_count != n {
        return Err(RegistryError::SignatureCountMismatch {
            oracles: n,
            signatures: signature_count,
        });
    }

    agreement.aggregator.validate_oracle_count(n)?;

    // Rank n's weight is 1 part in n², so anything less pays it zero
    let minimum = U256::from(n) * U256::from(n);
    if agreement.payment < minimum {
        return Err(RegistryError::PaymentTooSmall {
            payment: agreement.payment,
            minimum,
        });
    }

    Ok(())
}

/// `end_at` must be strictly after `now`.
pub fn check_not_expired(agreement: &ServiceAgreement, now: u64) -> Result<(), RegistryError> {
    if agreement.end_at > now {
        Ok(())
    } else {
        Err(RegistryError::ExpiredAgreement {
            end_at: agreement.end_at,
            now,
        })
    }
}
