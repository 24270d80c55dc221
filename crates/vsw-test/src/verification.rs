//! Verification helpers for testing the switch
//!
//! Provides assertion helpers to verify learning-table state and downstream
//! delivery

use thiserror::Error;
use vsw_switch::EthSoftSwitch;
use vsw_types::{MacAddress, PortIndex};

use crate::ports::CallLog;

/// Verification error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Expected {address} learned on port {expected}, found {actual:?}")]
    PortMismatch {
        address: MacAddress,
        expected: PortIndex,
        actual: Option<PortIndex>,
    },

    #[error("Expected {address} not to be learned, found on port {actual}")]
    UnexpectedEntry {
        address: MacAddress,
        actual: PortIndex,
    },

    #[error("Expected {expected} table entries, found {actual}")]
    TableSizeMismatch { expected: usize, actual: usize },

    #[error("Expected delivery to ports {expected:?}, got {actual:?}")]
    DeliveryMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Learning table verification helper
pub struct TableVerifier<'a> {
    switch: &'a EthSoftSwitch,
}

impl<'a> TableVerifier<'a> {
    pub fn new(switch: &'a EthSoftSwitch) -> Self {
        Self { switch }
    }

    /// Verify that `address` resolves to `port`
    pub fn assert_learned(&self, address: MacAddress, port: usize) -> VerifyResult<()> {
        let expected = PortIndex::new(port);
        match self.switch.port_of(&address) {
            Some(actual) if actual == expected => Ok(()),
            actual => Err(VerificationError::PortMismatch {
                address,
                expected,
                actual,
            }),
        }
    }

    /// Verify that `address` is unknown
    pub fn assert_not_learned(&self, address: MacAddress) -> VerifyResult<()> {
        match self.switch.port_of(&address) {
            None => Ok(()),
            Some(actual) => Err(VerificationError::UnexpectedEntry { address, actual }),
        }
    }

    /// Verify the number of table entries
    pub fn assert_len(&self, expected: usize) -> VerifyResult<()> {
        let actual = self.switch.table().len();
        if actual != expected {
            return Err(VerificationError::TableSizeMismatch { expected, actual });
        }
        Ok(())
    }
}

/// Downstream delivery verification helper
pub struct DeliveryVerifier<'a> {
    log: &'a CallLog,
}

impl<'a> DeliveryVerifier<'a> {
    pub fn new(log: &'a CallLog) -> Self {
        Self { log }
    }

    /// Verify the exact ports called so far, in order
    pub fn assert_delivered_to(&self, expected: &[usize]) -> VerifyResult<()> {
        let actual = self.log.ports();
        if actual != expected {
            return Err(VerificationError::DeliveryMismatch {
                expected: expected.to_vec(),
                actual,
            });
        }
        Ok(())
    }

    /// Verify that no port was called
    pub fn assert_nothing_delivered(&self) -> VerifyResult<()> {
        self.assert_delivered_to(&[])
    }
}
