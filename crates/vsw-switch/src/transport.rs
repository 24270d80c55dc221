//! Transaction-level transport vocabulary.
//!
//! A [`Transaction`] is what travels through the switch: either an Ethernet
//! frame or a configuration-only payload addressed to a downstream driver.
//! Downstream ports report a [`ResponseStatus`] on the transaction; the
//! non-blocking discipline additionally returns a [`SyncResult`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::frame::Frame;

/// Transfer status reported by a transport target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseStatus {
    Ok,
    Incomplete,
    GenericError,
    AddressError,
    CommandError,
    BurstError,
    ByteEnableError,
}

impl ResponseStatus {
    /// Returns true for [`ResponseStatus::Ok`].
    pub fn is_ok(&self) -> bool {
        matches!(self, ResponseStatus::Ok)
    }
}

impl Default for ResponseStatus {
    /// Transactions start out incomplete until a target answers.
    fn default() -> Self {
        ResponseStatus::Incomplete
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResponseStatus::Ok => "OK",
            ResponseStatus::Incomplete => "INCOMPLETE",
            ResponseStatus::GenericError => "GENERIC_ERROR",
            ResponseStatus::AddressError => "ADDRESS_ERROR",
            ResponseStatus::CommandError => "COMMAND_ERROR",
            ResponseStatus::BurstError => "BURST_ERROR",
            ResponseStatus::ByteEnableError => "BYTE_ENABLE_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Protocol phase of a non-blocking transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    BeginRequest,
    EndRequest,
    BeginResponse,
    EndResponse,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::BeginRequest => "BEGIN_REQ",
            Phase::EndRequest => "END_REQ",
            Phase::BeginResponse => "BEGIN_RESP",
            Phase::EndResponse => "END_RESP",
        };
        write!(f, "{}", s)
    }
}

/// Synchronization result of a non-blocking call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncResult {
    /// Target accepted the phase; completion comes later.
    Accepted,
    /// Target moved the phase forward; completion comes later.
    Updated,
    /// Transfer finished within the call.
    Completed,
}

impl SyncResult {
    /// Returns true when more phase progress is needed.
    pub fn is_pending(&self) -> bool {
        !matches!(self, SyncResult::Completed)
    }
}

/// Outcome of a non-blocking delivery as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryOutcome {
    CompletedOk,
    CompletedError,
    Pending,
}

impl DeliveryOutcome {
    /// Combines a sync result with the transaction's final status.
    pub fn from_sync(sync: SyncResult, status: ResponseStatus) -> Self {
        match (sync, status.is_ok()) {
            (SyncResult::Completed, true) => DeliveryOutcome::CompletedOk,
            (SyncResult::Completed, false) => DeliveryOutcome::CompletedError,
            _ => DeliveryOutcome::Pending,
        }
    }
}

/// Configuration-only payload intended for a downstream driver component.
///
/// The switch never interprets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Free-form settings for the driver.
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

impl DriverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }
}

/// What a transaction carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Raw Ethernet frame bytes. Length is the vector length.
    Data(Vec<u8>),
    /// Configuration for a downstream driver; not a frame.
    DriverConfig(DriverConfig),
}

/// Unit of transfer between ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    payload: Payload,
    response_status: ResponseStatus,
}

impl Transaction {
    /// Creates a data transaction carrying `bytes`.
    pub fn data(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: Payload::Data(bytes.into()),
            response_status: ResponseStatus::default(),
        }
    }

    /// Creates a configuration-only transaction.
    pub fn driver_config(config: DriverConfig) -> Self {
        Self {
            payload: Payload::DriverConfig(config),
            response_status: ResponseStatus::default(),
        }
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns the frame bytes, or `None` for a configuration payload.
    pub fn data_bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Data(bytes) => Some(bytes),
            Payload::DriverConfig(_) => None,
        }
    }

    /// Returns a frame view over the data, if this is a data transaction.
    pub fn frame(&self) -> Option<Frame<'_>> {
        self.data_bytes().map(Frame::new)
    }

    pub fn is_driver_config(&self) -> bool {
        matches!(self.payload, Payload::DriverConfig(_))
    }

    pub fn response_status(&self) -> ResponseStatus {
        self.response_status
    }

    pub fn set_response_status(&mut self, status: ResponseStatus) {
        self.response_status = status;
    }
}
