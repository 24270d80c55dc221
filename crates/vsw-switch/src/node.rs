//! Virtual end node.
//!
//! A [`VirtualNode`] terminates a switch port: it accepts every frame,
//! answers OK (or `Completed` on the non-blocking path) and keeps what it
//! received for later inspection.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::debug;
use vsw_types::MacAddress;

use crate::port::TransmitPort;
use crate::transport::{Phase, ResponseStatus, SyncResult, Transaction};

/// A frame as delivered to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFrame {
    pub bytes: Vec<u8>,
    pub blocking: bool,
}

impl ReceivedFrame {
    pub fn source(&self) -> Option<MacAddress> {
        crate::frame::Frame::new(&self.bytes).source()
    }
}

#[derive(Debug)]
pub struct VirtualNode {
    name: String,
    address: Option<MacAddress>,
    received: Mutex<Vec<ReceivedFrame>>,
}

impl VirtualNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            received: Mutex::new(Vec::new()),
        }
    }

    /// Node owning `address`; frames addressed elsewhere are still kept but
    /// logged as passing traffic.
    pub fn with_address(name: impl Into<String>, address: MacAddress) -> Self {
        Self {
            address: Some(address),
            ..Self::new(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Option<MacAddress> {
        self.address
    }

    /// Frames received so far, in arrival order.
    pub fn received(&self) -> Vec<ReceivedFrame> {
        self.received.lock().clone()
    }

    pub fn received_count(&self) -> usize {
        self.received.lock().len()
    }

    pub fn clear(&self) {
        self.received.lock().clear();
    }

    fn accept(&self, trans: &mut Transaction, blocking: bool) {
        if let Some(frame) = trans.frame() {
            let for_us = match (self.address, frame.destination()) {
                (Some(own), Some(dst)) => own == dst || dst.is_multicast(),
                _ => true,
            };
            debug!(
                "{} received {}{}",
                self.name,
                frame,
                if for_us { "" } else { " (not addressed here)" }
            );
            self.received.lock().push(ReceivedFrame {
                bytes: frame.as_bytes().to_vec(),
                blocking,
            });
        }
        trans.set_response_status(ResponseStatus::Ok);
    }
}

#[async_trait]
impl TransmitPort for VirtualNode {
    async fn blocking_transfer(&self, trans: &mut Transaction, _delay: &mut Duration) {
        self.accept(trans, true);
    }

    fn non_blocking_transfer(
        &self,
        trans: &mut Transaction,
        _phase: &mut Phase,
        _delay: &mut Duration,
    ) -> SyncResult {
        self.accept(trans, false);
        SyncResult::Completed
    }
}
