//! Trait abstraction for the report channel to enable testing

use async_trait::async_trait;

use crate::error::TransportError;

/// One request/response exchange with the gamepad MCU
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send {
    /// Send a 64-byte report and return the device's response
    async fn send(&mut self, report: &[u8]) -> Result<Vec<u8>, TransportError>;
}
