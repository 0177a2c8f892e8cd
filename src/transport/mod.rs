//! # Transport Module
//!
//! Report channels to the gamepad MCU.
//!
//! This module handles:
//! - The [`Transport`] seam used by the device handle
//! - A hidraw implementation for real hardware
//! - A frame-logging dry run that acknowledges every report

pub mod hidraw;
pub mod port_trait;

pub use port_trait::Transport;

use std::io::Write;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::hid::decoder::{ack_for, decode_report};

/// One logged report.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FrameRecord {
    /// Position in the session, starting at 0
    pub seq: u64,

    /// Command name, or `None` if the report did not decode
    pub command: Option<&'static str>,

    /// Argument byte (button pair for mappings)
    pub argument: Option<u8>,

    /// Full report as lowercase hex
    pub report: String,
}

/// Dry-run transport
///
/// Acknowledges every report without touching hardware and writes one JSON
/// object per report to `sink`.
#[derive(Debug)]
pub struct FrameLogTransport<W> {
    sink: W,
    seq: u64,
}

impl<W: Write + Send> FrameLogTransport<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, seq: 0 }
    }

    /// Number of reports logged so far
    pub fn frames_logged(&self) -> u64 {
        self.seq
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn record(&mut self, report: &[u8]) -> FrameRecord {
        let decoded = decode_report(report);
        if let Err(e) = &decoded {
            warn!("Logging undecodable report: {}", e);
        }
        let record = FrameRecord {
            seq: self.seq,
            command: decoded.as_ref().ok().map(|d| d.command.name()),
            argument: decoded.as_ref().ok().and_then(|d| d.argument),
            report: report.iter().map(|b| format!("{:02x}", b)).collect(),
        };
        self.seq += 1;
        record
    }
}

#[async_trait]
impl<W: Write + Send> Transport for FrameLogTransport<W> {
    async fn send(&mut self, report: &[u8]) -> Result<Vec<u8>, TransportError> {
        let record = self.record(report);
        let line = serde_json::to_string(&record).map_err(|e| TransportError::Io(e.to_string()))?;
        writeln!(self.sink, "{}", line)?;
        debug!("Logged frame #{} ({:?})", record.seq, record.command);
        Ok(ack_for(report))
    }
}
