//! # Command Dispatcher
//!
//! Drives one command at a time through build, send and acknowledge.
//!
//! ```text
//! Idle ──▶ Building ──▶ Sent ──▶ AwaitingAck ──▶ Idle
//!             │           │           │
//!             └───────────┴───────────┴──────▶ Failed
//! ```
//!
//! `Failed` is left again when the next command starts building. The
//! dispatcher never retries; the caller decides.

use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::error::{AllyError, Result, TransportError};
use crate::gamepad::types::{ButtonPair, Mode};
use crate::hid::decoder::check_response;
use crate::hid::encoder::{encode_block, encode_report};
use crate::hid::protocol::*;
use crate::transport::Transport;

/// Dispatcher state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Building,
    Sent,
    AwaitingAck,
    Failed,
}

/// A typed command waiting to be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCommand {
    pub command: CommandId,
    pub argument: Option<u8>,
    pub block: Block,
}

impl PendingCommand {
    #[must_use]
    pub fn mode(mode: Mode) -> Self {
        Self::plain(CommandId::SetMode, Block::Mode(mode))
    }

    #[must_use]
    pub fn mapping(pair: ButtonPair, block: MappingBlock) -> Self {
        Self {
            command: CommandId::SetMapping,
            argument: Some(pair.wire()),
            block: Block::Mapping(block),
        }
    }

    #[must_use]
    pub fn deadzone(triggers: bool, block: DeadzoneBlock) -> Self {
        let command = if triggers {
            CommandId::SetTriggerDeadzone
        } else {
            CommandId::SetStickDeadzone
        };
        Self::plain(command, Block::Deadzone(block))
    }

    #[must_use]
    pub fn response_curve(block: ResponseCurveBlock) -> Self {
        Self::plain(CommandId::SetResponseCurve, Block::ResponseCurve(block))
    }

    #[must_use]
    pub fn turbo(block: TurboBlock) -> Self {
        Self::plain(CommandId::SetTurbo, Block::Turbo(block))
    }

    #[must_use]
    pub fn calibration(block: CalibrationBlock) -> Self {
        Self::plain(CommandId::SetCalibration, Block::Calibration(block))
    }

    #[must_use]
    pub fn vibration(intensity: DualPercent) -> Self {
        Self::plain(CommandId::SetVibrationIntensity, Block::Vibration(intensity))
    }

    #[must_use]
    pub fn anti_deadzone(adz: DualPercent) -> Self {
        Self::plain(CommandId::SetAntiDeadzone, Block::AntiDeadzone(adz))
    }

    #[must_use]
    pub fn leds(zones: [Rgb; LED_ZONES]) -> Self {
        Self::plain(CommandId::SetLeds, Block::Leds(zones))
    }

    #[must_use]
    pub fn ready() -> Self {
        Self::plain(CommandId::CheckReady, Block::Ready)
    }

    fn plain(command: CommandId, block: Block) -> Self {
        Self {
            command,
            argument: None,
            block,
        }
    }

    /// Encodes the block and wraps it in a checked envelope.
    pub fn build(&self) -> Result<CommandEnvelope> {
        let payload = encode_block(&self.block)?;
        let envelope = match self.argument {
            Some(argument) => CommandEnvelope::with_argument(self.command, argument, payload)?,
            None => CommandEnvelope::new(self.command, payload)?,
        };
        Ok(envelope)
    }
}

/// Per-device command state machine
#[derive(Debug)]
pub struct Dispatcher {
    state: DispatchState,
    response_timeout: Duration,
    commands_acked: u64,
}

impl Dispatcher {
    #[must_use]
    pub fn new(response_timeout: Duration) -> Self {
        Self {
            state: DispatchState::Idle,
            response_timeout,
            commands_acked: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> DispatchState {
        self.state
    }

    #[must_use]
    pub fn commands_acked(&self) -> u64 {
        self.commands_acked
    }

    fn enter(&mut self, state: DispatchState) {
        trace!("Dispatcher {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Builds and sends one typed command
    ///
    /// # Errors
    ///
    /// Validation and protocol errors are raised while building, before the
    /// transport is touched. Transport errors and nacks are raised after.
    pub async fn dispatch<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        pending: &PendingCommand,
    ) -> Result<()> {
        self.enter(DispatchState::Building);
        let envelope = match pending.build() {
            Ok(envelope) => envelope,
            Err(e) => return Err(self.fail(pending.command, e)),
        };
        self.send(transport, &envelope).await
    }

    /// Sends a command already wrapped in an envelope
    pub async fn send<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        envelope: &CommandEnvelope,
    ) -> Result<()> {
        let command = envelope.command();
        self.enter(DispatchState::Building);
        let report = encode_report(envelope);

        self.enter(DispatchState::Sent);
        debug!("Sending {} ({} bytes)", command.name(), report.len());
        let response = match tokio::time::timeout(self.response_timeout, transport.send(&report)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(self.fail(command, e.into())),
            Err(_) => return Err(self.fail(command, TransportError::Timeout.into())),
        };

        self.enter(DispatchState::AwaitingAck);
        match check_response(envelope, &response) {
            Ok(Some(_)) => trace!("{} echo matches", command.name()),
            Ok(None) => {}
            Err(e) => return Err(self.fail(command, e.into())),
        }

        self.commands_acked += 1;
        self.enter(DispatchState::Idle);
        Ok(())
    }

    /// Runs commands in order, stopping at the first failure.
    pub async fn dispatch_all<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        commands: &[PendingCommand],
    ) -> Result<()> {
        for pending in commands {
            self.dispatch(transport, pending).await?;
        }
        Ok(())
    }

    fn fail(&mut self, command: CommandId, error: AllyError) -> AllyError {
        warn!("{} failed: {}", command.name(), error);
        self.enter(DispatchState::Failed);
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProtocolError, ValidationError};
    use crate::transport::port_trait::mocks::{Reply, ScriptedTransport};
    use crate::transport::port_trait::MockTransport;

    const TIMEOUT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn test_dispatch_success_returns_to_idle() {
        let mut transport = ScriptedTransport::new();
        let mut dispatcher = Dispatcher::new(TIMEOUT);

        dispatcher
            .dispatch(&mut transport, &PendingCommand::mode(Mode::Wasd))
            .await
            .unwrap();

        assert_eq!(dispatcher.state(), DispatchState::Idle);
        assert_eq!(dispatcher.commands_acked(), 1);
        let sent = transport.get_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(&sent[0][..5], &[0x5a, 0xd1, 0x01, 0x01, 0x02]);
    }

    #[tokio::test]
    async fn test_nack_fails() {
        let mut transport = ScriptedTransport::new();
        transport.push_reply(Reply::Nack);
        let mut dispatcher = Dispatcher::new(TIMEOUT);

        let err = dispatcher
            .dispatch(&mut transport, &PendingCommand::ready())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AllyError::Protocol(ProtocolError::Nack {
                command: CommandId::CheckReady
            })
        ));
        assert_eq!(dispatcher.state(), DispatchState::Failed);
        assert_eq!(dispatcher.commands_acked(), 0);
    }

    #[tokio::test]
    async fn test_mismatched_echo_fails() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|report| {
            let mut echo = crate::hid::decoder::ack_for(report);
            echo[4] = 0x03;
            Ok(echo)
        });
        let mut dispatcher = Dispatcher::new(TIMEOUT);

        let err = dispatcher
            .dispatch(&mut transport, &PendingCommand::mode(Mode::Wasd))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AllyError::Protocol(ProtocolError::EchoMismatch {
                command: CommandId::SetMode
            })
        ));
        assert_eq!(dispatcher.state(), DispatchState::Failed);
        assert_eq!(dispatcher.commands_acked(), 0);
    }

    #[tokio::test]
    async fn test_hang_times_out() {
        let mut transport = ScriptedTransport::new();
        transport.push_reply(Reply::Hang);
        let mut dispatcher = Dispatcher::new(TIMEOUT);

        let err = dispatcher
            .dispatch(&mut transport, &PendingCommand::ready())
            .await
            .unwrap_err();
        assert!(matches!(err, AllyError::Transport(TransportError::Timeout)));
        assert_eq!(dispatcher.state(), DispatchState::Failed);
    }

    #[tokio::test]
    async fn test_transport_error_is_surfaced_unchanged() {
        let mut transport = ScriptedTransport::new();
        transport.push_reply(Reply::Io("unplugged"));
        let mut dispatcher = Dispatcher::new(TIMEOUT);

        let err = dispatcher
            .dispatch(&mut transport, &PendingCommand::ready())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AllyError::Transport(TransportError::Io(ref msg)) if msg == "unplugged"
        ));
    }

    #[tokio::test]
    async fn test_invalid_block_never_reaches_transport() {
        let mut transport = MockTransport::new();
        transport.expect_send().never();
        let mut dispatcher = Dispatcher::new(TIMEOUT);

        let pending = PendingCommand::vibration(DualPercent { left: 101, right: 0 });
        let err = dispatcher.dispatch(&mut transport, &pending).await.unwrap_err();
        assert!(matches!(
            err,
            AllyError::Validation(ValidationError::OutOfRange { .. })
        ));
        assert_eq!(dispatcher.state(), DispatchState::Failed);
    }

    #[tokio::test]
    async fn test_failed_recovers_on_next_command() {
        let mut transport = ScriptedTransport::new();
        transport.push_reply(Reply::Timeout);
        let mut dispatcher = Dispatcher::new(TIMEOUT);

        assert!(dispatcher
            .dispatch(&mut transport, &PendingCommand::ready())
            .await
            .is_err());
        dispatcher
            .dispatch(&mut transport, &PendingCommand::ready())
            .await
            .unwrap();
        assert_eq!(dispatcher.state(), DispatchState::Idle);
    }

    #[tokio::test]
    async fn test_dispatch_all_stops_at_first_failure() {
        let mut transport = ScriptedTransport::new();
        transport.push_reply(Reply::Ack);
        transport.push_reply(Reply::Nack);
        let mut dispatcher = Dispatcher::new(TIMEOUT);

        let commands = [
            PendingCommand::mode(Mode::Game),
            PendingCommand::turbo(TurboBlock::default()),
            PendingCommand::ready(),
        ];
        assert!(dispatcher
            .dispatch_all(&mut transport, &commands)
            .await
            .is_err());
        assert_eq!(
            transport.sent_commands(),
            vec![CommandId::SetMode.wire(), CommandId::SetTurbo.wire()]
        );
    }

    #[tokio::test]
    async fn test_mapping_report_carries_pair_argument() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|report: &[u8]| report[2] == 0x02 && report[3] == 0x2c && report[4] == 0x05)
            .times(1)
            .returning(|report| Ok(crate::hid::decoder::ack_for(report)));
        let mut dispatcher = Dispatcher::new(TIMEOUT);

        let block = crate::hid::presets::preset_block(Mode::Game, ButtonPair::AB);
        dispatcher
            .dispatch(&mut transport, &PendingCommand::mapping(ButtonPair::AB, block))
            .await
            .unwrap();
    }
}
