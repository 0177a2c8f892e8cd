//! # Device Module
//!
//! One handle per physical gamepad. The handle owns the transport, the
//! dispatcher and the host copy of the configuration behind a single async
//! mutex, so commands to the same device never interleave while different
//! devices proceed independently.
//!
//! Every change follows the same path: clone the committed configuration,
//! apply the change to the clone, send whatever the MCU needs to hear, and
//! swap the clone in only when every command was acknowledged. A failure at
//! any step leaves the committed configuration untouched.
//!
//! Changes addressed to a mode other than the active one are committed
//! locally and sent when that mode is selected.

pub mod attributes;
pub mod dispatcher;

use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::ProfileConfig;
use crate::error::{AllyError, Result};
use crate::gamepad::calibration::AxisCalibration;
use crate::gamepad::state::GamepadConfig;
use crate::gamepad::types::{Axis, ButtonPair, Mode, Side, Slot};
use crate::hid::actions::ActionCode;
use crate::hid::protocol::*;
use crate::transport::Transport;

pub use dispatcher::{DispatchState, Dispatcher, PendingCommand};

struct Inner<T> {
    transport: T,
    dispatcher: Dispatcher,
    config: Option<GamepadConfig>,
}

/// Handle to one gamepad
pub struct Device<T> {
    name: String,
    inner: Mutex<Inner<T>>,
}

impl<T> std::fmt::Debug for Device<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Commands that bring the per-mode tuning of `mode` onto the device.
fn tuning_commands(config: &GamepadConfig, mode: Mode) -> Vec<PendingCommand> {
    vec![
        PendingCommand::deadzone(false, config.tuning.deadzone_block(mode, false)),
        PendingCommand::deadzone(true, config.tuning.deadzone_block(mode, true)),
        PendingCommand::response_curve(config.tuning.curve_block(mode, Side::Left)),
        PendingCommand::response_curve(config.tuning.curve_block(mode, Side::Right)),
    ]
}

/// Mapping commands for the given pairs of the active mode; marks them clean.
fn mapping_commands(config: &mut GamepadConfig, pairs: &[ButtonPair]) -> Vec<PendingCommand> {
    let mode = config.mode;
    pairs
        .iter()
        .map(|&pair| {
            config.mappings.mark_clean(mode, pair);
            PendingCommand::mapping(pair, *config.mappings.block(mode, pair))
        })
        .collect()
}

/// Everything the MCU holds for the active mode.
fn full_state_commands(config: &mut GamepadConfig) -> Vec<PendingCommand> {
    let mode = config.mode;
    let mut commands = vec![PendingCommand::mode(mode)];
    commands.extend(mapping_commands(config, &ButtonPair::ALL));
    commands.extend(tuning_commands(config, mode));
    commands.push(PendingCommand::turbo(config.turbo.to_block()));
    commands.push(PendingCommand::vibration(config.vibration));
    commands.push(PendingCommand::anti_deadzone(config.anti_deadzone));
    commands.push(PendingCommand::leds(config.leds));
    commands
}

/// Stages a binding; inactive modes get no commands.
fn stage_binding(
    config: &mut GamepadConfig,
    mode: Mode,
    pair: ButtonPair,
    side: Side,
    slot: Slot,
    name: &str,
) -> Result<Vec<PendingCommand>> {
    config.mappings.set_binding(mode, pair, side, slot, name)?;
    if !config.is_active(mode) {
        return Ok(Vec::new());
    }
    Ok(mapping_commands(config, &[pair]))
}

/// Stages a deadzone; the whole stick (or trigger) group is sent, since one
/// command carries both sides.
fn stage_deadzone(
    config: &mut GamepadConfig,
    mode: Mode,
    axis: Axis,
    inner: u8,
    outer: u8,
) -> Vec<PendingCommand> {
    config.tuning.set_deadzone(mode, axis, inner, outer);
    if !config.is_active(mode) {
        return Vec::new();
    }
    let triggers = axis.is_trigger();
    vec![PendingCommand::deadzone(
        triggers,
        config.tuning.deadzone_block(mode, triggers),
    )]
}

fn stage_curve_point(
    config: &mut GamepadConfig,
    mode: Mode,
    side: Side,
    point: usize,
    input: u8,
    output: u8,
) -> Result<Vec<PendingCommand>> {
    config
        .tuning
        .set_curve_point(mode, side, point, input, output)?;
    if !config.is_active(mode) {
        return Ok(Vec::new());
    }
    Ok(vec![PendingCommand::response_curve(
        config.tuning.curve_block(mode, side),
    )])
}

impl<T: Transport> Device<T> {
    /// Creates an uninitialized handle
    ///
    /// # Arguments
    ///
    /// * `name` - Label used in logs
    /// * `transport` - Report channel to the MCU
    /// * `response_timeout` - Upper bound for one round trip
    pub fn new(name: impl Into<String>, transport: T, response_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(Inner {
                transport,
                dispatcher: Dispatcher::new(response_timeout),
                config: None,
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consumes the handle and returns its transport.
    pub fn into_transport(self) -> T {
        self.inner.into_inner().transport
    }

    /// Stage, send, commit.
    async fn transact<F>(&self, op: &'static str, stage: F) -> Result<()>
    where
        F: FnOnce(&mut GamepadConfig) -> Result<Vec<PendingCommand>>,
    {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        let mut staged = inner
            .config
            .as_ref()
            .ok_or(AllyError::DeviceNotReady)?
            .clone();
        let commands = stage(&mut staged)?;
        inner
            .dispatcher
            .dispatch_all(&mut inner.transport, &commands)
            .await?;
        inner.config = Some(staged);

        debug!("{}: {} committed ({} commands)", self.name, op, commands.len());
        Ok(())
    }

    async fn read<R>(&self, f: impl FnOnce(&GamepadConfig) -> R) -> Result<R> {
        let inner = self.inner.lock().await;
        inner.config.as_ref().map(f).ok_or(AllyError::DeviceNotReady)
    }

    /// Seeds the configuration with the factory presets and pushes it
    ///
    /// Checks readiness first. The handle stays uninitialized if any command
    /// fails.
    pub async fn initialize(&self, mode: Mode) -> Result<()> {
        self.initialize_with(mode, |_| Ok(())).await
    }

    /// Seeds the factory configuration, applies a profile to it, and pushes
    /// the result once.
    pub async fn initialize_profile(&self, profile: &ProfileConfig) -> Result<()> {
        self.initialize_with(profile.mode, |cfg| Ok(profile.apply_to(cfg)?))
            .await
    }

    async fn initialize_with<F>(&self, mode: Mode, seed: F) -> Result<()>
    where
        F: FnOnce(&mut GamepadConfig) -> Result<()>,
    {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        let mut staged = GamepadConfig::seeded(mode);
        seed(&mut staged)?;
        let mut commands = vec![PendingCommand::ready()];
        commands.extend(full_state_commands(&mut staged));
        inner
            .dispatcher
            .dispatch_all(&mut inner.transport, &commands)
            .await?;
        let mode = staged.mode;
        inner.config = Some(staged);

        info!("{}: initialized in {} mode", self.name, mode.name());
        Ok(())
    }

    pub async fn is_initialized(&self) -> bool {
        self.inner.lock().await.config.is_some()
    }

    /// Asks the MCU whether it accepts configuration commands.
    pub async fn check_ready(&self) -> Result<()> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        inner
            .dispatcher
            .dispatch(&mut inner.transport, &PendingCommand::ready())
            .await
    }

    /// Sends a raw command payload
    ///
    /// The envelope is checked before the transport is touched; a payload of
    /// the wrong size fails with `ProtocolError::PayloadLength`.
    pub async fn send_raw(
        &self,
        command: CommandId,
        argument: Option<u8>,
        payload: Vec<u8>,
    ) -> Result<()> {
        let envelope = match argument {
            Some(argument) => CommandEnvelope::with_argument(command, argument, payload)?,
            None => CommandEnvelope::new(command, payload)?,
        };
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        inner.dispatcher.send(&mut inner.transport, &envelope).await
    }

    /// Pushes the complete state of the active mode.
    pub async fn apply_all(&self) -> Result<()> {
        self.transact("apply_all", |cfg| Ok(full_state_commands(cfg)))
            .await
    }

    /// Stages an arbitrary change and pushes the complete resulting state.
    pub async fn apply_with<F>(&self, op: &'static str, change: F) -> Result<()>
    where
        F: FnOnce(&mut GamepadConfig) -> Result<()>,
    {
        self.transact(op, |cfg| {
            change(cfg)?;
            Ok(full_state_commands(cfg))
        })
        .await
    }

    /// Applies a configured profile and pushes the resulting state.
    pub async fn apply_profile(&self, profile: &ProfileConfig) -> Result<()> {
        self.apply_with("apply_profile", |cfg| Ok(profile.apply_to(cfg)?))
            .await
    }

    pub async fn mode(&self) -> Result<Mode> {
        self.read(|cfg| cfg.mode).await
    }

    /// Switches mode, then flushes what changed for it while inactive.
    pub async fn set_mode(&self, mode: Mode) -> Result<()> {
        self.transact("set_mode", |cfg| {
            cfg.mode = mode;
            let mut commands = vec![PendingCommand::mode(mode)];
            let dirty = cfg.mappings.dirty_pairs(mode);
            commands.extend(mapping_commands(cfg, &dirty));
            commands.extend(tuning_commands(cfg, mode));
            Ok(commands)
        })
        .await
    }

    pub async fn action(
        &self,
        mode: Mode,
        pair: ButtonPair,
        side: Side,
        slot: Slot,
    ) -> Result<ActionCode> {
        self.read(|cfg| cfg.mappings.action(mode, pair, side, slot))
            .await
    }

    /// Canonical name of a binding (`get_binding_string`).
    pub async fn binding(
        &self,
        mode: Mode,
        pair: ButtonPair,
        side: Side,
        slot: Slot,
    ) -> Result<String> {
        self.read(|cfg| cfg.mappings.binding_name(mode, pair, side, slot))
            .await
    }

    /// Binds an action by name
    ///
    /// # Errors
    ///
    /// * `ValidationError::UnknownAction` - nothing is stored or sent
    /// * transport/protocol errors - the previous binding stays
    pub async fn set_binding(
        &self,
        mode: Mode,
        pair: ButtonPair,
        side: Side,
        slot: Slot,
        name: &str,
    ) -> Result<()> {
        self.transact("set_binding", |cfg| {
            stage_binding(cfg, mode, pair, side, slot, name)
        })
        .await
    }

    /// Reloads the factory layout of the active mode.
    pub async fn reset_mappings(&self) -> Result<()> {
        self.transact("reset_mappings", |cfg| {
            cfg.mappings.load_preset(cfg.mode);
            Ok(mapping_commands(cfg, &ButtonPair::ALL))
        })
        .await
    }

    pub async fn turbo_interval(&self, pair: ButtonPair, side: Side) -> Result<u8> {
        Ok(self.read(|cfg| cfg.turbo.interval(pair, side)).await??)
    }

    pub async fn turbo(&self, pair: ButtonPair, side: Side) -> Result<bool> {
        Ok(self.turbo_interval(pair, side).await? != 0)
    }

    /// Turns turbo on (default interval) or off for one button.
    pub async fn set_turbo(&self, pair: ButtonPair, side: Side, enabled: bool) -> Result<()> {
        self.transact("set_turbo", |cfg| {
            cfg.turbo.set_turbo(pair, side, enabled)?;
            Ok(vec![PendingCommand::turbo(cfg.turbo.to_block())])
        })
        .await
    }

    pub async fn set_turbo_interval(&self, pair: ButtonPair, side: Side, interval: u8) -> Result<()> {
        self.transact("set_turbo_interval", |cfg| {
            cfg.turbo.set_interval(pair, side, interval)?;
            Ok(vec![PendingCommand::turbo(cfg.turbo.to_block())])
        })
        .await
    }

    pub async fn deadzone(&self, mode: Mode, axis: Axis) -> Result<DeadzonePair> {
        self.read(|cfg| cfg.tuning.deadzone(mode, axis)).await
    }

    /// Sets the inner/outer deadzone of one axis.
    pub async fn set_deadzone(&self, mode: Mode, axis: Axis, inner: u8, outer: u8) -> Result<()> {
        self.transact("set_deadzone", |cfg| {
            Ok(stage_deadzone(cfg, mode, axis, inner, outer))
        })
        .await
    }

    pub async fn curve_point(&self, mode: Mode, side: Side, point: usize) -> Result<CurvePoint> {
        Ok(self
            .read(|cfg| cfg.tuning.curve_point(mode, side, point))
            .await??)
    }

    pub async fn set_response_curve(
        &self,
        mode: Mode,
        side: Side,
        point: usize,
        input: u8,
        output: u8,
    ) -> Result<()> {
        self.transact("set_response_curve", |cfg| {
            stage_curve_point(cfg, mode, side, point, input, output)
        })
        .await
    }

    pub async fn calibration(&self, axis: Axis) -> Result<AxisCalibration> {
        self.read(|cfg| cfg.tuning.calibration(axis)).await
    }

    /// Writes a calibration and makes the MCU apply it.
    pub async fn set_calibration(&self, axis: Axis, calibration: AxisCalibration) -> Result<()> {
        self.transact("set_calibration", |cfg| {
            cfg.tuning.set_calibration(axis, calibration)?;
            Ok(vec![
                PendingCommand::calibration(calibration.to_block(CalibrationOp::Write, axis)),
                PendingCommand::calibration(calibration.to_block(CalibrationOp::Apply, axis)),
            ])
        })
        .await
    }

    /// Resets one axis to the neutral calibration.
    pub async fn reset_calibration(&self, axis: Axis) -> Result<()> {
        self.transact("reset_calibration", |cfg| {
            cfg.tuning.reset_calibration(axis);
            let neutral = cfg.tuning.calibration(axis);
            Ok(vec![PendingCommand::calibration(
                neutral.to_block(CalibrationOp::Reset, axis),
            )])
        })
        .await
    }

    pub async fn vibration_intensity(&self) -> Result<DualPercent> {
        self.read(|cfg| cfg.vibration).await
    }

    pub async fn set_vibration_intensity(&self, left: u8, right: u8) -> Result<()> {
        self.transact("set_vibration_intensity", |cfg| {
            cfg.vibration = DualPercent { left, right };
            Ok(vec![PendingCommand::vibration(cfg.vibration)])
        })
        .await
    }

    pub async fn anti_deadzone(&self) -> Result<DualPercent> {
        self.read(|cfg| cfg.anti_deadzone).await
    }

    pub async fn set_anti_deadzone(&self, left: u8, right: u8) -> Result<()> {
        self.transact("set_anti_deadzone", |cfg| {
            cfg.anti_deadzone = DualPercent { left, right };
            Ok(vec![PendingCommand::anti_deadzone(cfg.anti_deadzone)])
        })
        .await
    }

    pub async fn leds(&self) -> Result<[Rgb; LED_ZONES]> {
        self.read(|cfg| cfg.leds).await
    }

    pub async fn set_leds(&self, zones: [Rgb; LED_ZONES]) -> Result<()> {
        self.transact("set_leds", |cfg| {
            cfg.leds = zones;
            Ok(vec![PendingCommand::leds(zones)])
        })
        .await
    }

    /// Copy of the committed configuration.
    pub async fn snapshot(&self) -> Result<GamepadConfig> {
        self.read(GamepadConfig::clone).await
    }

    pub async fn dispatch_state(&self) -> DispatchState {
        self.inner.lock().await.dispatcher.state()
    }

    /// Commands acknowledged by the MCU since the handle was created.
    pub async fn commands_acked(&self) -> u64 {
        self.inner.lock().await.dispatcher.commands_acked()
    }
}
