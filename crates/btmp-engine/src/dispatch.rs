//! Action dispatcher and test session state machine.
//!
//! At most one test session runs at a time. Starting a session is only
//! legal from [`SessionState::Idle`]; updating, sending, and stopping are
//! only legal while that same session class is active. An illegal
//! transition is rejected before the device is touched.
//!
//! ```text
//!            START(c) ok
//!   Idle ─────────────────▶ Active(c) ──┐ UPDATE(c) / SEND_ONE (PacketTx)
//!    ▲  ◀──────────────────     │  ◀────┘
//!    │        STOP(c) ok        │
//!    └──── HCI_RESET (always) ──┘
//! ```

use std::fmt;
use std::time::Duration;

use tracing::debug;

use btmp_core::{Device, Error, Result, SessionClass};

use crate::action::{Action, Setting, Step};
use crate::params::ParameterStore;
use crate::report::SessionReport;

/// Default timeout for the HCI reset command.
pub const DEFAULT_HCI_RESET_TIMEOUT: Duration = Duration::from_millis(700);

/// Whether a test session is running, and which one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Active(SessionClass),
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Active(class) => write!(f, "active({class})"),
        }
    }
}

/// Executes actions against a device and sequences test sessions.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    state: SessionState,
    hci_reset_timeout: Duration,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_HCI_RESET_TIMEOUT)
    }
}

impl Dispatcher {
    pub fn new(hci_reset_timeout: Duration) -> Self {
        Dispatcher {
            state: SessionState::Idle,
            hci_reset_timeout,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn hci_reset_timeout(&self) -> Duration {
        self.hci_reset_timeout
    }

    /// Run one action.
    ///
    /// Device errors are returned unchanged. Counter deltas from updates and
    /// single-packet sends are folded into `report`.
    pub async fn execute<D: Device + ?Sized>(
        &mut self,
        action: Action,
        device: &mut D,
        params: &ParameterStore,
        report: &mut SessionReport,
    ) -> Result<()> {
        debug!(%action, state = %self.state, "dispatching action");
        let config = params.config();

        match action.step() {
            Step::NoOp => Ok(()),

            Step::Apply(setting) => apply(setting, device, params).await,

            Step::Start { class, with_config } => {
                if self.state != SessionState::Idle {
                    return Err(self.illegal(action));
                }
                match class {
                    SessionClass::PacketTx | SessionClass::ContinuousTx => report.reset_tx(),
                    SessionClass::PacketRx => report.reset_rx(),
                    SessionClass::Hopping => {}
                }
                if with_config {
                    device.session_begin_with_config(class, config).await?;
                } else {
                    device.session_begin(class, config).await?;
                }
                self.transition(SessionState::Active(class));
                Ok(())
            }

            Step::Update(class) => {
                self.require(action, SessionState::Active(class))?;
                let sample = device.session_update(class, config).await?;
                report.fold(&sample);
                Ok(())
            }

            Step::SendOne => {
                self.require(action, SessionState::Active(SessionClass::PacketTx))?;
                let sample = device.send_one_packet(config).await?;
                report.fold(&sample);
                Ok(())
            }

            Step::Stop(class) => {
                self.require(action, SessionState::Active(class))?;
                device.session_stop(class, config).await?;
                self.transition(SessionState::Idle);
                Ok(())
            }

            Step::HciReset => {
                let reset = device.hci_reset(self.hci_reset_timeout).await;
                report.clear();
                self.transition(SessionState::Idle);
                let counters = device.reset_counters().await;
                reset.and(counters)
            }

            Step::ReportClear => {
                report.clear();
                device.reset_counters().await
            }
        }
    }

    fn require(&self, action: Action, expected: SessionState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.illegal(action))
        }
    }

    fn illegal(&self, action: Action) -> Error {
        tracing::warn!(%action, state = %self.state, "action not allowed in session state");
        Error::InvalidParameter(format!("{action} not allowed while {}", self.state))
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "session state change");
            self.state = next;
        }
    }
}

/// Push one parameter store field to the device.
async fn apply<D: Device + ?Sized>(
    setting: Setting,
    device: &mut D,
    params: &ParameterStore,
) -> Result<()> {
    let c = params.config();
    match setting {
        Setting::TxGainTable => device.set_tx_gain_table(params.tx_gain_table()).await,
        Setting::TxDacTable => device.set_tx_dac_table(params.tx_dac_table()).await,
        Setting::TxChannel => device.set_tx_channel(c.channel).await,
        Setting::RxChannel => device.set_rx_channel(c.channel).await,
        Setting::PowerGainIndex => device.set_power_gain_index(c.tx_gain_index).await,
        Setting::PowerGain => device.set_power_gain(c.tx_gain_value).await,
        Setting::PowerDac => device.set_power_dac(c.tx_dac).await,
        Setting::PayloadType => device.set_payload_type(c.payload_type).await,
        Setting::WhiteningCoeff => device.set_whitening_coeff(c.whitening_coeff).await,
        Setting::PacketType => device.set_packet_type(c.packet_type).await,
        Setting::HitTarget => device.set_hit_target(c.hit_target).await,
        Setting::TestMode => device.set_test_mode(c.test_mode).await,
        Setting::MultiRxEnable => device.set_multi_rx_enable(c.multi_rx_enable).await,
    }
}
