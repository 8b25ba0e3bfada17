//! Test actions and their dense ordinal table.
//!
//! The host triggers actions by ordinal through `bt_mp_Exec`. Ordinal 0 is
//! the "nothing" sentinel and [`ACTION_COUNT`] is one past the last valid
//! ordinal; both are rejected. Each action resolves to a [`Step`] that the
//! dispatcher executes.

use std::fmt;

use btmp_core::SessionClass;

/// Sentinel ordinal below the valid range.
pub const ACTION_NOTHING: u8 = 0;

/// One past the highest valid ordinal.
pub const ACTION_COUNT: u8 = 34;

/// A test action, numbered by its wire ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Action {
    ModuleInit = 1,
    SetTxGainTable = 2,
    SetTxDacTable = 3,
    SetTxChannel = 4,
    SetRxChannel = 5,
    SetPowerGainIndex = 6,
    SetPowerGain = 7,
    SetPowerDac = 8,
    SetPayloadType = 9,
    SetWhiteningCoeff = 10,
    SetPacketType = 11,
    SetHitTarget = 12,
    SetTestMode = 13,
    SetMultiRxEnable = 14,
    HciReset = 15,
    PacketTxStart = 16,
    PacketTxStartSetChannelPktType = 17,
    PacketTxUpdate = 18,
    PacketTxSendOne = 19,
    PacketTxStop = 20,
    PacketRxStart = 21,
    PacketRxStartSetChannelPktType = 22,
    PacketRxUpdate = 23,
    PacketRxStop = 24,
    ContinueTxStart = 25,
    ContinueTxStop = 26,
    ContinueTxUpdate = 27,
    ContinueTxLeStart = 28,
    ContinueTxLeStop = 29,
    ContinueTxLeUpdate = 30,
    HoppingStart = 31,
    HoppingStop = 32,
    ReportClear = 33,
}

/// Every action in ordinal order.
pub const ACTIONS: [Action; (ACTION_COUNT - 1) as usize] = [
    Action::ModuleInit,
    Action::SetTxGainTable,
    Action::SetTxDacTable,
    Action::SetTxChannel,
    Action::SetRxChannel,
    Action::SetPowerGainIndex,
    Action::SetPowerGain,
    Action::SetPowerDac,
    Action::SetPayloadType,
    Action::SetWhiteningCoeff,
    Action::SetPacketType,
    Action::SetHitTarget,
    Action::SetTestMode,
    Action::SetMultiRxEnable,
    Action::HciReset,
    Action::PacketTxStart,
    Action::PacketTxStartSetChannelPktType,
    Action::PacketTxUpdate,
    Action::PacketTxSendOne,
    Action::PacketTxStop,
    Action::PacketRxStart,
    Action::PacketRxStartSetChannelPktType,
    Action::PacketRxUpdate,
    Action::PacketRxStop,
    Action::ContinueTxStart,
    Action::ContinueTxStop,
    Action::ContinueTxUpdate,
    Action::ContinueTxLeStart,
    Action::ContinueTxLeStop,
    Action::ContinueTxLeUpdate,
    Action::HoppingStart,
    Action::HoppingStop,
    Action::ReportClear,
];

/// A single-field device setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Setting {
    TxGainTable,
    TxDacTable,
    TxChannel,
    RxChannel,
    PowerGainIndex,
    PowerGain,
    PowerDac,
    PayloadType,
    WhiteningCoeff,
    PacketType,
    HitTarget,
    TestMode,
    MultiRxEnable,
}

/// What the dispatcher does for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    NoOp,
    Apply(Setting),
    Start {
        class: SessionClass,
        /// Program channel and packet type as part of the start.
        with_config: bool,
    },
    Update(SessionClass),
    SendOne,
    Stop(SessionClass),
    HciReset,
    ReportClear,
}

impl Action {
    /// Resolve a host ordinal; `None` outside `(ACTION_NOTHING, ACTION_COUNT)`.
    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        if ordinal <= i64::from(ACTION_NOTHING) || ordinal >= i64::from(ACTION_COUNT) {
            return None;
        }
        ACTIONS.get(ordinal as usize - 1).copied()
    }

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn step(self) -> Step {
        use SessionClass::*;
        match self {
            Action::ModuleInit => Step::NoOp,
            Action::SetTxGainTable => Step::Apply(Setting::TxGainTable),
            Action::SetTxDacTable => Step::Apply(Setting::TxDacTable),
            Action::SetTxChannel => Step::Apply(Setting::TxChannel),
            Action::SetRxChannel => Step::Apply(Setting::RxChannel),
            Action::SetPowerGainIndex => Step::Apply(Setting::PowerGainIndex),
            Action::SetPowerGain => Step::Apply(Setting::PowerGain),
            Action::SetPowerDac => Step::Apply(Setting::PowerDac),
            Action::SetPayloadType => Step::Apply(Setting::PayloadType),
            Action::SetWhiteningCoeff => Step::Apply(Setting::WhiteningCoeff),
            Action::SetPacketType => Step::Apply(Setting::PacketType),
            Action::SetHitTarget => Step::Apply(Setting::HitTarget),
            Action::SetTestMode => Step::Apply(Setting::TestMode),
            Action::SetMultiRxEnable => Step::Apply(Setting::MultiRxEnable),
            Action::HciReset => Step::HciReset,
            Action::PacketTxStart => Step::Start {
                class: PacketTx,
                with_config: false,
            },
            Action::PacketTxStartSetChannelPktType => Step::Start {
                class: PacketTx,
                with_config: true,
            },
            Action::PacketTxUpdate => Step::Update(PacketTx),
            Action::PacketTxSendOne => Step::SendOne,
            Action::PacketTxStop => Step::Stop(PacketTx),
            Action::PacketRxStart => Step::Start {
                class: PacketRx,
                with_config: false,
            },
            Action::PacketRxStartSetChannelPktType => Step::Start {
                class: PacketRx,
                with_config: true,
            },
            Action::PacketRxUpdate => Step::Update(PacketRx),
            Action::PacketRxStop => Step::Stop(PacketRx),
            Action::ContinueTxStart | Action::ContinueTxLeStart => Step::Start {
                class: ContinuousTx,
                with_config: false,
            },
            Action::ContinueTxStop | Action::ContinueTxLeStop => Step::Stop(ContinuousTx),
            Action::ContinueTxUpdate | Action::ContinueTxLeUpdate => {
                Step::Update(ContinuousTx)
            }
            Action::HoppingStart => Step::Start {
                class: Hopping,
                with_config: false,
            },
            Action::HoppingStop => Step::Stop(Hopping),
            Action::ReportClear => Step::ReportClear,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.ordinal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_table_is_dense() {
        for (i, action) in ACTIONS.iter().enumerate() {
            assert_eq!(action.ordinal() as usize, i + 1, "{action:?}");
        }
        assert_eq!(ACTIONS.len() + 1, ACTION_COUNT as usize);
    }

    #[test]
    fn from_ordinal_round_trip() {
        for action in ACTIONS {
            assert_eq!(Action::from_ordinal(action.ordinal().into()), Some(action));
        }
    }

    #[test]
    fn from_ordinal_rejects_sentinels() {
        assert_eq!(Action::from_ordinal(ACTION_NOTHING.into()), None);
        assert_eq!(Action::from_ordinal(ACTION_COUNT.into()), None);
        assert_eq!(Action::from_ordinal(-1), None);
        assert_eq!(Action::from_ordinal(i64::MAX), None);
    }

    #[test]
    fn le_variants_share_continuous_class() {
        assert_eq!(Action::ContinueTxLeStart.step(), Action::ContinueTxStart.step());
        assert_eq!(Action::ContinueTxLeStop.step(), Action::ContinueTxStop.step());
        assert_eq!(
            Action::ContinueTxLeUpdate.step(),
            Step::Update(SessionClass::ContinuousTx)
        );
    }

    #[test]
    fn module_init_is_noop() {
        assert_eq!(Action::ModuleInit.step(), Step::NoOp);
    }

    #[test]
    fn every_session_class_can_start_and_stop() {
        for class in [
            SessionClass::PacketTx,
            SessionClass::PacketRx,
            SessionClass::ContinuousTx,
            SessionClass::Hopping,
        ] {
            assert!(ACTIONS.iter().any(|a| matches!(
                a.step(),
                Step::Start { class: c, .. } if c == class
            )));
            assert!(ACTIONS.iter().any(|a| a.step() == Step::Stop(class)));
        }
    }

    #[test]
    fn display_includes_ordinal() {
        assert_eq!(Action::HciReset.to_string(), "HciReset(15)");
    }
}
