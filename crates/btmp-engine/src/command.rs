//! Command names as they appear on the control channel.

use std::fmt;
use std::str::FromStr;

use btmp_core::Error;

use crate::report::ReportView;

/// A host command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    GetParam,
    SetParam,
    SetParam1,
    SetParam2,
    RegRw,
    HciCmd,
    Exec,
    SetConfig,
    Report(ReportView),
}

/// Every command, in the order the host documentation lists them.
pub const COMMANDS: [Command; 13] = [
    Command::GetParam,
    Command::SetParam,
    Command::SetParam1,
    Command::SetParam2,
    Command::RegRw,
    Command::HciCmd,
    Command::Exec,
    Command::SetConfig,
    Command::Report(ReportView::Tx),
    Command::Report(ReportView::ContinuousTx),
    Command::Report(ReportView::Rx),
    Command::Report(ReportView::Chip),
    Command::Report(ReportView::All),
];

impl Command {
    /// Wire name; also the first field of every response.
    pub fn name(self) -> &'static str {
        match self {
            Command::GetParam => "bt_mp_GetParam",
            Command::SetParam => "bt_mp_SetParam",
            Command::SetParam1 => "bt_mp_SetParam1",
            Command::SetParam2 => "bt_mp_SetParam2",
            Command::RegRw => "bt_mp_RegRW",
            Command::HciCmd => "bt_mp_HciCmd",
            Command::Exec => "bt_mp_Exec",
            Command::SetConfig => "bt_mp_SetConfig",
            Command::Report(ReportView::Tx) => "bt_mp_ReportTx",
            Command::Report(ReportView::ContinuousTx) => "bt_mp_ReportContTx",
            Command::Report(ReportView::Rx) => "bt_mp_ReportRx",
            Command::Report(ReportView::Chip) => "bt_mp_ReportChip",
            Command::Report(ReportView::All) => "bt_mp_ReportAll",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        COMMANDS
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| Error::InvalidParameter(format!("unknown command: {s}")))
    }
}
