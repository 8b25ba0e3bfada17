//! MpModule -- one device under test and the command engine around it.
//!
//! The module owns the device, the parameter store, the session report, and
//! the action dispatcher. Every command takes `&mut self`, so exactly one
//! command is in flight per module. Construct it with
//! [`MpModuleBuilder`](crate::builder::MpModuleBuilder) and release the
//! device with [`MpModule::shutdown`].

use tracing::debug;

use btmp_core::{ConfigStore, Device, Error, FsConfigStore, HCI_EVENT_COMMAND_COMPLETE, Result, Status};
use btmp_protocol::{Delimiters, Response, ResponseBuilder};

use crate::action::Action;
use crate::codec::{self, PacketSettings, PowerSettings};
use crate::command::Command;
use crate::dispatch::{Dispatcher, SessionState};
use crate::models::ChipModel;
use crate::params::ParameterStore;
use crate::register::RegisterAccessor;
use crate::report::{ReportView, SessionReport, render_chip_info};

/// A device under test driven by host commands.
pub struct MpModule<D: Device, S: ConfigStore = FsConfigStore> {
    device: D,
    config_store: S,
    model: ChipModel,
    params: ParameterStore,
    report: SessionReport,
    dispatcher: Dispatcher,
    delims: Delimiters,
}

impl<D: Device, S: ConfigStore> MpModule<D, S> {
    /// Assemble a module from its parts.
    ///
    /// Called by [`MpModuleBuilder`](crate::builder::MpModuleBuilder);
    /// callers should use the builder instead.
    pub(crate) fn new(
        device: D,
        config_store: S,
        model: ChipModel,
        params: ParameterStore,
        dispatcher: Dispatcher,
        delims: Delimiters,
    ) -> Self {
        debug!(model = model.name, "mp module initialised");
        MpModule {
            device,
            config_store,
            model,
            params,
            report: SessionReport::new(),
            dispatcher,
            delims,
        }
    }

    pub fn model(&self) -> &ChipModel {
        &self.model
    }

    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    pub fn session_report(&self) -> &SessionReport {
        &self.report
    }

    pub fn session_state(&self) -> SessionState {
        self.dispatcher.state()
    }

    pub fn delimiters(&self) -> Delimiters {
        self.delims
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn config_store(&self) -> &S {
        &self.config_store
    }

    /// Release the module, handing the device back to the caller.
    pub fn shutdown(self) -> D {
        debug!(
            model = self.model.name,
            state = %self.dispatcher.state(),
            "mp module shut down"
        );
        self.device
    }

    // ------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------

    /// Parse and run one `<command-name> <args>` line.
    ///
    /// Fails only when the command name is unknown; every known command
    /// produces a [`Response`], successful or not.
    pub async fn handle_line(&mut self, line: &str) -> Result<Response> {
        let line = line.trim();
        let (name, args) = match line.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (line, ""),
        };
        let command: Command = name.parse()?;
        Ok(self.execute(command, args).await)
    }

    /// Run `command` with its argument text.
    pub async fn execute(&mut self, command: Command, args: &str) -> Response {
        debug!(%command, args, "command");
        let result = match command {
            Command::GetParam => self.get_param(args),
            Command::SetParam => self.set_param(args),
            Command::SetParam1 => self.set_param1(args),
            Command::SetParam2 => self.set_param2(args),
            Command::RegRw => self.reg_rw(args).await,
            Command::HciCmd => self.hci_cmd(args).await,
            Command::Exec => self.exec(args).await,
            Command::SetConfig => self.set_config(args).await,
            Command::Report(view) => self.report(view).await,
        };
        match result {
            Ok(response) => {
                debug!(response = response.text(), "command complete");
                response
            }
            Err(e) => {
                tracing::warn!(%command, error = %e, "command failed");
                Response::from_error(command.name(), self.delims.result, &e)
            }
        }
    }

    /// Run one action directly, bypassing the text grammar.
    pub async fn exec_action(&mut self, action: Action) -> Result<()> {
        self.dispatcher
            .execute(action, &mut self.device, &self.params, &mut self.report)
            .await
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    fn success(&self, command: Command) -> Response {
        Response::ok(command.name(), self.delims.result)
    }

    fn builder(&self, command: Command) -> ResponseBuilder {
        ResponseBuilder::new(command.name(), self.delims.result)
    }

    /// `bt_mp_GetParam [index]`
    pub fn get_param(&self, args: &str) -> Result<Response> {
        let rendered = match codec::decode_get_param(args, self.delims.field)? {
            Some(index) => self.params.get(index, self.delims.result)?,
            None => self.params.snapshot(self.delims.result),
        };
        Ok(self
            .builder(Command::GetParam)
            .raw(&rendered)
            .finish(Status::Success))
    }

    /// `bt_mp_SetParam idx,val|idx,val|…`
    pub fn set_param(&mut self, args: &str) -> Result<Response> {
        let groups = codec::apply_set_param(&mut self.params, args, self.delims)?;
        debug!(groups, "parameters set");
        Ok(self.success(Command::SetParam))
    }

    /// `bt_mp_SetParam1 ch,pkt_type,payload,tx_count,gain,whitening`
    pub fn set_param1(&mut self, args: &str) -> Result<Response> {
        let settings = PacketSettings::decode(args, self.delims.field)?;
        settings.apply(self.params.config_mut());
        debug!(?settings, "packet settings applied");
        Ok(self.success(Command::SetParam1))
    }

    /// `bt_mp_SetParam2 gain_idx,dac,header,hop_ch,hit_target`
    pub fn set_param2(&mut self, args: &str) -> Result<Response> {
        let settings = PowerSettings::decode(args, self.delims.field)?;
        settings.apply(self.params.config_mut());
        debug!(?settings, "power settings applied");
        Ok(self.success(Command::SetParam2))
    }

    /// `bt_mp_RegRW type,rw,[page],addr,msb,lsb,[data]`
    pub async fn reg_rw(&mut self, args: &str) -> Result<Response> {
        let request = codec::decode_reg_rw(args, self.delims.field)?;
        let mut regs = RegisterAccessor::new(&mut self.device);
        match request.write {
            Some(value) => {
                regs.write(&request.address, value).await?;
                Ok(self.success(Command::RegRw))
            }
            None => {
                let value = regs.read(&request.address).await?;
                Ok(self
                    .builder(Command::RegRw)
                    .field(Status::Success)
                    .field(format_args!("{value:08x}"))
                    .finish(Status::Success))
            }
        }
    }

    /// `bt_mp_HciCmd opcode,len,data…`
    pub async fn hci_cmd(&mut self, args: &str) -> Result<Response> {
        let request = codec::decode_hci_cmd(args, self.delims.field)?;
        let event = self
            .device
            .send_hci_command(request.opcode, &request.payload, HCI_EVENT_COMMAND_COMPLETE)
            .await?;
        let mut b = self.builder(Command::HciCmd);
        for byte in &event {
            b.push(format_args!("{byte:x}"));
        }
        Ok(b.finish(Status::Success))
    }

    /// `bt_mp_Exec ordinal`
    pub async fn exec(&mut self, args: &str) -> Result<Response> {
        let action = codec::decode_exec(args, self.delims.field)?;
        self.exec_action(action).await?;
        Ok(self
            .builder(Command::Exec)
            .field(format_args!("{:x}", action.ordinal()))
            .field(Status::Success)
            .finish(Status::Success))
    }

    /// `bt_mp_SetConfig path,mode|record|…`
    pub async fn set_config(&mut self, args: &str) -> Result<Response> {
        let request = codec::decode_set_config(args, self.delims)?;
        self.config_store
            .write(&request.path, request.mode, &request.payload)
            .await
            .map_err(|e| match e {
                Error::InvalidParameter(msg) => Error::Device(msg),
                other => other,
            })?;
        debug!(
            path = %request.path,
            mode = %request.mode,
            bytes = request.payload.len(),
            "config written"
        );
        Ok(self.success(Command::SetConfig))
    }

    /// `bt_mp_Report*`
    pub async fn report(&mut self, view: ReportView) -> Result<Response> {
        let fields = match view {
            ReportView::Chip => {
                let info = self.device.chip_info().await?;
                render_chip_info(&info, self.delims.result)
            }
            _ => self.report.render(view, self.delims.result),
        };
        Ok(self
            .builder(Command::Report(view))
            .raw(&fields)
            .finish(Status::Success))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MpModuleBuilder;
    use btmp_core::{ChipInfo, ConfigMode, CounterSample, RegisterSpace, SessionClass};
    use btmp_test_harness::{DeviceCall, MemoryConfigStore, MockDevice};

    fn module() -> MpModule<MockDevice, MemoryConfigStore> {
        MpModuleBuilder::new()
            .build_with_store(MockDevice::new(), MemoryConfigStore::new())
            .unwrap()
    }

    async fn run(m: &mut MpModule<MockDevice, MemoryConfigStore>, line: &str) -> String {
        m.handle_line(line).await.unwrap().into_text()
    }

    // -----------------------------------------------------------------------
    // Line handling
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn unknown_command_is_error() {
        let mut m = module();
        assert!(m.handle_line("bt_mp_Nope 1").await.is_err());
        assert!(m.handle_line("").await.is_err());
    }

    #[tokio::test]
    async fn line_whitespace_is_trimmed() {
        let mut m = module();
        assert_eq!(run(&mut m, "  bt_mp_GetParam   1 \n").await, "bt_mp_GetParam,1,0x0a");
    }

    // -----------------------------------------------------------------------
    // Parameters
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn get_param_defaults() {
        let mut m = module();
        assert_eq!(
            run(&mut m, "bt_mp_GetParam").await,
            "bt_mp_GetParam,a,e,3,0,a9,0,ff,13,1234,0,0000009e8b33"
        );
        assert_eq!(
            run(&mut m, "bt_mp_GetParam 12").await,
            "bt_mp_GetParam,12,0x49,0x4d,0x69,0x89,0x8d,0xa9,0xa9"
        );
        assert_eq!(
            run(&mut m, "bt_mp_GetParam 13").await,
            "bt_mp_GetParam,13,0x10,0x11,0x12,0x13,0x14"
        );
    }

    #[tokio::test]
    async fn get_param_out_of_range() {
        let mut m = module();
        let r = m.handle_line("bt_mp_GetParam 15").await.unwrap();
        assert_eq!(r.text(), "bt_mp_GetParam,2");
        assert_eq!(r.status(), Status::ParameterError);
    }

    #[tokio::test]
    async fn set_param_then_get() {
        let mut m = module();
        assert_eq!(run(&mut m, "bt_mp_SetParam 0,0|1,10|2,1").await, "bt_mp_SetParam,0");
        assert_eq!(run(&mut m, "bt_mp_GetParam 1").await, "bt_mp_GetParam,1,0x0a");
        assert_eq!(run(&mut m, "bt_mp_GetParam 2").await, "bt_mp_GetParam,2,0x01");
    }

    #[tokio::test]
    async fn set_param_bad_index() {
        let mut m = module();
        let before = m.params().clone();
        assert_eq!(run(&mut m, "bt_mp_SetParam 99,5").await, "bt_mp_SetParam,2");
        assert_eq!(m.params(), &before);
    }

    #[tokio::test]
    async fn set_param1_and_2() {
        let mut m = module();
        assert_eq!(
            run(&mut m, "bt_mp_SetParam1 39,0x0e,3,100,0xa9,0").await,
            "bt_mp_SetParam1,0"
        );
        assert_eq!(
            run(&mut m, "bt_mp_SetParam2 0xff,0x13,0x1234,5,e04c112233").await,
            "bt_mp_SetParam2,0"
        );
        assert_eq!(m.params().config().channel, 39);
        assert_eq!(m.params().config().tx_packet_count, 100);
        assert_eq!(m.params().config().hit_target, 0xe0_4c11_2233);

        assert_eq!(run(&mut m, "bt_mp_SetParam1 1,2,3").await, "bt_mp_SetParam1,2");
        assert_eq!(m.params().config().channel, 39);
    }

    #[tokio::test]
    async fn custom_delimiters() {
        let mut m = MpModuleBuilder::new()
            .delimiters(Delimiters {
                pair: ';',
                field: ':',
                result: ' ',
            })
            .build_with_store(MockDevice::new(), MemoryConfigStore::new())
            .unwrap();
        assert_eq!(run(&mut m, "bt_mp_SetParam 1:20;2:3").await, "bt_mp_SetParam 0");
        assert_eq!(run(&mut m, "bt_mp_GetParam 1").await, "bt_mp_GetParam 1 0x14");
    }

    // -----------------------------------------------------------------------
    // Registers and HCI
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn reg_rw_read_and_write() {
        let mut m = module();
        m.device_mut().set_register(RegisterSpace::Rf, 0, 0x3c, 0b1111_0000);

        assert_eq!(run(&mut m, "bt_mp_RegRW 1,1,0x3c,2,0,5").await, "bt_mp_RegRW,0");
        assert_eq!(
            run(&mut m, "bt_mp_RegRW 1,0,0x3c,7,4").await,
            "bt_mp_RegRW,0,0000000f"
        );
        assert_eq!(
            m.device().register(RegisterSpace::Rf, 0, 0x3c),
            0b1111_0101
        );
    }

    #[tokio::test]
    async fn reg_rw_field_counts() {
        let mut m = module();
        assert_eq!(run(&mut m, "bt_mp_RegRW 1,0,0x3c,7").await, "bt_mp_RegRW,2");
        assert_eq!(run(&mut m, "bt_mp_RegRW 1,0,0x3c,7,4,1").await, "bt_mp_RegRW,2");
        assert_eq!(run(&mut m, "bt_mp_RegRW 1,1,0x3c,7,4,1").await, "bt_mp_RegRW,0");
        assert_eq!(
            run(&mut m, "bt_mp_RegRW 0,0,3,0x10,31,0").await,
            "bt_mp_RegRW,0,00000000"
        );
    }

    #[tokio::test]
    async fn reg_rw_device_failure() {
        let mut m = module();
        m.device_mut().fail_next(Error::Device("bus".into()));
        assert_eq!(run(&mut m, "bt_mp_RegRW 2,0,0x01,7,0").await, "bt_mp_RegRW,1");
    }

    #[tokio::test]
    async fn hci_cmd_echoes_event() {
        let mut m = module();
        m.device_mut()
            .set_hci_response(0x1001, vec![0x0e, 0x0c, 0x01, 0x01, 0x10, 0x00]);
        assert_eq!(
            run(&mut m, "bt_mp_HciCmd 0x1001,0").await,
            "bt_mp_HciCmd,e,c,1,1,10,0"
        );
        assert_eq!(
            m.device().calls().last(),
            Some(&DeviceCall::HciCommand {
                opcode: 0x1001,
                payload: vec![],
                event_code: HCI_EVENT_COMMAND_COMPLETE,
            })
        );
    }

    #[tokio::test]
    async fn hci_cmd_length_mismatch() {
        let mut m = module();
        assert_eq!(run(&mut m, "bt_mp_HciCmd 0xfc61,2,1").await, "bt_mp_HciCmd,2");
        assert!(m.device().calls().is_empty());
    }

    // -----------------------------------------------------------------------
    // Exec and reports
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn exec_packet_tx_flow() {
        let mut m = module();
        m.device_mut().push_sample(CounterSample {
            tx_bits: 0x1200,
            tx_packets: 3,
            ..CounterSample::default()
        });

        assert_eq!(run(&mut m, "bt_mp_Exec 16").await, "bt_mp_Exec,10,0");
        assert_eq!(
            m.session_state(),
            SessionState::Active(SessionClass::PacketTx)
        );
        assert_eq!(run(&mut m, "bt_mp_Exec 18").await, "bt_mp_Exec,12,0");
        assert_eq!(run(&mut m, "bt_mp_ReportTx").await, "bt_mp_ReportTx,1200,3");
        assert_eq!(run(&mut m, "bt_mp_Exec 20").await, "bt_mp_Exec,14,0");
        assert_eq!(run(&mut m, "bt_mp_ReportTx").await, "bt_mp_ReportTx,1200,3");
    }

    #[tokio::test]
    async fn exec_rejects_bad_ordinals() {
        let mut m = module();
        assert_eq!(run(&mut m, "bt_mp_Exec 0").await, "bt_mp_Exec,2");
        assert_eq!(run(&mut m, "bt_mp_Exec 34").await, "bt_mp_Exec,2");
        assert_eq!(run(&mut m, "bt_mp_Exec 1,2").await, "bt_mp_Exec,2");
    }

    #[tokio::test]
    async fn exec_wrong_state() {
        let mut m = module();
        assert_eq!(run(&mut m, "bt_mp_Exec 18").await, "bt_mp_Exec,2");
        assert!(m.device().calls().is_empty());
    }

    #[tokio::test]
    async fn exec_device_failure() {
        let mut m = module();
        m.device_mut().fail_next(Error::Timeout);
        assert_eq!(run(&mut m, "bt_mp_Exec 21").await, "bt_mp_Exec,1");
        assert_eq!(m.session_state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn hci_reset_and_report_clear_restore_baseline() {
        let mut m = module();
        for clearing in ["bt_mp_Exec 15", "bt_mp_Exec 33"] {
            m.device_mut().push_sample(CounterSample {
                rx_bits: 4000,
                rx_packets: 2,
                rx_error_bits: 8,
                rx_received_packets: 2,
                rssi: Some(-55),
                ..CounterSample::default()
            });
            run(&mut m, "bt_mp_Exec 21").await;
            run(&mut m, "bt_mp_Exec 23").await;
            assert_eq!(
                run(&mut m, "bt_mp_ReportRx").await,
                "bt_mp_ReportRx,ffffffc9,fa0,2,8"
            );
            run(&mut m, clearing).await;
            assert_eq!(
                run(&mut m, "bt_mp_ReportRx").await,
                "bt_mp_ReportRx,ffffffa6,0,0,0"
            );
            assert_eq!(
                run(&mut m, "bt_mp_ReportAll").await,
                "bt_mp_ReportAll,0,0,ffffffa6,0,0,0,0"
            );
            // Leave the RX session so the next round can start it again.
            run(&mut m, "bt_mp_Exec 15").await;
        }
    }

    #[tokio::test]
    async fn report_chip_queries_device() {
        let mut m = module();
        m.device_mut().set_chip_info(ChipInfo {
            hci_version: 8,
            hci_revision: 0x000d,
            lmp_version: 8,
            lmp_subversion: 0x8761,
            chip_type: 2,
            rom_version: 1,
        });
        assert_eq!(
            run(&mut m, "bt_mp_ReportChip").await,
            "bt_mp_ReportChip,2,8,d,8,8761,1"
        );
        m.device_mut().fail_next(Error::Timeout);
        assert_eq!(run(&mut m, "bt_mp_ReportChip").await, "bt_mp_ReportChip,1");
    }

    #[tokio::test]
    async fn report_cont_tx_view() {
        let mut m = module();
        assert_eq!(run(&mut m, "bt_mp_ReportContTx").await, "bt_mp_ReportContTx,0,0");
    }

    // -----------------------------------------------------------------------
    // SetConfig
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn set_config_writes_once() {
        let mut m = module();
        assert_eq!(
            run(&mut m, "bt_mp_SetConfig bt_addr,0|00:e0:4c:11:22:33").await,
            "bt_mp_SetConfig,0"
        );
        let writes = m.config_store().writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].path, "bt_addr");
        assert_eq!(writes[0].mode, ConfigMode::Address);
        assert_eq!(&writes[0].payload[..], b"00:e0:4c:11:22:33");
    }

    #[tokio::test]
    async fn set_config_errors() {
        let mut m = module();
        assert_eq!(run(&mut m, "bt_mp_SetConfig path,9").await, "bt_mp_SetConfig,2");

        m.config_store.fail_next(Error::Io(std::io::Error::other("read-only")));
        assert_eq!(run(&mut m, "bt_mp_SetConfig cal,1|1,2").await, "bt_mp_SetConfig,1");
        assert!(m.config_store().writes().is_empty());
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn shutdown_returns_device() {
        let mut m = module();
        m.exec_action(Action::SetTxChannel).await.unwrap();
        let device = m.shutdown();
        assert_eq!(device.calls(), &[DeviceCall::SetTxChannel(10)]);
    }
}
