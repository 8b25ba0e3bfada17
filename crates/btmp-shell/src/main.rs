// btmp shell -- runs mass-production test command lines against a simulated
// device and prints one response line per command.
//
// Usage:
//   btmp-shell                                  # read commands from stdin
//   btmp-shell --script smoke.txt
//   btmp-shell --field-delim : --pair-delim ';' --script custom.txt
//   RUST_LOG=btmp_engine=debug btmp-shell --config-dir /tmp/bt < cmds.txt
//
// Script format: one `<command-name> <args>` per line. Blank lines and lines
// starting with `#` are skipped.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use btmp_core::{ChipInfo, ConfigStore, CounterSample};
use btmp_engine::{MpModule, MpModuleBuilder};
use btmp_protocol::Delimiters;
use btmp_test_harness::MockDevice;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// btmp shell -- drives the test command engine from the command line.
#[derive(Parser)]
#[command(name = "btmp-shell", version, about)]
struct Cli {
    /// Read commands from this file instead of stdin.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Delimiter between parameter groups.
    #[arg(long, default_value_t = '|')]
    pair_delim: char,

    /// Delimiter between fields inside a group.
    #[arg(long, default_value_t = ',')]
    field_delim: char,

    /// Delimiter between response fields.
    #[arg(long, default_value_t = ',')]
    result_delim: char,

    /// Timeout for the HCI reset action, in milliseconds.
    #[arg(long, default_value_t = 700)]
    hci_reset_timeout_ms: u64,

    /// Directory that relative bt_mp_SetConfig paths are written under.
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Stop at the first command that does not succeed.
    #[arg(long)]
    fail_fast: bool,
}

// ---------------------------------------------------------------------------
// Simulated device
// ---------------------------------------------------------------------------

/// A mock device that reports plausible counters on every poll.
fn simulated_device() -> MockDevice {
    let mut device = MockDevice::new();
    device.set_auto_sample(CounterSample {
        tx_bits: 27_000,
        tx_packets: 10,
        rx_bits: 27_000,
        rx_packets: 10,
        rx_error_bits: 3,
        rx_received_packets: 10,
        rssi: Some(-48),
    });
    device.set_chip_info(ChipInfo {
        hci_version: 0x08,
        hci_revision: 0x000d,
        lmp_version: 0x08,
        lmp_subversion: 0x8761,
        chip_type: 0x02,
        rom_version: 0x01,
    });
    device
}

// ---------------------------------------------------------------------------
// Script execution
// ---------------------------------------------------------------------------

/// Outcome counts of one script run.
#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    succeeded: usize,
    failed: usize,
}

/// Run every command line from `input`, writing responses to `out`.
async fn run_script<R, W, S>(
    module: &mut MpModule<MockDevice, S>,
    input: R,
    out: &mut W,
    fail_fast: bool,
) -> Result<Summary>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    S: ConfigStore,
{
    let mut summary = Summary::default();
    let mut lines = input.lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await.context("reading command input")? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let ok = match module.handle_line(line).await {
            Ok(response) => {
                writeln!(out, "{response}")?;
                response.status().is_success()
            }
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "rejected command line");
                writeln!(out, "error: line {line_no}: {e}")?;
                false
            }
        };

        if ok {
            summary.succeeded += 1;
        } else {
            summary.failed += 1;
            if fail_fast {
                bail!("line {line_no} failed: {line}");
            }
        }
    }
    Ok(summary)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut builder = MpModuleBuilder::new()
        .delimiters(Delimiters {
            pair: cli.pair_delim,
            field: cli.field_delim,
            result: cli.result_delim,
        })
        .hci_reset_timeout(Duration::from_millis(cli.hci_reset_timeout_ms));
    if let Some(dir) = &cli.config_dir {
        builder = builder.config_dir(dir);
    }
    let mut module = builder
        .build(simulated_device())
        .context("invalid module configuration")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = match &cli.script {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening script {}", path.display()))?;
            run_script(&mut module, BufReader::new(file), &mut out, cli.fail_fast).await?
        }
        None => {
            let stdin = BufReader::new(tokio::io::stdin());
            run_script(&mut module, stdin, &mut out, cli.fail_fast).await?
        }
    };

    let device = module.shutdown();
    tracing::debug!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        device_calls = device.calls().len(),
        "script finished"
    );
    if summary.failed > 0 {
        bail!("{} of {} commands failed", summary.failed, summary.succeeded + summary.failed);
    }
    Ok(())
}
