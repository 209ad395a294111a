//! `vault shell` -- line-oriented driver for the workflow engine.
//!
//! Reads one command per line. The simulated wallet is the in-memory
//! contract's signer, so `connect` and `disconnect` move both together.

use std::fmt::Write as _;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;
use vault_chain::MemoryContract;
use vault_workflow::{InitOutcome, UploadForm, WorkflowEngine};

use crate::render;
use crate::OutputFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell {
    engine: WorkflowEngine,
    contract: MemoryContract,
    wallet: String,
    output: OutputFormat,
}

impl Shell {
    pub fn new(
        engine: WorkflowEngine,
        contract: MemoryContract,
        wallet: String,
        output: OutputFormat,
    ) -> Self {
        Self {
            engine,
            contract,
            wallet,
            output,
        }
    }

    /// Run commands from `input` until `quit` or end of input.
    pub async fn run<R: AsyncBufRead + Unpin>(&self, input: R) -> std::io::Result<()> {
        println!("vault shell. Type 'help' for commands.");
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let mut out = String::new();
            let flow = self.execute(&line, &mut out).await;
            if !out.is_empty() {
                println!("{}", out.trim_end());
            }
            if flow == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    /// Execute one command line, appending what it prints to `out`.
    pub async fn execute(&self, line: &str, out: &mut String) -> Flow {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Flow::Continue;
        }
        let mut parts = trimmed.split_whitespace();
        let cmd = parts.next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = parts.collect();
        debug!(command = %cmd, "shell command");

        match cmd.as_str() {
            "help" => help(out),
            "connect" => {
                let address = args.first().map_or(self.wallet.as_str(), |a| *a);
                self.contract.connect_signer(address);
                self.engine.connect(address).await;
                let _ = writeln!(out, "session: {:?}", self.engine.phase());
            }
            "disconnect" => {
                self.contract.disconnect_signer();
                self.engine.disconnect().await;
                let _ = writeln!(out, "session: {:?}", self.engine.phase());
            }
            "init" => {
                let outcome = self.engine.ensure_initialized().await;
                let _ = writeln!(out, "{}", init_text(outcome));
            }
            "upload" => {
                if args.len() < 3 {
                    let _ = writeln!(
                        out,
                        "usage: upload <name> <value> <confidence> [description...]"
                    );
                    return Flow::Continue;
                }
                let description = args[3..].join(" ");
                self.engine.open_upload();
                self.engine
                    .set_upload_form(UploadForm::new(args[0], args[1], args[2], description));
                if let Ok(id) = self.engine.upload().await {
                    let _ = writeln!(out, "created {id}");
                }
            }
            "list" => self.list(&self.engine.records(), out),
            "search" => {
                let term = args.join(" ");
                self.list(&self.engine.search(&term), out);
            }
            "show" => match args.first().and_then(|id| self.engine.record(id)) {
                Some(record) => {
                    let display = self.engine.value_display(&record.id);
                    match self.output {
                        OutputFormat::Json => {
                            let _ = writeln!(out, "{}", render::json(&record));
                        }
                        OutputFormat::Text => {
                            let _ = writeln!(out, "{}", render::record_detail(&record, display));
                        }
                    }
                }
                None => {
                    let _ = writeln!(out, "usage: show <id> (an id from 'list')");
                }
            },
            "decrypt" => {
                let Some(id) = args.first() else {
                    let _ = writeln!(out, "usage: decrypt <id>");
                    return Flow::Continue;
                };
                if let Some(value) = self.engine.decrypt(id).await {
                    let _ = writeln!(out, "value {value}");
                }
            }
            "refresh" => {
                if let Ok(count) = self.engine.refresh().await {
                    let _ = writeln!(out, "{count} records");
                }
            }
            "check" => {
                if !self.engine.check_availability().await {
                    let _ = writeln!(out, "contract did not report available");
                }
            }
            "history" => {
                let entries = self.engine.history();
                let _ = match self.output {
                    OutputFormat::Json => writeln!(out, "{}", render::json(&entries)),
                    OutputFormat::Text => writeln!(out, "{}", render::history(&entries)),
                };
            }
            "stats" => {
                let stats = self.engine.stats();
                let _ = match self.output {
                    OutputFormat::Json => writeln!(out, "{}", render::json(&stats)),
                    OutputFormat::Text => writeln!(out, "{}", render::stats(&stats)),
                };
            }
            "status" => {
                if render::status_line(&self.engine.status()).is_none() {
                    let _ = writeln!(out, "no status");
                }
            }
            "snapshot" => {
                let _ = writeln!(out, "{}", render::json(&self.engine.snapshot()));
            }
            "quit" | "exit" => return Flow::Quit,
            _ => {
                let _ = writeln!(
                    out,
                    "unknown command: {}. Type 'help' for available commands.",
                    cmd
                );
                return Flow::Continue;
            }
        }

        if let Some(status) = render::status_line(&self.engine.status()) {
            let _ = writeln!(out, "{status}");
        }
        Flow::Continue
    }

    fn list(&self, records: &[vault_workflow::Record], out: &mut String) {
        if self.output == OutputFormat::Json {
            let _ = writeln!(out, "{}", render::json(&records));
            return;
        }
        if records.is_empty() {
            let _ = writeln!(out, "no records");
        }
        for record in records {
            let display = self.engine.value_display(&record.id);
            let _ = writeln!(out, "{}", render::record_line(record, display));
        }
    }
}

fn init_text(outcome: InitOutcome) -> &'static str {
    match outcome {
        InitOutcome::NotConnected => "not connected",
        InitOutcome::InProgress => "initialization already in progress",
        InitOutcome::AlreadyReady => "already initialized",
        InitOutcome::Initialized => "initialized",
        InitOutcome::Failed => "initialization failed",
        InitOutcome::Superseded => "session changed during initialization",
    }
}

fn help(out: &mut String) {
    let _ = writeln!(out, "  connect [address]                 Connect the wallet and initialize");
    let _ = writeln!(out, "  disconnect                        Disconnect the wallet");
    let _ = writeln!(out, "  init                              Retry encryption initialization");
    let _ = writeln!(out, "  upload <name> <value> <conf> [d]  Encrypt and upload a record");
    let _ = writeln!(out, "  list                              List records");
    let _ = writeln!(out, "  search <term>                     Search name and description");
    let _ = writeln!(out, "  show <id>                         Show one record");
    let _ = writeln!(out, "  decrypt <id>                      Decrypt and verify on-chain");
    let _ = writeln!(out, "  refresh                           Reload records");
    let _ = writeln!(out, "  check                             Contract availability check");
    let _ = writeln!(out, "  history                           Recent operations");
    let _ = writeln!(out, "  stats                             Record statistics");
    let _ = writeln!(out, "  status                            Current status");
    let _ = writeln!(out, "  snapshot                          Full state as JSON");
    let _ = writeln!(out, "  quit                              Leave the shell");
}
