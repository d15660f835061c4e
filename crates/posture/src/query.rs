//! Host query adapter.
//!
//! Two backends sit behind [`HostQuery`]: the `osqueryi` inventory interface
//! and the platform command shell. Both fail open: a missing tool, a
//! non-zero exit or a timeout yields an empty result and a log line, never an
//! error, so the remaining checks still run.

use std::collections::BTreeMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{Platform, PostureError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(25);
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

// Forces UTF-8 output so localized powercfg / CIM text survives decoding.
const POWERSHELL_UTF8_PRELUDE: &str =
    "[Console]::OutputEncoding = [System.Text.Encoding]::UTF8; ";

/// One inventory row: column name to string value.
pub type Row = BTreeMap<String, String>;

/// Ordered rows returned by an inventory query. Empty means "no match".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    rows: Vec<Row>,
}

impl QueryResult {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Values of `column` across all rows that carry it.
    pub fn column<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.rows
            .iter()
            .filter_map(move |row| row.get(column).map(String::as_str))
    }
}

/// Read-only access to host state used by every detector.
pub trait HostQuery {
    /// Run a structured inventory query (osquery SQL).
    fn inventory(&self, query: &str) -> QueryResult;

    /// Run a command through the platform shell and return trimmed stdout.
    fn shell(&self, command: &str) -> String;

    /// Non-empty session environment variable.
    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.trim().is_empty())
    }
}

impl<H: HostQuery + ?Sized> HostQuery for &H {
    fn inventory(&self, query: &str) -> QueryResult {
        (**self).inventory(query)
    }

    fn shell(&self, command: &str) -> String {
        (**self).shell(command)
    }

    fn env_var(&self, name: &str) -> Option<String> {
        (**self).env_var(name)
    }
}

#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub command_timeout: Duration,
    pub osquery_path: String,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            osquery_path: "osqueryi".to_string(),
        }
    }
}

/// Program plus the leading arguments that make it execute one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ShellCommand {
    pub fn new(program: impl Into<PathBuf>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// [`HostQuery`] backed by real child processes.
#[derive(Debug, Clone)]
pub struct SystemQuery {
    platform: Platform,
    shell: ShellCommand,
    options: QueryOptions,
}

impl SystemQuery {
    /// Resolve the shell for `platform`.
    ///
    /// Fails with [`PostureError::NoShellAvailable`] on Windows hosts without
    /// PowerShell; every Windows detector depends on it.
    pub fn new(platform: Platform, options: QueryOptions) -> Result<Self> {
        Self::with_shell(platform, options, resolve_shell(platform))
    }

    fn with_shell(
        platform: Platform,
        options: QueryOptions,
        shell: Option<ShellCommand>,
    ) -> Result<Self> {
        let shell = shell.ok_or(PostureError::NoShellAvailable)?;
        info!(
            platform = %platform,
            shell = %shell.program.display(),
            timeout_ms = options.command_timeout.as_millis() as u64,
            "host query adapter ready"
        );
        Ok(Self {
            platform,
            shell,
            options,
        })
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn shell_program(&self) -> &Path {
        &self.shell.program
    }

    fn execute(&self, command: &mut Command, label: &str) -> Option<String> {
        match run_with_timeout(command, self.options.command_timeout) {
            Ok(Some(output)) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(Some(output)) => {
                warn!(
                    command = label,
                    status = %output.status,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "host command exited with failure"
                );
                None
            }
            Ok(None) => {
                warn!(
                    command = label,
                    timeout_ms = self.options.command_timeout.as_millis() as u64,
                    "host command timed out"
                );
                None
            }
            Err(err) => {
                warn!(command = label, error = %err, "failed to spawn host command");
                None
            }
        }
    }
}

impl HostQuery for SystemQuery {
    fn inventory(&self, query: &str) -> QueryResult {
        let mut command = Command::new(&self.options.osquery_path);
        command.arg("--json").arg(query);

        let Some(stdout) = self.execute(&mut command, query) else {
            return QueryResult::default();
        };
        match parse_osquery_json(&stdout) {
            Ok(result) => {
                debug!(query, rows = result.len(), "inventory query completed");
                result
            }
            Err(err) => {
                warn!(query, error = %err, "failed to parse inventory output");
                QueryResult::default()
            }
        }
    }

    fn shell(&self, command_text: &str) -> String {
        let script = match self.platform {
            Platform::Windows => format!("{}{}", POWERSHELL_UTF8_PRELUDE, command_text),
            Platform::MacOs | Platform::Linux => command_text.to_string(),
        };
        let mut command = Command::new(&self.shell.program);
        command.args(&self.shell.args).arg(script);

        self.execute(&mut command, command_text)
            .map(|stdout| stdout.trim().to_string())
            .unwrap_or_default()
    }
}

/// Run `command` to completion, killing it once `timeout` elapses.
///
/// Returns `Ok(None)` on timeout. The deadline also covers collecting output:
/// a descendant that inherited the pipes and outlives the child cannot hold
/// the call open past `timeout`.
pub fn run_with_timeout(command: &mut Command, timeout: Duration) -> io::Result<Option<Output>> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let deadline = Instant::now() + timeout;
    let (tx, rx) = mpsc::channel();
    let readers = usize::from(drain(child.stdout.take(), Pipe::Stdout, &tx))
        + usize::from(drain(child.stderr.take(), Pipe::Stderr, &tx));
    drop(tx);

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                kill(&mut child);
                return Ok(None);
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(err) => {
                kill(&mut child);
                return Err(err);
            }
        }
    };

    let mut output = Output {
        status,
        stdout: Vec::new(),
        stderr: Vec::new(),
    };
    for _ in 0..readers {
        match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok((Pipe::Stdout, buf)) => output.stdout = buf,
            Ok((Pipe::Stderr, buf)) => output.stderr = buf,
            Err(RecvTimeoutError::Timeout) => {
                // Readers stay detached; the descendant still holds the pipe.
                debug!("output pipe held open past the deadline");
                return Ok(None);
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(Some(output))
}

#[derive(Debug, Clone, Copy)]
enum Pipe {
    Stdout,
    Stderr,
}

/// Read `pipe` to the end on a helper thread. Returns whether a reader was
/// started.
fn drain<R: Read + Send + 'static>(
    pipe: Option<R>,
    kind: Pipe,
    tx: &Sender<(Pipe, Vec<u8>)>,
) -> bool {
    let Some(mut pipe) = pipe else {
        return false;
    };
    let tx = tx.clone();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send((kind, buf));
    });
    true
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Parse `osqueryi --json` output into rows of strings.
pub(crate) fn parse_osquery_json(raw: &str) -> std::result::Result<QueryResult, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(QueryResult::default());
    }

    let value: Value = serde_json::from_str(trimmed).map_err(|err| err.to_string())?;
    let Value::Array(items) = value else {
        return Err("expected a JSON array of rows".to_string());
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => Ok(map
                .into_iter()
                .map(|(column, value)| (column, value_to_cell(value)))
                .collect::<Row>()),
            other => Err(format!("expected a JSON object row, got {}", other)),
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(QueryResult::new)
}

fn value_to_cell(value: Value) -> String {
    match value {
        Value::String(raw) => raw,
        Value::Null => String::new(),
        Value::Bool(v) => (if v { "1" } else { "0" }).to_string(),
        other => other.to_string(),
    }
}

fn resolve_shell(platform: Platform) -> Option<ShellCommand> {
    let fallbacks = match platform {
        Platform::Windows => known_windows_powershell_locations(),
        Platform::MacOs | Platform::Linux => Vec::new(),
    };
    resolve_shell_with(platform, find_in_path, &fallbacks)
}

/// Pick the shell for `platform` from `lookup` (a PATH search) and, on
/// Windows, the installed PowerShell locations in `windows_fallbacks`.
fn resolve_shell_with(
    platform: Platform,
    lookup: impl Fn(&str) -> Option<PathBuf>,
    windows_fallbacks: &[PathBuf],
) -> Option<ShellCommand> {
    match platform {
        Platform::Windows => lookup("pwsh")
            .or_else(|| lookup("powershell"))
            .or_else(|| windows_fallbacks.first().cloned())
            .map(|program| {
                ShellCommand::new(program, &["-NoProfile", "-NonInteractive", "-Command"])
            }),
        Platform::MacOs | Platform::Linux => {
            let program = lookup("sh").unwrap_or_else(|| PathBuf::from("/bin/sh"));
            Some(ShellCommand::new(program, &["-c"]))
        }
    }
}

fn find_in_path(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}

fn known_windows_powershell_locations() -> Vec<PathBuf> {
    let mut out = Vec::new();

    // PowerShell 7 first.
    for var in ["ProgramFiles", "ProgramFiles(x86)"] {
        if let Ok(root) = std::env::var(var) {
            let p = Path::new(&root).join("PowerShell").join("7").join("pwsh.exe");
            if p.exists() {
                out.push(p);
            }
        }
    }

    if let Ok(root) = std::env::var("SystemRoot") {
        let p = Path::new(&root)
            .join("System32")
            .join("WindowsPowerShell")
            .join("v1.0")
            .join("powershell.exe");
        if p.exists() {
            out.push(p);
        }
    }

    out
}
