//! Conversions performed by external command-line tools.

use std::ffi::OsString;
use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Context as _;

use crate::canvas::executable::ExecutableResolver;
use crate::canvas::node::{Converter, Rendered, check_page_outputs, ensure_parent_dir, page_output};
use crate::config::RunConfig;
use crate::foundation::core::Size;
use crate::foundation::error::{TokenpressError, TokenpressResult};
use crate::foundation::temp::TempFiles;

/// How long to wait for the stderr reader after the process exited.
const STDERR_GRACE: Duration = Duration::from_secs(1);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Description of one external tool.
pub trait CommandTool {
    /// Declared name of the produced format, e.g. `"pdf(rsvg)"`.
    fn name(&self) -> String;

    /// Distribution directory inside a binary root.
    fn repo(&self) -> &str;

    /// Executable name without platform suffix.
    fn binary(&self) -> &str;

    fn input_suffix(&self) -> &str;

    fn output_suffix(&self) -> &str;

    /// Whether all inputs combine into a single output.
    fn many_to_one(&self) -> bool;

    /// Whether one invocation accepts several input files.
    fn multiple_inputs(&self) -> bool {
        self.many_to_one()
    }

    /// Arguments for one invocation.
    fn args(&self, inputs: &[PathBuf], output: &Path) -> Vec<OsString>;
}

/// Runs a [`CommandTool`] over the inner node's results.
///
/// Inputs are written to temp files. The output goes to the final path, or to a temp file when
/// the result is requested in memory. Every temp file is removed in `cleanup`.
pub struct CommandConverter<T> {
    tool: T,
    resolver: ExecutableResolver,
    output: PathBuf,
    timeout: Option<Duration>,
    split_pages: bool,
    temps: TempFiles,
}

impl<T: CommandTool> CommandConverter<T> {
    pub fn new(tool: T, cfg: &RunConfig) -> Self {
        let temps = TempFiles::new(tool.name()).in_dir(cfg.temp_dir.clone());
        Self {
            resolver: ExecutableResolver::from_config(cfg),
            output: cfg.output_file.clone(),
            timeout: cfg.conversion_timeout(),
            split_pages: cfg.split_pages,
            temps,
            tool,
        }
    }

    pub fn with_resolver(mut self, resolver: ExecutableResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// Temp files currently held.
    pub fn temp_paths(&self) -> Vec<PathBuf> {
        self.temps.paths().map(Path::to_path_buf).collect()
    }

    /// Group inputs into invocations.
    fn batches(&self, inputs: Vec<Rendered>) -> TokenpressResult<Vec<Vec<Rendered>>> {
        if self.tool.many_to_one() {
            if inputs.len() > 1 && !self.tool.multiple_inputs() {
                return Err(TokenpressError::unsupported_multi_page(format!(
                    "{} combines its input into one document but accepts a single input file, got {}",
                    self.tool.name(),
                    inputs.len()
                )));
            }
            return Ok(vec![inputs]);
        }
        Ok(inputs.into_iter().map(|r| vec![r]).collect())
    }
}

impl<T: CommandTool> Converter for CommandConverter<T> {
    fn name(&self) -> String {
        self.tool.name()
    }

    fn convert(
        &mut self,
        inputs: Vec<Rendered>,
        _sizes: &[Size],
        verbose: bool,
        return_result: bool,
    ) -> TokenpressResult<Option<Vec<Rendered>>> {
        if inputs.is_empty() {
            return Err(TokenpressError::validation(format!(
                "{} received nothing to convert",
                self.tool.name()
            )));
        }
        let batches = self.batches(inputs)?;
        if !return_result {
            check_page_outputs(&self.tool.name(), batches.len(), self.split_pages)?;
        }
        // Resolve before writing any temp file.
        let exe = self.resolver.resolve(self.tool.repo(), self.tool.binary())?;

        let total = batches.len();
        let mut results = Vec::with_capacity(total);
        for (i, batch) in batches.into_iter().enumerate() {
            let input_paths = batch
                .iter()
                .map(|r| self.temps.write(self.tool.input_suffix(), r.as_bytes()))
                .collect::<TokenpressResult<Vec<_>>>()?;
            let output = if return_result {
                self.temps.reserve(self.tool.output_suffix())?
            } else {
                let path = page_output(&self.output, i, total);
                ensure_parent_dir(&path)?;
                path
            };

            let mut cmd = Command::new(&exe);
            cmd.args(self.tool.args(&input_paths, &output));
            run_command(cmd, verbose, self.timeout)?;

            if return_result {
                let bytes = std::fs::read(&output)
                    .with_context(|| format!("read tool output '{}'", output.display()))?;
                results.push(Rendered::Bytes(bytes));
            } else {
                tracing::info!(path = %output.display(), "wrote output");
            }
        }
        Ok(return_result.then_some(results))
    }

    fn cleanup(&mut self) {
        self.temps.cleanup();
    }
}

/// Render a command line for logs and error messages.
pub fn render_command(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|s| s.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run `cmd` to completion.
///
/// In verbose mode the tool's output is passed through; otherwise stdout is discarded and stderr
/// is captured for the error. A `timeout` kills the process when exceeded.
pub fn run_command(
    mut cmd: Command,
    verbose: bool,
    timeout: Option<Duration>,
) -> TokenpressResult<()> {
    let rendered = render_command(&cmd);
    if verbose {
        tracing::info!(command = %rendered, "running external tool");
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    } else {
        tracing::debug!(command = %rendered, "running external tool");
        cmd.stdout(Stdio::null()).stderr(Stdio::piped());
    }
    cmd.stdin(Stdio::null());

    let mut child = cmd
        .spawn()
        .map_err(|e| TokenpressError::conversion_failed(&rendered, format!("spawn failed: {e}"), ""))?;
    let stderr = drain_stderr(&mut child);

    let status = wait_with_timeout(&mut child, timeout)
        .map_err(|e| TokenpressError::conversion_failed(&rendered, format!("wait failed: {e}"), ""))?;
    let Some(status) = status else {
        let _ = child.kill();
        let _ = child.wait();
        let waited = timeout.map(|t| t.as_secs_f64()).unwrap_or_default();
        return Err(TokenpressError::conversion_failed(
            rendered,
            format!("timed out after {waited:.1}s"),
            collect_stderr(stderr),
        ));
    };

    if status.success() {
        return Ok(());
    }
    Err(TokenpressError::conversion_failed(
        rendered,
        status.to_string(),
        collect_stderr(stderr),
    ))
}

/// Read stderr on a helper thread so a chatty tool never blocks on a full pipe.
fn drain_stderr(child: &mut Child) -> Option<mpsc::Receiver<Vec<u8>>> {
    let mut pipe = child.stderr.take()?;
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(buf);
    });
    Some(rx)
}

fn collect_stderr(rx: Option<mpsc::Receiver<Vec<u8>>>) -> String {
    // Helpers forked by the tool may keep the pipe open; do not wait for them.
    rx.and_then(|rx| rx.recv_timeout(STDERR_GRACE).ok())
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default()
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> std::io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/command.rs"]
mod tests;
