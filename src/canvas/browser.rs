//! HTML to PDF through a browser engine that is polled until it goes idle.
//!
//! The engine reports layout activity as events. Once no event has arrived for longer than the
//! idle threshold, the content is exported and the engine is shut down. The whole exchange runs
//! on the calling thread; engines that need a main-thread event loop get one for free when the
//! pipeline is driven from `main`.

use std::io::{BufRead as _, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use anyhow::Context as _;

use crate::canvas::command::render_command;
use crate::canvas::executable::ExecutableResolver;
use crate::canvas::node::{Converter, Rendered, ensure_parent_dir};
use crate::canvas::tools::{chromium_base_args, print_to_pdf_arg};
use crate::config::RunConfig;
use crate::foundation::core::Size;
use crate::foundation::error::{TokenpressError, TokenpressResult};
use crate::foundation::temp::TempFiles;

/// A running browser engine as seen by [`IdleExporter`].
pub trait EngineSession {
    /// Start loading `input`.
    fn load(&mut self, input: &Path) -> TokenpressResult<()>;

    /// Wait up to `wait` and return how many layout-affecting events arrived meanwhile.
    fn pump_events(&mut self, wait: Duration) -> TokenpressResult<usize>;

    /// Export the loaded content as PDF to `output`.
    fn export(&mut self, output: &Path) -> TokenpressResult<()>;

    /// Stop the engine. Called exactly once, whatever happened before.
    fn shutdown(&mut self);
}

/// Poll/threshold state machine around an [`EngineSession`].
#[derive(Clone, Debug)]
pub struct IdleExporter {
    pub poll: Duration,
    pub threshold: Duration,
    /// Hard upper bound for the whole load. `None` waits for idleness indefinitely.
    pub deadline: Option<Duration>,
}

impl IdleExporter {
    pub fn from_config(cfg: &RunConfig) -> Self {
        Self {
            poll: Duration::from_millis(cfg.idle_poll_ms),
            threshold: Duration::from_millis(cfg.idle_threshold_ms),
            deadline: cfg.conversion_timeout(),
        }
    }

    pub fn run<E: EngineSession>(
        &self,
        engine: &mut E,
        input: &Path,
        output: &Path,
    ) -> TokenpressResult<()> {
        let result = self.drive(engine, input, output);
        engine.shutdown();
        result
    }

    fn drive<E: EngineSession>(
        &self,
        engine: &mut E,
        input: &Path,
        output: &Path,
    ) -> TokenpressResult<()> {
        engine.load(input)?;
        let started = Instant::now();
        let mut last_change = started;
        loop {
            let events = engine.pump_events(self.poll)?;
            let now = Instant::now();
            if events > 0 {
                tracing::trace!(events, "engine still busy");
                last_change = now;
            } else if now.duration_since(last_change) > self.threshold {
                tracing::debug!(
                    elapsed_ms = now.duration_since(started).as_millis() as u64,
                    "engine idle, exporting"
                );
                return engine.export(output);
            }
            if let Some(deadline) = self.deadline
                && now.duration_since(started) > deadline
            {
                return Err(TokenpressError::conversion_failed(
                    format!("idle export of '{}'", input.display()),
                    format!("engine did not go idle within {:.1}s", deadline.as_secs_f64()),
                    "",
                ));
            }
        }
    }
}

/// Headless Chromium driven as an [`EngineSession`].
///
/// Chromium's log lines stand in for layout events. The process prints to a staging file that is
/// copied to the requested output on export.
pub struct ChromiumSession {
    exe: PathBuf,
    staging: PathBuf,
    child: Option<Child>,
    lines: Option<mpsc::Receiver<String>>,
    log: Vec<String>,
}

impl ChromiumSession {
    pub fn new(exe: PathBuf, staging: PathBuf) -> Self {
        Self {
            exe,
            staging,
            child: None,
            lines: None,
            log: Vec::new(),
        }
    }
}

impl EngineSession for ChromiumSession {
    fn load(&mut self, input: &Path) -> TokenpressResult<()> {
        let mut cmd = Command::new(&self.exe);
        cmd.args(chromium_base_args())
            .arg("--enable-logging=stderr")
            .arg("--v=1")
            .arg(print_to_pdf_arg(&self.staging))
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        let rendered = render_command(&cmd);
        tracing::debug!(command = %rendered, "starting browser engine");
        let mut child = cmd.spawn().map_err(|e| {
            TokenpressError::conversion_failed(&rendered, format!("spawn failed: {e}"), "")
        })?;

        if let Some(stderr) = child.stderr.take() {
            let (tx, rx) = mpsc::channel();
            std::thread::spawn(move || {
                for line in BufReader::new(stderr).lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            });
            self.lines = Some(rx);
        }
        self.child = Some(child);
        Ok(())
    }

    fn pump_events(&mut self, wait: Duration) -> TokenpressResult<usize> {
        let Some(rx) = &self.lines else {
            std::thread::sleep(wait);
            return Ok(0);
        };
        let until = Instant::now() + wait;
        let mut events = 0;
        let mut closed = false;
        loop {
            let now = Instant::now();
            if now >= until {
                break;
            }
            match rx.recv_timeout(until - now) {
                Ok(line) => {
                    events += 1;
                    self.log.push(line);
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    closed = true;
                    break;
                }
            }
        }
        if closed {
            // Log stream closed: the engine is done talking.
            self.lines = None;
            std::thread::sleep(until.saturating_duration_since(Instant::now()));
        }
        Ok(events)
    }

    fn export(&mut self, output: &Path) -> TokenpressResult<()> {
        let produced = std::fs::metadata(&self.staging)
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if !produced {
            return Err(TokenpressError::conversion_failed(
                format!("{} --print-to-pdf", self.exe.display()),
                "engine went idle without producing a PDF",
                self.log.join("\n"),
            ));
        }
        ensure_parent_dir(output)?;
        std::fs::copy(&self.staging, output)
            .with_context(|| format!("copy engine output to '{}'", output.display()))?;
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some(mut child) = self.child.take() {
            if matches!(child.try_wait(), Ok(None)) {
                let _ = child.kill();
            }
            let _ = child.wait();
        }
        self.lines = None;
    }
}

/// `html2pdf(chromium-idle)`: exports straight to the final output path.
pub struct HtmlToPdfIdle {
    resolver: ExecutableResolver,
    exporter: IdleExporter,
    output: PathBuf,
    temps: TempFiles,
}

impl HtmlToPdfIdle {
    pub const NAME: &'static str = "pdf(chromium-idle)";

    pub fn new(cfg: &RunConfig) -> Self {
        Self {
            resolver: ExecutableResolver::from_config(cfg),
            exporter: IdleExporter::from_config(cfg),
            output: cfg.output_file.clone(),
            temps: TempFiles::new(Self::NAME).in_dir(cfg.temp_dir.clone()),
        }
    }
}

impl Converter for HtmlToPdfIdle {
    fn name(&self) -> String {
        Self::NAME.to_string()
    }

    fn convert(
        &mut self,
        inputs: Vec<Rendered>,
        _sizes: &[Size],
        _verbose: bool,
        return_result: bool,
    ) -> TokenpressResult<Option<Vec<Rendered>>> {
        if return_result {
            return Err(TokenpressError::configuration(format!(
                "{} writes the final output directly and cannot return results",
                Self::NAME
            )));
        }
        let [input] = inputs.as_slice() else {
            return Err(TokenpressError::unsupported_multi_page(format!(
                "{} expects one HTML document, got {}",
                Self::NAME,
                inputs.len()
            )));
        };
        let exe = self.resolver.resolve("chromium", "chromium")?;
        let html = self.temps.write(".html", input.as_bytes())?;
        // Reserved empty; export only accepts it once the engine has filled it.
        let staging = self.temps.reserve(".pdf")?;

        let mut session = ChromiumSession::new(exe, staging);
        self.exporter.run(&mut session, &html, &self.output)?;
        tracing::info!(path = %self.output.display(), "wrote output");
        Ok(None)
    }

    fn cleanup(&mut self) {
        self.temps.cleanup();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/browser.rs"]
mod tests;
