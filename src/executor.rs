//! Step executor
//!
//! Runs plan steps as blocking shell invocations, streaming their output to a
//! caller-provided sink and collecting per-step results.
//!
//! # Execution model
//!
//! Steps run strictly sequentially: later steps may depend on earlier ones
//! (bootstrap before batch, native helper before AUR batch), and interleaved
//! privileged-command output would be unreadable. A failing step is recorded
//! and reported but never halts the run — most steps are independent, so
//! partial success with full visibility beats all-or-nothing rollback. There
//! is no per-command timeout; a hung command hangs the run.
//!
//! Privileged commands are prefixed with sudo unless the process already runs
//! as root. Unprivileged discovery commands never request elevation.

use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;

use crate::plan::{CommandSpec, InstallPlan, Step};

/// Line-oriented output destination.
///
/// The core assumes nothing about rendering beyond "accepts ordered text";
/// callers can print, collect, or feed a progress display.
pub trait OutputSink {
    fn line(&mut self, line: &str);
}

/// Sink that prints to stdout.
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn line(&mut self, line: &str) {
        println!("{}", line);
    }
}

/// Sink that collects lines, for tests and captured transcripts.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub lines: Vec<String>,
}

impl OutputSink for CollectSink {
    fn line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Result of one executed step.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub label: String,
    pub succeeded: bool,
    /// Exit code (None if terminated by signal or never spawned)
    pub exit_code: Option<i32>,
    /// Captured output lines, in stream order
    pub output: Vec<String>,
}

/// Aggregated results of a whole run.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    pub results: Vec<StepResult>,
}

impl ExecutionReport {
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.succeeded)
    }

    pub fn failed(&self) -> impl Iterator<Item = &StepResult> {
        self.results.iter().filter(|r| !r.succeeded)
    }

    /// Final per-step recap for display after the transcript.
    pub fn summary(&self) -> String {
        let mut lines = Vec::with_capacity(self.results.len() + 1);
        for result in &self.results {
            if result.succeeded {
                lines.push(format!("  ok   {}", result.label));
            } else {
                lines.push(format!(
                    "  FAIL {} (exit code {})",
                    result.label,
                    result.exit_code.map_or_else(|| "none".to_string(), |c| c.to_string())
                ));
            }
        }
        let ok = self.results.iter().filter(|r| r.succeeded).count();
        lines.push(format!("{}/{} steps succeeded", ok, self.results.len()));
        lines.join("\n")
    }
}

/// Runs plan steps sequentially.
pub struct Executor {
    dry_run: bool,
    use_sudo: bool,
}

impl Executor {
    /// Executor for the current process privileges.
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run, use_sudo: !nix::unistd::geteuid().is_root() }
    }

    /// Executor with explicit sudo control, for tests and environments that
    /// are already elevated in a way euid cannot see.
    pub fn with_sudo(dry_run: bool, use_sudo: bool) -> Self {
        Self { dry_run, use_sudo }
    }

    /// Execute every step of the plan, in order, never short-circuiting.
    pub fn execute(&self, plan: &InstallPlan, sink: &mut dyn OutputSink) -> ExecutionReport {
        let mut report = ExecutionReport::default();

        for step in &plan.steps {
            let result = self.run_step(step, sink);

            if !result.succeeded {
                if let Step::Bootstrap { mandatory: true, label, .. } = step {
                    // The underlying manager will fail loudly on its own if
                    // this setup really was required; keep going.
                    log::warn!("mandatory bootstrap '{}' failed; continuing", label);
                    sink.line(&format!("[!] {} failed; later steps may be affected", label));
                }
            }

            report.results.push(result);
        }

        report
    }

    /// Run a single step to completion, streaming output to the sink.
    pub fn run_step(&self, step: &Step, sink: &mut dyn OutputSink) -> StepResult {
        let spec = step.command();
        let (program, args) = self.rendered(spec);

        let display: String = {
            let mut parts = vec![program.clone()];
            parts.extend(args.iter().cloned());
            parts.join(" ")
        };
        sink.line(&format!("$ {}", display));

        if self.dry_run {
            log::info!("dry-run: skipping '{}'", display);
            sink.line("[dry-run] not executed");
            return StepResult {
                label: step.label(),
                succeeded: true,
                exit_code: Some(0),
                output: Vec::new(),
            };
        }

        match self.spawn_and_stream(&program, &args, sink) {
            Ok((exit_code, output)) => StepResult {
                label: step.label(),
                succeeded: exit_code == Some(0),
                exit_code,
                output,
            },
            Err(e) => {
                let message = format!("Error: failed to run {}: {}", program, e);
                log::error!("{}", message);
                sink.line(&message);
                StepResult {
                    label: step.label(),
                    succeeded: false,
                    exit_code: None,
                    output: vec![message],
                }
            }
        }
    }

    /// Apply sudo attribution to a command spec.
    fn rendered(&self, spec: &CommandSpec) -> (String, Vec<String>) {
        if spec.privileged && self.use_sudo {
            let mut args = Vec::with_capacity(spec.args.len() + 1);
            args.push(spec.program.clone());
            args.extend(spec.args.iter().cloned());
            ("sudo".to_string(), args)
        } else {
            (spec.program.clone(), spec.args.clone())
        }
    }

    /// Spawn the command and stream stdout/stderr lines to the sink.
    ///
    /// stderr is drained on a separate thread so neither pipe can fill up
    /// and stall the child; its lines are appended after stdout completes.
    fn spawn_and_stream(
        &self,
        program: &str,
        args: &[String],
        sink: &mut dyn OutputSink,
    ) -> std::io::Result<(Option<i32>, Vec<String>)> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut output = Vec::new();

        let stderr_rx = child.stderr.take().map(|stderr| {
            let (tx, rx) = mpsc::channel();
            thread::spawn(move || {
                let reader = BufReader::new(stderr);
                for line in reader.lines().map_while(Result::ok) {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            });
            rx
        });

        if let Some(stdout) = child.stdout.take() {
            let reader = BufReader::new(stdout);
            for line in reader.lines().map_while(Result::ok) {
                sink.line(&line);
                output.push(line);
            }
        }

        if let Some(rx) = stderr_rx {
            for line in rx {
                sink.line(&line);
                output.push(line);
            }
        }

        let status = child.wait()?;
        Ok((status.code(), output))
    }
}
