use crate::core::classifier::Classifier;
use crate::core::command::parse_command;
use crate::core::orchestrator::{ProcessOrchestrator, DEPLOY_ACK};
use crate::domain::ports::{MaterialsBackend, ProcessRunner, ReadinessProbe};
use crate::utils::error::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const PROMPT: &str = "Enter a command (or 'exit' to quit): ";

pub const HELP_TEXT: &str = "
    Available commands:
    - /register-material
    - /register-material-prices/:id
    - /materials
    - /materials/:id
    - /materials/:id/piece-prices
    - /remove/material/:id
    - /update/material/:id/piece
    - /add/material/:id/piece
    - /material/:id/optimize-cuts/:length

    id represents the id of the material.
    Create and update commands take key=value arguments, e.g.
        /register-material name=Oak description=\"Hard wood\"
        /update/material/:id/piece size=3 price=8

    Backend lifecycle: /start, /deploy, /stop

    Type 'exit' to quit the program.
";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub commands: usize,
    pub dispatched: usize,
    pub failed: usize,
}

enum LifecycleCommand {
    Start,
    Deploy,
    Stop,
}

impl LifecycleCommand {
    fn parse(line: &str) -> Option<Self> {
        match line.to_ascii_lowercase().as_str() {
            "/start" => Some(LifecycleCommand::Start),
            "/deploy" => Some(LifecycleCommand::Deploy),
            "/stop" => Some(LifecycleCommand::Stop),
            _ => None,
        }
    }
}

/// 互動式主迴圈：讀取指令、分類、送往後端並顯示結果
pub struct Session<B, R, P>
where
    B: MaterialsBackend,
    R: ProcessRunner,
    P: ReadinessProbe,
{
    backend: B,
    classifier: Classifier,
    orchestrator: Option<ProcessOrchestrator<R, P>>,
    clean_start: bool,
    stop_on_success: bool,
}

impl<B, R, P> Session<B, R, P>
where
    B: MaterialsBackend,
    R: ProcessRunner,
    P: ReadinessProbe,
{
    pub fn new(backend: B, classifier: Classifier) -> Self {
        Self {
            backend,
            classifier,
            orchestrator: None,
            clean_start: true,
            stop_on_success: false,
        }
    }

    pub fn with_orchestrator(mut self, orchestrator: ProcessOrchestrator<R, P>) -> Self {
        self.orchestrator = Some(orchestrator);
        self
    }

    pub fn with_clean_start(mut self, clean_start: bool) -> Self {
        self.clean_start = clean_start;
        self
    }

    /// Stop the backend after any non-empty successful response.
    pub fn with_stop_on_success(mut self, stop_on_success: bool) -> Self {
        self.stop_on_success = stop_on_success;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn orchestrator(&self) -> Option<&ProcessOrchestrator<R, P>> {
        self.orchestrator.as_ref()
    }

    /// Runs until `exit` (any case) or end of input.
    pub async fn run<I, W>(&mut self, mut input: I, output: &mut W) -> Result<SessionSummary>
    where
        I: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut summary = SessionSummary::default();

        loop {
            write!(output, "{}", PROMPT)?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line).await? == 0 {
                writeln!(output)?;
                tracing::debug!("End of input, leaving session");
                break;
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.eq_ignore_ascii_case("exit") {
                break;
            }

            summary.commands += 1;
            self.handle_line(line, output, &mut summary).await?;
        }

        tracing::info!(
            "Session finished: {} command(s), {} dispatched, {} failed",
            summary.commands,
            summary.dispatched,
            summary.failed
        );
        Ok(summary)
    }

    async fn handle_line<W: Write>(
        &mut self,
        line: &str,
        output: &mut W,
        summary: &mut SessionSummary,
    ) -> Result<()> {
        if let Some(command) = LifecycleCommand::parse(line) {
            return self.handle_lifecycle(command, output).await;
        }

        let parsed = parse_command(line);
        let operation = self.classifier.classify(&parsed.target);
        writeln!(output, "{}", operation.narration())?;

        if !operation.is_dispatchable() {
            writeln!(output, "{}", HELP_TEXT)?;
            return Ok(());
        }

        summary.dispatched += 1;
        match self.backend.perform(&operation, parsed.payload).await {
            Some(value) => {
                writeln!(output, "{}", serde_json::to_string_pretty(&value)?)?;
                if self.stop_on_success && !value.is_null() {
                    tracing::info!("Stopping backend after successful response");
                    self.handle_lifecycle(LifecycleCommand::Stop, output).await?;
                }
            }
            None => summary.failed += 1,
        }

        Ok(())
    }

    async fn handle_lifecycle<W: Write>(
        &mut self,
        command: LifecycleCommand,
        output: &mut W,
    ) -> Result<()> {
        let Some(orchestrator) = self.orchestrator.as_mut() else {
            writeln!(output, "Process management is disabled (attached mode).")?;
            return Ok(());
        };

        match command {
            LifecycleCommand::Start => match orchestrator.start(self.clean_start).await {
                Some(handle) => writeln!(output, "Backend service started: {}", handle)?,
                None => writeln!(output, "Backend service is not available.")?,
            },
            LifecycleCommand::Deploy => {
                if orchestrator.deploy().is_some() {
                    writeln!(output, "{}", DEPLOY_ACK)?;
                }
            }
            LifecycleCommand::Stop => {
                if orchestrator.stop().await {
                    writeln!(output, "Backend service stopped.")?;
                }
            }
        }

        Ok(())
    }

    /// 結束時若仍持有後端行程則停止它
    pub async fn shutdown(&mut self) -> bool {
        match self.orchestrator.as_mut() {
            Some(orchestrator) if orchestrator.has_service() => orchestrator.stop().await,
            _ => false,
        }
    }
}
