use crate::config::toml_config::ConsoleConfig;
use crate::domain::model::ProcessHandle;
use crate::domain::ports::{CommandLine, ProcessRunner, ReadinessProbe};
use crate::utils::error::{ConsoleError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::Instant;

pub const DEPLOY_ACK: &str = "Canister deployed.";

/// 以 tokio::process 執行外部指令，繼承目前的工作目錄
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    fn spawn(&self, command: &CommandLine) -> Result<ProcessHandle> {
        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ConsoleError::ProcessSpawnError {
                command: command.to_string(),
                message: e.to_string(),
            })?;

        Ok(ProcessHandle::from_child(command.to_string(), child))
    }

    async fn run(&self, command: &CommandLine) -> Result<()> {
        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ConsoleError::ProcessSpawnError {
                command: command.to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ConsoleError::ProcessSpawnError {
                command: command.to_string(),
                message: format!(
                    "exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(())
    }
}

/// Any HTTP answer on the health URL means the service is listening.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    url: String,
}

impl HttpProbe {
    pub fn new(host: &str, health_path: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!("http://{}{}", host, health_path),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ReadinessProbe for HttpProbe {
    async fn is_ready(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(response) => {
                tracing::debug!("Readiness probe {} -> {}", self.url, response.status());
                true
            }
            Err(e) => {
                tracing::debug!("Readiness probe {} failed: {}", self.url, e);
                false
            }
        }
    }
}

/// 後端服務行程的唯一擁有者
pub struct ProcessOrchestrator<R: ProcessRunner, P: ReadinessProbe> {
    runner: R,
    probe: P,
    program: String,
    host: String,
    readiness_timeout: Duration,
    poll_interval: Duration,
    service: Option<ProcessHandle>,
    deployment: Option<ProcessHandle>,
}

impl<R: ProcessRunner, P: ReadinessProbe> ProcessOrchestrator<R, P> {
    pub fn new(runner: R, probe: P, config: &ConsoleConfig) -> Self {
        Self {
            runner,
            probe,
            program: config.lifecycle.program.clone(),
            host: config.backend.host.clone(),
            readiness_timeout: config.lifecycle.readiness_timeout(),
            poll_interval: config.lifecycle.poll_interval(),
            service: None,
            deployment: None,
        }
    }

    pub fn with_timing(mut self, readiness_timeout: Duration, poll_interval: Duration) -> Self {
        self.readiness_timeout = readiness_timeout;
        self.poll_interval = poll_interval;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn service(&self) -> Option<&ProcessHandle> {
        self.service.as_ref()
    }

    pub fn deployment(&self) -> Option<&ProcessHandle> {
        self.deployment.as_ref()
    }

    pub fn has_service(&self) -> bool {
        self.service.is_some()
    }

    pub fn start_command(&self, clean: bool) -> CommandLine {
        let mut args = vec!["start", "--host", self.host.as_str()];
        if clean {
            args.push("--clean");
        }
        CommandLine::new(&self.program, &args)
    }

    pub fn deploy_command(&self) -> CommandLine {
        CommandLine::new(&self.program, &["deploy"])
    }

    pub fn stop_command(&self) -> CommandLine {
        CommandLine::new(&self.program, &["stop"])
    }

    /// Spawns the service and returns once the probe answers. On readiness
    /// timeout the handle stays owned here so `stop` can still tear it down.
    pub async fn try_start(&mut self, clean: bool) -> Result<&ProcessHandle> {
        if let Some(handle) = self.service.as_mut() {
            if handle.is_running() == Some(false) {
                tracing::warn!("Previous service {} has exited, releasing it", handle);
                self.service = None;
            } else {
                return Err(ConsoleError::AlreadyRunning {
                    label: handle.to_string(),
                });
            }
        }

        let command = self.start_command(clean);
        tracing::info!("🚀 Starting backend service: {}", command);
        let handle = self.service.insert(self.runner.spawn(&command)?);

        let attempts =
            wait_until_ready(&self.probe, self.readiness_timeout, self.poll_interval).await?;
        tracing::info!("✅ Backend service ready after {} probe(s): {}", attempts, handle);

        Ok(handle)
    }

    pub async fn start(&mut self, clean: bool) -> Option<&ProcessHandle> {
        match self.try_start(clean).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                report("start", &e);
                None
            }
        }
    }

    /// 非阻塞的部署，不等待完成
    pub fn try_deploy(&mut self) -> Result<&ProcessHandle> {
        let command = self.deploy_command();
        tracing::info!("📦 Deploying: {}", command);
        let handle = self.runner.spawn(&command)?;
        if let Some(previous) = self.deployment.take() {
            tracing::debug!("Releasing previous deployment handle {}", previous);
        }
        Ok(self.deployment.insert(handle))
    }

    pub fn deploy(&mut self) -> Option<&ProcessHandle> {
        match self.try_deploy() {
            Ok(handle) => {
                tracing::info!("{}", DEPLOY_ACK);
                Some(handle)
            }
            Err(e) => {
                report("deploy", &e);
                None
            }
        }
    }

    /// Blocks on the stop command only, then releases the service handle.
    pub async fn try_stop(&mut self) -> Result<()> {
        let command = self.stop_command();
        tracing::info!("🛑 Stopping backend service: {}", command);
        self.runner.run(&command).await?;

        if let Some(handle) = self.service.take() {
            tracing::info!("Released {}", handle);
        }
        self.deployment = None;
        Ok(())
    }

    pub async fn stop(&mut self) -> bool {
        match self.try_stop().await {
            Ok(()) => true,
            Err(e) => {
                report("stop", &e);
                false
            }
        }
    }
}

/// 輪詢 readiness probe，直到成功或超過時限
pub async fn wait_until_ready<P: ReadinessProbe>(
    probe: &P,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<u32> {
    let started = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;
        if probe.is_ready().await {
            return Ok(attempts);
        }

        let waited = started.elapsed();
        if waited >= timeout {
            return Err(ConsoleError::ReadinessTimeout { waited });
        }

        tracing::debug!("Backend not ready yet (attempt {})", attempts);
        tokio::time::sleep(poll_interval.min(timeout - waited)).await;
    }
}

fn report(action: &str, e: &ConsoleError) {
    tracing::error!("❌ Failed to {} backend service: {}", action, e);
    eprintln!("❌ {}", e.user_friendly_message());
}
