use anyhow::Result;
use async_trait::async_trait;
use cutter_console::core::session::{HELP_TEXT, PROMPT};
use cutter_console::core::{MaterialsBackend, Payload, ProcessHandle, ProcessRunner, ReadinessProbe};
use cutter_console::domain::ports::CommandLine;
use cutter_console::{Classifier, ConsoleConfig, Precedence, ProcessOrchestrator, Session};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::BufReader;

/// 記錄每次呼叫的材料後端替身
#[derive(Clone, Default)]
struct FakeBackend {
    calls: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl FakeBackend {
    fn record(&self, call: String) -> Option<Value> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            None
        } else {
            Some(json!({"ok": true}))
        }
    }

    fn record_with(&self, call: String, payload: Option<Payload>) -> Option<Value> {
        let body = payload.map(Value::Object).unwrap_or(Value::Null);
        self.record(format!("{} {}", call, body))
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MaterialsBackend for FakeBackend {
    async fn register_material(&self, payload: Option<Payload>) -> Option<Value> {
        let name = payload
            .and_then(|p| p.get("name").cloned())
            .unwrap_or(Value::Null);
        self.record(format!("register_material {}", name))
    }

    async fn register_material_prices(
        &self,
        material_id: &str,
        payload: Option<Payload>,
    ) -> Option<Value> {
        self.record_with(format!("register_material_prices {}", material_id), payload)
    }

    async fn list_materials(&self) -> Option<Value> {
        self.record("list_materials".to_string())
    }

    async fn get_material(&self, material_id: &str) -> Option<Value> {
        self.record(format!("get_material {}", material_id))
    }

    async fn get_piece_prices(&self, material_id: &str) -> Option<Value> {
        self.record(format!("get_piece_prices {}", material_id))
    }

    async fn delete_material(&self, material_id: &str) -> Option<Value> {
        self.record(format!("delete_material {}", material_id))
    }

    async fn update_piece(&self, material_id: &str, payload: Option<Payload>) -> Option<Value> {
        self.record_with(format!("update_piece {}", material_id), payload)
    }

    async fn add_piece(&self, material_id: &str, payload: Option<Payload>) -> Option<Value> {
        self.record_with(format!("add_piece {}", material_id), payload)
    }

    async fn optimize_cuts(&self, material_id: &str, length: &str) -> Option<Value> {
        self.record(format!("optimize_cuts {} {}", material_id, length))
    }
}

#[derive(Clone, Default)]
struct FakeRunner {
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    fn spawn(&self, command: &CommandLine) -> cutter_console::Result<ProcessHandle> {
        self.log.lock().unwrap().push(format!("spawn {}", command));
        Ok(ProcessHandle::untracked(command.to_string(), Some(42)))
    }

    async fn run(&self, command: &CommandLine) -> cutter_console::Result<()> {
        self.log.lock().unwrap().push(format!("run {}", command));
        Ok(())
    }
}

struct ReadyProbe;

#[async_trait]
impl ReadinessProbe for ReadyProbe {
    async fn is_ready(&self) -> bool {
        true
    }
}

type TestSession = Session<FakeBackend, FakeRunner, ReadyProbe>;

fn session(backend: FakeBackend) -> TestSession {
    Session::new(backend, Classifier::default())
}

fn orchestrator(runner: FakeRunner) -> ProcessOrchestrator<FakeRunner, ReadyProbe> {
    ProcessOrchestrator::new(runner, ReadyProbe, &ConsoleConfig::default())
        .with_timing(Duration::from_millis(50), Duration::from_millis(1))
}

async fn run(session: &mut TestSession, input: &str) -> Result<(String, cutter_console::SessionSummary)> {
    let reader = BufReader::new(
        tokio_test::io::Builder::new()
            .read(input.as_bytes())
            .build(),
    );
    let mut output = Vec::new();
    let summary = session.run(reader, &mut output).await?;
    Ok((String::from_utf8(output)?, summary))
}

#[tokio::test]
async fn test_list_then_exit() -> Result<()> {
    let backend = FakeBackend::default();
    let mut session = session(backend.clone());

    let (output, summary) = run(&mut session, "/materials\nexit\n").await?;

    assert_eq!(backend.calls(), vec!["list_materials".to_string()]);
    assert_eq!(summary.commands, 1);
    assert_eq!(summary.dispatched, 1);
    // 一個指令一次提示，加上讀取 exit 的那一次，之後不再提示
    assert_eq!(output.matches(PROMPT).count(), 2);
    assert!(output.trim_end().ends_with(PROMPT.trim_end()));
    assert!(output.contains("Retrieving all materials..."));
    Ok(())
}

#[tokio::test]
async fn test_exit_is_case_insensitive() -> Result<()> {
    let backend = FakeBackend::default();
    let mut session = session(backend.clone());

    let (_, summary) = run(&mut session, "EXIT\n/materials\n").await?;

    assert!(backend.calls().is_empty());
    assert_eq!(summary.commands, 0);
    Ok(())
}

#[tokio::test]
async fn test_end_of_input_ends_session() -> Result<()> {
    let backend = FakeBackend::default();
    let mut session = session(backend.clone());

    let (_, summary) = run(&mut session, "/materials/42\n\n").await?;

    assert_eq!(backend.calls(), vec!["get_material 42".to_string()]);
    assert_eq!(summary.commands, 1);
    Ok(())
}

#[tokio::test]
async fn test_unknown_and_help_print_help_text() -> Result<()> {
    let backend = FakeBackend::default();
    let mut session = session(backend.clone());

    let (output, summary) = run(&mut session, "gibberish\nhelp\nexit\n").await?;

    assert!(backend.calls().is_empty());
    assert_eq!(summary.commands, 2);
    assert_eq!(summary.dispatched, 0);
    assert!(output.contains("Unknown command."));
    assert_eq!(output.matches(HELP_TEXT).count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_payload_and_routing() -> Result<()> {
    let backend = FakeBackend::default();
    let mut session = session(backend.clone());

    let input = "/register-material name=Oak\n\
                 /register-material-prices/7 prices='[{\"size\":1,\"price\":2}]'\n\
                 /materials/7/piece-prices\n\
                 /update/material/7/piece size=2 price=3\n\
                 /add/material/7/piece size=4 price=9\n\
                 /material/7/optimize-cuts/10\n\
                 /remove/material/7\n\
                 exit\n";
    let (_, summary) = run(&mut session, input).await?;

    assert_eq!(
        backend.calls(),
        vec![
            "register_material \"Oak\"",
            r#"register_material_prices 7 {"prices":[{"price":2,"size":1}]}"#,
            "get_piece_prices 7",
            r#"update_piece 7 {"price":3,"size":2}"#,
            r#"add_piece 7 {"price":9,"size":4}"#,
            "optimize_cuts 7 10",
            "delete_material 7",
        ]
    );
    assert_eq!(summary.dispatched, 7);
    Ok(())
}

#[tokio::test]
async fn test_leading_text_before_marker() -> Result<()> {
    let backend = FakeBackend::default();
    let mut session = session(backend.clone());

    let input = "curl http://bkyz2.localhost:8000/materials\n\
                 please /remove/material/9 now\n\
                 exit\n";
    let (_, summary) = run(&mut session, input).await?;

    assert_eq!(
        backend.calls(),
        vec!["list_materials".to_string(), "delete_material 9".to_string()]
    );
    assert_eq!(summary.dispatched, 2);
    Ok(())
}

#[tokio::test]
async fn test_reference_precedence_session() -> Result<()> {
    let backend = FakeBackend::default();
    let mut session: TestSession =
        Session::new(backend.clone(), Classifier::new(Precedence::Reference));

    run(&mut session, "/register-material-prices/7\nexit\n").await?;

    assert_eq!(backend.calls(), vec!["register_material null"]);
    Ok(())
}

#[tokio::test]
async fn test_failed_request_keeps_loop_running() -> Result<()> {
    let backend = FakeBackend {
        fail: true,
        ..FakeBackend::default()
    };
    let mut session = session(backend.clone());

    let (_, summary) = run(&mut session, "/materials\n/materials/1\nexit\n").await?;

    assert_eq!(backend.calls().len(), 2);
    assert_eq!(summary.failed, 2);
    Ok(())
}

#[tokio::test]
async fn test_explicit_lifecycle_commands() -> Result<()> {
    let runner = FakeRunner::default();
    let mut session = session(FakeBackend::default()).with_orchestrator(orchestrator(runner.clone()));

    let (output, _) = run(&mut session, "/start\n/deploy\n/materials\n/STOP\nexit\n").await?;

    assert_eq!(
        runner.log.lock().unwrap().clone(),
        vec![
            "spawn dfx start --host 127.0.0.1:8000 --clean".to_string(),
            "spawn dfx deploy".to_string(),
            "run dfx stop".to_string(),
        ]
    );
    assert!(output.contains("Canister deployed."));
    assert!(output.contains("Backend service stopped."));
    assert!(!session.orchestrator().unwrap().has_service());
    Ok(())
}

#[tokio::test]
async fn test_success_does_not_stop_backend_by_default() -> Result<()> {
    let runner = FakeRunner::default();
    let mut session = session(FakeBackend::default()).with_orchestrator(orchestrator(runner.clone()));

    run(&mut session, "/start\n/materials\n/materials\nexit\n").await?;

    assert!(session.orchestrator().unwrap().has_service());
    assert!(session.shutdown().await);
    assert!(!session.orchestrator().unwrap().has_service());
    assert_eq!(runner.log.lock().unwrap().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_stop_on_success_tears_down_after_first_answer() -> Result<()> {
    let runner = FakeRunner::default();
    let mut session = session(FakeBackend::default())
        .with_orchestrator(orchestrator(runner.clone()))
        .with_stop_on_success(true);

    run(&mut session, "/start\n/materials\nexit\n").await?;

    assert!(!session.orchestrator().unwrap().has_service());
    assert_eq!(
        runner.log.lock().unwrap().last().cloned(),
        Some("run dfx stop".to_string())
    );
    assert!(!session.shutdown().await);
    Ok(())
}

#[tokio::test]
async fn test_lifecycle_commands_in_attached_mode() -> Result<()> {
    let mut session = session(FakeBackend::default());

    let (output, _) = run(&mut session, "/stop\nexit\n").await?;

    assert!(output.contains("Process management is disabled"));
    Ok(())
}
