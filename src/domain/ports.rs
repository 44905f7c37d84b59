use crate::domain::model::{HttpMethod, Operation, Payload, ProcessHandle};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Raw answer from the transport, before status and body are interpreted.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        payload: Option<&Payload>,
    ) -> Result<TransportResponse>;
}

/// 材料後端的能力集合，每個 Operation 對應一個方法。
/// 回傳 `None` 表示呼叫失敗且錯誤已經回報。
#[async_trait]
pub trait MaterialsBackend: Send + Sync {
    async fn register_material(&self, payload: Option<Payload>) -> Option<Value>;
    async fn register_material_prices(
        &self,
        material_id: &str,
        payload: Option<Payload>,
    ) -> Option<Value>;
    async fn list_materials(&self) -> Option<Value>;
    async fn get_material(&self, material_id: &str) -> Option<Value>;
    async fn get_piece_prices(&self, material_id: &str) -> Option<Value>;
    async fn delete_material(&self, material_id: &str) -> Option<Value>;
    async fn update_piece(&self, material_id: &str, payload: Option<Payload>) -> Option<Value>;
    async fn add_piece(&self, material_id: &str, payload: Option<Payload>) -> Option<Value>;
    async fn optimize_cuts(&self, material_id: &str, length: &str) -> Option<Value>;

    /// Uniform entry point used by the session loop.
    async fn perform(&self, operation: &Operation, payload: Option<Payload>) -> Option<Value> {
        match operation {
            Operation::RegisterMaterial => self.register_material(payload).await,
            Operation::RegisterMaterialPrices { material_id } => {
                self.register_material_prices(material_id, payload).await
            }
            Operation::ListMaterials => self.list_materials().await,
            Operation::GetMaterial { material_id } => self.get_material(material_id).await,
            Operation::GetPiecePrices { material_id } => self.get_piece_prices(material_id).await,
            Operation::DeleteMaterial { material_id } => self.delete_material(material_id).await,
            Operation::UpdatePiece { material_id } => {
                self.update_piece(material_id, payload).await
            }
            Operation::AddPiece { material_id } => self.add_piece(material_id, payload).await,
            Operation::OptimizeCuts {
                material_id,
                length,
            } => self.optimize_cuts(material_id, length).await,
            Operation::Help | Operation::Unknown => None,
        }
    }
}

/// A program invocation, e.g. `dfx start --host 127.0.0.1:8000 --clean`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// 非阻塞啟動，回傳擁有該行程的 handle
    fn spawn(&self, command: &CommandLine) -> Result<ProcessHandle>;

    /// 阻塞直到指令本身結束
    async fn run(&self, command: &CommandLine) -> Result<()>;
}

#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn is_ready(&self) -> bool;
}
