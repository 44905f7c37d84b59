use crate::utils::error::{ConsoleError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 指令附帶的 key-value 內容，作為 JSON 物件送出
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// 使用者指令分類後的意圖
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    RegisterMaterial,
    RegisterMaterialPrices { material_id: String },
    ListMaterials,
    GetMaterial { material_id: String },
    GetPiecePrices { material_id: String },
    DeleteMaterial { material_id: String },
    UpdatePiece { material_id: String },
    AddPiece { material_id: String },
    OptimizeCuts { material_id: String, length: String },
    Help,
    Unknown,
}

impl Operation {
    /// Line printed by the session before the operation is dispatched.
    pub fn narration(&self) -> &'static str {
        match self {
            Operation::RegisterMaterial => "Registering material...",
            Operation::RegisterMaterialPrices { .. } => "Registering material prices...",
            Operation::ListMaterials => "Retrieving all materials...",
            Operation::GetMaterial { .. } => "Retrieving a material...",
            Operation::GetPiecePrices { .. } => "Retrieving piece prices...",
            Operation::DeleteMaterial { .. } => "Deleting a material...",
            Operation::UpdatePiece { .. } => "Updating a piece price...",
            Operation::AddPiece { .. } => "Adding a piece price...",
            Operation::OptimizeCuts { .. } => "Optimizing cuts...",
            Operation::Help => "Showing help...",
            Operation::Unknown => "Unknown command.",
        }
    }

    /// Help and Unknown never reach the backend.
    pub fn is_dispatchable(&self) -> bool {
        !matches!(self, Operation::Help | Operation::Unknown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn parse(method: &str) -> Result<Self> {
        match method.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(ConsoleError::UnsupportedMethod {
                method: method.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 單一後端呼叫。`method` 保留為字串，無效方法由 adapter 在送出前拒絕。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendRequest {
    pub method: String,
    pub path: String,
    pub payload: Option<Payload>,
}

impl BackendRequest {
    pub fn new(method: &str, path: impl Into<String>, payload: Option<Payload>) -> Self {
        Self {
            method: method.to_string(),
            path: path.into(),
            payload,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path, None)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new("DELETE", path, None)
    }

    /// Create/update calls always carry a body, an empty object when no tokens were given.
    pub fn post(path: impl Into<String>, payload: Option<Payload>) -> Self {
        Self::new("POST", path, Some(payload.unwrap_or_default()))
    }
}

/// 已啟動行程的擁有權憑證。不可 Clone：同一個行程只會有一個 handle。
#[derive(Debug)]
pub struct ProcessHandle {
    label: String,
    pid: Option<u32>,
    spawned_at: DateTime<Utc>,
    child: Option<tokio::process::Child>,
}

impl ProcessHandle {
    pub fn from_child(label: impl Into<String>, child: tokio::process::Child) -> Self {
        Self {
            label: label.into(),
            pid: child.id(),
            spawned_at: Utc::now(),
            child: Some(child),
        }
    }

    /// Handle for a process the runner does not supervise itself.
    pub fn untracked(label: impl Into<String>, pid: Option<u32>) -> Self {
        Self {
            label: label.into(),
            pid,
            spawned_at: Utc::now(),
            child: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn spawned_at(&self) -> DateTime<Utc> {
        self.spawned_at
    }

    /// `Some(true)` while the owned child has not exited, `None` when untracked.
    pub fn is_running(&mut self) -> Option<bool> {
        self.child
            .as_mut()
            .map(|child| child.try_wait().map(|s| s.is_none()).unwrap_or(false))
    }
}

impl fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pid {
            Some(pid) => write!(f, "{} (pid {})", self.label, pid),
            None => write!(f, "{}", self.label),
        }
    }
}
