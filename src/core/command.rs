use crate::domain::model::Payload;
use serde_json::Value;

/// 一行使用者輸入：`key=value` 組成 payload，其餘文字原樣交給分類器
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    pub target: String,
    pub payload: Option<Payload>,
}

pub fn parse_command(line: &str) -> ParsedCommand {
    let mut target = Vec::new();
    let mut payload = Payload::new();

    for token in tokenize(line.trim()) {
        match token.split_once('=') {
            Some((key, value)) if is_payload_key(key) => {
                payload.insert(key.to_string(), parse_value(value));
            }
            _ => target.push(token),
        }
    }

    ParsedCommand {
        target: target.join(" "),
        payload: if payload.is_empty() { None } else { Some(payload) },
    }
}

/// Keys are plain identifiers, so URL query strings stay part of the target.
fn is_payload_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Whitespace-separated tokens. Double or single quotes group a value
/// containing spaces; the other quote character is kept literally inside.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in input.chars() {
        match (c, quote) {
            ('"' | '\'', None) => quote = Some(c),
            (c, Some(q)) if c == q => quote = None,
            (c, None) if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            (c, _) => current.push(c),
        }
    }
    if let Some(q) = quote {
        tracing::warn!("Unterminated {} quote, taking the rest of the line as one value", q);
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// 能解析為 JSON 的值（數字、布林、陣列）照 JSON 處理，否則視為字串
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
