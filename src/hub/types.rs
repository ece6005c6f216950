//! Tipos de dados para o endpoint `POST /api/admin/import-github`.
//!
//! [`ImportRequest`] é o corpo enviado, [`ImportResponse`] o corpo de sucesso
//! e [`ImportOutcome`] a classificação de uma única tentativa.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ImportJob;

/// Corpo da requisição de importação. Campos ausentes são omitidos, nunca enviados como `null`.
#[derive(Debug, Clone, Serialize)]
pub struct ImportRequest<'a> {
    pub repo: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<&'a str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<&'a str>,
}

impl<'a> ImportRequest<'a> {
    pub fn from_job(job: &'a ImportJob) -> Self {
        Self {
            repo: &job.repo,
            path: non_empty(&job.path),
            asset_type: non_empty(&job.asset_type),
            category: non_empty(&job.category),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Resposta do endpoint: `{success, data: {asset: {...}}, error?}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<ImportData>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportData {
    #[serde(default)]
    pub asset: Option<AssetSummary>,
}

impl ImportResponse {
    /// O asset importado, ou um resumo vazio quando o servidor não o descreve.
    pub fn into_asset(self) -> AssetSummary {
        self.data.and_then(|d| d.asset).unwrap_or_default()
    }
}

/// Resumo do asset criado pelo servidor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSummary {
    #[serde(default = "unknown")]
    pub name: String,
    #[serde(default = "unknown", rename = "type")]
    pub asset_type: String,
    #[serde(default, rename = "fileCount")]
    pub file_count: u64,
}

fn unknown() -> String {
    "?".to_string()
}

impl Default for AssetSummary {
    fn default() -> Self {
        Self {
            name: unknown(),
            asset_type: unknown(),
            file_count: 0,
        }
    }
}

/// Resultado classificado de uma tentativa de importação.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Success(AssetSummary),
    /// Resposta não-2xx. O trecho do corpo tem no máximo 500 caracteres.
    HttpError { status: u16, body_excerpt: String },
    /// Falha de transporte (DNS, conexão recusada, reset).
    ConnectionError { reason: String },
    Timeout,
    UnknownError { message: String },
}

impl ImportOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ImportOutcome::Success(_))
    }

    /// Detalhe adicional da falha; vazio para tudo exceto erros HTTP.
    pub fn detail(&self) -> &str {
        match self {
            ImportOutcome::HttpError { body_excerpt, .. } => body_excerpt.as_str(),
            _ => "",
        }
    }
}

impl fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportOutcome::Success(asset) => write!(f, "imported {}", asset.name),
            ImportOutcome::HttpError { status, .. } => write!(f, "HTTP {status}"),
            ImportOutcome::ConnectionError { reason } => write!(f, "Connection error: {reason}"),
            ImportOutcome::Timeout => write!(f, "Request timeout"),
            ImportOutcome::UnknownError { message } => write!(f, "{message}"),
        }
    }
}

/// Trunca `text` em no máximo `max` caracteres sem partir um code point UTF-8.
pub fn excerpt(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_absent_fields() {
        let job = ImportJob::new("a/b").with_type("skill");
        let json = serde_json::to_value(ImportRequest::from_job(&job)).unwrap();
        assert_eq!(json, serde_json::json!({"repo": "a/b", "type": "skill"}));
    }

    #[test]
    fn request_omits_empty_strings() {
        let job = ImportJob::new("a/b").with_path("").with_category("tools");
        let json = serde_json::to_value(ImportRequest::from_job(&job)).unwrap();
        assert_eq!(json, serde_json::json!({"repo": "a/b", "category": "tools"}));
    }

    #[test]
    fn response_parses_asset() {
        let body = r#"{"success": true, "data": {"asset": {"name": "demo", "type": "skill", "fileCount": 4}}}"#;
        let parsed: ImportResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.success);
        assert_eq!(
            parsed.into_asset(),
            AssetSummary {
                name: "demo".into(),
                asset_type: "skill".into(),
                file_count: 4,
            }
        );
    }

    #[test]
    fn response_without_asset_uses_placeholders() {
        let parsed: ImportResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        let asset = parsed.into_asset();
        assert_eq!(asset.name, "?");
        assert_eq!(asset.file_count, 0);
    }

    #[test]
    fn outcome_display_matches_report_labels() {
        let http = ImportOutcome::HttpError {
            status: 500,
            body_excerpt: "boom".into(),
        };
        assert_eq!(http.to_string(), "HTTP 500");
        assert_eq!(http.detail(), "boom");
        assert_eq!(ImportOutcome::Timeout.to_string(), "Request timeout");
        assert_eq!(
            ImportOutcome::ConnectionError {
                reason: "refused".into()
            }
            .to_string(),
            "Connection error: refused"
        );
        assert_eq!(ImportOutcome::Timeout.detail(), "");
    }

    #[test]
    fn excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("hello", 10), "hello");
        assert_eq!(excerpt("hello", 3), "hel");
        assert_eq!(excerpt("ããããã", 2), "ãã");
        assert_eq!(excerpt("", 5), "");
    }
}
