//! Configuração de uma execução em lote carregada de um arquivo JSON ou TOML.
//!
//! A struct [`RunConfig`] contém todos os parâmetros da execução e a lista
//! ordenada de [`ImportJob`]s. Valores não presentes no arquivo usam os
//! mesmos defaults da ferramenta de linha de comando.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ImportError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

/// Uma unidade de trabalho: um repositório e, opcionalmente, um sub-caminho.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportJob {
    /// Repositório no formato `owner/repo`.
    pub repo: String,
    /// Sub-caminho dentro do repositório (arquivo ou diretório).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Tipo do asset (ex.: "skill", "experience").
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
    /// Categoria opcional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ImportJob {
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            path: None,
            asset_type: None,
            category: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_type(mut self, asset_type: impl Into<String>) -> Self {
        self.asset_type = Some(asset_type.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Rótulo usado em logs e no relatório: o caminho se presente, senão o repositório.
    pub fn label(&self) -> &str {
        match self.path.as_deref() {
            Some(path) if !path.is_empty() => path,
            _ => &self.repo,
        }
    }
}

/// Configuração de nível superior de uma execução.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// URL base do serviço administrativo.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Segredo enviado no header `x-admin-secret`.
    #[serde(default)]
    pub admin_secret: String,

    /// Pausa entre jobs e atraso base do backoff exponencial.
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: u64,

    /// Timeout de cada requisição de importação.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retentativas após a primeira tentativa de cada job.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Timeout de cada sonda de saúde.
    #[serde(default = "default_health_timeout_seconds")]
    pub health_timeout_seconds: u64,

    /// Prazo de espera pelo servidor antes do primeiro job.
    #[serde(default = "default_startup_wait_seconds")]
    pub startup_wait_seconds: u64,

    /// Prazo de espera pela recuperação do servidor no meio do lote.
    #[serde(default = "default_recovery_wait_seconds")]
    pub recovery_wait_seconds: u64,

    /// Intervalo entre sondas enquanto se espera pelo servidor.
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,

    /// Jobs em ordem de execução.
    #[serde(default)]
    pub imports: Vec<ImportJob>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_delay_seconds() -> u64 {
    3
}

fn default_timeout_seconds() -> u64 {
    180
}

fn default_max_retries() -> u32 {
    2
}

fn default_health_timeout_seconds() -> u64 {
    10
}

fn default_startup_wait_seconds() -> u64 {
    60
}

fn default_recovery_wait_seconds() -> u64 {
    120
}

fn default_poll_interval_seconds() -> u64 {
    3
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            admin_secret: String::new(),
            delay_seconds: default_delay_seconds(),
            timeout_seconds: default_timeout_seconds(),
            max_retries: default_max_retries(),
            health_timeout_seconds: default_health_timeout_seconds(),
            startup_wait_seconds: default_startup_wait_seconds(),
            recovery_wait_seconds: default_recovery_wait_seconds(),
            poll_interval_seconds: default_poll_interval_seconds(),
            imports: Vec::new(),
        }
    }
}

impl RunConfig {
    /// Carrega a configuração de um arquivo. Extensão `.toml` é lida como TOML,
    /// qualquer outra como JSON.
    pub fn load(path: &Path) -> Result<Self, ImportError> {
        let contents = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let mut config = if is_toml {
            toml::from_str::<RunConfig>(&contents)?
        } else {
            serde_json::from_str::<RunConfig>(&contents)?
        };
        config.normalize();
        Ok(config)
    }

    /// Remove a barra final da URL base para que os endpoints sejam montados sem `//`.
    pub fn normalize(&mut self) {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        self.base_url = trimmed.to_string();
    }

    /// Verifica as pré-condições da execução antes de qualquer atividade de rede.
    pub fn validate(&self) -> Result<(), ImportError> {
        if self.admin_secret.trim().is_empty() {
            return Err(ImportError::MissingSecret);
        }
        if self.imports.is_empty() {
            return Err(ImportError::NoImports);
        }
        if self.imports.iter().any(|job| job.repo.trim().is_empty()) {
            return Err(ImportError::Config("every import needs a repo".into()));
        }
        let positive = [
            ("timeout_seconds", self.timeout_seconds),
            ("health_timeout_seconds", self.health_timeout_seconds),
            ("poll_interval_seconds", self.poll_interval_seconds),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ImportError::Config(format!("{name} must be greater than zero")));
        }
        Ok(())
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_seconds)
    }

    pub fn startup_wait(&self) -> Duration {
        Duration::from_secs(self.startup_wait_seconds)
    }

    pub fn recovery_wait(&self) -> Duration {
        Duration::from_secs(self.recovery_wait_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_values() {
        let config = RunConfig::default();
        assert_eq!(config.base_url, "http://localhost:3001");
        assert_eq!(config.delay_seconds, 3);
        assert_eq!(config.timeout_seconds, 180);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.startup_wait_seconds, 60);
        assert_eq!(config.recovery_wait_seconds, 120);
        assert_eq!(config.poll_interval_seconds, 3);
        assert!(config.admin_secret.is_empty());
        assert!(config.imports.is_empty());
    }

    #[test]
    fn deserialize_partial_json() {
        let json = r#"{
            "admin_secret": "s3cret",
            "delay_seconds": 1,
            "imports": [
                { "repo": "a/b", "type": "skill" },
                { "repo": "c/d", "path": "x.md", "type": "experience", "category": null }
            ]
        }"#;
        let config: RunConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.admin_secret, "s3cret");
        assert_eq!(config.delay_seconds, 1);
        assert_eq!(config.timeout_seconds, 180);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.imports.len(), 2);
        assert_eq!(config.imports[0], ImportJob::new("a/b").with_type("skill"));
        assert_eq!(config.imports[1].path.as_deref(), Some("x.md"));
        assert!(config.imports[1].category.is_none());
    }

    #[test]
    fn load_json_file_and_trim_base_url() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"base_url": "http://hub.local:8080/", "admin_secret": "x", "imports": [{{"repo": "o/r"}}]}}"#
        )
        .unwrap();

        let config = RunConfig::load(file.path()).unwrap();
        assert_eq!(config.base_url, "http://hub.local:8080");
        assert_eq!(config.imports, vec![ImportJob::new("o/r")]);
    }

    #[test]
    fn load_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
admin_secret = "x"
max_retries = 4

[[imports]]
repo = "owner/repo"
path = "usecases/a.md"
type = "experience"
"#
        )
        .unwrap();

        let config = RunConfig::load(file.path()).unwrap();
        assert_eq!(config.max_retries, 4);
        assert_eq!(
            config.imports,
            vec![
                ImportJob::new("owner/repo")
                    .with_path("usecases/a.md")
                    .with_type("experience")
            ]
        );
    }

    #[test]
    fn load_rejects_malformed_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = RunConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ImportError::Json(_)));
    }

    #[test]
    fn validate_requires_secret_and_imports() {
        let mut config = RunConfig::default();
        config.imports.push(ImportJob::new("a/b"));
        assert!(matches!(config.validate(), Err(ImportError::MissingSecret)));

        config.admin_secret = "x".into();
        assert!(config.validate().is_ok());

        config.imports.clear();
        assert!(matches!(config.validate(), Err(ImportError::NoImports)));
    }

    #[test]
    fn validate_rejects_blank_repo() {
        let config = RunConfig {
            admin_secret: "x".into(),
            imports: vec![ImportJob::new("  ")],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ImportError::Config(_))));
    }

    #[test]
    fn validate_rejects_zero_timeouts() {
        let base = RunConfig {
            admin_secret: "x".into(),
            imports: vec![ImportJob::new("a/b")],
            ..Default::default()
        };

        let config = RunConfig {
            timeout_seconds: 0,
            ..base.clone()
        };
        match config.validate() {
            Err(ImportError::Config(msg)) => assert!(msg.contains("timeout_seconds")),
            other => panic!("expected Config error, got {other:?}"),
        }

        let config = RunConfig {
            health_timeout_seconds: 0,
            ..base.clone()
        };
        match config.validate() {
            Err(ImportError::Config(msg)) => assert!(msg.contains("health_timeout_seconds")),
            other => panic!("expected Config error, got {other:?}"),
        }

        let config = RunConfig {
            poll_interval_seconds: 0,
            ..base
        };
        assert!(matches!(config.validate(), Err(ImportError::Config(_))));
    }

    #[test]
    fn label_prefers_path() {
        assert_eq!(ImportJob::new("a/b").label(), "a/b");
        assert_eq!(ImportJob::new("a/b").with_path("x.md").label(), "x.md");
        assert_eq!(ImportJob::new("a/b").with_path("").label(), "a/b");
    }
}
