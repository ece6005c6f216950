//! Interface de linha de comando do importador baseada em clap.
//!
//! A struct [`Cli`] aceita um arquivo de configuração (`--config`) ou jobs
//! inline (`--repo`, `--paths`, `--type`), mais overrides de execução.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{DEFAULT_BASE_URL, ImportJob, RunConfig};
use crate::error::ImportError;

/// Importa assets do GitHub em lote, um por vez, via endpoint administrativo.
#[derive(Debug, Parser)]
#[command(name = "hub-import", version, about)]
pub struct Cli {
    /// Caminho para um arquivo JSON ou TOML com a configuração e os jobs.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// URL base do serviço.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Segredo administrativo enviado em `x-admin-secret`.
    #[arg(long, env = "ADMIN_SECRET", hide_env_values = true)]
    pub admin_secret: Option<String>,

    /// Repositório único (owner/repo) para importação inline.
    #[arg(long)]
    pub repo: Option<String>,

    /// Sub-caminhos separados por vírgula dentro de `--repo`.
    #[arg(long)]
    pub paths: Option<String>,

    /// Tipo de asset para todos os jobs inline.
    #[arg(long = "type", default_value = "skill")]
    pub asset_type: String,

    /// Categoria para todos os jobs inline.
    #[arg(long)]
    pub category: Option<String>,

    /// Pausa entre jobs e atraso base do backoff, em segundos.
    #[arg(long)]
    pub delay: Option<u64>,

    /// Timeout de cada importação, em segundos.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Retentativas após a primeira tentativa.
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Grava o relatório final em JSON neste caminho.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Habilita logs de depuração.
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,

    /// Emite logs em JSON.
    #[arg(long, default_value_t = false)]
    pub json_logs: bool,
}

impl Cli {
    /// Monta a [`RunConfig`] a partir do arquivo ou dos jobs inline.
    /// Flags explícitas têm precedência sobre o arquivo.
    pub fn run_config(&self) -> Result<RunConfig, ImportError> {
        let mut config = if let Some(path) = &self.config {
            RunConfig::load(path)?
        } else if let Some(repo) = &self.repo {
            RunConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                imports: self.inline_jobs(repo),
                ..Default::default()
            }
        } else {
            return Err(ImportError::MissingSource);
        };

        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(secret) = self.admin_secret.as_deref().filter(|s| !s.is_empty()) {
            config.admin_secret = secret.to_string();
        }
        if let Some(delay) = self.delay {
            config.delay_seconds = delay;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_seconds = timeout;
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        config.normalize();
        Ok(config)
    }

    fn inline_jobs(&self, repo: &str) -> Vec<ImportJob> {
        let paths: Vec<&str> = self
            .paths
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        let base = {
            let job = ImportJob::new(repo).with_type(self.asset_type.as_str());
            match &self.category {
                Some(category) => job.with_category(category.as_str()),
                None => job,
            }
        };

        if paths.is_empty() {
            vec![base]
        } else {
            paths
                .into_iter()
                .map(|path| base.clone().with_path(path))
                .collect()
        }
    }
}
