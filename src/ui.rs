//! Interface de terminal do importador: spinners e saída colorida.
//!
//! Usa `indicatif` para o spinner de cada job e `console` para as cores.
//! [`ConsoleProgress`] implementa [`BatchObserver`] e acompanha o lote
//! visualmente; [`print_summary`] imprime o relatório final. Os spinners
//! vivem num [`MultiProgress`] compartilhado com o writer de logs
//! ([`ProgressWriter`](crate::telemetry::ProgressWriter)), que os esconde
//! enquanto cada linha de log é escrita.

use std::time::Duration;

use console::Style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::orchestrator::BatchObserver;
use crate::report::BatchReport;
use crate::retry::{AttemptRecord, JobVerdict};

/// Indicador visual de progresso do lote no terminal.
///
/// Um spinner por job; sucesso em verde, falha em vermelho, retentativa em amarelo.
pub struct ConsoleProgress {
    // Alvo de desenho compartilhado com o subscriber de tracing.
    multi: MultiProgress,
    // Spinner do job em andamento, se houver.
    pb: Option<ProgressBar>,
    green: Style,
    red: Style,
    yellow: Style,
    dim: Style,
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::with_multi(MultiProgress::new())
    }

    /// Usa o mesmo [`MultiProgress`] passado para
    /// [`init_tracing`](crate::telemetry::init_tracing).
    pub fn with_multi(multi: MultiProgress) -> Self {
        Self {
            multi,
            pb: None,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            dim: Style::new().dim(),
        }
    }

    fn spinner(&self, message: String) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} {elapsed:.dim}") {
            pb.set_style(style);
        }
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    // Imprime no stdout com os spinners escondidos.
    fn println(&self, line: String) {
        self.multi.suspend(|| println!("{line}"));
    }
}

impl BatchObserver for ConsoleProgress {
    fn batch_started(&mut self, total: usize) {
        self.println(format!("\n🚀 Starting batch import: {total} items\n"));
    }

    fn job_started(&mut self, index: usize, total: usize, label: &str) {
        self.println(format!("{} {label}", self.dim.apply_to(format!("[{index}/{total}]"))));
        self.pb = Some(self.spinner(format!("importing {label}")));
    }

    fn attempt_failed(&mut self, record: &AttemptRecord) {
        self.println(format!(
            "  {} Attempt {} failed: {}",
            self.yellow.apply_to("⚠"),
            record.attempt_number,
            record.outcome
        ));
    }

    fn recovery_wait(&mut self, _label: &str, max_wait: Duration) {
        self.println(format!(
            "  {} Server appears down, waiting up to {}s for recovery...",
            self.yellow.apply_to("↻"),
            max_wait.as_secs()
        ));
    }

    fn backoff(&mut self, _label: &str, delay: Duration) {
        if let Some(pb) = &self.pb {
            pb.set_message(format!("retrying in {}s", delay.as_secs()));
        }
    }

    fn job_finished(&mut self, _index: usize, _label: &str, verdict: &JobVerdict) {
        if let Some(pb) = self.pb.take() {
            pb.finish_and_clear();
            self.multi.remove(&pb);
        }
        let line = match verdict {
            JobVerdict::Imported(asset) => format!(
                "  {} {} (type={}, files={})",
                self.green.apply_to("✓"),
                asset.name,
                asset.asset_type,
                asset.file_count
            ),
            JobVerdict::Exhausted(outcome) => {
                format!("  {} Failed: {outcome}", self.red.apply_to("✗"))
            }
            JobVerdict::ServerDown => {
                format!("  {} Server did not recover", self.red.apply_to("✗"))
            }
        };
        self.println(line);
    }
}

/// Imprime o resumo final do lote.
pub fn print_summary(report: &BatchReport) {
    let green = Style::new().green().bold();
    let red = Style::new().red().bold();
    let dim = Style::new().dim();

    println!();
    println!("{}", "=".repeat(50));
    println!(
        "📊 Import complete: {}{} / {}{} / {} total",
        report.succeeded,
        green.apply_to("✓"),
        report.failed,
        red.apply_to("✗"),
        report.total
    );
    if !report.failures.is_empty() {
        println!();
        println!("{}", red.apply_to("Failures:"));
        for failure in &report.failures {
            println!("  - {}: {}", failure.item, failure.error);
            if !failure.detail.is_empty() {
                println!("    {}", dim.apply_to(&failure.detail));
            }
        }
    }
    println!();
}
