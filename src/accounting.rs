//! Token and cost accounting for one planning run

use serde::Serialize;
use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::Result;
use crate::config::PricingConfig;
use crate::llm::TokenUsage;

/// Default report file name inside the output directory
pub const COST_REPORT_FILE: &str = "costos_totales.txt";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UsageKind {
    Text(TokenUsage),
    Image,
}

/// One billed call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageEntry {
    pub label: String,
    #[serde(flatten)]
    pub kind: UsageKind,
    pub cost_usd: f64,
}

impl Display for UsageEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            UsageKind::Text(usage) => write!(
                f,
                "{} → Tokens usados: {} (entrada={}, salida={}), USD {:.6}",
                self.label,
                usage.total_tokens,
                usage.prompt_tokens,
                usage.completion_tokens,
                self.cost_usd
            ),
            UsageKind::Image => write!(
                f,
                "{} → Costo fijo por imagen: USD {:.6}",
                self.label, self.cost_usd
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct UsageTotals {
    pub total_tokens: u64,
    pub total_usd: f64,
}

/// Usage recorded during one run. Owned by the caller and threaded through
/// the pipeline; nothing here is global.
#[derive(Debug, Clone)]
pub struct UsageLedger {
    pricing: PricingConfig,
    entries: Vec<UsageEntry>,
}

impl UsageLedger {
    pub fn new(pricing: PricingConfig) -> Self {
        Self {
            pricing,
            entries: Vec::new(),
        }
    }

    pub fn record_text<S: Into<String>>(&mut self, label: S, usage: TokenUsage) -> &UsageEntry {
        let cost_usd = f64::from(usage.prompt_tokens) * self.pricing.input_usd_per_token
            + f64::from(usage.completion_tokens) * self.pricing.output_usd_per_token;
        self.push(UsageEntry {
            label: label.into(),
            kind: UsageKind::Text(usage),
            cost_usd,
        })
    }

    pub fn record_image<S: Into<String>>(&mut self, label: S) -> &UsageEntry {
        let cost_usd = self.pricing.image_usd;
        self.push(UsageEntry {
            label: label.into(),
            kind: UsageKind::Image,
            cost_usd,
        })
    }

    fn push(&mut self, entry: UsageEntry) -> &UsageEntry {
        debug!(label = %entry.label, cost_usd = entry.cost_usd, "Usage recorded");
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[UsageEntry] {
        &self.entries
    }

    pub fn totals(&self) -> UsageTotals {
        self.entries
            .iter()
            .fold(UsageTotals::default(), |mut totals, entry| {
                if let UsageKind::Text(usage) = entry.kind {
                    totals.total_tokens += u64::from(usage.total_tokens);
                }
                totals.total_usd += entry.cost_usd;
                totals
            })
    }

    /// Per-call lines followed by the totals footer
    pub fn render(&self) -> String {
        let mut report = String::new();
        for entry in &self.entries {
            report.push_str(&entry.to_string());
            report.push('\n');
        }
        let totals = self.totals();
        report.push_str("\n=== RESUMEN TOTAL ===\n");
        report.push_str(&format!(
            "Tokens totales consumidos: {}\n",
            totals.total_tokens
        ));
        report.push_str(&format!(
            "Costo total estimado: USD {:.6}\n",
            totals.total_usd
        ));
        report
    }

    /// Append the rendered report to `path`, creating the file if needed
    pub fn write_report(&self, path: &Path) -> Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(self.render().as_bytes())?;
        Ok(())
    }
}
