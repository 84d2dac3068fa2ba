//! Human-readable run report printed by the CLI

use std::fmt::{self, Display};

use crate::accounting::UsageLedger;
use crate::output::{ImageStatus, WrittenArtifacts};
use crate::pipeline::PlanOutcome;
use crate::prompts::pretty_json;

/// Everything one run produced, rendered section by section
pub struct RunReport<'a> {
    pub outcome: &'a PlanOutcome,
    pub written: &'a WrittenArtifacts,
    pub ledger: &'a UsageLedger,
}

fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "\n=== {title} ===")
}

impl Display for RunReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = self.outcome;

        heading(f, "Intake JSON")?;
        writeln!(f, "{}", pretty_json(&outcome.intake))?;

        heading(f, "Itinerario generado")?;
        match &outcome.itinerary {
            Some(text) => writeln!(f, "{}", text.trim_end())?,
            None => writeln!(f, "(no se pudo generar el itinerario)")?,
        }

        heading(f, "QA del itinerario")?;
        if outcome.audit.is_empty() {
            writeln!(f, "Sin alertas.")?;
        } else {
            write!(f, "{}", outcome.audit)?;
        }

        heading(f, "Lugares y servicios detectados en el itinerario")?;
        for place in &outcome.places {
            writeln!(f, "- {place}")?;
        }

        heading(f, "Lugares y servicios con datos de contacto simulados")?;
        for contact in outcome.contacts.iter() {
            writeln!(f, "{contact}")?;
        }

        heading(f, "Imágenes")?;
        for image in &self.written.images {
            match &image.status {
                ImageStatus::Saved { path } => {
                    writeln!(f, "✅ {} generado → {}", image.name, path.display())?
                }
                ImageStatus::Missing { reason } => {
                    writeln!(f, "⚠️ No se generó imagen para {}. {}", image.name, reason)?
                }
            }
        }

        let mut warnings = outcome.warnings.iter().chain(&self.written.warnings).peekable();
        if warnings.peek().is_some() {
            heading(f, "Advertencias")?;
            for warning in warnings {
                writeln!(f, "⚠️ {warning}")?;
            }
        }

        f.write_str(&self.ledger.render())
    }
}

pub fn render_report(outcome: &PlanOutcome, written: &WrittenArtifacts, ledger: &UsageLedger) -> String {
    RunReport {
        outcome,
        written,
        ledger,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PricingConfig;
    use crate::models::{AuditReport, ContactList};
    use crate::output::ImageReport;
    use crate::pipeline::{Stage, StageWarning};
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn test_report_sections() {
        let audit: AuditReport =
            serde_json::from_str(r#"{"alertas": {"Día 1": ["Traslado mayor a 60 minutos"]}}"#)
                .unwrap();
        let outcome = PlanOutcome {
            intake: json!({"param": {"dest": "Salta"}}),
            itinerary: None,
            audit,
            places: vec!["Visita al Cabildo".to_string()],
            key_points: Vec::new(),
            contacts: ContactList::default(),
            images: Vec::new(),
            warnings: vec![StageWarning::new(Stage::Itinerary, "OpenAI error: timeout")],
        };
        let written = WrittenArtifacts {
            files: Vec::new(),
            images: vec![ImageReport {
                name: "Mapa",
                status: ImageStatus::Saved {
                    path: PathBuf::from("salida/escapada_Mapa.png"),
                },
            }],
            warnings: Vec::new(),
        };
        let ledger = UsageLedger::new(PricingConfig::default());

        let report = render_report(&outcome, &written, &ledger);

        assert!(report.contains("\"dest\": \"Salta\""));
        assert!(report.contains("(no se pudo generar el itinerario)"));
        assert!(report.contains("📅 Día 1\n"));
        assert!(report.contains("🕒 Traslado mayor a 60 minutos"));
        assert!(report.contains("- Visita al Cabildo"));
        assert!(report.contains("✅ Mapa generado → salida/escapada_Mapa.png"));
        assert!(report.contains("⚠️ itinerary: OpenAI error: timeout"));
        assert!(report.ends_with("Costo total estimado: USD 0.000000\n"));
    }

    #[test]
    fn test_report_without_warnings_has_no_warning_section() {
        let outcome = PlanOutcome {
            intake: json!({}),
            itinerary: Some("Día 1 - Centro".to_string()),
            audit: AuditReport::default(),
            places: Vec::new(),
            key_points: Vec::new(),
            contacts: ContactList::default(),
            images: Vec::new(),
            warnings: Vec::new(),
        };
        let ledger = UsageLedger::new(PricingConfig::default());
        let report = RunReport {
            outcome: &outcome,
            written: &WrittenArtifacts::default(),
            ledger: &ledger,
        }
        .to_string();

        assert!(report.contains("Sin alertas."));
        assert!(!report.contains("=== Advertencias ==="));
        assert!(report.contains("=== RESUMEN TOTAL ==="));
    }
}
