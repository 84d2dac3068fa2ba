//! Quality-audit warnings grouped by itinerary day

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt::Display;

use crate::extraction::extract_alert_icon;

/// Alerts the audit pass raised for one day of the itinerary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayAlerts {
    pub day: String,
    pub alerts: Vec<String>,
}

/// Audit answer: `{"alertas": {"Día 2": ["..."], ...}}`, days kept in the
/// order the model wrote them. Serializes back into the same shape.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct AuditReport {
    pub days: Vec<DayAlerts>,
}

impl From<Map<String, Value>> for AuditReport {
    fn from(mut raw: Map<String, Value>) -> Self {
        let alertas = match raw.remove("alertas") {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let days = alertas
            .into_iter()
            .map(|(day, value)| DayAlerts {
                day,
                alerts: alert_strings(value),
            })
            .filter(|d| !d.alerts.is_empty())
            .collect();
        Self { days }
    }
}

impl Serialize for AuditReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Days<'a>(&'a [DayAlerts]);

        impl Serialize for Days<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for day in self.0 {
                    map.serialize_entry(&day.day, &day.alerts)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("alertas", &Days(&self.days))?;
        map.end()
    }
}

fn alert_strings(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        Value::String(s) => vec![s],
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

impl AuditReport {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn alert_count(&self) -> usize {
        self.days.iter().map(|d| d.alerts.len()).sum()
    }
}

impl Display for AuditReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for day in &self.days {
            writeln!(f)?;
            writeln!(f, "📅 {}", day.day)?;
            writeln!(f, "{}", "-".repeat(day.day.chars().count() + 4))?;
            for alert in &day.alerts {
                writeln!(f, "{} {}", extract_alert_icon(alert).icon(), alert)?;
            }
            writeln!(f, "{}", "-".repeat(40))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_keep_model_order() {
        let raw = r#"{"alertas": {"Día 5": ["Actividad Y puede ser excesiva"], "Día 2": ["Traslado mayor a 60 minutos", "Reserva anticipada"]}}"#;
        let report: AuditReport = serde_json::from_str(raw).unwrap();
        assert_eq!(report.days.len(), 2);
        assert_eq!(report.days[0].day, "Día 5");
        assert_eq!(report.days[1].alerts.len(), 2);
        assert_eq!(report.alert_count(), 3);
    }

    #[test]
    fn test_missing_alerts_key_is_empty() {
        let report: AuditReport = serde_json::from_str("{}").unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_days_without_alerts_are_dropped() {
        let raw = r#"{"alertas": {"Día 1": [], "Día 3": "Traslado largo"}}"#;
        let report: AuditReport = serde_json::from_str(raw).unwrap();
        assert_eq!(report.days.len(), 1);
        assert_eq!(report.days[0].alerts, vec!["Traslado largo".to_string()]);
    }

    #[test]
    fn test_serializes_back_into_alertas_shape() {
        let raw = r#"{"alertas": {"Día 5": ["Actividad Y puede ser excesiva"], "Día 2": ["Reserva anticipada"]}}"#;
        let report: AuditReport = serde_json::from_str(raw).unwrap();

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value, serde_json::from_str::<Value>(raw).unwrap());
        assert_eq!(serde_json::from_value::<AuditReport>(value).unwrap(), report);
    }

    #[test]
    fn test_sequence_is_rejected() {
        assert!(serde_json::from_str::<AuditReport>(r#"[{"Día 1": ["x"]}]"#).is_err());
    }

    #[test]
    fn test_display_uses_alert_icons() {
        let report = AuditReport {
            days: vec![DayAlerts {
                day: "Día 2".to_string(),
                alerts: vec![
                    "Actividad no apta para niños".to_string(),
                    "Traslado mayor a 60 minutos".to_string(),
                    "Día muy cargado".to_string(),
                ],
            }],
        };
        let rendered = report.to_string();
        assert!(rendered.contains("📅 Día 2"));
        assert!(rendered.contains("👶 Actividad no apta para niños"));
        assert!(rendered.contains("🕒 Traslado mayor a 60 minutos"));
        assert!(rendered.contains("⚠️ Día muy cargado"));
    }
}
