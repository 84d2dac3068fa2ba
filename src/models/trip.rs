//! Trip request model and the menu enums it is built from

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A numbered menu option (1-based) with a stable key and a Spanish label
pub trait Choice: Copy + Sized + 'static {
    /// Every option, in menu order
    const ALL: &'static [Self];

    /// Stable ASCII identifier used by forms and config ("medium-high")
    fn key(self) -> &'static str;

    /// Label shown to the traveller and embedded in prompts
    fn label(self) -> &'static str;

    /// Optional one-line explanation printed next to the menu entry
    fn description(self) -> Option<&'static str> {
        None
    }

    fn from_number(number: usize) -> Option<Self> {
        number.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.key().eq_ignore_ascii_case(key) || c.label().eq_ignore_ascii_case(key))
    }

    /// Menu position of this option (1-based)
    fn number(self) -> usize
    where
        Self: PartialEq,
    {
        Self::ALL.iter().position(|c| *c == self).map_or(0, |i| i + 1)
    }
}

/// How the party reaches the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportMode {
    Car,
    Bus,
    Plane,
    Train,
}

impl Choice for TransportMode {
    const ALL: &'static [Self] = &[Self::Car, Self::Bus, Self::Plane, Self::Train];

    fn key(self) -> &'static str {
        match self {
            Self::Car => "car",
            Self::Bus => "bus",
            Self::Plane => "plane",
            Self::Train => "train",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Car => "auto",
            Self::Bus => "micro",
            Self::Plane => "avión",
            Self::Train => "tren",
        }
    }
}

/// Spending level the itinerary should target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BudgetTier {
    Low,
    Medium,
    MediumHigh,
    High,
}

impl Choice for BudgetTier {
    const ALL: &'static [Self] = &[Self::Low, Self::Medium, Self::MediumHigh, Self::High];

    fn key(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::MediumHigh => "medium-high",
            Self::High => "high",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Low => "bajo",
            Self::Medium => "medio",
            Self::MediumHigh => "medio-alto",
            Self::High => "alto",
        }
    }

    fn description(self) -> Option<&'static str> {
        Some(match self {
            Self::Low => "Opciones económicas, transporte público, hostels.",
            Self::Medium => "Balance entre costo y comodidad.",
            Self::MediumHigh => "Hoteles 3-4⭐, experiencias destacadas.",
            Self::High => "Lujo, experiencias premium.",
        })
    }
}

/// Pace and theme of the trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TravelMode {
    Intense,
    Relax,
    Cultural,
    Gastronomic,
    Adventure,
    Family,
}

impl Choice for TravelMode {
    const ALL: &'static [Self] = &[
        Self::Intense,
        Self::Relax,
        Self::Cultural,
        Self::Gastronomic,
        Self::Adventure,
        Self::Family,
    ];

    fn key(self) -> &'static str {
        match self {
            Self::Intense => "intense",
            Self::Relax => "relax",
            Self::Cultural => "cultural",
            Self::Gastronomic => "gastronomic",
            Self::Adventure => "adventure",
            Self::Family => "family",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Intense => "Exprímelo",
            Self::Relax => "Relax",
            Self::Cultural => "Cultural",
            Self::Gastronomic => "Gastronómico",
            Self::Adventure => "Aventura",
            Self::Family => "Familiar",
        }
    }

    fn description(self) -> Option<&'static str> {
        Some(match self {
            Self::Intense => "Aprovechar al máximo cada hora.",
            Self::Relax => "Ritmo tranquilo, descansos largos.",
            Self::Cultural => "Museos, historia, arquitectura.",
            Self::Gastronomic => "Comidas y vinos locales.",
            Self::Adventure => "Deportes y excursiones.",
            Self::Family => "Opciones aptas para todas las edades.",
        })
    }
}

/// Tourist season of the travel dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Season {
    High,
    Low,
}

impl Choice for Season {
    const ALL: &'static [Self] = &[Self::High, Self::Low];

    fn key(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Low => "low",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::High => "alta",
            Self::Low => "baja",
        }
    }

    fn description(self) -> Option<&'static str> {
        Some(match self {
            Self::High => "vacaciones, feriados largos, temporada turística",
            Self::Low => "resto del año",
        })
    }
}

macro_rules! display_label {
    ($($ty:ty),*) => {
        $(impl Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        })*
    };
}

display_label!(TransportMode, BudgetTier, TravelMode, Season);

/// Field values gathered from the traveller, typed but not yet checked
/// against each other
#[derive(Debug, Clone, PartialEq)]
pub struct TripDraft {
    pub destination: String,
    pub transport_mode: TransportMode,
    pub party_size: u32,
    pub start_date: NaiveDate,
    pub arrival_time: NaiveTime,
    pub end_date: NaiveDate,
    pub return_time: NaiveTime,
    pub budget_tier: BudgetTier,
    pub travel_mode: TravelMode,
    pub children_under_12: bool,
    pub season: Season,
}

/// Validated trip parameters. Only `validation::build_trip_request`
/// constructs one, so the date ordering invariant always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripRequest {
    pub(crate) destination: String,
    pub(crate) transport_mode: TransportMode,
    pub(crate) party_size: u32,
    pub(crate) start_date: NaiveDate,
    pub(crate) arrival_time: NaiveTime,
    pub(crate) end_date: NaiveDate,
    pub(crate) return_time: NaiveTime,
    pub(crate) budget_tier: BudgetTier,
    pub(crate) travel_mode: TravelMode,
    pub(crate) children_under_12: bool,
    pub(crate) season: Season,
}

impl TripRequest {
    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn transport_mode(&self) -> TransportMode {
        self.transport_mode
    }

    pub fn party_size(&self) -> u32 {
        self.party_size
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn arrival_time(&self) -> NaiveTime {
        self.arrival_time
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn return_time(&self) -> NaiveTime {
        self.return_time
    }

    pub fn budget_tier(&self) -> BudgetTier {
        self.budget_tier
    }

    pub fn travel_mode(&self) -> TravelMode {
        self.travel_mode
    }

    pub fn season(&self) -> Season {
        self.season
    }

    /// Only family trips carry a children answer; every other mode reports `false`
    pub fn children_under_12(&self) -> bool {
        self.travel_mode == TravelMode::Family && self.children_under_12
    }

    pub fn start_instant(&self) -> NaiveDateTime {
        self.start_date.and_time(self.arrival_time)
    }

    pub fn end_instant(&self) -> NaiveDateTime {
        self.end_date.and_time(self.return_time)
    }

    /// Calendar days touched by the trip, both ends included
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Parameters in the shape the intake prompt asks the model to echo back
    #[must_use]
    pub fn intake_params(&self) -> IntakeParams {
        IntakeParams {
            dest: self.destination.clone(),
            transporte: self.transport_mode.label().to_string(),
            dias: self.duration_days(),
            pers: self.party_size,
            presupuesto: self.budget_tier.label().to_string(),
            modo: self.travel_mode.label().to_string(),
            fecha_inicio: format_date(self.start_date),
            hora_llegada: format_time(self.arrival_time),
            fecha_regreso: format_date(self.end_date),
            hora_regreso: format_time(self.return_time),
            ninos_menores_12: self.children_under_12(),
            temporada: self.season.label().to_string(),
        }
    }
}

/// `DD/MM/YYYY`, the layout the traveller typed
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// `HH:MM`
pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Serialised intake parameters (`{"param": {...}}` payload)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeParams {
    pub dest: String,
    pub transporte: String,
    pub dias: i64,
    pub pers: u32,
    pub presupuesto: String,
    pub modo: String,
    pub fecha_inicio: String,
    pub hora_llegada: String,
    pub fecha_regreso: String,
    pub hora_regreso: String,
    pub ninos_menores_12: bool,
    pub temporada: String,
}

impl Display for TripRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Resumen de tu viaje ===")?;
        writeln!(f, "Destino: {}", self.destination)?;
        writeln!(f, "Medio de transporte: {}", self.transport_mode)?;
        writeln!(
            f,
            "Duración: {} días, para {} personas.",
            self.duration_days(),
            self.party_size
        )?;
        writeln!(
            f,
            "Llegada: {} a las {}",
            format_date(self.start_date),
            format_time(self.arrival_time)
        )?;
        writeln!(
            f,
            "Regreso: {} a las {}",
            format_date(self.end_date),
            format_time(self.return_time)
        )?;
        writeln!(f, "Presupuesto estimado: {}", self.budget_tier)?;
        writeln!(f, "Modo de viaje seleccionado: {}", self.travel_mode)?;
        if self.travel_mode == TravelMode::Family {
            writeln!(
                f,
                "¿Viajan niños menores de 12 años?: {}",
                if self.children_under_12 { "Sí" } else { "No" }
            )?;
        }
        write!(f, "Temporada: {}", self.season.label().to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, Some(TransportMode::Car))]
    #[case(3, Some(TransportMode::Plane))]
    #[case(4, Some(TransportMode::Train))]
    #[case(0, None)]
    #[case(5, None)]
    fn test_transport_from_number(#[case] number: usize, #[case] expected: Option<TransportMode>) {
        assert_eq!(TransportMode::from_number(number), expected);
    }

    #[test]
    fn test_from_key_accepts_key_and_label() {
        assert_eq!(BudgetTier::from_key("medium-high"), Some(BudgetTier::MediumHigh));
        assert_eq!(BudgetTier::from_key("Medio-Alto"), Some(BudgetTier::MediumHigh));
        assert_eq!(TravelMode::from_key("familiar"), Some(TravelMode::Family));
        assert_eq!(Season::from_key("winter"), None);
    }

    #[test]
    fn test_menu_numbers_follow_declaration_order() {
        assert_eq!(TravelMode::Family.number(), 6);
        assert_eq!(Season::High.number(), 1);
        assert_eq!(TravelMode::ALL.len(), 6);
    }

    #[test]
    fn test_serde_uses_kebab_keys() {
        let json = serde_json::to_string(&BudgetTier::MediumHigh).unwrap();
        assert_eq!(json, "\"medium-high\"");
    }
}
