//! Input validation
//!
//! Turns raw traveller input into a [`TripRequest`]. The single-field parsers
//! are shared by the interactive intake (which re-asks one field at a time)
//! and by [`TripForm::validate`], which checks every field of a submitted
//! form and reports all violations together.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::error::ValidationError;
use crate::models::{
    BudgetTier, Choice, Season, TransportMode, TravelMode, TripDraft, TripRequest,
};

pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Parse a `DD/MM/YYYY` calendar date
pub fn parse_date(text: &str) -> Result<NaiveDate, ValidationError> {
    let text = text.trim();
    // chrono accepts single-digit days and months, the fixed layout does not
    let well_formed = text.len() == 10
        && text
            .char_indices()
            .all(|(i, c)| if i == 2 || i == 5 { c == '/' } else { c.is_ascii_digit() });
    if !well_formed {
        return Err(ValidationError::format("DD/MM/YYYY (ej: 05/09/2025)", text));
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|_| ValidationError::format("DD/MM/YYYY (ej: 05/09/2025)", text))
}

/// Parse a 4-digit `HHMM` time of day
pub fn parse_time_of_day(text: &str) -> Result<NaiveTime, ValidationError> {
    let text = text.trim();
    let invalid = || ValidationError::format("HHMM (ej: 0830, 1300)", text);

    if text.len() != 4 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let hour: u32 = text[..2].parse().map_err(|_| invalid())?;
    let minute: u32 = text[2..].parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

fn parse_integer(text: &str) -> Result<i64, ValidationError> {
    let text = text.trim();
    text.parse::<i64>()
        .map_err(|_| ValidationError::format("un número entero", text))
}

/// Parse an integer that must fall inside `valid` (both ends included)
pub fn parse_choice(text: &str, valid: RangeInclusive<i64>) -> Result<i64, ValidationError> {
    let value = parse_integer(text)?;
    if valid.contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::Range {
            value,
            min: *valid.start(),
            max: Some(*valid.end()),
        })
    }
}

/// Parse an integer no smaller than `minimum`
pub fn parse_positive_int(text: &str, minimum: i64) -> Result<i64, ValidationError> {
    let value = parse_integer(text)?;
    if value >= minimum {
        Ok(value)
    } else {
        Err(ValidationError::Range {
            value,
            min: minimum,
            max: None,
        })
    }
}

/// Trimmed, non-empty free text
pub fn parse_non_empty(text: &str, field: &'static str) -> Result<String, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        Err(ValidationError::Missing { field })
    } else {
        Ok(text.to_string())
    }
}

/// Pick a menu option by its 1-based number
pub fn parse_menu<C: Choice>(text: &str) -> Result<C, ValidationError> {
    let max = i64::try_from(C::ALL.len()).unwrap_or(i64::MAX);
    let number = parse_choice(text, 1..=max)?;
    usize::try_from(number)
        .ok()
        .and_then(C::from_number)
        .ok_or(ValidationError::Range {
            value: number,
            min: 1,
            max: Some(max),
        })
}

/// Pick a menu option by number or by key/label ("3", "plane", "avión")
pub fn parse_option<C: Choice>(text: &str) -> Result<C, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.bytes().all(|b| b.is_ascii_digit() || b == b'-') {
        return parse_menu(trimmed);
    }
    C::from_key(trimmed).ok_or_else(|| {
        let keys: Vec<&str> = C::ALL.iter().map(|c| c.key()).collect();
        ValidationError::format(format!("one of: {}", keys.join(", ")), trimmed)
    })
}

/// Parse a yes/no answer ("1"/"2", "si"/"no", "true"/"false")
pub fn parse_yes_no(text: &str) -> Result<bool, ValidationError> {
    match text.trim().to_lowercase().as_str() {
        "1" | "si" | "sí" | "s" | "yes" | "y" | "true" => Ok(true),
        "2" | "no" | "n" | "false" => Ok(false),
        other => Err(ValidationError::format("1 (Sí) o 2 (No)", other)),
    }
}

/// The return instant must be strictly after the arrival instant
pub fn check_ordering(
    start_date: NaiveDate,
    arrival_time: NaiveTime,
    end_date: NaiveDate,
    return_time: NaiveTime,
) -> Result<(), ValidationError> {
    let start = start_date.and_time(arrival_time);
    let end = end_date.and_time(return_time);
    if end <= start {
        return Err(ValidationError::Ordering { start, end });
    }
    Ok(())
}

/// Apply the cross-field checks and freeze the draft into a [`TripRequest`]
pub fn build_trip_request(draft: TripDraft) -> Result<TripRequest, ValidationError> {
    let destination = parse_non_empty(&draft.destination, "destination")?;
    if draft.party_size < 1 {
        return Err(ValidationError::Range {
            value: i64::from(draft.party_size),
            min: 1,
            max: None,
        });
    }

    check_ordering(
        draft.start_date,
        draft.arrival_time,
        draft.end_date,
        draft.return_time,
    )?;

    Ok(TripRequest {
        destination,
        transport_mode: draft.transport_mode,
        party_size: draft.party_size,
        start_date: draft.start_date,
        arrival_time: draft.arrival_time,
        end_date: draft.end_date,
        return_time: draft.return_time,
        budget_tier: draft.budget_tier,
        travel_mode: draft.travel_mode,
        children_under_12: draft.travel_mode == TravelMode::Family && draft.children_under_12,
        season: draft.season,
    })
}

/// One rejected form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
    #[serde(skip)]
    pub error: ValidationError,
}

impl FieldError {
    fn new(field: &'static str, error: ValidationError) -> Self {
        Self {
            field,
            message: error.to_string(),
            error,
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Raw form submission, every value as typed by the traveller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripForm {
    pub destination: String,
    pub transport: String,
    pub people: String,
    pub start_date: String,
    pub arrival_time: String,
    pub end_date: String,
    pub return_time: String,
    pub budget: String,
    pub mode: String,
    pub children_under_12: Option<String>,
    pub season: String,
}

impl TripForm {
    /// Validate every field, then the cross-field invariant. Either the whole
    /// form is accepted or every violation found is returned.
    pub fn validate(&self) -> Result<TripRequest, Vec<FieldError>> {
        let mut errors = Vec::new();

        let destination = collect(&mut errors, "destination", parse_non_empty(&self.destination, "destination"));
        let transport_mode = collect(&mut errors, "transport", parse_option::<TransportMode>(&self.transport));
        let party_size = collect(
            &mut errors,
            "people",
            parse_positive_int(&self.people, 1).and_then(|n| {
                u32::try_from(n).map_err(|_| ValidationError::Range {
                    value: n,
                    min: 1,
                    max: Some(i64::from(u32::MAX)),
                })
            }),
        );
        let start_date = collect(&mut errors, "start_date", parse_date(&self.start_date));
        let arrival_time = collect(&mut errors, "arrival_time", parse_time_of_day(&self.arrival_time));
        let end_date = collect(&mut errors, "end_date", parse_date(&self.end_date));
        let return_time = collect(&mut errors, "return_time", parse_time_of_day(&self.return_time));
        let budget_tier = collect(&mut errors, "budget", parse_option::<BudgetTier>(&self.budget));
        let travel_mode = collect(&mut errors, "mode", parse_option::<TravelMode>(&self.mode));
        let season = collect(&mut errors, "season", parse_option::<Season>(&self.season));

        let children_under_12 = match (travel_mode, self.children_under_12.as_deref()) {
            (Some(TravelMode::Family), Some(answer)) if !answer.trim().is_empty() => {
                collect(&mut errors, "children_under_12", parse_yes_no(answer)).unwrap_or(false)
            }
            (Some(TravelMode::Family), _) => {
                errors.push(FieldError::new(
                    "children_under_12",
                    ValidationError::Missing {
                        field: "children_under_12",
                    },
                ));
                false
            }
            _ => false,
        };

        let (
            Some(destination),
            Some(transport_mode),
            Some(party_size),
            Some(start_date),
            Some(arrival_time),
            Some(end_date),
            Some(return_time),
            Some(budget_tier),
            Some(travel_mode),
            Some(season),
        ) = (
            destination,
            transport_mode,
            party_size,
            start_date,
            arrival_time,
            end_date,
            return_time,
            budget_tier,
            travel_mode,
            season,
        )
        else {
            return Err(errors);
        };

        let draft = TripDraft {
            destination,
            transport_mode,
            party_size,
            start_date,
            arrival_time,
            end_date,
            return_time,
            budget_tier,
            travel_mode,
            children_under_12,
            season,
        };

        match build_trip_request(draft) {
            Ok(trip) if errors.is_empty() => Ok(trip),
            Ok(_) => Err(errors),
            Err(err) => {
                errors.push(FieldError::new("return_time", err));
                Err(errors)
            }
        }
    }
}

fn collect<T>(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    result: Result<T, ValidationError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            errors.push(FieldError::new(field, err));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn draft(start: &str, arrival: &str, end: &str, ret: &str) -> TripDraft {
        TripDraft {
            destination: "Mendoza".to_string(),
            transport_mode: TransportMode::Car,
            party_size: 2,
            start_date: parse_date(start).unwrap(),
            arrival_time: parse_time_of_day(arrival).unwrap(),
            end_date: parse_date(end).unwrap(),
            return_time: parse_time_of_day(ret).unwrap(),
            budget_tier: BudgetTier::Medium,
            travel_mode: TravelMode::Gastronomic,
            children_under_12: false,
            season: Season::Low,
        }
    }

    fn form() -> TripForm {
        TripForm {
            destination: "Bariloche".to_string(),
            transport: "3".to_string(),
            people: "2".to_string(),
            start_date: "15/09/2025".to_string(),
            arrival_time: "1045".to_string(),
            end_date: "21/09/2025".to_string(),
            return_time: "2200".to_string(),
            budget: "medium-high".to_string(),
            mode: "family".to_string(),
            children_under_12: Some("yes".to_string()),
            season: "high".to_string(),
        }
    }

    #[rstest]
    #[case("05/09/2025", 2025, 9, 5)]
    #[case("29/02/2024", 2024, 2, 29)]
    #[case(" 31/12/2025 ", 2025, 12, 31)]
    fn test_parse_date_valid(#[case] input: &str, #[case] y: i32, #[case] m: u32, #[case] d: u32) {
        assert_eq!(parse_date(input).unwrap(), NaiveDate::from_ymd_opt(y, m, d).unwrap());
    }

    #[rstest]
    #[case("31/04/2025")]
    #[case("29/02/2025")]
    #[case("2025-09-05")]
    #[case("5/9/2025")]
    #[case("05/13/2025")]
    #[case("")]
    fn test_parse_date_invalid(#[case] input: &str) {
        assert!(matches!(parse_date(input), Err(ValidationError::Format { .. })));
    }

    #[rstest]
    #[case("0000", 0, 0)]
    #[case("2359", 23, 59)]
    #[case("0830", 8, 30)]
    fn test_parse_time_valid(#[case] input: &str, #[case] h: u32, #[case] m: u32) {
        assert_eq!(parse_time_of_day(input).unwrap(), NaiveTime::from_hms_opt(h, m, 0).unwrap());
    }

    #[rstest]
    #[case("2500")]
    #[case("2400")]
    #[case("1260")]
    #[case("830")]
    #[case("08:30")]
    #[case("abcd")]
    #[case("+830")]
    fn test_parse_time_invalid(#[case] input: &str) {
        assert!(matches!(parse_time_of_day(input), Err(ValidationError::Format { .. })));
    }

    #[test]
    fn test_parse_choice_bounds() {
        assert_eq!(parse_choice("4", 1..=4).unwrap(), 4);
        assert_eq!(parse_choice("1", 1..=4).unwrap(), 1);
        assert_eq!(
            parse_choice("5", 1..=4),
            Err(ValidationError::Range {
                value: 5,
                min: 1,
                max: Some(4)
            })
        );
        assert!(matches!(parse_choice("tres", 1..=4), Err(ValidationError::Format { .. })));
    }

    #[test]
    fn test_parse_positive_int() {
        assert_eq!(parse_positive_int("1", 1).unwrap(), 1);
        assert_eq!(parse_positive_int(" 12 ", 1).unwrap(), 12);
        assert!(matches!(parse_positive_int("0", 1), Err(ValidationError::Range { .. })));
        assert!(matches!(parse_positive_int("-3", 1), Err(ValidationError::Range { .. })));
        assert!(matches!(parse_positive_int("2.5", 1), Err(ValidationError::Format { .. })));
    }

    #[test]
    fn test_parse_option_number_or_key() {
        assert_eq!(parse_option::<TransportMode>("3").unwrap(), TransportMode::Plane);
        assert_eq!(parse_option::<TransportMode>("avión").unwrap(), TransportMode::Plane);
        assert!(matches!(parse_option::<TransportMode>("9"), Err(ValidationError::Range { .. })));
        assert!(matches!(
            parse_option::<TransportMode>("boat"),
            Err(ValidationError::Format { .. })
        ));
    }

    #[test]
    fn test_build_rejects_identical_instants() {
        let err = build_trip_request(draft("10/10/2025", "0900", "10/10/2025", "0900")).unwrap_err();
        assert!(matches!(err, ValidationError::Ordering { .. }));
    }

    #[rstest]
    #[case::earlier_date("12/10/2025", "0900", "11/10/2025", "2300")]
    #[case::earlier_time("10/10/2025", "0900", "10/10/2025", "0859")]
    fn test_build_rejects_return_before_start(
        #[case] start: &str,
        #[case] arrival: &str,
        #[case] end: &str,
        #[case] ret: &str,
    ) {
        let err = build_trip_request(draft(start, arrival, end, ret)).unwrap_err();
        assert!(matches!(err, ValidationError::Ordering { .. }));
    }

    #[test]
    fn test_single_day_trip_is_legal() {
        let trip = build_trip_request(draft("10/10/2025", "0900", "10/10/2025", "0901")).unwrap();
        assert_eq!(trip.duration_days(), 1);
    }

    #[test]
    fn test_children_flag_ignored_outside_family_mode() {
        let mut d = draft("10/10/2025", "0900", "12/10/2025", "1800");
        d.children_under_12 = true;
        let trip = build_trip_request(d).unwrap();
        assert!(!trip.children_under_12());
        assert!(!trip.intake_params().ninos_menores_12);
    }

    #[test]
    fn test_form_accepts_valid_submission() {
        let trip = form().validate().unwrap();
        assert_eq!(trip.duration_days(), 7);
        assert_eq!(trip.transport_mode(), TransportMode::Plane);
        assert!(trip.children_under_12());
    }

    #[test]
    fn test_form_reports_every_violation() {
        let mut bad = form();
        bad.destination = "  ".to_string();
        bad.people = "0".to_string();
        bad.arrival_time = "2500".to_string();
        bad.budget = "7".to_string();

        let errors = bad.validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["destination", "people", "arrival_time", "budget"]);
    }

    #[test]
    fn test_form_reports_ordering_with_other_errors() {
        let mut bad = form();
        bad.end_date = "15/09/2025".to_string();
        bad.return_time = "1045".to_string();
        bad.children_under_12 = Some("maybe".to_string());

        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "children_under_12");
        assert!(matches!(errors[1].error, ValidationError::Ordering { .. }));
    }

    #[test]
    fn test_form_requires_children_answer_for_family_only() {
        let mut family = form();
        family.children_under_12 = None;
        let errors = family.validate().unwrap_err();
        assert_eq!(errors[0].field, "children_under_12");

        let mut relax = form();
        relax.mode = "relax".to_string();
        relax.children_under_12 = None;
        assert!(relax.validate().is_ok());
    }
}
