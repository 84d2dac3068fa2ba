//! Interactive trip intake
//!
//! Each field is asked until it parses; the date/time block is asked again
//! as a whole when the return is not after the arrival.

use std::io::{BufRead, Write};

use crate::error::ValidationError;
use crate::models::{
    BudgetTier, Choice, Season, TransportMode, TravelMode, TripDraft, TripRequest,
};
use crate::validation::{
    build_trip_request, check_ordering, parse_choice, parse_date, parse_menu, parse_non_empty,
    parse_positive_int, parse_time_of_day,
};
use crate::{EscapadasError, Result};

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    fn read_line(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(EscapadasError::general(
                "Input ended before the trip was complete",
            ));
        }
        Ok(line.trim().to_string())
    }

    /// Ask until `parse` accepts the answer
    pub fn ask<T, F>(&mut self, prompt: &str, parse: F) -> Result<T>
    where
        F: Fn(&str) -> std::result::Result<T, ValidationError>,
    {
        loop {
            let answer = self.read_line(prompt)?;
            match parse(&answer) {
                Ok(value) => return Ok(value),
                Err(e) => writeln!(self.output, "{}", e.hint())?,
            }
        }
    }

    /// Print a numbered menu and ask for an option number
    pub fn ask_menu<C: Choice>(&mut self, title: &str, prompt: &str) -> Result<C> {
        writeln!(self.output, "\n{title}")?;
        for (index, option) in C::ALL.iter().enumerate() {
            let label = capitalize(option.label());
            match option.description() {
                Some(description) => {
                    writeln!(self.output, "{}. {} → {}", index + 1, label, description)?
                }
                None => writeln!(self.output, "{}. {}", index + 1, label)?,
            }
        }
        self.ask(prompt, parse_menu::<C>)
    }

    fn ask_yes_no(&mut self, question: &str) -> Result<bool> {
        writeln!(self.output, "\n{question}")?;
        writeln!(self.output, "1. Sí")?;
        writeln!(self.output, "2. No")?;
        let answer = self.ask(&format!("{question}: "), |t| parse_choice(t, 1..=2))?;
        Ok(answer == 1)
    }

    /// Walk through every field and return the validated trip
    pub fn collect_trip(&mut self) -> Result<TripRequest> {
        writeln!(self.output, "👋 Bienvenido al Organizador de Escapadas IA")?;
        writeln!(
            self.output,
            "Por favor completá los siguientes datos usando SOLO números:\n"
        )?;

        let destination = self.ask("Destino del viaje (texto libre): ", |t| {
            parse_non_empty(t, "destination")
        })?;

        let transport_mode: TransportMode = self.ask_menu(
            "Seleccioná el medio de transporte:",
            "Seleccione Medio de Transporte: ",
        )?;

        let party_size = self.ask("\nCantidad de personas: ", |t| {
            let n = parse_positive_int(t, 1)?;
            u32::try_from(n).map_err(|_| ValidationError::Range {
                value: n,
                min: 1,
                max: Some(i64::from(u32::MAX)),
            })
        })?;

        let (start_date, arrival_time, end_date, return_time) = loop {
            let start_date = self.ask("\nFecha de inicio (ej: 05/09/2025): ", parse_date)?;
            let arrival_time = self.ask(
                "Hora de llegada (HHMM, ej: 1300 para las 13:00): ",
                parse_time_of_day,
            )?;
            let end_date = self.ask("\nFecha de regreso (ej: 07/09/2025): ", parse_date)?;
            let return_time = self.ask(
                "Hora de regreso (HHMM, ej: 0830 para las 8:30): ",
                parse_time_of_day,
            )?;

            match check_ordering(start_date, arrival_time, end_date, return_time) {
                Ok(()) => break (start_date, arrival_time, end_date, return_time),
                Err(e) => writeln!(self.output, "{}", e.hint())?,
            }
        };

        let budget_tier: BudgetTier = self.ask_menu(
            "Seleccioná el nivel de presupuesto:",
            "Seleccione el Nivel de Presupuesto: ",
        )?;
        let travel_mode: TravelMode =
            self.ask_menu("Seleccioná el modo de viaje:", "Seleccione el Modo de Viaje: ")?;

        let children_under_12 = if travel_mode == TravelMode::Family {
            self.ask_yes_no("¿Hay niños menores de 12 años en el grupo?")?
        } else {
            false
        };

        let season: Season = self.ask_menu(
            "¿En qué temporada vas a viajar?",
            "¿En qué temporada vas a viajar?: ",
        )?;

        let trip = build_trip_request(TripDraft {
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
        })?;

        writeln!(self.output, "\n{trip}")?;
        Ok(trip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(input: &str) -> (Result<TripRequest>, String) {
        let mut prompter = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let result = prompter.collect_trip();
        let (_, output) = prompter.into_inner();
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_happy_path() {
        let input = "Bariloche\n3\n2\n01/07/2025\n1300\n07/07/2025\n0830\n2\n2\n1\n";
        let (trip, output) = run(input);
        let trip = trip.unwrap();

        assert_eq!(trip.destination(), "Bariloche");
        assert_eq!(trip.transport_mode(), TransportMode::Plane);
        assert_eq!(trip.party_size(), 2);
        assert_eq!(trip.duration_days(), 7);
        assert_eq!(trip.travel_mode(), TravelMode::Relax);
        assert_eq!(trip.season(), Season::High);
        assert!(!trip.children_under_12());
        assert!(output.contains("3. Medio-alto → "));
        assert!(output.contains("Temporada: ALTA"));
    }

    #[test]
    fn test_bad_fields_are_asked_again() {
        let input = "\nSalta\n7\nx\n4\n0\n3\n31/02/2025\n05/09/2025\n2460\n0900\n06/09/2025\n1800\n1\n6\n9\n1\n2\n";
        let (trip, output) = run(input);
        let trip = trip.unwrap();

        assert_eq!(trip.destination(), "Salta");
        assert_eq!(trip.transport_mode(), TransportMode::Train);
        assert_eq!(trip.party_size(), 3);
        assert!(trip.children_under_12());
        assert_eq!(trip.season(), Season::Low);

        assert!(output.contains("⚠️ Ingresá un texto no vacío."));
        assert!(output.contains("⚠️ Opción inválida. Elegí un número en 1–4."));
        assert!(output.contains("⚠️ Ingresá un entero mayor o igual a 1."));
        assert!(output.contains("⚠️ Formato inválido. Se esperaba DD/MM/YYYY"));
        assert!(output.contains("⚠️ Formato inválido. Se esperaba HHMM"));
        assert!(output.contains("⚠️ Opción inválida. Elegí un número en 1–2."));
    }

    #[test]
    fn test_ordering_failure_repeats_date_block() {
        let input = "Mendoza\n1\n4\n05/09/2025\n1300\n05/09/2025\n1300\n05/09/2025\n1300\n05/09/2025\n1800\n1\n4\n2\n";
        let (trip, output) = run(input);
        let trip = trip.unwrap();

        assert_eq!(trip.duration_days(), 1);
        assert_eq!(output.matches("Fecha de inicio").count(), 2);
        assert!(output.contains("La fecha/hora de regreso debe ser posterior"));
    }

    #[test]
    fn test_closed_input_is_an_error() {
        let (trip, _) = run("Córdoba\n");
        assert!(matches!(trip, Err(EscapadasError::General { .. })));
    }
}
