//! Sequential planning chain
//!
//! intake → itinerary → audit → contacts → map image → flyer image.
//! Once a [`TripRequest`] exists nothing here is fatal: a failing stage
//! leaves an empty result plus a [`StageWarning`] and the chain moves on.

use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fmt::Display;
use tracing::{info, instrument, warn};

use crate::Result;
use crate::accounting::UsageLedger;
use crate::extraction::{KeywordSet, UniqueLines, extract_key_points, extract_places};
use crate::llm::{ChatMessage, ImageGenerator, ImageOutcome, Parsed, TextGenerator, parse_or_default};
use crate::models::{AuditReport, Choice, ContactList, TripRequest};
use crate::prompts::{self, TextPrompt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Intake,
    Itinerary,
    Audit,
    Contacts,
    MapImage,
    FlyerImage,
    Output,
}

impl Stage {
    /// Label used in the cost report
    pub fn ledger_label(self) -> &'static str {
        match self {
            Self::Intake => "Prompt A - Intake",
            Self::Itinerary => "Prompt A - Itinerario",
            Self::Audit => "Prompt QA - Auditoría",
            Self::Contacts => "Prompt C - Contactos",
            Self::MapImage => "Imagen Mapa",
            Self::FlyerImage => "Imagen Flyer",
            Self::Output => "Archivos",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Intake => "intake",
            Self::Itinerary => "itinerary",
            Self::Audit => "audit",
            Self::Contacts => "contacts",
            Self::MapImage => "map image",
            Self::FlyerImage => "flyer image",
            Self::Output => "output",
        })
    }
}

/// A stage that degraded instead of failing the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageWarning {
    pub stage: Stage,
    pub message: String,
}

impl StageWarning {
    pub fn new<S: Into<String>>(stage: Stage, message: S) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

impl Display for StageWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.stage, self.message)
    }
}

/// Image stage result, keyed by the artifact name ("Mapa", "Flyer")
#[derive(Debug, Clone, PartialEq)]
pub struct ImageArtifact {
    pub name: &'static str,
    pub stage: Stage,
    pub outcome: ImageOutcome,
}

/// Everything one run produced
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    /// Intake JSON actually sent to the itinerary stage
    pub intake: Value,
    /// `None` when the itinerary stage failed
    pub itinerary: Option<String>,
    pub audit: AuditReport,
    /// Detected places in itinerary order, repeats kept
    pub places: Vec<String>,
    pub key_points: Vec<String>,
    pub contacts: ContactList,
    pub images: Vec<ImageArtifact>,
    pub warnings: Vec<StageWarning>,
}

/// Runs the stages against a text and an image collaborator
pub struct TripPlanner<T, I> {
    text: T,
    images: I,
    places: KeywordSet,
    key_points: KeywordSet,
}

impl<T: TextGenerator, I: ImageGenerator> TripPlanner<T, I> {
    pub fn new(text: T, images: I) -> Self {
        Self {
            text,
            images,
            places: KeywordSet::places(),
            key_points: KeywordSet::key_points(),
        }
    }

    async fn run_text(
        &self,
        stage: Stage,
        prompt: TextPrompt,
        ledger: &mut UsageLedger,
    ) -> Result<String> {
        info!(stage = %stage, collaborator = self.text.name(), "Running text stage");
        let messages = [
            ChatMessage::system(prompt.system),
            ChatMessage::user(prompt.user),
        ];
        let completion = self.text.complete(&messages, prompt.temperature).await?;
        if let Some(usage) = completion.usage {
            ledger.record_text(stage.ledger_label(), usage);
        }
        Ok(completion.content)
    }

    /// Text stage whose answer must be JSON; any failure yields `T::default()`
    async fn run_json<D>(
        &self,
        stage: Stage,
        prompt: TextPrompt,
        ledger: &mut UsageLedger,
        warnings: &mut Vec<StageWarning>,
    ) -> Option<D>
    where
        D: serde::de::DeserializeOwned + Default,
    {
        match self.run_text(stage, prompt, ledger).await {
            Ok(text) => match parse_or_default::<D>(&text) {
                Parsed::Value(value) => Some(value),
                Parsed::Fallback { reason, .. } => {
                    warnings.push(StageWarning::new(stage, reason));
                    None
                }
            },
            Err(e) => {
                warn!(stage = %stage, error = %e, "Stage failed");
                warnings.push(StageWarning::new(stage, e.to_string()));
                None
            }
        }
    }

    async fn run_image(
        &self,
        name: &'static str,
        stage: Stage,
        prompt: &str,
        ledger: &mut UsageLedger,
        warnings: &mut Vec<StageWarning>,
    ) -> ImageArtifact {
        info!(stage = %stage, collaborator = self.images.name(), "Generating {}", name);
        let outcome = match self.images.generate_image(prompt).await {
            Ok(outcome @ ImageOutcome::Image { .. }) => {
                ledger.record_image(stage.ledger_label());
                outcome
            }
            Ok(ImageOutcome::NoImage { diagnostic }) => {
                warnings.push(StageWarning::new(
                    stage,
                    format!("no image returned ({diagnostic})"),
                ));
                ImageOutcome::NoImage { diagnostic }
            }
            Err(e) => {
                warn!(stage = %stage, error = %e, "Image stage failed");
                warnings.push(StageWarning::new(stage, e.to_string()));
                ImageOutcome::NoImage {
                    diagnostic: e.to_string(),
                }
            }
        };
        ImageArtifact {
            name,
            stage,
            outcome,
        }
    }

    #[instrument(skip_all, fields(destination = %trip.destination(), days = trip.duration_days()))]
    pub async fn plan(&self, trip: &TripRequest, ledger: &mut UsageLedger) -> PlanOutcome {
        let mut warnings = Vec::new();
        let local_intake = json!({ "param": trip.intake_params() });

        let intake = match self
            .run_json::<Map<String, Value>>(
                Stage::Intake,
                prompts::intake_prompt(&trip.intake_params()),
                ledger,
                &mut warnings,
            )
            .await
        {
            Some(map) if !map.is_empty() => Value::Object(map),
            Some(_) => {
                warnings.push(StageWarning::new(
                    Stage::Intake,
                    "empty JSON object, using local parameters",
                ));
                local_intake
            }
            None => local_intake,
        };

        let itinerary = match self
            .run_text(
                Stage::Itinerary,
                prompts::itinerary_prompt(&prompts::pretty_json(&intake), trip.duration_days()),
                ledger,
            )
            .await
        {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, "Itinerary stage failed");
                warnings.push(StageWarning::new(Stage::Itinerary, e.to_string()));
                None
            }
        };

        let mut audit = AuditReport::default();
        let mut places = Vec::new();
        let mut key_points = Vec::new();
        let mut contacts = ContactList::default();

        match itinerary.as_deref() {
            Some(text) => {
                audit = self
                    .run_json::<AuditReport>(
                        Stage::Audit,
                        prompts::audit_prompt(text),
                        ledger,
                        &mut warnings,
                    )
                    .await
                    .unwrap_or_default();

                places = extract_places(text, &self.places)
                    .map(str::to_string)
                    .collect();
                key_points = extract_key_points(text, &self.key_points, None)
                    .map(str::to_string)
                    .collect();

                let unique: Vec<&str> =
                    UniqueLines::new(places.iter().map(String::as_str)).collect();
                if unique.is_empty() {
                    info!("No places detected, skipping contacts");
                } else {
                    contacts = self
                        .run_json::<ContactList>(
                            Stage::Contacts,
                            prompts::contacts_prompt(&unique),
                            ledger,
                            &mut warnings,
                        )
                        .await
                        .unwrap_or_default();
                }
            }
            None => {
                for stage in [Stage::Audit, Stage::Contacts] {
                    warnings.push(StageWarning::new(stage, "skipped: no itinerary"));
                }
            }
        }

        let point_refs: Vec<&str> = key_points.iter().map(String::as_str).collect();
        let map_prompt = prompts::map_image_prompt(trip.destination(), &point_refs);
        let flyer_prompt =
            prompts::flyer_image_prompt(trip.destination(), trip.travel_mode().label());

        let map = self
            .run_image("Mapa", Stage::MapImage, &map_prompt, ledger, &mut warnings)
            .await;
        let flyer = self
            .run_image("Flyer", Stage::FlyerImage, &flyer_prompt, ledger, &mut warnings)
            .await;

        info!(
            warnings = warnings.len(),
            places = places.len(),
            contacts = contacts.len(),
            "Planning finished"
        );

        PlanOutcome {
            intake,
            itinerary,
            audit,
            places,
            key_points,
            contacts,
            images: vec![map, flyer],
            warnings,
        }
    }
}
