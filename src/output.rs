//! Artifact files written after a planning run

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::Result;
use crate::accounting::{COST_REPORT_FILE, UsageLedger};
use crate::config::OutputConfig;
use crate::llm::ImageOutcome;
use crate::pipeline::{ImageArtifact, PlanOutcome, Stage, StageWarning};
use crate::prompts::pretty_json;

pub const ITINERARY_FILE: &str = "itinerario_final.txt";
pub const PLACES_FILE: &str = "lugares.json";
pub const CONTACTS_FILE: &str = "contactos.json";

/// Where an image ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageStatus {
    Saved { path: PathBuf },
    Missing { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageReport {
    pub name: &'static str,
    #[serde(flatten)]
    pub status: ImageStatus,
}

/// Files written plus any write failures
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WrittenArtifacts {
    pub files: Vec<PathBuf>,
    pub images: Vec<ImageReport>,
    pub warnings: Vec<StageWarning>,
}

pub struct ArtifactWriter {
    directory: PathBuf,
    image_prefix: String,
}

impl ArtifactWriter {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            directory: config.directory.clone(),
            image_prefix: config.image_prefix.clone(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// `{prefix}_{name}.{ext}` inside the output directory
    pub fn image_path(&self, name: &str, mime_type: &str) -> PathBuf {
        let extension = match mime_type {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            _ => "png",
        };
        self.directory
            .join(format!("{}_{}.{}", self.image_prefix, name, extension))
    }

    fn write_file(&self, name: &str, contents: &[u8], written: &mut WrittenArtifacts) {
        let path = self.directory.join(name);
        match fs::write(&path, contents) {
            Ok(()) => {
                info!(path = %path.display(), "Artifact written");
                written.files.push(path);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to write artifact");
                written.warnings.push(StageWarning::new(
                    Stage::Output,
                    format!("could not write {}: {e}", path.display()),
                ));
            }
        }
    }

    fn write_image(&self, image: &ImageArtifact, written: &mut WrittenArtifacts) -> ImageReport {
        let status = match &image.outcome {
            ImageOutcome::Image { bytes, mime_type } => {
                let path = self.image_path(image.name, mime_type);
                match fs::write(&path, bytes) {
                    Ok(()) => {
                        info!(path = %path.display(), "Image saved");
                        written.files.push(path.clone());
                        ImageStatus::Saved { path }
                    }
                    Err(e) => {
                        let reason = format!("could not write {}: {e}", path.display());
                        written
                            .warnings
                            .push(StageWarning::new(Stage::Output, reason.clone()));
                        ImageStatus::Missing { reason }
                    }
                }
            }
            ImageOutcome::NoImage { diagnostic } => ImageStatus::Missing {
                reason: diagnostic.clone(),
            },
        };
        ImageReport {
            name: image.name,
            status,
        }
    }

    /// Write every artifact the outcome has. Failures are collected as
    /// warnings, never returned as errors.
    pub fn write_all(&self, outcome: &PlanOutcome, ledger: &UsageLedger) -> WrittenArtifacts {
        let mut written = WrittenArtifacts::default();

        if let Err(e) = self.ensure_directory() {
            written.warnings.push(StageWarning::new(Stage::Output, e.to_string()));
        }

        if let Some(itinerary) = &outcome.itinerary {
            self.write_file(ITINERARY_FILE, itinerary.as_bytes(), &mut written);
        }
        self.write_file(
            PLACES_FILE,
            pretty_json(&outcome.places).as_bytes(),
            &mut written,
        );
        self.write_file(
            CONTACTS_FILE,
            pretty_json(&outcome.contacts).as_bytes(),
            &mut written,
        );

        let images = outcome
            .images
            .iter()
            .map(|image| self.write_image(image, &mut written))
            .collect();
        written.images = images;

        let report_path = self.directory.join(COST_REPORT_FILE);
        match ledger.write_report(&report_path) {
            Ok(()) => written.files.push(report_path),
            Err(e) => written.warnings.push(StageWarning::new(
                Stage::Output,
                format!("could not write {}: {e}", report_path.display()),
            )),
        }

        written
    }

    fn ensure_directory(&self) -> Result<()> {
        fs::create_dir_all(&self.directory)?;
        Ok(())
    }
}
