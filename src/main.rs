//! escapadas CLI - plan a getaway from the terminal or serve the trip form API

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use escapadas::config::LoggingConfig;
use escapadas::extraction::{KeywordSet, UniqueLines, extract_key_points, extract_places};
use escapadas::intake::Prompter;
use escapadas::llm::{GeminiImageClient, OpenAiClient};
use escapadas::output::ArtifactWriter;
use escapadas::report::render_report;
use escapadas::{EscapadasConfig, FieldError, TripForm, TripPlanner, TripRequest, UsageLedger};

/// Organizador de Escapadas IA
#[derive(Parser, Debug)]
#[command(name = "escapadas", author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory for generated artifacts (overrides output.directory)
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect a trip and generate itinerary, audit, contacts and images
    ///
    /// Without trip flags the parameters are asked interactively.
    Plan(TripArgs),

    /// Validate trip flags without calling any model
    Validate(TripArgs),

    /// Run the place and key-point extractor over an itinerary file
    Extract {
        /// Itinerary text file
        file: PathBuf,

        /// Maximum number of key points to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Serve the trip form API
    Serve {
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
}

/// Trip parameters as flags; values take menu numbers or keys
#[derive(Args, Debug, Default)]
struct TripArgs {
    #[arg(long)]
    destination: Option<String>,
    /// car, bus, plane, train (or 1-4)
    #[arg(long)]
    transport: Option<String>,
    #[arg(long)]
    people: Option<String>,
    /// DD/MM/YYYY
    #[arg(long)]
    start: Option<String>,
    /// HHMM
    #[arg(long)]
    arrival: Option<String>,
    /// DD/MM/YYYY
    #[arg(long)]
    end: Option<String>,
    /// HHMM
    #[arg(long = "return-time")]
    return_time: Option<String>,
    /// low, medium, medium-high, high (or 1-4)
    #[arg(long)]
    budget: Option<String>,
    /// intense, relax, cultural, gastronomic, adventure, family (or 1-6)
    #[arg(long)]
    mode: Option<String>,
    /// Only asked for family trips: yes or no
    #[arg(long)]
    children: Option<String>,
    /// high or low (or 1-2)
    #[arg(long)]
    season: Option<String>,
}

impl TripArgs {
    fn is_empty(&self) -> bool {
        [
            &self.destination,
            &self.transport,
            &self.people,
            &self.start,
            &self.arrival,
            &self.end,
            &self.return_time,
            &self.budget,
            &self.mode,
            &self.children,
            &self.season,
        ]
        .iter()
        .all(|value| value.is_none())
    }

    fn into_form(self) -> TripForm {
        TripForm {
            destination: self.destination.unwrap_or_default(),
            transport: self.transport.unwrap_or_default(),
            people: self.people.unwrap_or_default(),
            start_date: self.start.unwrap_or_default(),
            arrival_time: self.arrival.unwrap_or_default(),
            end_date: self.end.unwrap_or_default(),
            return_time: self.return_time.unwrap_or_default(),
            budget: self.budget.unwrap_or_default(),
            mode: self.mode.unwrap_or_default(),
            children_under_12: self.children,
            season: self.season.unwrap_or_default(),
        }
    }
}

fn init_logging(config: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,escapadas={level}")));

    // stdout belongs to the interactive prompts and the report
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);

    if config.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn form_trip(form: &TripForm) -> Result<TripRequest> {
    form.validate().map_err(|errors: Vec<FieldError>| {
        for error in &errors {
            eprintln!("⚠️ {error}");
        }
        anyhow::anyhow!("{} invalid trip field(s)", errors.len())
    })
}

async fn plan(config: &EscapadasConfig, args: TripArgs) -> Result<()> {
    let trip = if args.is_empty() {
        let stdin = io::stdin();
        Prompter::new(stdin.lock(), io::stdout())
            .collect_trip()
            .context("Interactive intake failed")?
    } else {
        let trip = form_trip(&args.into_form())?;
        println!("{trip}");
        trip
    };

    let text = OpenAiClient::new(&config.text_model)?;
    let images = GeminiImageClient::optional(&config.image_model);
    let mut ledger = UsageLedger::new(config.pricing);

    info!(destination = trip.destination(), "Generating trip");
    let outcome = TripPlanner::new(text, images).plan(&trip, &mut ledger).await;
    let written = ArtifactWriter::new(&config.output).write_all(&outcome, &ledger);

    print!("{}", render_report(&outcome, &written, &ledger));
    Ok(())
}

fn validate(args: TripArgs) -> Result<()> {
    if args.is_empty() {
        bail!("No trip flags given, see `escapadas validate --help`");
    }
    let trip = form_trip(&args.into_form())?;
    println!("{trip}");
    println!("✅ Trip is valid ({} días)", trip.duration_days());
    Ok(())
}

fn extract(file: &Path, limit: Option<usize>) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read itinerary {}", file.display()))?;

    let places = KeywordSet::places();
    println!("=== Lugares y servicios detectados en el itinerario ===");
    for place in UniqueLines::new(extract_places(&text, &places)) {
        println!("- {place}");
    }

    let key_points = KeywordSet::key_points();
    println!("\n=== Puntos clave ===");
    for point in extract_key_points(&text, &key_points, limit) {
        println!("- {point}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = EscapadasConfig::load_from_path(cli.config.clone())
        .context("Failed to load configuration")?;
    if let Some(dir) = cli.output_dir {
        config.output.directory = dir;
    }

    init_logging(&config.logging, cli.verbose);
    debug!(?config.output, "Configuration loaded");

    match cli.command.unwrap_or(Command::Plan(TripArgs::default())) {
        Command::Plan(args) => plan(&config, args).await,
        Command::Validate(args) => validate(args),
        Command::Extract { file, limit } => extract(&file, limit),
        Command::Serve { port } => Ok(escapadas::web::run(config, port).await?),
    }
}
