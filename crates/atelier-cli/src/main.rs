use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use atelier_contracts::analysis::AnalysisResult;
use atelier_contracts::catalog::StyleCatalog;
use atelier_contracts::dictation::{Dictation, SegmentSink};
use atelier_contracts::events::EventWriter;
use atelier_contracts::media::SourceImage;
use atelier_contracts::modes::Mode;
use atelier_engine::{
    DictationStatus, EngineConfig, FlowError, GeminiTransport, GenerativeClient,
    GenerativeService, Orchestrator, ProcessOutcome, RegenerateOutcome,
};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

#[derive(Debug, Parser)]
#[command(
    name = "atelier",
    version,
    about = "Architectural renders and floor plans from sketches, photos and descriptions"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Styles(StylesArgs),
    Run(RunArgs),
}

#[derive(Debug, Parser)]
struct StylesArgs {
    #[arg(long)]
    mode: Option<Mode>,
    #[arg(long)]
    catalog: Option<PathBuf>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Parser)]
struct RunArgs {
    #[arg(long, default_value = "sketch-to-render")]
    mode: Mode,
    #[arg(long)]
    image: Option<PathBuf>,
    #[arg(long)]
    text: Option<String>,
    /// Transcript replayed through dictation, one finalized segment per line.
    #[arg(long)]
    dictation_file: Option<PathBuf>,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[arg(long)]
    catalog: Option<PathBuf>,
    #[arg(long)]
    analysis_model: Option<String>,
    #[arg(long)]
    image_model: Option<String>,
    #[arg(long)]
    max_concurrency: Option<usize>,
    /// Style id to regenerate after the batch commits. Repeatable.
    #[arg(long = "regenerate")]
    regenerate: Vec<String>,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("atelier error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Styles(args) => run_styles(args),
        Command::Run(args) => run_session(args),
    }
}

fn load_catalog(path: Option<&Path>) -> Result<StyleCatalog> {
    match path {
        Some(path) => StyleCatalog::from_json_file(path),
        None => Ok(StyleCatalog::default()),
    }
}

fn run_styles(args: StylesArgs) -> Result<i32> {
    let catalog = load_catalog(args.catalog.as_deref())?;
    let modes: Vec<Mode> = match args.mode {
        Some(mode) => vec![mode],
        None => Mode::ALL.to_vec(),
    };
    if args.json {
        let mut listing = Map::new();
        for mode in &modes {
            listing.insert(
                mode.wire_name().to_string(),
                serde_json::to_value(catalog.for_mode(*mode))?,
            );
        }
        println!("{}", serde_json::to_string_pretty(&Value::Object(listing))?);
    } else {
        print!("{}", render_styles(&catalog, &modes));
    }
    Ok(0)
}

fn render_styles(catalog: &StyleCatalog, modes: &[Mode]) -> String {
    let mut out = String::new();
    for mode in modes {
        out.push_str(&format!("{} ({})\n", mode.title(), mode.cli_name()));
        for style in catalog.for_mode(*mode) {
            out.push_str(&format!(
                "  {:<16} {:<28} {}\n",
                style.id,
                style.name,
                style.display_description()
            ));
        }
    }
    out
}

fn run_session(args: RunArgs) -> Result<i32> {
    let mut config = EngineConfig::from_env();
    if let Some(model) = args.analysis_model.clone() {
        config.analysis_model = model;
    }
    if let Some(model) = args.image_model.clone() {
        config.image_model = model;
    }
    if let Some(limit) = args.max_concurrency {
        config.max_concurrency = limit.clamp(1, 16);
    }

    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    let events_path = args
        .events
        .clone()
        .unwrap_or_else(|| args.out.join("events.jsonl"));
    let events = EventWriter::new(events_path, EventWriter::new_session_id());
    let catalog = load_catalog(args.catalog.as_deref())?;
    let transport = GeminiTransport::new(&config)?.with_events(events.clone());
    let client = GenerativeClient::gemini(&config, transport);

    let mut orchestrator =
        Orchestrator::new(client, catalog, events).with_max_concurrency(config.max_concurrency);
    if let Some(path) = args.dictation_file.as_deref() {
        orchestrator = orchestrator.with_dictation(Box::new(TranscriptDictation::from_path(path)?));
    }

    orchestrator.set_mode(args.mode)?;
    if let Some(path) = args.image.as_deref() {
        orchestrator.set_source_image(Some(SourceImage::from_path(path)?))?;
    }
    if let Some(text) = args.text.as_deref() {
        orchestrator.set_free_text(text)?;
    }
    if args.dictation_file.is_some() {
        dictate(&orchestrator)?;
    }

    let count = match orchestrator.process()? {
        ProcessOutcome::Committed { variants } => variants,
        ProcessOutcome::Skipped(reason) => bail!("{reason}"),
        ProcessOutcome::Failed { message, causes } => {
            eprintln!("{message}");
            for cause in &causes {
                eprintln!("  - {cause}");
            }
            if let Some(hint) = retry_hint(&causes) {
                eprintln!("{hint}");
            }
            return Ok(1);
        }
        ProcessOutcome::Discarded => {
            eprintln!("Batch result was discarded because the session changed.");
            return Ok(1);
        }
    };

    let state = orchestrator.state()?;
    if let Some(analysis) = state.analysis.as_ref() {
        print!("{}", render_analysis(analysis));
    }
    println!("{count} phương án:");
    for variant in &state.variants {
        let path = orchestrator.export(&variant.id, &args.out)?;
        println!("  {:<16} {:<28} {}", variant.id, variant.style, path.display());
    }

    for id in &args.regenerate {
        match orchestrator.regenerate(id)? {
            RegenerateOutcome::Replaced => {
                let path = orchestrator.export(id, &args.out)?;
                println!("Regenerated {id}: {}", path.display());
            }
            RegenerateOutcome::Failed(err) => eprintln!("Regeneration of {id} failed: {err}"),
            RegenerateOutcome::Skipped(reason) => eprintln!("Skipped regeneration of {id}: {reason}"),
            RegenerateOutcome::Discarded => {
                eprintln!("Regeneration of {id} was discarded because the session changed.")
            }
        }
    }
    Ok(0)
}

/// Suggests retrying when every failed call was a transient failure.
fn retry_hint(causes: &[FlowError]) -> Option<&'static str> {
    let transient = !causes.is_empty() && causes.iter().all(|cause| cause.kind().is_transient());
    transient.then_some("Lỗi kết nối tạm thời. Hãy chạy lại lệnh sau ít phút.")
}

fn dictate<S: GenerativeService>(orchestrator: &Orchestrator<S>) -> Result<()> {
    match orchestrator.toggle_dictation()? {
        DictationStatus::Unsupported(notice) => eprintln!("{notice}"),
        DictationStatus::Listening => {
            orchestrator.toggle_dictation()?;
        }
        DictationStatus::Stopped => {}
    }
    Ok(())
}

fn render_analysis(analysis: &AnalysisResult) -> String {
    format!(
        "Phong cách kiến trúc: {}\nGhi chú cấu trúc: {}\nĐề xuất: {}\n",
        analysis.architecture_style, analysis.structure_notes, analysis.recommendations
    )
}

/// Replays a recorded transcript as finalized dictation segments.
struct TranscriptDictation {
    segments: Vec<String>,
    listening: bool,
}

impl TranscriptDictation {
    fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed reading transcript {}", path.display()))?;
        Ok(Self::from_transcript(&raw))
    }

    fn from_transcript(raw: &str) -> Self {
        Self {
            segments: raw
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            listening: false,
        }
    }
}

impl Dictation for TranscriptDictation {
    fn is_supported(&self) -> bool {
        true
    }

    fn is_listening(&self) -> bool {
        self.listening
    }

    fn start(&mut self, mut on_segment: SegmentSink) -> Result<()> {
        self.listening = true;
        for segment in self.segments.drain(..) {
            on_segment(segment);
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.listening = false;
    }
}
