use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use atelier_contracts::analysis::DesignVariant;
use atelier_contracts::catalog::{StyleCatalog, StyleDescriptor};
use atelier_contracts::dictation::{
    append_segment, Dictation, NoopDictation, DICTATION_LOCALE, DICTATION_UNSUPPORTED_NOTICE,
};
use atelier_contracts::events::EventWriter;
use atelier_contracts::media::SourceImage;
use atelier_contracts::modes::Mode;
use atelier_contracts::session::{reduce, GenerationState, SessionEvent, BATCH_FAILED_MESSAGE};
use serde_json::{json, Value};

use crate::client::GenerativeService;
use crate::error::{FailureKind, FlowError, GenerationError, PreconditionError};
use crate::export::export_variant;
use crate::fanout::{decide, gather, BatchDecision};

/// Land planning from text alone needs more than this many UTF-16 code
/// units of trimmed text, the length browsers report for the field.
const LAND_TEXT_MIN_UNITS: usize = 10;

pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Nothing was sent; state is unchanged.
    Skipped(PreconditionError),
    Committed { variants: usize },
    /// The batch was aborted. `message` is what the user sees; `causes`
    /// lists every failed call.
    Failed {
        message: String,
        causes: Vec<FlowError>,
    },
    /// The session moved on (mode switch or new upload) while the batch ran.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegenerateOutcome {
    Skipped(PreconditionError),
    Replaced,
    /// Logged only; the session state is left as it was.
    Failed(GenerationError),
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictationStatus {
    Listening,
    Stopped,
    Unsupported(&'static str),
}

struct Session {
    mode: Mode,
    source: Option<SourceImage>,
    free_text: String,
    state: GenerationState,
}

impl Session {
    fn apply(&mut self, event: SessionEvent) {
        self.state = reduce(std::mem::take(&mut self.state), event);
    }

    fn can_process(&self) -> bool {
        self.source.is_some()
            || (self.mode.accepts_text_only()
                && self.free_text.trim().encode_utf16().count() > LAND_TEXT_MIN_UNITS)
    }

    fn ticket(&self) -> Ticket {
        Ticket {
            generation: self.state.generation,
            batch: self.state.batch,
            mode: self.mode,
            source: self.source.clone(),
            free_text: self.free_text.clone(),
        }
    }
}

/// Inputs captured when a request is issued.
struct Ticket {
    generation: u64,
    batch: u64,
    mode: Mode,
    source: Option<SourceImage>,
    free_text: String,
}

impl Ticket {
    fn requirement(&self) -> Option<&str> {
        Some(self.free_text.as_str()).filter(|text| !text.trim().is_empty())
    }
}

/// Owns one session: its inputs, its [`GenerationState`], and the remote
/// calls that feed it. The session lock is never held across a remote call.
pub struct Orchestrator<S: GenerativeService> {
    service: S,
    catalog: StyleCatalog,
    events: EventWriter,
    max_concurrency: usize,
    session: Arc<Mutex<Session>>,
    dictation: Mutex<Box<dyn Dictation>>,
}

impl<S: GenerativeService> Orchestrator<S> {
    pub fn new(service: S, catalog: StyleCatalog, events: EventWriter) -> Self {
        let orchestrator = Self {
            service,
            catalog,
            events,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            session: Arc::new(Mutex::new(Session {
                mode: Mode::SketchToRender,
                source: None,
                free_text: String::new(),
                state: GenerationState::default(),
            })),
            dictation: Mutex::new(Box::new(NoopDictation)),
        };
        orchestrator.log(
            "session_started",
            json!({ "mode": Mode::SketchToRender.wire_name() }),
        );
        orchestrator
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_dictation(mut self, dictation: Box<dyn Dictation>) -> Self {
        self.dictation = Mutex::new(dictation);
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn catalog(&self) -> &StyleCatalog {
        &self.catalog
    }

    pub fn events(&self) -> &EventWriter {
        &self.events
    }

    pub fn state(&self) -> Result<GenerationState> {
        Ok(self.session()?.state.clone())
    }

    pub fn mode(&self) -> Result<Mode> {
        Ok(self.session()?.mode)
    }

    pub fn free_text(&self) -> Result<String> {
        Ok(self.session()?.free_text.clone())
    }

    pub fn has_source(&self) -> Result<bool> {
        Ok(self.session()?.source.is_some())
    }

    /// Whether the process action should be enabled.
    pub fn can_process(&self) -> Result<bool> {
        let session = self.session()?;
        Ok(!session.state.is_busy() && session.can_process())
    }

    /// Switches workflow and clears results, even while a batch runs.
    pub fn set_mode(&self, mode: Mode) -> Result<()> {
        let generation = {
            let mut session = self.session()?;
            session.mode = mode;
            session.apply(SessionEvent::Reset);
            session.state.generation
        };
        self.log(
            "mode_switched",
            json!({ "mode": mode.wire_name(), "generation": generation }),
        );
        Ok(())
    }

    /// Replaces (or clears) the source image and clears results.
    pub fn set_source_image(&self, source: Option<SourceImage>) -> Result<()> {
        let payload = json!({
            "has_image": source.is_some(),
            "mime_type": source.as_ref().map(|image| image.mime_type().to_string()),
            "bytes": source.as_ref().map(|image| image.bytes().len()).unwrap_or(0),
        });
        {
            let mut session = self.session()?;
            session.source = source;
            session.apply(SessionEvent::Reset);
        }
        self.log("source_replaced", payload);
        Ok(())
    }

    pub fn set_free_text(&self, text: impl Into<String>) -> Result<()> {
        self.session()?.free_text = text.into();
        Ok(())
    }

    pub fn append_dictation_segment(&self, segment: &str) -> Result<()> {
        let mut session = self.session()?;
        let next = append_segment(&session.free_text, segment);
        session.free_text = next;
        Ok(())
    }

    /// Runs analysis, then one generation per catalog entry of the active
    /// mode. Variants are committed only if every generation succeeded.
    pub fn process(&self) -> Result<ProcessOutcome> {
        let (ticket, styles) = {
            let mut session = self.session()?;
            if session.state.is_busy() {
                return Ok(ProcessOutcome::Skipped(PreconditionError::BatchInFlight));
            }
            if !session.can_process() {
                return Ok(ProcessOutcome::Skipped(PreconditionError::MissingInput));
            }
            let ticket = session.ticket();
            session.apply(SessionEvent::BatchStarted {
                generation: ticket.generation,
            });
            let styles = self.catalog.for_mode(ticket.mode).to_vec();
            (ticket, styles)
        };

        self.log(
            "analysis_started",
            json!({
                "generation": ticket.generation,
                "mode": ticket.mode.wire_name(),
                "has_image": ticket.source.is_some(),
            }),
        );
        let analysis =
            match self
                .service
                .analyze(ticket.source.as_ref(), ticket.mode, &ticket.free_text)
            {
                Ok(analysis) => analysis,
                Err(err) => {
                    self.log(
                        "analysis_failed",
                        json!({
                            "generation": ticket.generation,
                            "kind": err.kind.as_str(),
                            "error": err.message,
                        }),
                    );
                    return self.fail_batch(&ticket, vec![FlowError::Analysis(err)]);
                }
            };
        self.log(
            "analysis_finished",
            json!({
                "generation": ticket.generation,
                "architecture_style": analysis.architecture_style,
            }),
        );

        {
            let mut session = self.session()?;
            session.apply(SessionEvent::AnalysisSucceeded {
                generation: ticket.generation,
                analysis,
            });
            if !session.state.is_current(ticket.generation) {
                drop(session);
                self.log_stale(&ticket, "analysis");
                return Ok(ProcessOutcome::Discarded);
            }
        }

        self.log(
            "batch_started",
            json!({
                "generation": ticket.generation,
                "styles": styles.iter().map(|style| style.id.as_str()).collect::<Vec<&str>>(),
                "max_concurrency": self.max_concurrency,
            }),
        );
        let service = &self.service;
        let outcomes = gather(&styles, self.max_concurrency, |style| {
            service
                .generate_variant(
                    ticket.source.as_ref(),
                    ticket.mode,
                    style,
                    ticket.requirement(),
                )
                .map(|image_url| variant_from(style, image_url))
        });
        for (style, outcome) in styles.iter().zip(&outcomes) {
            match outcome {
                Some(Ok(_)) => self.log(
                    "variant_generated",
                    json!({ "generation": ticket.generation, "style_id": style.id }),
                ),
                Some(Err(err)) => self.log(
                    "variant_failed",
                    json!({
                        "generation": ticket.generation,
                        "style_id": style.id,
                        "kind": err.kind.as_str(),
                        "error": err.message,
                    }),
                ),
                None => self.log(
                    "variant_failed",
                    json!({
                        "generation": ticket.generation,
                        "style_id": style.id,
                        "kind": FailureKind::Aborted.as_str(),
                    }),
                ),
            }
        }

        match decide(outcomes, |idx| lost_worker(&styles[idx])) {
            BatchDecision::Commit(variants) => {
                let count = variants.len();
                let current = {
                    let mut session = self.session()?;
                    session.apply(SessionEvent::BatchCommitted {
                        generation: ticket.generation,
                        variants,
                    });
                    session.state.is_current(ticket.generation)
                };
                if !current {
                    self.log_stale(&ticket, "batch");
                    return Ok(ProcessOutcome::Discarded);
                }
                self.log(
                    "batch_committed",
                    json!({ "generation": ticket.generation, "variants": count }),
                );
                Ok(ProcessOutcome::Committed { variants: count })
            }
            BatchDecision::Abort {
                failures,
                discarded,
            } => {
                self.log(
                    "batch_failed",
                    json!({
                        "generation": ticket.generation,
                        "failed": failures
                            .iter()
                            .map(|(_, err)| err.style_id.as_str())
                            .collect::<Vec<&str>>(),
                        "discarded_successes": discarded,
                    }),
                );
                let causes = failures
                    .into_iter()
                    .map(|(_, err)| FlowError::Generation(err))
                    .collect();
                self.fail_batch(&ticket, causes)
            }
        }
    }

    /// Regenerates one committed variant. Failures are logged and leave the
    /// session untouched.
    pub fn regenerate(&self, variant_id: &str) -> Result<RegenerateOutcome> {
        let (ticket, style) = {
            let session = self.session()?;
            if session.state.is_busy() {
                return Ok(RegenerateOutcome::Skipped(
                    PreconditionError::BatchInFlight,
                ));
            }
            if !session.can_process() {
                return Ok(RegenerateOutcome::Skipped(PreconditionError::MissingInput));
            }
            let Some(style) = self.catalog.find(session.mode, variant_id).cloned() else {
                return Ok(RegenerateOutcome::Skipped(PreconditionError::UnknownStyle(
                    variant_id.to_string(),
                )));
            };
            if session.state.variant(variant_id).is_none() {
                return Ok(RegenerateOutcome::Skipped(PreconditionError::NoVariant(
                    variant_id.to_string(),
                )));
            }
            (session.ticket(), style)
        };

        self.log(
            "regeneration_started",
            json!({ "generation": ticket.generation, "style_id": style.id }),
        );
        match self.service.generate_variant(
            ticket.source.as_ref(),
            ticket.mode,
            &style,
            ticket.requirement(),
        ) {
            Ok(image_url) => {
                let accepted = {
                    let mut session = self.session()?;
                    let accepted = session
                        .state
                        .accepts_regeneration(ticket.generation, ticket.batch);
                    session.apply(SessionEvent::VariantRegenerated {
                        generation: ticket.generation,
                        batch: ticket.batch,
                        variant: variant_from(&style, image_url),
                    });
                    accepted
                };
                if !accepted {
                    self.log_stale(&ticket, "regeneration");
                    return Ok(RegenerateOutcome::Discarded);
                }
                self.log(
                    "regeneration_committed",
                    json!({ "generation": ticket.generation, "style_id": style.id }),
                );
                Ok(RegenerateOutcome::Replaced)
            }
            Err(err) => {
                self.log(
                    "regeneration_failed",
                    json!({
                        "generation": ticket.generation,
                        "style_id": style.id,
                        "kind": err.kind.as_str(),
                        "error": err.message,
                    }),
                );
                Ok(RegenerateOutcome::Failed(err))
            }
        }
    }

    /// Starts or stops dictation. Unsupported hosts get a notice, not an
    /// error.
    pub fn toggle_dictation(&self) -> Result<DictationStatus> {
        let mut dictation = self
            .dictation
            .lock()
            .map_err(|_| anyhow!("dictation lock poisoned"))?;
        if dictation.is_listening() {
            dictation.stop();
            self.log("dictation_stopped", json!({}));
            return Ok(DictationStatus::Stopped);
        }
        if !dictation.is_supported() {
            self.log(
                "dictation_unavailable",
                json!({ "notice": DICTATION_UNSUPPORTED_NOTICE }),
            );
            return Ok(DictationStatus::Unsupported(DICTATION_UNSUPPORTED_NOTICE));
        }

        let session = Arc::clone(&self.session);
        let started = dictation.start(Box::new(move |segment| {
            if let Ok(mut session) = session.lock() {
                let next = append_segment(&session.free_text, &segment);
                session.free_text = next;
            }
        }));
        match started {
            Ok(()) => {
                self.log("dictation_started", json!({ "locale": DICTATION_LOCALE }));
                if dictation.is_listening() {
                    Ok(DictationStatus::Listening)
                } else {
                    Ok(DictationStatus::Stopped)
                }
            }
            Err(err) => {
                self.log("dictation_failed", json!({ "error": format!("{err:#}") }));
                Ok(DictationStatus::Stopped)
            }
        }
    }

    /// Download action for one committed variant.
    pub fn export(&self, variant_id: &str, dir: &Path) -> Result<PathBuf> {
        let variant = self
            .session()?
            .state
            .variant(variant_id)
            .cloned()
            .ok_or_else(|| anyhow!("there is no generated variant '{variant_id}'"))?;
        let path = export_variant(&variant, dir)?;
        self.log(
            "variant_exported",
            json!({
                "style_id": variant.id,
                "path": path.to_string_lossy().to_string(),
            }),
        );
        Ok(path)
    }

    fn fail_batch(&self, ticket: &Ticket, causes: Vec<FlowError>) -> Result<ProcessOutcome> {
        let current = {
            let mut session = self.session()?;
            session.apply(SessionEvent::BatchFailed {
                generation: ticket.generation,
                message: BATCH_FAILED_MESSAGE.to_string(),
            });
            session.state.is_current(ticket.generation)
        };
        if !current {
            self.log_stale(ticket, "batch_failure");
            return Ok(ProcessOutcome::Discarded);
        }
        Ok(ProcessOutcome::Failed {
            message: BATCH_FAILED_MESSAGE.to_string(),
            causes,
        })
    }

    fn session(&self) -> Result<MutexGuard<'_, Session>> {
        self.session
            .lock()
            .map_err(|_| anyhow!("session lock poisoned"))
    }

    fn log_stale(&self, ticket: &Ticket, stage: &str) {
        self.log(
            "stale_result_discarded",
            json!({
                "generation": ticket.generation,
                "mode": ticket.mode.wire_name(),
                "stage": stage,
            }),
        );
    }

    /// A session keeps running when its log cannot be written.
    fn log(&self, event_type: &str, payload: Value) {
        let _ = self
            .events
            .emit(event_type, payload.as_object().cloned().unwrap_or_default());
    }
}

fn variant_from(style: &StyleDescriptor, image_url: String) -> DesignVariant {
    DesignVariant {
        id: style.id.clone(),
        style: style.name.clone(),
        image_url,
        description: style.display_description().to_string(),
    }
}

fn lost_worker(style: &StyleDescriptor) -> GenerationError {
    GenerationError {
        style_id: style.id.clone(),
        kind: FailureKind::Aborted,
        message: "generation worker stopped before settling".to_string(),
    }
}
