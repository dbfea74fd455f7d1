use crate::analysis::{AnalysisResult, DesignVariant};

use super::state::GenerationState;

/// Inputs to the session state machine. Every event that carries results is
/// tagged with the generation it was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Mode switch or new source upload.
    Reset,
    BatchStarted {
        generation: u64,
    },
    AnalysisSucceeded {
        generation: u64,
        analysis: AnalysisResult,
    },
    BatchCommitted {
        generation: u64,
        variants: Vec<DesignVariant>,
    },
    BatchFailed {
        generation: u64,
        message: String,
    },
    /// `batch` is the batch the regenerated variant was issued against.
    VariantRegenerated {
        generation: u64,
        batch: u64,
        variant: DesignVariant,
    },
}

/// Pure transition function `(state, event) -> state`.
pub fn reduce(mut state: GenerationState, event: SessionEvent) -> GenerationState {
    match event {
        SessionEvent::Reset => {
            state.generation += 1;
            state.analysis = None;
            state.variants.clear();
            state.error = None;
        }
        SessionEvent::BatchStarted { generation } => {
            if state.is_busy() || !state.is_current(generation) {
                return state;
            }
            state.is_analyzing = true;
            state.is_generating = false;
            state.error = None;
            state.in_flight = Some(generation);
            state.batch += 1;
        }
        SessionEvent::AnalysisSucceeded {
            generation,
            analysis,
        } => {
            if state.in_flight != Some(generation) {
                return state;
            }
            if state.is_current(generation) {
                state.analysis = Some(analysis);
                state.is_analyzing = false;
                state.is_generating = true;
            } else {
                // Abandoned batch: stop before the fan-out.
                finish_batch(&mut state);
            }
        }
        SessionEvent::BatchCommitted {
            generation,
            variants,
        } => {
            if state.in_flight != Some(generation) {
                return state;
            }
            finish_batch(&mut state);
            if state.is_current(generation) {
                state.variants = variants;
            }
        }
        SessionEvent::BatchFailed {
            generation,
            message,
        } => {
            if state.in_flight != Some(generation) {
                return state;
            }
            finish_batch(&mut state);
            if state.is_current(generation) {
                state.error = Some(message);
            }
        }
        SessionEvent::VariantRegenerated {
            generation,
            batch,
            variant,
        } => {
            if !state.accepts_regeneration(generation, batch) {
                return state;
            }
            if let Some(slot) = state
                .variants
                .iter_mut()
                .find(|existing| existing.id == variant.id)
            {
                slot.image_url = variant.image_url;
            }
        }
    }
    state
}

fn finish_batch(state: &mut GenerationState) {
    state.is_analyzing = false;
    state.is_generating = false;
    state.in_flight = None;
}

#[cfg(test)]
mod tests {
    use super::{reduce, SessionEvent};
    use crate::analysis::{AnalysisResult, DesignVariant};
    use crate::session::{GenerationState, Phase};

    fn analysis() -> AnalysisResult {
        AnalysisResult {
            architecture_style: "Modern".to_string(),
            structure_notes: "Two stacked volumes".to_string(),
            recommendations: "Deep overhangs".to_string(),
        }
    }

    fn variant(id: &str, image: &str) -> DesignVariant {
        DesignVariant {
            id: id.to_string(),
            style: id.to_uppercase(),
            image_url: image.to_string(),
            description: format!("{id} description"),
        }
    }

    fn committed(generation: u64, ids: &[&str]) -> GenerationState {
        let mut state = GenerationState {
            generation,
            ..GenerationState::default()
        };
        state = reduce(state, SessionEvent::BatchStarted { generation });
        state = reduce(
            state,
            SessionEvent::AnalysisSucceeded {
                generation,
                analysis: analysis(),
            },
        );
        reduce(
            state,
            SessionEvent::BatchCommitted {
                generation,
                variants: ids.iter().map(|id| variant(id, "data:old")).collect(),
            },
        )
    }

    #[test]
    fn batch_walks_through_every_phase() {
        let mut state = GenerationState::default();
        assert_eq!(state.phase(), Phase::Idle);

        state = reduce(state, SessionEvent::BatchStarted { generation: 0 });
        assert_eq!(state.phase(), Phase::Analyzing);
        assert!(state.is_busy());

        state = reduce(
            state,
            SessionEvent::AnalysisSucceeded {
                generation: 0,
                analysis: analysis(),
            },
        );
        assert_eq!(state.phase(), Phase::Generating);
        assert_eq!(state.analysis, Some(analysis()));

        state = reduce(
            state,
            SessionEvent::BatchCommitted {
                generation: 0,
                variants: vec![variant("a", "data:a")],
            },
        );
        assert_eq!(state.phase(), Phase::Done);
        assert!(!state.is_busy());
    }

    #[test]
    fn failure_clears_both_busy_flags() {
        let mut state = reduce(
            GenerationState::default(),
            SessionEvent::BatchStarted { generation: 0 },
        );
        state = reduce(
            state,
            SessionEvent::BatchFailed {
                generation: 0,
                message: "boom".to_string(),
            },
        );
        assert_eq!(state.phase(), Phase::Failed);
        assert!(!state.is_analyzing);
        assert!(!state.is_generating);
        assert!(state.variants.is_empty());
        assert_eq!(state.error.as_deref(), Some("boom"));
    }

    #[test]
    fn second_batch_is_refused_while_one_runs() {
        let state = reduce(
            GenerationState::default(),
            SessionEvent::BatchStarted { generation: 0 },
        );
        let again = reduce(state.clone(), SessionEvent::BatchStarted { generation: 0 });
        assert_eq!(again, state);
    }

    #[test]
    fn reset_clears_results_and_bumps_generation() {
        let mut state = committed(0, &["a", "b"]);
        state.error = Some("old".to_string());
        let state = reduce(state, SessionEvent::Reset);
        assert_eq!(state.generation, 1);
        assert!(state.variants.is_empty());
        assert!(state.analysis.is_none());
        assert!(state.error.is_none());
    }

    #[test]
    fn stale_batch_result_is_dropped_after_reset() {
        let mut state = reduce(
            GenerationState::default(),
            SessionEvent::BatchStarted { generation: 0 },
        );
        state = reduce(
            state,
            SessionEvent::AnalysisSucceeded {
                generation: 0,
                analysis: analysis(),
            },
        );
        state = reduce(state, SessionEvent::Reset);
        assert!(state.is_busy());

        state = reduce(
            state,
            SessionEvent::BatchCommitted {
                generation: 0,
                variants: vec![variant("a", "data:stale")],
            },
        );
        assert!(state.variants.is_empty());
        assert!(state.analysis.is_none());
        assert!(!state.is_busy());
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn stale_analysis_ends_the_abandoned_batch() {
        let mut state = reduce(
            GenerationState::default(),
            SessionEvent::BatchStarted { generation: 0 },
        );
        state = reduce(state, SessionEvent::Reset);
        state = reduce(
            state,
            SessionEvent::AnalysisSucceeded {
                generation: 0,
                analysis: analysis(),
            },
        );
        assert!(state.analysis.is_none());
        assert!(!state.is_busy());
    }

    #[test]
    fn regeneration_replaces_only_the_matching_image() {
        let state = committed(0, &["a", "b", "c"]);
        let before = state.variants.clone();
        let batch = state.batch;
        let state = reduce(
            state,
            SessionEvent::VariantRegenerated {
                generation: 0,
                batch,
                variant: variant("b", "data:new"),
            },
        );
        assert_eq!(state.variants[0], before[0]);
        assert_eq!(state.variants[2], before[2]);
        assert_eq!(state.variants[1].image_url, "data:new");
        assert_eq!(state.variants[1].description, before[1].description);
    }

    #[test]
    fn regeneration_from_older_generation_is_ignored() {
        let state = committed(0, &["a"]);
        let state = reduce(state, SessionEvent::Reset);
        let state = committed(state.generation, &["a"]);
        let after = reduce(
            state.clone(),
            SessionEvent::VariantRegenerated {
                generation: 0,
                batch: state.batch,
                variant: variant("a", "data:stale"),
            },
        );
        assert_eq!(after, state);
    }

    #[test]
    fn regeneration_issued_before_a_newer_batch_is_ignored() {
        let state = committed(0, &["a", "b"]);
        let issued_against = state.batch;
        let state = reduce(state, SessionEvent::BatchStarted { generation: 0 });
        let state = reduce(
            state,
            SessionEvent::AnalysisSucceeded {
                generation: 0,
                analysis: analysis(),
            },
        );
        let state = reduce(
            state,
            SessionEvent::BatchCommitted {
                generation: 0,
                variants: vec![variant("a", "data:fresh"), variant("b", "data:fresh")],
            },
        );
        assert_ne!(state.batch, issued_against);

        let after = reduce(
            state.clone(),
            SessionEvent::VariantRegenerated {
                generation: 0,
                batch: issued_against,
                variant: variant("a", "data:late"),
            },
        );
        assert_eq!(after, state);
    }
}
