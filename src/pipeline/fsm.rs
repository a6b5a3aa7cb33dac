use crate::{Error, Result};
use tracing::{debug, info, warn};

// Pipeline states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    MaybeStage1,
    Stage2,
    VerifyLoop,
    Done,
    Failed,
}

// Pipeline events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    InputAccepted,
    InputRejected,
    BackgroundResolved,
    ImageGenerated,
    GenerationExhausted,
    VerificationPassed,
    RepairRequested,
    RepairsExhausted,
}

/// Drives `Init → MaybeStage1 → Stage2 → VerifyLoop → Done | Failed` and
/// counts Stage 2 attempts so the repair loop stays bounded.
#[derive(Debug)]
pub struct PipelineStateMachine {
    state: PipelineState,
    attempts: u32,
    max_attempts: u32,
}

impl PipelineStateMachine {
    /// `max_repairs` regenerations are allowed after the first attempt.
    pub fn new(max_repairs: u32) -> Self {
        Self {
            state: PipelineState::Init,
            attempts: 0,
            max_attempts: max_repairs + 1,
        }
    }

    pub fn current_state(&self) -> PipelineState {
        self.state
    }

    /// Stage 2 attempts started so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn can_repair(&self) -> bool {
        self.attempts < self.max_attempts
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, PipelineState::Done | PipelineState::Failed)
    }

    pub fn transition(&mut self, event: PipelineEvent) -> Result<()> {
        let old_state = self.state;
        debug!("🔄 Pipeline processing event {:?} in state {:?}", event, old_state);

        let new_state = match (old_state, event) {
            (PipelineState::Init, PipelineEvent::InputAccepted) => PipelineState::MaybeStage1,
            (PipelineState::Init, PipelineEvent::InputRejected) => PipelineState::Failed,
            (PipelineState::MaybeStage1, PipelineEvent::BackgroundResolved) => {
                PipelineState::Stage2
            }
            (PipelineState::Stage2, PipelineEvent::ImageGenerated) => PipelineState::VerifyLoop,
            (PipelineState::Stage2, PipelineEvent::GenerationExhausted) => PipelineState::Failed,
            (PipelineState::VerifyLoop, PipelineEvent::VerificationPassed) => PipelineState::Done,
            (PipelineState::VerifyLoop, PipelineEvent::RepairRequested) if self.can_repair() => {
                PipelineState::Stage2
            }
            (PipelineState::VerifyLoop, PipelineEvent::RepairsExhausted) => PipelineState::Done,
            _ => {
                warn!(
                    "❌ Invalid pipeline transition from {:?} with event {:?}",
                    old_state, event
                );
                return Err(Error::pipeline(format!(
                    "Invalid transition from {:?} with event {:?}",
                    old_state, event
                )));
            }
        };

        if new_state == PipelineState::Stage2 {
            self.attempts += 1;
        }

        info!(
            "🎯 Pipeline state transition: {:?} -> {:?} (event: {:?})",
            old_state, new_state, event
        );

        self.state = new_state;
        Ok(())
    }
}
