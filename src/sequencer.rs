use std::fmt;

use tracing::{debug, info, warn};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Step {
    #[default]
    Sugar,
    SugarResponse,
    Moon,
    MoonResponse,
    Name,
    Gift,
    Opened,
}

impl Step {
    #[cfg(test)]
    pub const ALL: [Step; 7] = [
        Step::Sugar,
        Step::SugarResponse,
        Step::Moon,
        Step::MoonResponse,
        Step::Name,
        Step::Gift,
        Step::Opened,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Step::Sugar => "sugar",
            Step::SugarResponse => "sugar-response",
            Step::Moon => "moon",
            Step::MoonResponse => "moon-response",
            Step::Name => "name",
            Step::Gift => "gift",
            Step::Opened => "opened",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discrete user action. `Yes` and `No` are deliberately interchangeable:
/// the card never branches on the answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Yes,
    No,
    Continue,
    /// The name field's full new value after a keystroke.
    EditDraft(String),
    /// Enter in the name field, or the send button.
    Submit,
    OpenGift,
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    DraftEdited,
    Advanced { from: Step, to: Step },
}

/// The single state record. It only changes through [`CardState::apply`],
/// which walks sugar, sugar-response, moon, moon-response, name, gift and
/// opened, then restarts from sugar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardState {
    step: Step,
    draft: String,
    name: String,
}

impl CardState {
    pub fn step(&self) -> Step {
        self.step
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The confirmed name as the finale shouts it.
    pub fn shouted_name(&self) -> String {
        self.name.to_uppercase()
    }

    /// Apply one input. Anything outside the transition table is a no-op,
    /// including submitting an empty draft.
    pub fn apply(&mut self, input: Input) -> Outcome {
        let from = self.step;
        let to = match (from, input) {
            (Step::Sugar, Input::Yes | Input::No) => Step::SugarResponse,
            (Step::SugarResponse, Input::Continue) => Step::Moon,
            (Step::Moon, Input::Yes | Input::No) => Step::MoonResponse,
            (Step::MoonResponse, Input::Continue) => Step::Name,
            (Step::Name, Input::EditDraft(text)) => {
                if text == self.draft {
                    return Outcome::Ignored;
                }
                self.draft = text;
                return Outcome::DraftEdited;
            }
            (Step::Name, Input::Submit) if !self.draft.is_empty() => {
                self.name = self.draft.clone();
                Step::Gift
            }
            (Step::Gift, Input::OpenGift) => Step::Opened,
            (Step::Opened, Input::Restart) => {
                *self = CardState::default();
                Step::Sugar
            }
            _ => return Outcome::Ignored,
        };
        self.step = to;
        Outcome::Advanced { from, to }
    }
}

/// The decorative burst played when the gift opens. Best effort: an error is
/// logged by the sequencer and otherwise dropped.
pub trait Celebration {
    fn celebrate(&mut self) -> Result<()>;
}

/// Owns the state and fires the celebration when the gift is opened.
pub struct Sequencer<C> {
    state: CardState,
    celebration: C,
}

impl<C: Celebration> Sequencer<C> {
    pub fn new(celebration: C) -> Self {
        Self {
            state: CardState::default(),
            celebration,
        }
    }

    pub fn state(&self) -> &CardState {
        &self.state
    }

    pub fn celebration(&self) -> &C {
        &self.celebration
    }

    pub fn celebration_mut(&mut self) -> &mut C {
        &mut self.celebration
    }

    pub fn dispatch(&mut self, input: Input) -> Outcome {
        let label = input_label(&input);
        let outcome = self.state.apply(input);
        match outcome {
            Outcome::Advanced { from, to } => {
                info!(%from, %to, "step changed");
                if to == Step::Opened {
                    if let Err(e) = self.celebration.celebrate() {
                        warn!(error = %e, "celebration skipped");
                    }
                }
            }
            Outcome::DraftEdited => {
                debug!(chars = self.state.draft.chars().count(), "draft edited");
            }
            Outcome::Ignored => {
                debug!(step = %self.state.step, input = label, "input ignored");
            }
        }
        outcome
    }
}

/// Input name for logs; the draft text itself stays out of them.
fn input_label(input: &Input) -> &'static str {
    match input {
        Input::Yes => "yes",
        Input::No => "no",
        Input::Continue => "continue",
        Input::EditDraft(_) => "edit",
        Input::Submit => "submit",
        Input::OpenGift => "open-gift",
        Input::Restart => "restart",
    }
}
