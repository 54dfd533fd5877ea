use std::time::{Duration, Instant};

use crate::sequencer::Step;

pub const ENTER_DURATION: Duration = Duration::from_millis(300);
pub const EXIT_DURATION: Duration = Duration::from_millis(200);
pub const ELEMENT_DURATION: Duration = Duration::from_millis(400);

/// Visual offset of a screen. Offsets are in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub opacity: f64,
    pub dx: f64,
    pub dy: f64,
    pub scale: f64,
}

impl Pose {
    pub const REST: Pose = Pose {
        opacity: 1.0,
        dx: 0.0,
        dy: 0.0,
        scale: 1.0,
    };

    pub fn lerp(self, to: Pose, t: f64) -> Pose {
        if t <= 0.0 {
            return self;
        }
        if t >= 1.0 {
            return to;
        }
        Pose {
            opacity: self.opacity + (to.opacity - self.opacity) * t,
            dx: self.dx + (to.dx - self.dx) * t,
            dy: self.dy + (to.dy - self.dy) * t,
            scale: self.scale + (to.scale - self.scale) * t,
        }
    }

    pub fn offset(&self) -> (i16, i16) {
        (self.dx.round() as i16, self.dy.round() as i16)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenMotion {
    pub initial: Pose,
    pub exit: Option<Pose>,
    /// Per-element entry delays, for screens that stage their content.
    pub stagger: &'static [Duration],
}

const OPENED_STAGGER: &[Duration] = &[
    Duration::from_millis(0),
    Duration::from_millis(300),
    Duration::from_millis(500),
    Duration::from_millis(1500),
];

pub fn motion_for(step: Step) -> ScreenMotion {
    let hidden = Pose {
        opacity: 0.0,
        ..Pose::REST
    };
    match step {
        Step::Sugar | Step::Moon => ScreenMotion {
            initial: Pose { dy: 1.0, ..hidden },
            exit: Some(Pose { dy: -1.0, ..hidden }),
            stagger: &[],
        },
        Step::SugarResponse | Step::MoonResponse => ScreenMotion {
            initial: Pose { scale: 0.9, ..hidden },
            exit: Some(Pose { scale: 1.1, ..hidden }),
            stagger: &[],
        },
        Step::Name => ScreenMotion {
            initial: Pose { dx: 2.0, ..hidden },
            exit: Some(Pose { dx: -2.0, ..hidden }),
            stagger: &[],
        },
        Step::Gift => ScreenMotion {
            initial: Pose { scale: 0.8, ..hidden },
            exit: None,
            stagger: &[],
        },
        Step::Opened => ScreenMotion {
            initial: hidden,
            exit: None,
            stagger: OPENED_STAGGER,
        },
    }
}

/// Cubic ease-out.
pub fn ease_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Damped spring from 0 to 1 that overshoots once or twice before settling.
pub fn spring(t: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let damping = 5.0;
    let freq = 2.5 * std::f64::consts::TAU;
    1.0 - (-damping * t).exp() * (freq * t).cos()
}

fn fraction(elapsed: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
}

/// What is on screen right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shown {
    pub step: Step,
    pub pose: Pose,
    /// Time since this screen started entering; zero while leaving.
    pub elapsed: Duration,
    pub leaving: bool,
}

impl Shown {
    /// Progress of a staged element, 0.0 before its delay and 1.0 once done.
    pub fn element_progress(&self, index: usize) -> f64 {
        if self.leaving {
            return 1.0;
        }
        let delay = motion_for(self.step)
            .stagger
            .get(index)
            .copied()
            .unwrap_or_default();
        match self.elapsed.checked_sub(delay) {
            Some(since) => fraction(since, ELEMENT_DURATION),
            None => 0.0,
        }
    }
}

/// Plays screen changes in wait mode: the outgoing screen finishes its exit
/// before the incoming one enters. Never feeds back into the sequencer.
pub struct Presence {
    current: Step,
    leaving: Option<Step>,
    since: Instant,
    settled: bool,
}

impl Presence {
    pub fn new(step: Step, now: Instant) -> Self {
        Self {
            current: step,
            leaving: None,
            since: now,
            settled: false,
        }
    }

    pub fn current(&self) -> Step {
        self.current
    }

    /// Note the sequencer's step after an input. Starts the exit of the old
    /// screen when the step changed. A screen already mid-exit keeps leaving;
    /// the steps skipped past it are never drawn.
    pub fn observe(&mut self, step: Step, now: Instant) {
        if step == self.current {
            return;
        }
        let exiting = !self.settled
            && self.leaving.is_some()
            && now.saturating_duration_since(self.since) < EXIT_DURATION;
        if !exiting {
            self.leaving = motion_for(self.current).exit.map(|_| self.current);
            self.since = now;
        }
        self.current = step;
        self.settled = false;
    }

    /// Skip any animation in flight.
    #[cfg(test)]
    pub fn settle(&mut self) {
        self.leaving = None;
        self.settled = true;
    }

    pub fn shown(&self, now: Instant) -> Shown {
        if self.settled {
            return Shown {
                step: self.current,
                pose: Pose::REST,
                elapsed: Duration::from_secs(3600),
                leaving: false,
            };
        }

        let mut elapsed = now.saturating_duration_since(self.since);
        if let Some(prev) = self.leaving {
            if elapsed < EXIT_DURATION {
                let exit = motion_for(prev).exit.unwrap_or(Pose::REST);
                return Shown {
                    step: prev,
                    pose: Pose::REST.lerp(exit, ease_out(fraction(elapsed, EXIT_DURATION))),
                    elapsed: Duration::ZERO,
                    leaving: true,
                };
            }
            elapsed -= EXIT_DURATION;
        }

        let initial = motion_for(self.current).initial;
        Shown {
            step: self.current,
            pose: initial.lerp(Pose::REST, ease_out(fraction(elapsed, ENTER_DURATION))),
            elapsed,
            leaving: false,
        }
    }
}
