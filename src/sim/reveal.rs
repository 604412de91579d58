//! Result overview and reveal animation
//!
//! After a guess is scored the overview panel slides in, waits a moment, then
//! for each result: drops the guess marker, sweeps a line from the guess
//! toward the actual location at a fixed frame rate and finally drops the
//! actual-location marker. Every timer belongs to this controller's own
//! [`Timeline`], so starting a new reveal (or resetting) cancels all of them.

use serde::Serialize;

use super::state::GuessResult;
use super::timeline::{TaskHandle, Timeline};
use crate::geo::{Bounds, Coordinate, format_distance, interpolate};
use crate::settings::Timings;
use crate::view::{LineId, MarkerKind, ViewCommand};

/// Which overview is being shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    /// Mid-game: offers "Next Round"
    Round,
    /// After the final round: offers "Play Again"
    Game,
}

/// Running totals over the guesses made so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub total: u64,
    /// `max_score * round_count`
    pub max_possible: u64,
}

impl Totals {
    pub fn of(results: &[GuessResult], max_score: u32, round_count: u32) -> Self {
        Self {
            total: results.iter().map(|r| r.score as u64).sum(),
            max_possible: max_score as u64 * round_count as u64,
        }
    }
}

/// Everything the overview panel displays for one result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewSummary {
    pub kind: SummaryKind,
    pub round: u32,
    pub round_count: u32,
    pub distance_m: f64,
    pub score: u32,
    pub max_score: u32,
    pub totals: Totals,
    /// Distance sentence
    pub headline: String,
    /// Points sentence
    pub score_line: String,
    /// Latest score relative to `max_score`, 0-100
    pub progress_percent: f64,
}

/// "1 point" / "N points"
pub fn points(n: u64) -> String {
    if n == 1 {
        "1 point".to_string()
    } else {
        format!("{n} points")
    }
}

/// Build the overview for the latest result in `results`
pub fn summarize(
    kind: SummaryKind,
    results: &[GuessResult],
    max_score: u32,
    round_count: u32,
) -> Option<OverviewSummary> {
    let latest = results.last()?;
    let totals = Totals::of(results, max_score, round_count);
    let distance = format_distance(latest.distance_m);
    let scored = if latest.score == 1 {
        "You scored a point".to_string()
    } else {
        format!("You scored {}", points(latest.score as u64))
    };
    let (headline, score_line) = match kind {
        SummaryKind::Round => (
            format!("Your guess is {distance} removed from your start location"),
            scored,
        ),
        SummaryKind::Game => (
            format!("Your latest guess is {distance} removed from your start location"),
            format!("{scored}, which brings your total score to {}", points(totals.total)),
        ),
    };
    let progress_percent = if max_score == 0 {
        0.0
    } else {
        latest.score as f64 / max_score as f64 * 100.0
    };
    Some(OverviewSummary {
        kind,
        round: results.len() as u32,
        round_count,
        distance_m: latest.distance_m,
        score: latest.score,
        max_score,
        totals,
        headline,
        score_line,
        progress_percent,
    })
}

/// Timer payloads of the reveal sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RevealTask {
    /// Overview settled: set the score bar and draw the lines
    Begin,
    /// Guess marker landed: start sweeping
    Sweep(LineId),
    Frame(LineId),
    DropActual(LineId),
}

/// One animated guess → actual line
#[derive(Debug, Clone, PartialEq)]
pub struct RevealLine {
    id: LineId,
    guess: Coordinate,
    actual: Coordinate,
    steps: u32,
    step: u32,
    sweep: Option<TaskHandle>,
    actual_dropped: bool,
}

impl RevealLine {
    pub fn id(&self) -> LineId {
        self.id
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Elapsed fraction `step / steps`
    pub fn progress(&self) -> f64 {
        self.step as f64 / self.steps as f64
    }

    /// Current end of the line, interpolated from guess toward actual
    pub fn endpoint(&self) -> Coordinate {
        interpolate(self.guess, self.actual, self.progress())
    }

    pub fn sweep_finished(&self) -> bool {
        self.step >= self.steps && self.sweep.is_none()
    }

    pub fn actual_dropped(&self) -> bool {
        self.actual_dropped
    }
}

/// Presents scored results and paces their reveal
#[derive(Debug)]
pub struct Overview {
    timings: Timings,
    timeline: Timeline<RevealTask>,
    lines: Vec<RevealLine>,
    /// Lines waiting for the overview delay, with the score bar value
    staged: Option<(f64, Vec<(Coordinate, Coordinate)>)>,
    next_line: u32,
}

impl Overview {
    pub fn new(timings: Timings) -> Self {
        Self {
            timings,
            timeline: Timeline::new(),
            lines: Vec::new(),
            staged: None,
            next_line: 0,
        }
    }

    pub fn lines(&self) -> &[RevealLine] {
        &self.lines
    }

    /// Timers still pending for the current reveal
    pub fn active_timers(&self) -> usize {
        self.timeline.active_count()
    }

    pub fn is_animating(&self) -> bool {
        self.timeline.active_count() > 0
    }

    /// Show `summary` and schedule the reveal of `results`
    ///
    /// Any reveal still in flight is cancelled and its lines removed first.
    pub fn present(&mut self, summary: OverviewSummary, results: &[GuessResult], out: &mut Vec<ViewCommand>) {
        self.reset(out);

        let pairs: Vec<_> = results.iter().map(|r| (r.guess, r.actual)).collect();
        let progress = summary.progress_percent;
        out.push(ViewCommand::ShowOverview { summary });
        if let Some(bounds) = Bounds::enclosing(pairs.iter().flat_map(|(g, a)| [*g, *a])) {
            out.push(ViewCommand::FitOverview { bounds });
        }

        self.staged = Some((progress, pairs));
        self.timeline.schedule(self.timings.overview_delay_ms, RevealTask::Begin);
    }

    /// Cancel every pending reveal timer and remove drawn lines
    pub fn reset(&mut self, out: &mut Vec<ViewCommand>) {
        self.timeline.cancel_all();
        self.staged = None;
        for line in self.lines.drain(..) {
            out.push(ViewCommand::RemoveLine { line: line.id });
        }
    }

    /// Advance the reveal clock by `dt_ms`
    pub fn advance(&mut self, dt_ms: f64, out: &mut Vec<ViewCommand>) {
        let until = self.timeline.now_ms() + dt_ms.max(0.0);
        while let Some((_, task)) = self.timeline.pop_due(until) {
            self.run(task, out);
        }
        self.timeline.settle(until);
    }

    fn run(&mut self, task: RevealTask, out: &mut Vec<ViewCommand>) {
        match task {
            RevealTask::Begin => {
                let Some((percent, pairs)) = self.staged.take() else {
                    return;
                };
                out.push(ViewCommand::SetScoreProgress { percent });
                log::debug!("Revealing {} result line(s)", pairs.len());
                for (guess, actual) in pairs {
                    self.add_line(guess, actual, out);
                }
            }
            RevealTask::Sweep(id) => {
                let interval = self.timings.frame_interval_ms();
                if let Some(line) = self.lines.iter_mut().find(|l| l.id == id) {
                    line.sweep = Some(self.timeline.schedule_every(interval, RevealTask::Frame(id)));
                }
            }
            RevealTask::Frame(id) => {
                let Some(line) = self.lines.iter_mut().find(|l| l.id == id) else {
                    return;
                };
                if line.step >= line.steps {
                    if let Some(handle) = line.sweep.take() {
                        self.timeline.cancel(handle);
                    }
                    out.push(ViewCommand::SetLinePath {
                        line: id,
                        from: line.guess,
                        to: line.actual,
                    });
                    return;
                }
                line.step += 1;
                out.push(ViewCommand::SetLinePath {
                    line: id,
                    from: line.guess,
                    to: line.endpoint(),
                });
            }
            RevealTask::DropActual(id) => {
                if let Some(line) = self.lines.iter_mut().find(|l| l.id == id) {
                    line.actual_dropped = true;
                    out.push(ViewCommand::DropMarker {
                        line: id,
                        kind: MarkerKind::Actual,
                        at: line.actual,
                    });
                }
            }
        }
    }

    fn add_line(&mut self, guess: Coordinate, actual: Coordinate, out: &mut Vec<ViewCommand>) {
        let id = LineId(self.next_line);
        self.next_line = self.next_line.wrapping_add(1);

        out.push(ViewCommand::DrawLine {
            line: id,
            from: guess,
            to: guess,
        });
        out.push(ViewCommand::DropMarker {
            line: id,
            kind: MarkerKind::Guess,
            at: guess,
        });
        self.timeline.schedule(self.timings.marker_drop_ms, RevealTask::Sweep(id));
        self.timeline.schedule(self.timings.line_animation_ms, RevealTask::DropActual(id));

        self.lines.push(RevealLine {
            id,
            guess,
            actual,
            steps: self.timings.sweep_steps(),
            step: 0,
            sweep: None,
            actual_dropped: false,
        });
    }
}
