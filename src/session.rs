use crate::feedback::{Feedback, OutcomeKind};
use crate::high_score::HighScoreStore;
use crate::problem::{Problem, ProblemGenerator, ProblemKey, TABLE_RANGE};
use crate::scoring;
use std::{collections::BTreeSet, fmt};
use thiserror::Error;

/// Default length of a session in seconds
pub const SESSION_SECS: u32 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("Please select at least one multiplication table!")]
    EmptySelection,
    #[error("There is no {0} times table to practice!")]
    TableOutOfRange(u32),
}

/// What the user typed for a problem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Value(i64),
    /// Nothing numeric was entered
    Blank,
}

impl Answer {
    /// Leading digits (with an optional sign) are the answer; anything else is `Blank`.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim_start();
        let (sign, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        match digits.parse::<i64>() {
            Ok(n) => Answer::Value(sign * n),
            Err(_) => Answer::Blank,
        }
    }

    fn matches(&self, expected: u32) -> bool {
        matches!(self, Answer::Value(n) if *n == i64::from(expected))
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Value(n) => write!(f, "{n}"),
            Answer::Blank => f.write_str("No answer"),
        }
    }
}

/// First miss recorded for an operand pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrongAnswer {
    pub key: ProblemKey,
    pub correct_answer: u32,
    pub user_answer: Answer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingAnswer,
    /// Answer scored, next problem not dispatched yet
    Settling,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub is_running: bool,
    pub selected_tables: BTreeSet<u32>,
    pub current_problem: Option<Problem>,
    pub score: u32,
    pub streak: u32,
    pub max_streak: u32,
    pub time_left: u32,
    pub wrong_answers: Vec<WrongAnswer>,
    pub total_questions: u32,
}

impl SessionState {
    fn fresh(selected_tables: BTreeSet<u32>, time_left: u32) -> Self {
        Self {
            is_running: true,
            selected_tables,
            time_left,
            ..Self::default()
        }
    }

    fn record_wrong(&mut self, problem: &Problem, user_answer: Answer) {
        let key = problem.key();
        if self.wrong_answers.iter().all(|w| w.key != key) {
            self.wrong_answers.push(WrongAnswer {
                key,
                correct_answer: problem.answer,
                user_answer,
            });
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            is_running: false,
            selected_tables: BTreeSet::new(),
            current_problem: None,
            score: 0,
            streak: 0,
            max_streak: 0,
            time_left: SESSION_SECS,
            wrong_answers: Vec::new(),
            total_questions: 0,
        }
    }
}

/// Result of a scored submission, for the feedback line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub is_correct: bool,
    pub points: u32,
    pub bonus: u32,
    pub correct_answer: u32,
    pub kind: OutcomeKind,
}

/// Everything the review screen shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub score: u32,
    pub max_streak: u32,
    pub total_questions: u32,
    pub wrong_answers: Vec<WrongAnswer>,
    pub previous_high_score: u32,
    /// Set when this session beat the stored best score
    pub new_high_score: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// No session running, nothing changed
    Idle,
    Remaining(u32),
    Ended(SessionSummary),
}

/// Owns one drill session at a time and the adapters it reports to
pub struct SessionEngine<S: HighScoreStore, F: Feedback> {
    state: SessionState,
    phase: Phase,
    session_secs: u32,
    generator: ProblemGenerator,
    store: S,
    feedback: F,
    summary: Option<SessionSummary>,
}

impl<S: HighScoreStore, F: Feedback> SessionEngine<S, F> {
    pub fn new(store: S, feedback: F) -> Self {
        Self::with_generator(store, feedback, ProblemGenerator::new())
    }

    pub fn with_generator(store: S, feedback: F, generator: ProblemGenerator) -> Self {
        Self {
            state: SessionState::default(),
            phase: Phase::Idle,
            session_secs: SESSION_SECS,
            generator,
            store,
            feedback,
            summary: None,
        }
    }

    /// Length used by the next `start`
    pub fn with_session_secs(mut self, secs: u32) -> Self {
        self.session_secs = secs.max(1);
        if !self.state.is_running {
            self.state.time_left = self.session_secs;
        }
        self
    }

    pub fn snapshot(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn high_score(&self) -> u32 {
        self.store.read_high_score()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Begin a fresh session, replacing whatever came before.
    pub fn start(&mut self, tables: &BTreeSet<u32>) -> Result<Problem, StartError> {
        if let Some(&table) = tables.iter().find(|t| !TABLE_RANGE.contains(t)) {
            return Err(StartError::TableOutOfRange(table));
        }
        let problem = self
            .generator
            .generate(tables)
            .ok_or(StartError::EmptySelection)?;

        self.state = SessionState::fresh(tables.clone(), self.session_secs);
        self.state.current_problem = Some(problem);
        self.phase = Phase::AwaitingAnswer;
        self.summary = None;

        log::info!(
            "session started: tables {:?}, {}s",
            self.state.selected_tables,
            self.session_secs
        );
        Ok(problem)
    }

    /// Score an answer to the pending problem. `None` when nothing is pending.
    pub fn submit(&mut self, answer: Answer) -> Option<Outcome> {
        if self.phase != Phase::AwaitingAnswer {
            return None;
        }
        let problem = self.state.current_problem.take()?;

        let is_correct = answer.matches(problem.answer);
        let award = scoring::award(is_correct, self.state.streak);

        self.state.streak = award.streak_after;
        if is_correct {
            self.state.score += award.points;
            self.state.max_streak = self.state.max_streak.max(award.streak_after);
        } else {
            self.state.record_wrong(&problem, answer);
        }
        self.state.total_questions += 1;
        self.phase = Phase::Settling;

        let kind = match (is_correct, award.bonus) {
            (false, _) => OutcomeKind::Wrong,
            (true, 0) => OutcomeKind::Correct,
            (true, _) => OutcomeKind::StreakBonus,
        };
        self.feedback.play(kind);

        log::debug!(
            "{problem} answered {answer}: {kind}, +{} (streak {})",
            award.points,
            award.streak_after
        );

        Some(Outcome {
            is_correct,
            points: award.points,
            bonus: award.bonus,
            correct_answer: problem.answer,
            kind,
        })
    }

    /// Dispatch the next problem once the settle delay has passed.
    /// Returns `None` if the session ended in the meantime.
    pub fn next_problem(&mut self) -> Option<Problem> {
        if self.phase != Phase::Settling || !self.state.is_running {
            return None;
        }
        let problem = self.generator.generate(&self.state.selected_tables)?;
        self.state.current_problem = Some(problem);
        self.phase = Phase::AwaitingAnswer;
        Some(problem)
    }

    /// One elapsed second of the countdown.
    pub fn tick(&mut self) -> Tick {
        if !self.state.is_running {
            return Tick::Idle;
        }
        self.state.time_left = self.state.time_left.saturating_sub(1);
        if self.state.time_left == 0 {
            Tick::Ended(self.stop())
        } else {
            Tick::Remaining(self.state.time_left)
        }
    }

    /// End the session. Calling it again returns the same summary.
    pub fn stop(&mut self) -> SessionSummary {
        if let Some(summary) = &self.summary {
            return summary.clone();
        }

        self.state.is_running = false;
        self.state.current_problem = None;
        self.phase = Phase::Ended;

        let previous_high_score = self.store.read_high_score();
        let new_high_score = if self.state.score > previous_high_score {
            match self.store.write_high_score(self.state.score) {
                Ok(()) => log::info!("new high score {}", self.state.score),
                Err(e) => log::warn!("could not save high score {}: {e}", self.state.score),
            }
            Some(self.state.score)
        } else {
            None
        };

        let summary = SessionSummary {
            score: self.state.score,
            max_streak: self.state.max_streak,
            total_questions: self.state.total_questions,
            wrong_answers: self.state.wrong_answers.clone(),
            previous_high_score,
            new_high_score,
        };
        log::info!(
            "session ended: score {}, best streak {}, {} questions, {} missed",
            summary.score,
            summary.max_streak,
            summary.total_questions,
            summary.wrong_answers.len()
        );

        self.summary = Some(summary.clone());
        summary
    }
}

impl<S: HighScoreStore, F: Feedback> fmt::Debug for SessionEngine<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionEngine")
            .field("state", &self.state)
            .field("phase", &self.phase)
            .field("session_secs", &self.session_secs)
            .finish_non_exhaustive()
    }
}

/// `m:ss` for the countdown display
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
