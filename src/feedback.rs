use std::io::{self, Write};

/// Kind of audible cue played after an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum OutcomeKind {
    Correct,
    StreakBonus,
    Wrong,
}

/// Fire-and-forget cue sink. Implementations must swallow their own failures.
pub trait Feedback {
    fn play(&mut self, kind: OutcomeKind);
}

/// Rings the terminal bell: once for a plain hit, twice for a streak bonus,
/// three times for a miss.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl TerminalBell {
    fn rings(kind: OutcomeKind) -> usize {
        match kind {
            OutcomeKind::Correct => 1,
            OutcomeKind::StreakBonus => 2,
            OutcomeKind::Wrong => 3,
        }
    }
}

impl Feedback for TerminalBell {
    fn play(&mut self, kind: OutcomeKind) {
        let mut stdout = io::stdout();
        let bells = "\x07".repeat(Self::rings(kind));
        if stdout
            .write_all(bells.as_bytes())
            .and_then(|_| stdout.flush())
            .is_err()
        {
            log::debug!("bell for {kind} could not be written");
        }
    }
}

/// Discards every cue
#[derive(Debug, Default)]
pub struct Silent;

impl Feedback for Silent {
    fn play(&mut self, _kind: OutcomeKind) {}
}

impl<F: Feedback + ?Sized> Feedback for Box<F> {
    fn play(&mut self, kind: OutcomeKind) {
        (**self).play(kind)
    }
}
