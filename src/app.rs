use crate::config::TABLE_RANGE;
use crate::feedback::Feedback;
use crate::high_score::HighScoreStore;
use crate::session::{Answer, Outcome, SessionEngine, SessionSummary, Tick};
use crate::timer::{Countdown, SettleDelay};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::BTreeSet;
use std::time::Duration;

/// Engine wired to whichever adapters the binary picked
pub type Engine = SessionEngine<Box<dyn HighScoreStore>, Box<dyn Feedback>>;

/// Longest answer the input box accepts
const MAX_INPUT_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Game,
    Review,
}

/// Table checkboxes on the menu screen
#[derive(Debug, Clone, PartialEq)]
pub struct MenuState {
    pub cursor: u32,
    pub selected: BTreeSet<u32>,
    pub error: Option<String>,
}

impl MenuState {
    pub fn new(selected: BTreeSet<u32>) -> Self {
        Self {
            cursor: *TABLE_RANGE.start(),
            selected,
            error: None,
        }
    }

    pub fn toggle(&mut self, table: u32) {
        if !TABLE_RANGE.contains(&table) {
            return;
        }
        if !self.selected.remove(&table) {
            self.selected.insert(table);
        }
        self.error = None;
    }

    fn move_cursor(&mut self, delta: i64) {
        let (lo, hi) = (*TABLE_RANGE.start() as i64, *TABLE_RANGE.end() as i64);
        let next = (self.cursor as i64 + delta).clamp(lo, hi);
        self.cursor = next as u32;
    }
}

pub struct App {
    pub engine: Engine,
    pub screen: Screen,
    pub menu: MenuState,
    pub input: String,
    pub last_outcome: Option<Outcome>,
    pub summary: Option<SessionSummary>,
    pub high_score: u32,
    pub should_quit: bool,
    countdown: Countdown,
    settle: SettleDelay,
}

impl App {
    pub fn new(engine: Engine, selected: BTreeSet<u32>, settle_delay: Duration) -> Self {
        let high_score = engine.high_score();
        Self {
            engine,
            screen: Screen::Menu,
            menu: MenuState::new(selected),
            input: String::new(),
            last_outcome: None,
            summary: None,
            high_score,
            should_quit: false,
            countdown: Countdown::new(),
            settle: SettleDelay::new(settle_delay),
        }
    }

    pub fn countdown_active(&self) -> bool {
        self.countdown.is_active()
    }

    pub fn settle_pending(&self) -> bool {
        self.settle.is_pending()
    }

    /// Start a session with the tables ticked on the menu
    pub fn start_session(&mut self) {
        match self.engine.start(&self.menu.selected) {
            Ok(_) => {
                self.menu.error = None;
                self.input.clear();
                self.last_outcome = None;
                self.summary = None;
                self.high_score = self.engine.high_score();
                self.settle.cancel();
                self.countdown.start();
                self.screen = Screen::Game;
            }
            Err(e) => {
                self.menu.error = Some(e.to_string());
                self.screen = Screen::Menu;
            }
        }
    }

    pub fn submit_answer(&mut self) {
        let answer = Answer::parse(&self.input);
        self.input.clear();
        if let Some(outcome) = self.engine.submit(answer) {
            self.last_outcome = Some(outcome);
            self.settle.schedule();
        }
    }

    /// End the running session early
    pub fn stop_session(&mut self) {
        let summary = self.engine.stop();
        self.finish(summary);
    }

    fn finish(&mut self, summary: SessionSummary) {
        self.countdown.cancel();
        self.settle.cancel();
        self.input.clear();
        self.last_outcome = None;
        self.high_score = self.engine.high_score();
        self.summary = Some(summary);
        self.screen = Screen::Review;
    }

    /// Feed elapsed wall time to the countdown, then to the settle delay.
    pub fn advance(&mut self, elapsed: Duration) {
        for _ in 0..self.countdown.advance(elapsed) {
            if let Tick::Ended(summary) = self.engine.tick() {
                self.finish(summary);
                return;
            }
        }

        if self.settle.advance(elapsed) {
            self.last_outcome = None;
            self.engine.next_problem();
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Menu => self.on_menu_key(key),
            Screen::Game => self.on_game_key(key),
            Screen::Review => self.on_review_key(key),
        }
    }

    fn on_menu_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Enter => self.start_session(),
            KeyCode::Left | KeyCode::Up => self.menu.move_cursor(-1),
            KeyCode::Right | KeyCode::Down => self.menu.move_cursor(1),
            KeyCode::Char(' ') => {
                let cursor = self.menu.cursor;
                self.menu.toggle(cursor);
            }
            KeyCode::Char('0') => self.menu.toggle(10),
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if let Some(table) = c.to_digit(10) {
                    self.menu.toggle(table);
                }
            }
            KeyCode::Char('a') => {
                self.menu.selected = TABLE_RANGE.collect();
                self.menu.error = None;
            }
            KeyCode::Char('c') => self.menu.selected.clear(),
            _ => {}
        }
    }

    fn on_game_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.stop_session(),
            // Input is locked while the last answer settles
            _ if self.engine.snapshot().current_problem.is_none() => {}
            KeyCode::Enter => self.submit_answer(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c)
                if (c.is_ascii_digit() || (c == '-' && self.input.is_empty()))
                    && self.input.len() < MAX_INPUT_LEN =>
            {
                self.input.push(c);
            }
            _ => {}
        }
    }

    fn on_review_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            // Enter is left out so a late submit cannot skip the results
            KeyCode::Char('m') => self.screen = Screen::Menu,
            KeyCode::Char('r') => self.start_session(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::Silent;
    use crate::high_score::MemoryHighScoreStore;
    use crate::problem::ProblemGenerator;
    use crate::session::Phase;

    fn app_with(tables: &[u32], high_score: u32) -> App {
        let engine: Engine = SessionEngine::with_generator(
            Box::new(MemoryHighScoreStore::with_score(high_score)) as Box<dyn HighScoreStore>,
            Box::new(Silent) as Box<dyn Feedback>,
            ProblemGenerator::seeded(21),
        );
        App::new(
            engine,
            tables.iter().copied().collect(),
            Duration::from_millis(800),
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_answer(app: &mut App, text: &str) {
        for c in text.chars() {
            app.on_key(key(KeyCode::Char(c)));
        }
        app.on_key(key(KeyCode::Enter));
    }

    fn pending_answer(app: &App) -> u32 {
        app.engine.snapshot().current_problem.unwrap().answer
    }

    #[test]
    fn test_starts_on_menu() {
        let app = app_with(&[3], 12);
        assert_eq!(app.screen, Screen::Menu);
        assert_eq!(app.high_score, 12);
        assert!(!app.countdown_active());
    }

    #[test]
    fn test_menu_toggles_tables() {
        let mut app = app_with(&[], 0);
        app.on_key(key(KeyCode::Char('3')));
        app.on_key(key(KeyCode::Char('0')));
        assert_eq!(app.menu.selected, [3, 10].into_iter().collect::<BTreeSet<u32>>());

        app.on_key(key(KeyCode::Char('3')));
        assert_eq!(app.menu.selected, [10].into_iter().collect::<BTreeSet<u32>>());

        app.on_key(key(KeyCode::Char('c')));
        assert!(app.menu.selected.is_empty());

        app.on_key(key(KeyCode::Char('a')));
        assert_eq!(app.menu.selected.len(), 12);
    }

    #[test]
    fn test_menu_cursor_selects_high_tables() {
        let mut app = app_with(&[], 0);
        for _ in 0..20 {
            app.on_key(key(KeyCode::Right));
        }
        assert_eq!(app.menu.cursor, 12);
        app.on_key(key(KeyCode::Char(' ')));
        app.on_key(key(KeyCode::Left));
        app.on_key(key(KeyCode::Char(' ')));
        assert_eq!(app.menu.selected, [11, 12].into_iter().collect::<BTreeSet<u32>>());
    }

    #[test]
    fn test_enter_without_tables_shows_error() {
        let mut app = app_with(&[], 0);
        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::Menu);
        assert_eq!(
            app.menu.error.as_deref(),
            Some("Please select at least one multiplication table!")
        );
        assert_eq!(app.engine.phase(), Phase::Idle);

        app.on_key(key(KeyCode::Char('4')));
        assert!(app.menu.error.is_none());
    }

    #[test]
    fn test_enter_starts_game() {
        let mut app = app_with(&[4], 0);
        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::Game);
        assert!(app.countdown_active());
        assert_eq!(app.engine.snapshot().time_left, 300);
    }

    #[test]
    fn test_correct_answer_then_settle() {
        let mut app = app_with(&[4], 0);
        app.start_session();

        let answer = pending_answer(&app);
        type_answer(&mut app, &answer.to_string());

        assert!(app.last_outcome.unwrap().is_correct);
        assert!(app.input.is_empty());
        assert!(app.settle_pending());
        assert!(app.engine.snapshot().current_problem.is_none());

        app.advance(Duration::from_millis(500));
        assert!(app.engine.snapshot().current_problem.is_none());

        app.advance(Duration::from_millis(300));
        assert!(app.last_outcome.is_none());
        assert!(app.engine.snapshot().current_problem.is_some());
        assert_eq!(app.engine.snapshot().score, 1);
    }

    #[test]
    fn test_input_locked_while_settling() {
        let mut app = app_with(&[5], 0);
        app.start_session();
        type_answer(&mut app, "1");

        type_answer(&mut app, "25");
        assert!(app.input.is_empty());
        assert_eq!(app.engine.snapshot().total_questions, 1);
    }

    #[test]
    fn test_input_filters_keys() {
        let mut app = app_with(&[5], 0);
        app.start_session();

        for c in ['x', '-', '1', '-', '2', '3', '4', '5', '6', '7'] {
            app.on_key(key(KeyCode::Char(c)));
        }
        assert_eq!(app.input, "-12345");

        app.on_key(key(KeyCode::Backspace));
        assert_eq!(app.input, "-1234");
    }

    #[test]
    fn test_empty_submission_counts_as_wrong() {
        let mut app = app_with(&[6], 0);
        app.start_session();
        app.on_key(key(KeyCode::Enter));

        let state = app.engine.snapshot();
        assert_eq!(state.total_questions, 1);
        assert_eq!(state.wrong_answers[0].user_answer, Answer::Blank);
    }

    #[test]
    fn test_escape_stops_session() {
        let mut app = app_with(&[7], 0);
        app.start_session();
        let answer = pending_answer(&app);
        type_answer(&mut app, &answer.to_string());

        app.on_key(key(KeyCode::Esc));
        assert_eq!(app.screen, Screen::Review);
        assert!(!app.countdown_active());
        assert!(!app.settle_pending());

        let summary = app.summary.clone().unwrap();
        assert_eq!(summary.score, 1);
        assert_eq!(summary.new_high_score, Some(1));
        assert_eq!(app.high_score, 1);
    }

    #[test]
    fn test_countdown_end_wins_over_pending_settle() {
        let mut app = app_with(&[8], 0);
        app.start_session();
        for _ in 0..299 {
            app.advance(Duration::from_secs(1));
        }
        assert_eq!(app.engine.snapshot().time_left, 1);

        let answer = pending_answer(&app);
        type_answer(&mut app, &answer.to_string());
        assert!(app.settle_pending());

        app.advance(Duration::from_secs(1));
        assert_eq!(app.screen, Screen::Review);
        assert!(!app.settle_pending());
        assert!(app.engine.snapshot().current_problem.is_none());
        assert_eq!(app.engine.phase(), Phase::Ended);
    }

    #[test]
    fn test_review_navigation() {
        let mut app = app_with(&[9], 0);
        app.start_session();
        app.stop_session();

        app.on_key(key(KeyCode::Char('r')));
        assert_eq!(app.screen, Screen::Game);
        assert!(app.summary.is_none());

        app.stop_session();
        app.on_key(key(KeyCode::Char('m')));
        assert_eq!(app.screen, Screen::Menu);

        app.on_key(key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_late_enter_keeps_review_open() {
        let mut app = app_with(&[3], 0);
        app.engine = SessionEngine::with_generator(
            Box::new(MemoryHighScoreStore::default()) as Box<dyn HighScoreStore>,
            Box::new(Silent) as Box<dyn Feedback>,
            ProblemGenerator::seeded(21),
        )
        .with_session_secs(1);
        app.start_session();

        app.on_key(key(KeyCode::Char('1')));
        app.advance(Duration::from_secs(1));
        assert_eq!(app.screen, Screen::Review);

        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::Review);
        assert!(app.summary.is_some());
        assert_eq!(app.engine.phase(), Phase::Ended);
    }

    #[test]
    fn test_ctrl_c_quits_from_game() {
        let mut app = app_with(&[2], 0);
        app.start_session();
        app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }
}
