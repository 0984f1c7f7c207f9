use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};

use crate::{
    app::{App, Screen},
    config::TABLE_RANGE,
    feedback::OutcomeKind,
    session::{format_clock, Outcome, SessionState, SessionSummary},
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Streak length from which the counter is highlighted
const HOT_STREAK: u32 = 3;

pub fn draw(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([Constraint::Min(0)])
            .split(area)[0];

        match self.screen {
            Screen::Menu => render_menu(self, area, buf),
            Screen::Game => render_game(self, area, buf),
            Screen::Review => {
                if let Some(summary) = &self.summary {
                    render_review(summary, self.high_score, area, buf);
                }
            }
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn render_menu(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(Line::from(vec![
        Span::styled("Multiplication Drill", bold().fg(Color::Cyan)),
        Span::raw("   "),
        Span::styled(format!("High score: {}", app.high_score), bold().fg(Color::Yellow)),
    ]))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    Paragraph::new("Pick the tables to practice")
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let boxes: Vec<Span> = TABLE_RANGE
        .map(|table| {
            let checked = app.menu.selected.contains(&table);
            let mut style = if checked {
                bold().fg(Color::Green)
            } else {
                dim()
            };
            if table == app.menu.cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }
            let mark = if checked { "x" } else { " " };
            Span::styled(format!(" [{mark}] {table} "), style)
        })
        .collect();
    Paragraph::new(Line::from(boxes))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    if let Some(error) = &app.menu.error {
        Paragraph::new(Span::styled(error.as_str(), bold().fg(Color::Red)))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
    }

    Paragraph::new(Span::styled(
        "(←/→) move / (space) toggle / (1-9, 0=10) toggle / (a)ll / (c)lear / (enter) start / (q)uit",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(chunks[4], buf);
}

fn status_line(state: &SessionState, high_score: u32) -> Line<'static> {
    let streak_style = if state.streak >= HOT_STREAK {
        bold().fg(Color::Magenta).add_modifier(Modifier::SLOW_BLINK)
    } else {
        bold()
    };
    Line::from(vec![
        Span::styled(format!("Time: {}", format_clock(state.time_left)), bold()),
        Span::raw("   "),
        Span::styled(format!("Score: {}", state.score), bold().fg(Color::Green)),
        Span::raw("   "),
        Span::styled(format!("Streak: {}", state.streak), streak_style),
        Span::raw("   "),
        Span::styled(format!("Best: {high_score}"), bold().fg(Color::Yellow)),
    ])
}

/// Text and colour of the line shown while an answer settles
pub fn feedback_text(outcome: &Outcome) -> (String, Color) {
    match outcome.kind {
        OutcomeKind::StreakBonus => (
            format!("CORRECT! +{} (Streak Bonus!)", outcome.points),
            Color::Magenta,
        ),
        OutcomeKind::Correct => (format!("CORRECT! +{}", outcome.points), Color::Green),
        OutcomeKind::Wrong => (
            format!("WRONG (Answer: {})", outcome.correct_answer),
            Color::Red,
        ),
    }
}

fn render_game(app: &App, area: Rect, buf: &mut Buffer) {
    let state = app.engine.snapshot();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(status_line(state, app.high_score))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let problem_text = state
        .current_problem
        .map(|p| format!("{p} = ?"))
        .unwrap_or_default();
    Paragraph::new(Span::styled(problem_text, bold().fg(Color::Cyan)))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    Paragraph::new(Span::styled(format!("{}_", app.input), bold()))
        .block(Block::default().borders(Borders::ALL).title("Answer"))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    if let Some(outcome) = &app.last_outcome {
        let (text, color) = feedback_text(outcome);
        Paragraph::new(Span::styled(text, bold().fg(color)))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
    }

    Paragraph::new(Span::styled(
        "(enter) submit / (esc) stop",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[6], buf);
}

fn render_review(summary: &SessionSummary, high_score: u32, area: Rect, buf: &mut Buffer) {
    let mut lines = vec![
        Line::from(Span::styled("Session over", bold().fg(Color::Cyan))),
        Line::default(),
        Line::from(format!("Final score: {}", summary.score)),
        Line::from(format!("Best streak: {}", summary.max_streak)),
        Line::from(format!("Questions answered: {}", summary.total_questions)),
        Line::from(format!("High score: {high_score}")),
    ];

    if let Some(score) = summary.new_high_score {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!("NEW HIGH SCORE: {score}!"),
            bold().fg(Color::Yellow),
        )));
    }

    if !summary.wrong_answers.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Problems to review", bold().fg(Color::Red))));
        for wrong in &summary.wrong_answers {
            lines.push(Line::from(vec![
                Span::styled(format!("{:<8}", wrong.key.to_string()), bold()),
                Span::raw(format!("  Your answer: {:<10}", wrong.user_answer.to_string())),
                Span::styled(
                    format!("Correct: {}", wrong.correct_answer),
                    Style::default().fg(Color::Green),
                ),
            ]));
        }
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "(r)etry / (m)enu / (q)uit",
        Style::default().add_modifier(Modifier::ITALIC),
    )));

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Results"))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Engine;
    use crate::feedback::{Feedback, Silent};
    use crate::high_score::{HighScoreStore, MemoryHighScoreStore};
    use crate::problem::ProblemGenerator;
    use crate::session::{Answer, SessionEngine};
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn app(tables: &[u32]) -> App {
        let engine: Engine = SessionEngine::with_generator(
            Box::new(MemoryHighScoreStore::with_score(7)) as Box<dyn HighScoreStore>,
            Box::new(Silent) as Box<dyn Feedback>,
            ProblemGenerator::seeded(4),
        );
        App::new(engine, tables.iter().copied().collect(), Duration::from_millis(800))
    }

    fn rendered(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| draw(app, f)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_feedback_text() {
        let outcome = Outcome {
            is_correct: true,
            points: 3,
            bonus: 2,
            correct_answer: 12,
            kind: OutcomeKind::StreakBonus,
        };
        assert_eq!(feedback_text(&outcome).0, "CORRECT! +3 (Streak Bonus!)");

        let wrong = Outcome {
            is_correct: false,
            points: 0,
            bonus: 0,
            correct_answer: 21,
            kind: OutcomeKind::Wrong,
        };
        assert_eq!(feedback_text(&wrong), ("WRONG (Answer: 21)".to_string(), Color::Red));
    }

    #[test]
    fn test_render_menu() {
        let mut app = app(&[3]);
        app.menu.error = Some("Please select at least one multiplication table!".into());

        let screen = rendered(&app);
        assert!(screen.contains("Multiplication Drill"));
        assert!(screen.contains("High score: 7"));
        assert!(screen.contains("[x] 3"));
        assert!(screen.contains("[ ] 4"));
        assert!(screen.contains("Please select"));
    }

    #[test]
    fn test_render_game() {
        let mut app = app(&[6]);
        app.start_session();
        app.input = "42".into();

        let problem = app.engine.snapshot().current_problem.unwrap();
        let screen = rendered(&app);
        assert!(screen.contains("5:00"));
        assert!(screen.contains("Score: 0"));
        assert!(screen.contains(&format!("{problem} = ?")));
        assert!(screen.contains("42_"));
    }

    #[test]
    fn test_render_review_lists_misses() {
        let mut app = app(&[9]);
        app.start_session();
        app.input.clear();
        app.submit_answer();
        app.stop_session();

        let summary = app.summary.clone().unwrap();
        assert_eq!(summary.wrong_answers[0].user_answer, Answer::Blank);

        let screen = rendered(&app);
        assert!(screen.contains("Final score: 0"));
        assert!(screen.contains("Questions answered: 1"));
        assert!(screen.contains("No answer"));
        assert!(screen.contains(&summary.wrong_answers[0].key.to_string()));
        assert!(!screen.contains("NEW HIGH SCORE"));
    }
}
