use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

use crate::app::App;

/// How often the loop wakes up when no input arrives
pub const TICK_RATE_MS: u64 = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrillEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Where key presses and resizes come from
pub trait DrillEventSource {
    /// Waits up to `timeout`; `Err(Timeout)` when nothing arrived.
    fn recv_timeout(&self, timeout: Duration) -> Result<DrillEvent, RecvTimeoutError>;
}

/// Reads the terminal on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<DrillEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                // Windows reports releases too
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    tx.send(DrillEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => tx.send(DrillEvent::Resize),
                Ok(_) => Ok(()),
                Err(e) => {
                    log::warn!("terminal input closed: {e}");
                    break;
                }
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DrillEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<DrillEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Events pushed by hand through a channel
pub struct TestEventSource {
    rx: Receiver<DrillEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<DrillEvent>) -> Self {
        Self { rx }
    }
}

impl DrillEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<DrillEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

#[derive(Debug)]
enum Clock {
    /// Wall time since the previous step
    Wall(Instant),
    /// Every timeout counts as this much time; input takes none
    Simulated(Duration),
}

/// One turn of the loop: what happened and how much time passed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub event: DrillEvent,
    pub elapsed: Duration,
}

impl Step {
    /// Time moves first so an answer racing the last second lands after the end.
    pub fn apply(self, app: &mut App) {
        if !self.elapsed.is_zero() {
            app.advance(self.elapsed);
        }
        if let DrillEvent::Key(key) = self.event {
            app.on_key(key);
        }
    }
}

pub struct Runner<E: DrillEventSource> {
    events: E,
    wait: Duration,
    clock: Clock,
}

impl<E: DrillEventSource> Runner<E> {
    /// Wakes every `TICK_RATE_MS` and measures real elapsed time
    pub fn new(events: E) -> Self {
        Self {
            events,
            wait: Duration::from_millis(TICK_RATE_MS),
            clock: Clock::Wall(Instant::now()),
        }
    }

    /// Never blocks; each empty poll advances time by exactly `tick`
    pub fn simulated(events: E, tick: Duration) -> Self {
        Self {
            events,
            wait: Duration::ZERO,
            clock: Clock::Simulated(tick),
        }
    }

    pub fn step(&mut self) -> Step {
        let event = match self.events.recv_timeout(self.wait) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => DrillEvent::Tick,
        };

        let elapsed = match &mut self.clock {
            Clock::Wall(last) => {
                let now = Instant::now();
                let elapsed = now.duration_since(*last);
                *last = now;
                elapsed
            }
            Clock::Simulated(tick) => match event {
                DrillEvent::Tick => *tick,
                _ => Duration::ZERO,
            },
        };

        Step { event, elapsed }
    }
}
