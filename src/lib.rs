// Library surface for headless/integration tests and reuse.
// The binary only adds terminal setup and argument parsing on top.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod feedback;
pub mod high_score;
pub mod logging;
pub mod problem;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod timer;
pub mod ui;
