//! The diagnostics sink
//!
//! Warnings never abort a run, but the caller decides where they go: the
//! CLI prints them, tests capture them. The sink is passed explicitly
//! through both executors instead of living in a global logger.

/// Receives the non-fatal diagnostics a run produces
pub trait Reporter {
    /// A warning: printed/recorded, execution continues
    fn warning(&mut self, message: &str);

    /// Progress information
    fn info(&mut self, message: &str);
}

/// Forwards diagnostics to the `log` facade
#[derive(Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn warning(&mut self, message: &str) {
        log::warn!("{message}");
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }
}

/// Captures diagnostics for assertions in tests
#[derive(Debug, Default)]
pub struct BufferReporter {
    warnings: Vec<String>,
    infos: Vec<String>,
}

impl BufferReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn infos(&self) -> &[String] {
        &self.infos
    }
}

impl Reporter for BufferReporter {
    fn warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    fn info(&mut self, message: &str) {
        self.infos.push(message.to_string());
    }
}
