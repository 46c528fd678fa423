//! Progress reporting seam (component 4.J)
//!
//! Long-running loops (a full simulation, or the energy pass over a
//! large trajectory) poll a `ProgressSink` rather than printing
//! directly, so the CLI can log progress while library callers stay
//! silent by default.

/// Receives `(current_step, total_steps)` updates from a long loop.
pub trait ProgressSink {
    fn report(&mut self, current_step: u64, total_steps: u64);
}

/// Default sink: does nothing.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&mut self, _current_step: u64, _total_steps: u64) {}
}

/// Emits a `log::info!` line every `every` calls.
pub struct LoggingProgress {
    every: u64,
}

impl LoggingProgress {
    pub fn new(every: u64) -> Self {
        LoggingProgress { every: every.max(1) }
    }
}

impl ProgressSink for LoggingProgress {
    fn report(&mut self, current_step: u64, total_steps: u64) {
        if current_step % self.every == 0 || current_step == total_steps {
            log::info!("progress: {current_step}/{total_steps}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_progress_accepts_any_input() {
        let mut sink = NullProgress;
        sink.report(0, 100);
        sink.report(100, 100);
    }
}
