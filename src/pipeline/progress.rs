//! Import progress as a single 0–100 number.
//!
//! Bands: extraction and chunking end at 30, inference fills 30–70 by chunks
//! sent, materialization fills 70–100 by candidates processed. Values never
//! go backwards.

pub const EXTRACTED: u8 = 30;
pub const INFERRED: u8 = 70;
pub const COMPLETE: u8 = 100;

/// Progress after `done` of `total` chunks have been answered.
pub fn inference_progress(done: usize, total: usize) -> u8 {
    band(EXTRACTED, INFERRED, done, total)
}

/// Progress after `done` of `total` candidates have been materialized.
pub fn materialization_progress(done: usize, total: usize) -> u8 {
    band(INFERRED, COMPLETE, done, total)
}

fn band(start: u8, end: u8, done: usize, total: usize) -> u8 {
    if total == 0 {
        return start;
    }
    let width = (end - start) as usize;
    let step = done.min(total) * width / total;
    start + step as u8
}

/// Forwards progress to the caller's callback, dropping repeats and
/// regressions.
pub struct ProgressReporter<'a> {
    sink: &'a mut dyn FnMut(u8),
    last: Option<u8>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(sink: &'a mut dyn FnMut(u8)) -> Self {
        Self { sink, last: None }
    }

    pub fn report(&mut self, value: u8) {
        let value = value.min(COMPLETE);
        if self.last.is_some_and(|last| value <= last) {
            return;
        }
        self.last = Some(value);
        (self.sink)(value);
    }

    pub fn extracted(&mut self) {
        self.report(EXTRACTED);
    }

    pub fn chunk_answered(&mut self, done: usize, total: usize) {
        self.report(inference_progress(done, total));
    }

    pub fn candidate_processed(&mut self, done: usize, total: usize) {
        self.report(materialization_progress(done, total));
    }

    pub fn finish(&mut self) {
        self.report(COMPLETE);
    }

    /// Last value delivered, if any.
    pub fn last(&self) -> Option<u8> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inference_band_is_proportional() {
        assert_eq!(inference_progress(0, 3), 30);
        assert_eq!(inference_progress(1, 3), 43);
        assert_eq!(inference_progress(2, 3), 56);
        assert_eq!(inference_progress(3, 3), 70);
    }

    #[test]
    fn materialization_band_is_proportional() {
        assert_eq!(materialization_progress(1, 4), 77);
        assert_eq!(materialization_progress(4, 4), 100);
        assert_eq!(materialization_progress(0, 0), 70);
    }

    #[test]
    fn overshoot_clamped_to_band() {
        assert_eq!(inference_progress(9, 3), 70);
    }

    #[test]
    fn reporter_drops_repeats_and_regressions() {
        let mut seen = Vec::new();
        let mut sink = |p: u8| seen.push(p);
        let mut reporter = ProgressReporter::new(&mut sink);

        reporter.extracted();
        reporter.report(30);
        reporter.chunk_answered(1, 2);
        reporter.report(10);
        reporter.finish();
        reporter.report(250);

        assert_eq!(reporter.last(), Some(100));
        drop(reporter);
        assert_eq!(seen, vec![30, 50, 100]);
    }
}
