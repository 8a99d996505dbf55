use std::time::{Duration, Instant};

/// Search budget to bound worst-case latency on pathological inputs.
/// Checked cooperatively between position stages; the inner loops never poll it.
#[derive(Debug, Clone)]
pub struct SearchBudget {
    start_time: Instant,
    max_wall_ms: Option<u64>,     // Maximum wall clock time in milliseconds
    max_expansions: Option<u64>,  // Maximum combinations tried across all stages

    // Progress tracking
    stages_done: usize,
    expansions_done: u64,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl SearchBudget {
    /// Create a new budget with specified limits
    pub fn new(max_wall_ms: Option<u64>, max_expansions: Option<u64>) -> Self {
        Self {
            start_time: Instant::now(),
            max_wall_ms,
            max_expansions,
            stages_done: 0,
            expansions_done: 0,
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None, None)
    }

    pub fn with_time_limit(max_wall_ms: u64) -> Self {
        Self::new(Some(max_wall_ms), None)
    }

    /// Reset the budget timer (for reuse)
    pub fn reset(&mut self) {
        self.start_time = Instant::now();
        self.stages_done = 0;
        self.expansions_done = 0;
    }

    /// Record a finished stage and check if we should continue
    #[inline]
    pub fn tick_stage(&mut self, expansions: u64) -> bool {
        self.stages_done += 1;
        self.expansions_done = self.expansions_done.saturating_add(expansions);
        !self.is_exceeded()
    }

    /// Check if any budget limit has been exceeded
    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.is_timeout() || self.is_expansion_overflow()
    }

    /// Check if wall clock time exceeded
    #[inline]
    pub fn is_timeout(&self) -> bool {
        match self.max_wall_ms {
            Some(limit) => self.start_time.elapsed() > Duration::from_millis(limit),
            None => false,
        }
    }

    #[inline]
    pub fn is_expansion_overflow(&self) -> bool {
        match self.max_expansions {
            Some(limit) => self.expansions_done > limit,
            None => false,
        }
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Get progress information: (stages, expansions, elapsed ms)
    pub fn get_progress(&self) -> (usize, u64, u64) {
        (self.stages_done, self.expansions_done, self.elapsed_ms())
    }

    /// Get reason for budget exceeded (if any)
    pub fn get_exceeded_reason(&self) -> Option<String> {
        if self.is_timeout() {
            Some(format!(
                "Wall clock timeout: {}ms > {}ms",
                self.elapsed_ms(),
                self.max_wall_ms.unwrap_or_default()
            ))
        } else if self.is_expansion_overflow() {
            Some(format!(
                "Expansion overflow: {} > {}",
                self.expansions_done,
                self.max_expansions.unwrap_or_default()
            ))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_unlimited_never_exceeds() {
        let mut budget = SearchBudget::unlimited();
        for _ in 0..10 {
            assert!(budget.tick_stage(u64::MAX / 4));
        }
        assert!(budget.get_exceeded_reason().is_none());
    }

    #[test]
    fn test_expansion_limit() {
        let mut budget = SearchBudget::new(None, Some(100));
        assert!(budget.tick_stage(60));
        assert!(!budget.tick_stage(60));
        assert!(budget.get_exceeded_reason().unwrap().contains("Expansion overflow"));
        assert_eq!(budget.get_progress().0, 2);
    }

    #[test]
    fn test_timeout_and_reset() {
        let mut budget = SearchBudget::with_time_limit(1);
        thread::sleep(Duration::from_millis(5));
        assert!(budget.is_timeout());
        assert!(budget.get_exceeded_reason().unwrap().starts_with("Wall clock timeout"));

        budget.reset();
        assert_eq!(budget.get_progress().1, 0);
    }
}
