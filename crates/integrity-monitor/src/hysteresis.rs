//! Debounced trigger

/// Fires once after `threshold` consecutive qualifying ticks
///
/// A single non-qualifying tick cancels the incident in progress. The
/// counter is reset when the gate fires, so it always stays below the
/// threshold between ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HysteresisGate {
    threshold: u32,
    count: u32,
}

impl HysteresisGate {
    /// A threshold of zero behaves like one (fire on the first qualifying tick)
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            count: 0,
        }
    }

    /// Feed one tick; returns `true` on the tick that fires
    pub fn observe(&mut self, qualifies: bool) -> bool {
        if !qualifies {
            self.count = 0;
            return false;
        }

        self.count += 1;
        if self.count >= self.threshold {
            self.count = 0;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_on_threshold_then_rearms() {
        let mut gate = HysteresisGate::new(3);
        assert!(!gate.observe(true));
        assert!(!gate.observe(true));
        assert!(gate.observe(true));
        assert_eq!(gate.count(), 0);

        // A fresh incident needs the full run again
        assert!(!gate.observe(true));
        assert!(!gate.observe(true));
        assert!(gate.observe(true));
    }

    #[test]
    fn test_single_miss_cancels_incident() {
        let mut gate = HysteresisGate::new(3);
        gate.observe(true);
        gate.observe(true);
        assert_eq!(gate.count(), 2);

        assert!(!gate.observe(false));
        assert_eq!(gate.count(), 0);
        assert!(!gate.observe(true));
        assert!(!gate.observe(true));
    }

    #[test]
    fn test_counter_is_monotonic_while_qualifying() {
        let mut gate = HysteresisGate::new(10);
        let mut last = 0;
        for _ in 0..9 {
            gate.observe(true);
            assert!(gate.count() > last);
            assert!(gate.count() <= gate.threshold());
            last = gate.count();
        }
    }

    #[test]
    fn test_zero_threshold_fires_immediately() {
        let mut gate = HysteresisGate::new(0);
        assert_eq!(gate.threshold(), 1);
        assert!(gate.observe(true));
    }
}
