use std::collections::VecDeque;

/// Bounded log that keeps only the most recent entries.
pub struct RecentLog<T> {
    entries: VecDeque<T>,
    cap: usize,
}

impl<T> RecentLog<T> {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            entries: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn record(&mut self, value: T) {
        if self.entries.len() == self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(value);
    }

    /// The newest `n` entries, oldest first.
    pub fn latest(&self, n: usize) -> impl Iterator<Item = &T> {
        self.entries.range(self.entries.len().saturating_sub(n)..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_newest() {
        let mut log = RecentLog::new(3);
        for v in 1..=5 {
            log.record(v);
        }
        assert_eq!(log.latest(usize::MAX).copied().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(log.latest(2).copied().collect::<Vec<_>>(), vec![4, 5]);
        assert_eq!(log.latest(0).count(), 0);
    }

    #[test]
    fn latest_on_short_log() {
        let mut log = RecentLog::new(8);
        assert_eq!(log.latest(4).count(), 0);
        log.record("purr");
        assert_eq!(log.latest(4).copied().collect::<Vec<_>>(), vec!["purr"]);
    }

    #[test]
    fn zero_capacity_still_holds_one() {
        let mut log = RecentLog::new(0);
        log.record(1);
        log.record(2);
        assert_eq!(log.latest(usize::MAX).copied().collect::<Vec<_>>(), vec![2]);
    }
}
