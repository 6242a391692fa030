use std::time::Duration;
use tokio::time::Instant;

/// Дебаунс: устройства отключены, пока с последнего набора прошло не больше порога
#[derive(Debug, Clone)]
pub struct IdleTimer {
    threshold: Duration,
    last_activity: Option<Instant>,
}

impl IdleTimer {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            last_activity: None,
        }
    }

    /// Учесть результат опроса. Возвращает `true`, если устройства должны быть включены.
    pub fn update(&mut self, active: bool, now: Instant) -> bool {
        if active {
            self.last_activity = Some(now);
        }
        !self.is_within_threshold(now)
    }

    fn is_within_threshold(&self, now: Instant) -> bool {
        self.last_activity
            .map_or(false, |last| now <= last + self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: Duration = Duration::from_millis(1000);

    #[test]
    fn test_enabled_before_any_activity() {
        let mut timer = IdleTimer::new(THRESHOLD);
        assert!(timer.update(false, Instant::now()));
        assert!(timer.last_activity.is_none());
    }

    #[test]
    fn test_disabled_through_threshold_inclusive() {
        let t0 = Instant::now();
        let mut timer = IdleTimer::new(THRESHOLD);

        assert!(!timer.update(true, t0));
        for ms in [1, 500, 999, 1000] {
            assert!(!timer.update(false, t0 + Duration::from_millis(ms)), "t0 + {}ms", ms);
        }
        assert!(timer.update(false, t0 + Duration::from_millis(1001)));
        assert!(timer.update(false, t0 + Duration::from_secs(60)));
    }

    #[test]
    fn test_new_activity_extends_window() {
        let t0 = Instant::now();
        let mut timer = IdleTimer::new(THRESHOLD);

        timer.update(true, t0);
        assert!(!timer.update(true, t0 + Duration::from_millis(900)));
        assert!(!timer.update(false, t0 + Duration::from_millis(1800)));
        assert!(timer.update(false, t0 + Duration::from_millis(1901)));
    }
}
