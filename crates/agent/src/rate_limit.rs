//! Per-session rate limiting: a short cooldown between messages, a sliding
//! one-minute message window, and a sliding one-hour cap on booking-flow
//! starts. Sessions are isolated, so no cross-session bookkeeping exists.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use medbook_core::config::LimitsConfig;

const MESSAGE_WINDOW: Duration = Duration::from_secs(60);
const BOOKING_WINDOW: Duration = Duration::from_secs(3600);

pub struct RateLimiter {
    max_messages_per_minute: usize,
    max_bookings_per_hour: usize,
    cooldown: Duration,
    message_times: VecDeque<Instant>,
    booking_times: VecDeque<Instant>,
    last_message: Option<Instant>,
}

impl RateLimiter {
    pub fn new(limits: &LimitsConfig) -> Self {
        Self {
            max_messages_per_minute: limits.max_messages_per_minute as usize,
            max_bookings_per_hour: limits.max_bookings_per_hour as usize,
            cooldown: Duration::from_secs(limits.cooldown_secs),
            message_times: VecDeque::new(),
            booking_times: VecDeque::new(),
            last_message: None,
        }
    }

    /// Check whether another message may be processed now. Returns the
    /// user-facing refusal on a limit hit.
    pub fn check_message(&mut self) -> Result<(), String> {
        self.check_message_at(Instant::now())
    }

    pub fn record_message(&mut self) {
        self.record_message_at(Instant::now());
    }

    pub fn check_booking(&mut self) -> Result<(), String> {
        self.check_booking_at(Instant::now())
    }

    pub fn record_booking(&mut self) {
        self.booking_times.push_back(Instant::now());
    }

    fn check_message_at(&mut self, now: Instant) -> Result<(), String> {
        if let Some(last) = self.last_message {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.cooldown {
                let remaining = (self.cooldown - elapsed).as_secs_f64();
                return Err(format!(
                    "Please wait {remaining:.1} seconds before sending another message."
                ));
            }
        }

        prune(&mut self.message_times, now, MESSAGE_WINDOW);
        if self.message_times.len() >= self.max_messages_per_minute {
            return Err(format!(
                "Rate limit exceeded. Please wait a moment before sending more messages. \
                 (Max {} messages per minute)",
                self.max_messages_per_minute
            ));
        }

        Ok(())
    }

    fn record_message_at(&mut self, now: Instant) {
        self.message_times.push_back(now);
        self.last_message = Some(now);
    }

    fn check_booking_at(&mut self, now: Instant) -> Result<(), String> {
        prune(&mut self.booking_times, now, BOOKING_WINDOW);
        if self.booking_times.len() >= self.max_bookings_per_hour {
            return Err(format!(
                "You've made too many booking attempts. Please wait before trying again. \
                 (Max {} bookings per hour)",
                self.max_bookings_per_hour
            ));
        }
        Ok(())
    }
}

fn prune(times: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = times.front() {
        if now.saturating_duration_since(*oldest) > window {
            times.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use medbook_core::config::LimitsConfig;

    use super::RateLimiter;

    fn limits() -> LimitsConfig {
        LimitsConfig { max_messages_per_minute: 3, max_bookings_per_hour: 2, cooldown_secs: 2 }
    }

    #[test]
    fn cooldown_blocks_rapid_messages() {
        let mut limiter = RateLimiter::new(&limits());
        let start = Instant::now();

        assert!(limiter.check_message_at(start).is_ok());
        limiter.record_message_at(start);

        let refusal = limiter.check_message_at(start + Duration::from_millis(500)).unwrap_err();
        assert!(refusal.contains("Please wait"));

        assert!(limiter.check_message_at(start + Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn message_window_caps_throughput() {
        let mut limiter = RateLimiter::new(&limits());
        let start = Instant::now();

        for i in 0..3 {
            let at = start + Duration::from_secs(i * 3);
            assert!(limiter.check_message_at(at).is_ok());
            limiter.record_message_at(at);
        }

        let refusal = limiter.check_message_at(start + Duration::from_secs(12)).unwrap_err();
        assert!(refusal.contains("Rate limit exceeded"));

        // the window slides: a minute after the first message there is room
        assert!(limiter.check_message_at(start + Duration::from_secs(70)).is_ok());
    }

    #[test]
    fn booking_attempts_are_capped_per_hour() {
        let mut limiter = RateLimiter::new(&limits());
        let start = Instant::now();

        assert!(limiter.check_booking_at(start).is_ok());
        limiter.booking_times.push_back(start);
        assert!(limiter.check_booking_at(start).is_ok());
        limiter.booking_times.push_back(start + Duration::from_secs(1));

        let refusal = limiter.check_booking_at(start + Duration::from_secs(2)).unwrap_err();
        assert!(refusal.contains("too many booking attempts"));

        assert!(limiter.check_booking_at(start + Duration::from_secs(3700)).is_ok());
    }
}
