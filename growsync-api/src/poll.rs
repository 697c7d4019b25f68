use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between an answered ping and the next one (milliseconds)
    pub interval_ms: u64,
    /// Consecutive misses before the heartbeat is considered stale
    pub miss_threshold: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5000, // 5 seconds
            miss_threshold: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Waiting for the first answer to arm the clock
    Idle,
    /// Next ping is due at the given time
    Armed { due_at: u64 },
    /// A ping was emitted and has not been answered yet
    Firing { since: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollHealth {
    Healthy,
    /// Misses reached the configured threshold
    Stale,
}

/// Emitted once per poll cycle; the owner must answer with `pong` or `miss`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ping {
    pub at: u64,
}

/// Heartbeat clock for one environment session.
///
/// Time is supplied by the owner as a monotonic millisecond counter, so the
/// timer itself never sleeps.
#[derive(Debug, Clone)]
pub struct PollTimer {
    config: PollConfig,
    state: PollState,
    consecutive_misses: u32,
    last_pong: Option<u64>,
}

impl PollTimer {
    pub fn new(config: PollConfig) -> Self {
        Self {
            config,
            state: PollState::Idle,
            consecutive_misses: 0,
            last_pong: None,
        }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// When the next ping becomes due, if the clock is armed.
    pub fn next_deadline(&self) -> Option<u64> {
        match self.state {
            PollState::Armed { due_at } => Some(due_at),
            _ => None,
        }
    }

    /// Emit a ping if one is due. At most one ping is outstanding at a time.
    pub fn poll(&mut self, now: u64) -> Option<Ping> {
        match self.state {
            PollState::Armed { due_at } if now >= due_at => {
                self.state = PollState::Firing { since: now };
                Some(Ping { at: now })
            }
            _ => None,
        }
    }

    /// Successful answer: reset the heartbeat and re-arm.
    pub fn pong(&mut self, now: u64) {
        self.consecutive_misses = 0;
        self.last_pong = Some(now);
        self.arm(now);
    }

    /// Failed answer: count the miss and re-arm, so the next ping doubles as a retry.
    pub fn miss(&mut self, now: u64) -> PollHealth {
        self.consecutive_misses = self.consecutive_misses.saturating_add(1);
        self.arm(now);
        self.health()
    }

    pub fn health(&self) -> PollHealth {
        if self.consecutive_misses >= self.config.miss_threshold.max(1) {
            PollHealth::Stale
        } else {
            PollHealth::Healthy
        }
    }

    pub fn consecutive_misses(&self) -> u32 {
        self.consecutive_misses
    }

    pub fn last_pong(&self) -> Option<u64> {
        self.last_pong
    }

    pub fn reset(&mut self) {
        self.state = PollState::Idle;
        self.consecutive_misses = 0;
        self.last_pong = None;
    }

    fn arm(&mut self, now: u64) {
        self.state = PollState::Armed {
            due_at: now.saturating_add(self.config.interval_ms),
        };
    }
}

impl Default for PollTimer {
    fn default() -> Self {
        Self::new(PollConfig::default())
    }
}
