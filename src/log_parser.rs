//! Engine output parsing
//!
//! The engine prints its statistics as log lines, for example
//!
//! ```text
//! [2025-01-04 12:00:00.000]  miner    speed 10s/60s/15m 316.3 335.9 n/a H/s max 348.0 H/s
//! [2025-01-04 12:00:01.000]  cpu      accepted (3/0) diff 75000 (104 ms)
//! [2025-01-04 12:00:02.000]  net      new job from pool.example:3333 diff 75000 algo rx/0 height 3301234
//! ```
//!
//! Recognized lines become [`EngineEvent`]s that are folded into a
//! [`StatsCache`]. Anything else is ignored.

use crate::stats::StatsCache;

/// Statistic carried by one engine output line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    /// Hash rate windows in H/s (`n/a` reported as zero)
    Hashrate {
        /// 10-second window
        h10s: f64,
        /// 60-second window
        h60s: f64,
        /// 15-minute window
        h15m: f64,
    },
    /// A share was accepted
    Accepted {
        /// Cumulative `(accepted, rejected)` counts when the line carries them
        totals: Option<(u64, u64)>,
        /// Share difficulty
        difficulty: Option<u64>,
    },
    /// A share was rejected
    Rejected {
        /// Cumulative `(accepted, rejected)` counts when the line carries them
        totals: Option<(u64, u64)>,
    },
    /// The pool sent a new job
    NewJob {
        /// Job difficulty
        difficulty: u64,
    },
}

impl EngineEvent {
    /// Fold this event into the cache
    pub fn apply(&self, stats: &StatsCache) {
        match *self {
            EngineEvent::Hashrate { h10s, h60s, h15m } => stats.set_hashrate(h10s, h60s, h15m),
            EngineEvent::Accepted { totals, difficulty } => {
                match totals {
                    Some((accepted, rejected)) => stats.set_shares(accepted, rejected),
                    None => stats.record_accepted(),
                }
                if let Some(difficulty) = difficulty {
                    stats.set_difficulty(difficulty);
                }
            }
            EngineEvent::Rejected { totals } => match totals {
                Some((accepted, rejected)) => stats.set_shares(accepted, rejected),
                None => stats.record_rejected(),
            },
            EngineEvent::NewJob { difficulty } => stats.set_difficulty(difficulty),
        }
    }
}

/// Parse one line of engine output
pub fn parse_line(line: &str) -> Option<EngineEvent> {
    let lower = line.to_ascii_lowercase();
    let tokens: Vec<&str> = lower.split_whitespace().collect();

    if lower.contains("accepted") {
        return Some(EngineEvent::Accepted {
            totals: share_totals(&tokens),
            difficulty: difficulty(&tokens),
        });
    }

    if lower.contains("rejected") {
        return Some(EngineEvent::Rejected {
            totals: share_totals(&tokens),
        });
    }

    if lower.contains("speed") {
        return hashrate(&tokens);
    }

    if lower.contains("job") {
        return difficulty(&tokens).map(|difficulty| EngineEvent::NewJob { difficulty });
    }

    None
}

/// Parse `line` and fold the result into `stats`; returns whether it matched
pub fn apply_line(line: &str, stats: &StatsCache) -> bool {
    match parse_line(line) {
        Some(event) => {
            event.apply(stats);
            true
        }
        None => false,
    }
}

// "speed 10s/60s/15m A B C <unit>"
fn hashrate(tokens: &[&str]) -> Option<EngineEvent> {
    let start = tokens
        .windows(2)
        .position(|pair| pair[0] == "speed" && pair[1] == "10s/60s/15m")?;
    let values = tokens.get(start + 2..start + 6)?;

    let scale = unit_scale(values[3])?;
    let window = |raw: &str| -> Option<f64> {
        if raw == "n/a" {
            Some(0.0)
        } else {
            raw.parse::<f64>().ok().map(|v| v * scale)
        }
    };

    Some(EngineEvent::Hashrate {
        h10s: window(values[0])?,
        h60s: window(values[1])?,
        h15m: window(values[2])?,
    })
}

fn unit_scale(unit: &str) -> Option<f64> {
    match unit {
        "h/s" => Some(1.0),
        "kh/s" => Some(1_000.0),
        "mh/s" => Some(1_000_000.0),
        _ => None,
    }
}

// "diff 75000"
fn difficulty(tokens: &[&str]) -> Option<u64> {
    tokens
        .windows(2)
        .find(|pair| pair[0] == "diff")
        .and_then(|pair| pair[1].parse().ok())
}

// "(3/1)"
fn share_totals(tokens: &[&str]) -> Option<(u64, u64)> {
    tokens.iter().find_map(|token| {
        let inner = token.strip_prefix('(')?.strip_suffix(')')?;
        let (accepted, rejected) = inner.split_once('/')?;
        Some((accepted.parse().ok()?, rejected.parse().ok()?))
    })
}
