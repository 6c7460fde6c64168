// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Submission progress indicator.
//!
//! This is a simulation: the value climbs by a fixed increment on a timer
//! while the gateway works and is not tied to bytes uploaded. It stops at
//! [`SIMULATED_CEILING`] until the submission completes (100) or fails (0).

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub const TICK_INTERVAL: Duration = Duration::from_millis(200);
pub const TICK_STEP: u8 = 5;
pub const SIMULATED_CEILING: u8 = 95;

#[derive(Debug, Clone, Default)]
pub struct SimulatedProgress {
    value: Arc<AtomicU8>,
    ticker: Arc<Mutex<Option<CancellationToken>>>,
}

impl SimulatedProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> u8 {
        self.value.load(Ordering::Relaxed)
    }

    /// Reset to 0 and start ticking. A ticker left from an earlier attempt
    /// is stopped first.
    pub fn start(&self) {
        let token = CancellationToken::new();
        self.replace_ticker(Some(token.clone()));
        self.value.store(0, Ordering::Relaxed);

        let value = self.value.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let _ = value.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                            (v < SIMULATED_CEILING)
                                .then(|| v.saturating_add(TICK_STEP).min(SIMULATED_CEILING))
                        });
                    }
                }
            }
        });
    }

    pub fn complete(&self) {
        self.replace_ticker(None);
        self.value.store(100, Ordering::Relaxed);
    }

    pub fn fail(&self) {
        self.replace_ticker(None);
        self.value.store(0, Ordering::Relaxed);
    }

    fn replace_ticker(&self, next: Option<CancellationToken>) {
        let previous = match self.ticker.lock() {
            Ok(mut guard) => std::mem::replace(&mut *guard, next),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), next),
        };
        if let Some(token) = previous {
            token.cancel();
        }
    }
}
