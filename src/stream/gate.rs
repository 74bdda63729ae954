// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::{Duration, Instant};

/// Coalescing policy for speculative previews: at most one render per
/// interval. Pure over injected instants so the policy is deterministic
/// under test; the driver owns the actual timer.
#[derive(Debug)]
pub(crate) struct PreviewGate {
    interval: Duration,
    last: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GateDecision {
    RenderNow,
    Defer(Instant),
}

impl PreviewGate {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Decide whether a preview may render at `now`. Rendering is
    /// recorded; a deferred decision is not (the flush records it).
    pub(crate) fn poll(&mut self, now: Instant) -> GateDecision {
        match self.last {
            Some(last) => {
                let due = last + self.interval;
                if now < due {
                    GateDecision::Defer(due)
                } else {
                    self.last = Some(now);
                    GateDecision::RenderNow
                }
            }
            None => {
                self.last = Some(now);
                GateDecision::RenderNow
            }
        }
    }

    /// Record a render performed by a timer flush.
    pub(crate) fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }

    pub(crate) fn reset(&mut self) {
        self.last = None;
    }
}
