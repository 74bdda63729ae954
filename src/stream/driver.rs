// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant as TokioInstant;

use super::{Handled, Increment, StreamCoordinator, StreamSink};

// Placeholder deadline for the disabled timer branch; the branch guard
// keeps it from ever firing.
const IDLE_SLEEP: Duration = Duration::from_secs(3600);

/// Drive a coordinator from an increment channel on the current task.
///
/// The coalescing sleep is the only suspension point besides the channel
/// itself: at most one deadline is pending, a deferred preview replaces
/// the pending payload but keeps the deadline, and finalization clears it
/// synchronously. Returns the coordinator when the producer hangs up.
pub async fn drive<S: StreamSink>(
    mut coordinator: StreamCoordinator<S>,
    mut increments: mpsc::Receiver<Increment>,
) -> StreamCoordinator<S> {
    let mut deadline: Option<TokioInstant> = None;

    loop {
        tokio::select! {
            received = increments.recv() => {
                let Some(increment) = received else {
                    // Producer hung up; render any still-pending preview
                    // before handing the coordinator back.
                    coordinator.flush_preview(TokioInstant::now().into_std());
                    return coordinator;
                };
                let now = TokioInstant::now().into_std();
                match coordinator.handle_increment(increment, now) {
                    Handled::PreviewDeferred { deadline: due } => {
                        deadline = Some(TokioInstant::from_std(due));
                    }
                    Handled::Ignored => {}
                    Handled::PreviewRendered
                    | Handled::Committed { .. }
                    | Handled::Rejected { .. } => deadline = None,
                }
            }
            _ = tokio::time::sleep_until(
                deadline.unwrap_or_else(|| TokioInstant::now() + IDLE_SLEEP)
            ), if deadline.is_some() => {
                coordinator.flush_preview(TokioInstant::now().into_std());
                deadline = None;
            }
        }
    }
}
