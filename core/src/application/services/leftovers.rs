//! Per-run registry of ephemeral remote paths, removed at end of run.
//!
//! A failed delete does not stop the others: every registered path gets a
//! delete attempt and all failures are reported together.

use crate::application::action::{Action, Step};
use crate::application::services::files::delete_file;
use crate::domain::error::ValidationError;

/// Record `path` for removal by [`cleanup_leftovers`].
#[must_use]
pub fn add_leftover(path: &str) -> Action {
    if path.is_empty() {
        return Action::fail(ValidationError::EmptyRemotePath {
            operation: "leftover registration",
        });
    }
    Step::AddLeftover(path.to_string()).into()
}

/// Delete every registered leftover, in registration order.
///
/// Does nothing (and says nothing) when the registry is empty. The registry
/// is drained when the step runs, and every drained path gets its delete
/// even if the run is cancelled meanwhile.
#[must_use]
pub fn cleanup_leftovers() -> Action {
    Action::deferred(|state| {
        let leftovers = state.take_leftovers();
        if leftovers.is_empty() {
            return Action::noop();
        }
        // Cleanup section: cancellation must not skip paths already taken
        // off the registry.
        Action::guarded(
            Action::noop(),
            Action::Sequence(vec![
                Action::info("Removing leftovers..."),
                Action::Collect(leftovers.iter().map(|path| delete_file(path)).collect()),
            ]),
        )
    })
}
