use cueroom_state::Intent;
use cueroom_wire::Envelope;
use tracing::debug;

use crate::room::Core;

/// How a submitted intent turns into effect.
///
/// The room selects an executor per dispatch based on its current role,
/// so a participant whose role changes between sessions never carries
/// stale behavior.
pub(crate) trait IntentExecutor {
    fn execute(&self, core: &mut Core, intent: Intent, now_ms: u64);
}

/// Host-side execution: apply against the canonical document, then
/// persist and broadcast the result.
pub(crate) struct LocalExecutor;

impl IntentExecutor for LocalExecutor {
    fn execute(&self, core: &mut Core, intent: Intent, now_ms: u64) {
        let mut next = core.state().clone();
        match cueroom_state::apply(&mut next, &intent, now_ms) {
            Ok(()) => core.commit(next),
            Err(rejection) => {
                // Refused mutations are silent. The document is
                // unchanged, so there is nothing to broadcast.
                debug!(%rejection, "mutation refused");
            }
        }
    }
}

/// Viewer-side execution: wrap the intent in a command envelope and
/// send it upstream. The local replica is never touched.
pub(crate) struct RelayExecutor;

impl IntentExecutor for RelayExecutor {
    fn execute(&self, core: &mut Core, intent: Intent, _now_ms: u64) {
        core.send_upstream(&Envelope::Command(intent));
    }
}
