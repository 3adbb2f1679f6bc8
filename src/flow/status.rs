use crate::backend::wire::StatusReply;
use crate::backend::{ApiResult, Outcome};
use crate::session::Session;
use tracing::debug;

/// One-shot probe of the backend's document state at startup.
#[derive(Debug, Default)]
pub struct StatusBootstrapper {
    started: bool,
    pending: bool,
    superseded: bool,
}

impl StatusBootstrapper {
    /// Returns `true` the first time only; the probe is never repeated.
    pub fn begin(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        self.pending = true;
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Marks the probe stale: the user started an upload, which decides the
    /// session from now on.
    pub fn supersede(&mut self) {
        self.superseded = true;
    }

    pub fn finish(&mut self, session: &mut Session, result: ApiResult<StatusReply>) {
        self.pending = false;
        if self.superseded {
            debug!("status probe arrived after an upload started; ignored");
            return;
        }
        match result {
            Ok(Outcome::Success(reply)) if reply.has_pdf => session.set_active(reply.file_name),
            Ok(Outcome::Success(_)) => session.set_inactive(),
            // A missing document is a normal fresh start, so failures stay quiet.
            Ok(Outcome::ServerError { status, error }) => {
                debug!(status, error = ?error, "status probe rejected");
            }
            Ok(Outcome::TransportError(message)) => {
                debug!("status probe unreachable: {message}");
            }
            Err(err) => {
                debug!("status probe unusable: {err}");
            }
        }
    }
}
