use crate::backend::wire::{AskReply, AskRequest};
use crate::backend::{ApiResult, Outcome};
use crate::flow::error_text;
use crate::session::Session;
use tracing::warn;

pub const EMPTY_QUESTION: &str = "Please type a question.";
pub const NO_ACTIVE_DOCUMENT: &str = "Please upload a PDF first.";
pub const UPLOAD_PENDING: &str = "Please wait for the upload to finish.";
pub const THINKING: &str = "Thinking...";
pub const NO_ANSWER: &str = "No answer returned.";
const SERVER_ERROR: &str = "Server error";

#[derive(Debug, Default)]
pub struct QuestionCoordinator {
    busy: bool,
    status: String,
    answer: Option<String>,
}

impl QuestionCoordinator {
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// The visible answer; `None` while hidden.
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    /// Validates the question against the session and enters Busy.
    /// Rejections only touch the status line; `None` means nothing is sent.
    pub fn begin(
        &mut self,
        question: &str,
        session: &Session,
        upload_in_flight: bool,
    ) -> Option<AskRequest> {
        if self.busy {
            return None;
        }

        let question = question.trim();
        if question.is_empty() {
            self.status = EMPTY_QUESTION.to_string();
            return None;
        }
        if !session.has_active_pdf() {
            self.status = NO_ACTIVE_DOCUMENT.to_string();
            return None;
        }
        if upload_in_flight {
            self.status = UPLOAD_PENDING.to_string();
            return None;
        }

        self.busy = true;
        self.status = THINKING.to_string();
        self.answer = None;
        Some(AskRequest {
            question: question.to_string(),
        })
    }

    pub fn finish(&mut self, session: &mut Session, result: ApiResult<AskReply>) {
        self.busy = false;

        match result {
            Ok(Outcome::Success(reply)) => {
                self.status.clear();
                if let Some(file_name) = reply.file_name.filter(|name| !name.trim().is_empty()) {
                    session.set_active(Some(file_name));
                }
                let answer = reply
                    .answer
                    .filter(|answer| !answer.is_empty())
                    .unwrap_or_else(|| NO_ANSWER.to_string());
                self.answer = Some(answer);
            }
            Ok(Outcome::ServerError { status, error }) => {
                warn!(status, error = ?error, "question rejected");
                self.status = error_text(error, SERVER_ERROR);
            }
            Ok(Outcome::TransportError(message)) => {
                self.status = format!("Error: {message}");
            }
            Err(err) => {
                self.status = format!("Error: {err}");
            }
        }
    }

    /// Drops the status line and hides the answer, e.g. when a new document
    /// is being uploaded.
    pub fn clear_display(&mut self) {
        self.status.clear();
        self.answer = None;
    }
}
