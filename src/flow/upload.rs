use crate::backend::wire::UploadReply;
use crate::backend::{ApiResult, Outcome};
use crate::flow::error_text;
use crate::session::Session;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const NO_FILE_SELECTED: &str = "Please select a PDF file.";
pub const UPLOADING: &str = "Uploading and indexing PDF...";
const UPLOAD_SUCCEEDED: &str = "Upload successful.";
const UPLOAD_FAILED: &str = "Upload failed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub path: PathBuf,
    pub file_name: String,
}

#[derive(Debug, Default)]
pub struct UploadCoordinator {
    in_flight: Option<String>,
    status: String,
}

impl UploadCoordinator {
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn trigger_enabled(&self) -> bool {
        !self.is_busy()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Validates the selection and enters Busy. `None` means nothing is sent.
    pub fn begin(&mut self, selected: Option<&Path>) -> Option<UploadRequest> {
        if self.is_busy() {
            return None;
        }

        let Some(path) = selected.filter(|path| !path.as_os_str().is_empty()) else {
            self.status = NO_FILE_SELECTED.to_string();
            return None;
        };

        let file_name = local_file_name(path);
        self.in_flight = Some(file_name.clone());
        self.status = UPLOADING.to_string();
        Some(UploadRequest {
            path: path.to_path_buf(),
            file_name,
        })
    }

    pub fn finish(&mut self, session: &mut Session, result: ApiResult<UploadReply>) {
        let uploaded_name = self.in_flight.take();

        match result {
            Ok(Outcome::Success(reply)) => {
                let file_name = reply
                    .file_name
                    .filter(|name| !name.trim().is_empty())
                    .or(uploaded_name);
                session.set_active(file_name);
                self.status = reply
                    .message
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| UPLOAD_SUCCEEDED.to_string());
            }
            Ok(Outcome::ServerError { status, error }) => {
                warn!(status, error = ?error, "upload rejected");
                session.set_inactive();
                self.status = error_text(error, UPLOAD_FAILED);
            }
            Ok(Outcome::TransportError(message)) => {
                session.set_inactive();
                self.status = format!("Error: {message}");
            }
            Err(err) => {
                session.set_inactive();
                self.status = format!("Error: {err}");
            }
        }
    }
}

pub fn local_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
