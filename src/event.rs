use crate::backend::wire::{AskReply, StatusReply, UploadReply};
use crate::backend::ApiResult;

/// Completion of a backend request, posted from the runtime to the UI thread.
#[derive(Debug)]
pub enum AppEvent {
    StatusLoaded(ApiResult<StatusReply>),
    UploadFinished(ApiResult<UploadReply>),
    AskFinished(ApiResult<AskReply>),
}
