use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatusReply {
    #[serde(default)]
    pub has_pdf: bool,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UploadReply {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AskReply {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// Body of any non-2xx reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorReply {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AskRequest {
    pub question: String,
}
