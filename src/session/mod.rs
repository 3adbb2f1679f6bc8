use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum DocumentState {
    #[default]
    None,
    Active {
        file_name: Option<String>,
    },
}

/// Client-side belief about which document, if any, the backend has indexed.
///
/// Owned by the app shell and lent to the coordinators by `&mut`. The file
/// name lives inside the active state, so it cannot outlive `set_inactive`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    document: DocumentState,
}

impl Session {
    pub fn has_active_pdf(&self) -> bool {
        matches!(self.document, DocumentState::Active { .. })
    }

    pub fn file_name(&self) -> Option<&str> {
        match &self.document {
            DocumentState::Active { file_name } => file_name.as_deref(),
            DocumentState::None => None,
        }
    }

    pub fn set_active(&mut self, file_name: Option<String>) {
        let file_name = file_name.filter(|name| !name.trim().is_empty());
        info!(file_name = ?file_name, "session active");
        self.document = DocumentState::Active { file_name };
    }

    pub fn set_inactive(&mut self) {
        if self.has_active_pdf() {
            info!("session inactive");
        }
        self.document = DocumentState::None;
    }

    pub fn active_document_label(&self) -> String {
        match &self.document {
            DocumentState::Active {
                file_name: Some(name),
            } => format!("Active document: {name}"),
            DocumentState::Active { file_name: None } => "Active document loaded.".to_string(),
            DocumentState::None => "No document loaded yet.".to_string(),
        }
    }
}
