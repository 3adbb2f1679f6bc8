use crate::backend::BackendClient;
use crate::event::AppEvent;
use crate::flow::{QuestionCoordinator, StatusBootstrapper, UploadCoordinator};
use crate::session::Session;
use crate::theme::Theme;
use eframe::egui::{self, RichText};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;
use tracing::warn;

const PENDING_REPAINT: Duration = Duration::from_millis(100);

pub struct DocQaApp {
    rx: Receiver<AppEvent>,
    backend: BackendClient,
    server_url: String,
    theme: Theme,
    theme_applied: bool,
    session: Session,
    bootstrapper: StatusBootstrapper,
    upload: UploadCoordinator,
    question: QuestionCoordinator,
    file_input: String,
    question_input: String,
}

impl DocQaApp {
    pub fn new(rx: Receiver<AppEvent>, backend: BackendClient, server_url: String) -> Self {
        let mut app = Self {
            rx,
            backend,
            server_url,
            theme: Theme::default(),
            theme_applied: false,
            session: Session::default(),
            bootstrapper: StatusBootstrapper::default(),
            upload: UploadCoordinator::default(),
            question: QuestionCoordinator::default(),
            file_input: String::new(),
            question_input: String::new(),
        };

        if app.bootstrapper.begin() {
            app.backend.fetch_status();
        }

        app
    }

    fn selected_file(&self) -> Option<PathBuf> {
        let trimmed = self.file_input.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }

    fn submit_upload(&mut self) {
        let selected = self.selected_file();
        let Some(request) = self.upload.begin(selected.as_deref()) else {
            return;
        };

        self.bootstrapper.supersede();
        self.question.clear_display();
        self.backend.upload(request.path, request.file_name);
    }

    fn submit_question(&mut self) {
        let Some(request) =
            self.question
                .begin(&self.question_input, &self.session, self.upload.is_busy())
        else {
            return;
        };

        self.backend.ask(request);
    }

    fn drain_events(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::StatusLoaded(result) => self.bootstrapper.finish(&mut self.session, result),
            AppEvent::UploadFinished(result) => self.upload.finish(&mut self.session, result),
            AppEvent::AskFinished(result) => self.question.finish(&mut self.session, result),
        }
    }

    fn any_request_pending(&self) -> bool {
        self.bootstrapper.is_pending() || self.upload.is_busy() || self.question.is_busy()
    }

    fn collect_dropped_file(&mut self, ctx: &egui::Context) {
        if self.upload.is_busy() {
            return;
        }
        let dropped = ctx.input(|input| {
            input
                .raw
                .dropped_files
                .iter()
                .find_map(|file| file.path.clone())
        });
        if let Some(path) = dropped {
            self.file_input = path.display().to_string();
        }
    }

    fn active_document_line(&self) -> String {
        if self.upload.is_busy() {
            String::new()
        } else {
            self.session.active_document_label()
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        let document_label = self.active_document_line();

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Document Q&A");
                ui.separator();
                ui.label(RichText::new(&self.server_url).color(self.theme.text_muted));
                ui.separator();
                let color = if self.session.has_active_pdf() {
                    self.theme.success
                } else {
                    self.theme.text_muted
                };
                ui.label(RichText::new(document_label).color(color));
            });
        });
    }

    fn render_upload_card(&mut self, ui: &mut egui::Ui) {
        self.theme.card_frame().show(ui, |ui| {
            ui.heading("1. Upload a PDF");
            let mut upload_now = false;
            ui.horizontal(|ui| {
                ui.add_enabled(
                    self.upload.trigger_enabled(),
                    egui::TextEdit::singleline(&mut self.file_input)
                        .desired_width(ui.available_width() - 110.0)
                        .hint_text("Path to a PDF, or drop one on the window"),
                );
                upload_now = ui
                    .add_enabled(self.upload.trigger_enabled(), egui::Button::new("Upload"))
                    .clicked();
            });
            if upload_now {
                self.submit_upload();
            }

            let status = self.upload.status();
            if !status.is_empty() {
                ui.label(RichText::new(status).color(self.theme.status_color(status)));
            }
        });
    }

    fn render_question_card(&mut self, ui: &mut egui::Ui) {
        let ask_enabled = !self.question.is_busy() && !self.upload.is_busy();

        self.theme.card_frame().show(ui, |ui| {
            ui.heading("2. Ask a question");
            let mut ask_now = false;
            ui.horizontal(|ui| {
                let response = ui.add_enabled(
                    !self.question.is_busy(),
                    egui::TextEdit::singleline(&mut self.question_input)
                        .desired_width(ui.available_width() - 90.0)
                        .hint_text("What would you like to know?"),
                );
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    ask_now = true;
                }
                ask_now |= ui
                    .add_enabled(ask_enabled, egui::Button::new("Ask"))
                    .clicked();
            });
            // Enter reaches validation even while an upload is in flight.
            if ask_now && !self.question.is_busy() {
                self.submit_question();
            }

            let status = self.question.status();
            if !status.is_empty() {
                ui.label(RichText::new(status).color(self.theme.status_color(status)));
            }
        });
    }

    fn render_answer_card(&self, ui: &mut egui::Ui) {
        let Some(answer) = self.question.answer() else {
            return;
        };

        self.theme.card_frame().show(ui, |ui| {
            ui.heading("Answer");
            egui::ScrollArea::vertical()
                .id_salt("answer_text")
                .max_height(ui.available_height())
                .show(ui, |ui| {
                    ui.label(answer);
                });
        });
    }
}

impl eframe::App for DocQaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.theme_applied {
            self.theme.apply_visuals(ctx);
            self.theme_applied = true;
        }

        self.drain_events();
        self.collect_dropped_file(ctx);
        self.render_top_bar(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(self.theme.spacing_8);
            self.render_upload_card(ui);
            ui.add_space(self.theme.spacing_8);
            self.render_question_card(ui);
            ui.add_space(self.theme.spacing_8);
            self.render_answer_card(ui);
        });

        if self.any_request_pending() {
            ctx.request_repaint_after(PENDING_REPAINT);
        }
    }
}
