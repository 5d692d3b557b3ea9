mod config;
mod error;
mod markdown;
mod openai;
mod transcript;

use iced::widget::text::Span;
use iced::widget::{
    button, column, container, rich_text, row, scrollable, span, text, text_editor, text_input,
    text_input::Id,
};
use iced::{
    clipboard, font, time, window, Color, Element, Font, Length, Size, Subscription, Task, Theme,
};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ChatError;
use crate::transcript::{ChatEntry, Sender, Transcript};

const BOLD: Font = Font {
    family: font::Family::SansSerif,
    weight: font::Weight::Bold,
    stretch: font::Stretch::Normal,
    style: font::Style::Normal,
};

const USER_LABEL: Color = Color {
    r: 0.07,
    g: 0.45,
    b: 0.20,
    a: 1.0,
};

const AI_LABEL: Color = Color {
    r: 0.0,
    g: 0.37,
    b: 0.67,
    a: 1.0,
};

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

fn main() -> iced::Result {
    let config = config::Config::load();

    // Missing credential is a fatal precondition; refuse to start degraded.
    let api_key = match config::Config::api_key() {
        Ok(key) => key,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = openai::validate_model(&config.openai.model) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let window_settings = window::Settings {
        size: Size::new(config.window.width as f32, config.window.height as f32),
        min_size: Some(Size::new(
            config.window.min_width as f32,
            config.window.min_height as f32,
        )),
        position: window::Position::Centered,
        ..Default::default()
    };

    iced::application("Data Chatbot", App::update, App::view)
        .theme(App::theme)
        .subscription(App::subscription)
        .window(window_settings)
        .run_with(move || App::new(config, api_key))
}

#[derive(Debug, Clone)]
enum Message {
    DataEdited(text_editor::Action),
    PasteData,
    DataPasted(Option<String>),
    QuestionChanged(String),
    Send,
    CopyTranscript,
    ResponseReceived(String),
    ServiceFailed(String),
    ClearChat,
    Tick,
}

struct App {
    data: text_editor::Content,
    question: String,
    transcript: Transcript,
    status: String,
    is_loading: bool,
    loading_frame: usize,
    client: Arc<openai::OpenAiClient>,
    input_id: Id,
}

fn validate_inputs(data: &str, question: &str) -> Result<(), ChatError> {
    if data.trim().is_empty() {
        return Err(ChatError::EmptyInput { field: "data" });
    }
    if question.trim().is_empty() {
        return Err(ChatError::EmptyInput { field: "question" });
    }
    Ok(())
}

impl App {
    fn new(config: config::Config, api_key: String) -> (Self, Task<Message>) {
        let client = openai::OpenAiClient::with_config(
            config.openai.api_base.clone(),
            api_key,
            config.openai.model.clone(),
        );

        let input_id = Id::unique();

        let app = App {
            data: text_editor::Content::new(),
            question: String::new(),
            transcript: Transcript::new(),
            status: String::new(),
            is_loading: false,
            loading_frame: 0,
            client: Arc::new(client),
            input_id: input_id.clone(),
        };

        (app, text_input::focus(input_id))
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::DataEdited(action) => {
                self.data.perform(action);
                Task::none()
            }
            Message::PasteData => clipboard::read().map(Message::DataPasted),
            Message::DataPasted(contents) => {
                match contents.filter(|c| !c.is_empty()) {
                    Some(contents) => {
                        self.data = text_editor::Content::with_text(&contents);
                        self.status = "Clipboard content pasted.".to_string();
                    }
                    None => self.status = "Clipboard is empty.".to_string(),
                }
                Task::none()
            }
            Message::QuestionChanged(value) => {
                self.question = value;
                Task::none()
            }
            Message::Send => {
                // A send while a call is in flight is rejected outright.
                if self.is_loading {
                    return Task::none();
                }

                let data = self.data.text().trim().to_string();
                let question = self.question.trim().to_string();
                if let Err(e) = validate_inputs(&data, &question) {
                    self.status = e.to_string();
                    return Task::none();
                }

                self.transcript.append(Sender::User, &question);
                self.question.clear();
                self.is_loading = true;
                self.status = String::new();

                let client = self.client.clone();
                Task::future(async move {
                    match client.ask(&data, &question).await {
                        Ok(answer) => Message::ResponseReceived(answer),
                        Err(e) => Message::ServiceFailed(e.to_string()),
                    }
                })
            }
            Message::CopyTranscript => clipboard::write(self.transcript.render_all()),
            Message::ResponseReceived(answer) => {
                self.transcript.append(Sender::Assistant, &answer);
                self.is_loading = false;
                self.status = "AI response received.".to_string();
                Task::none()
            }
            Message::ServiceFailed(detail) => {
                self.transcript
                    .append(Sender::Assistant, &format!("Error: {}", detail));
                self.is_loading = false;
                self.status = detail;
                Task::none()
            }
            Message::ClearChat => {
                self.transcript.clear();
                self.status = "Chat cleared.".to_string();
                Task::none()
            }
            Message::Tick => {
                if self.is_loading {
                    self.loading_frame = (self.loading_frame + 1) % SPINNER_FRAMES.len();
                }
                Task::none()
            }
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        if self.is_loading {
            time::every(Duration::from_millis(80)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        }
    }

    fn view(&self) -> Element<Message> {
        let data_pane = column![
            text("Paste your data (CSV, TSV, or any table):").size(14),
            text_editor(&self.data)
                .placeholder("Paste or load your file content here...")
                .on_action(Message::DataEdited)
                .font(Font::MONOSPACE)
                .height(Length::Fill),
            row![button(text("Paste").size(14)).on_press(Message::PasteData)],
        ]
        .spacing(8)
        .width(Length::FillPortion(2));

        let chat_pane = column![
            text("Ask questions about your data:").size(14),
            scrollable(self.view_transcript())
                .height(Length::Fill)
                .width(Length::Fill),
            row![
                text_input("Type your question...", &self.question)
                    .on_input(Message::QuestionChanged)
                    .on_submit(Message::Send)
                    .padding(10)
                    .id(self.input_id.clone()),
                button(text("Send").size(14)).on_press(Message::Send),
                button(text("Copy").size(14)).on_press(Message::CopyTranscript),
                button(text("Clear").size(14)).on_press(Message::ClearChat),
            ]
            .spacing(8),
        ]
        .spacing(8)
        .width(Length::FillPortion(3));

        let status_line = if self.is_loading {
            format!(
                "{} Waiting for AI response...",
                SPINNER_FRAMES[self.loading_frame % SPINNER_FRAMES.len()]
            )
        } else {
            self.status.clone()
        };

        container(
            column![
                row![data_pane, chat_pane].spacing(12).height(Length::Fill),
                text(status_line).size(13),
            ]
            .spacing(8),
        )
        .padding(12)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
    }

    fn view_transcript(&self) -> Element<Message> {
        if self.transcript.is_empty() {
            return container(text("Paste your data and ask a question to get started.").size(15))
                .padding(10)
                .into();
        }

        let mut entries = column![].spacing(14).padding(10);
        for entry in self.transcript.entries() {
            entries = entries.push(view_entry(entry));
        }
        entries.into()
    }

    fn theme(&self) -> Theme {
        Theme::Light
    }
}

fn view_entry(entry: &ChatEntry) -> Element<'static, Message> {
    match entry.sender {
        Sender::User => column![
            text(format!("{}:", entry.sender.label()))
                .font(BOLD)
                .color(USER_LABEL),
            // User text is shown exactly as typed.
            text(entry.message.clone()).size(15),
        ]
        .spacing(2)
        .into(),
        Sender::Assistant => {
            let mut blocks = column![text(format!("{}:", entry.sender.label()))
                .font(BOLD)
                .color(AI_LABEL)]
            .spacing(6);
            for block in markdown::parse(&entry.message) {
                blocks = blocks.push(view_block(block));
            }
            blocks.into()
        }
    }
}

fn view_block(block: markdown::Block) -> Element<'static, Message> {
    match block {
        markdown::Block::Heading { level, spans } => {
            let size = match level {
                1 => 24.0,
                2 => 20.0,
                _ => 17.0,
            };
            let spans: Vec<Span<'static, Message>> = spans
                .into_iter()
                .map(|s| span(inline_text(s)).font(BOLD))
                .collect();
            rich_text(spans).size(size).into()
        }
        markdown::Block::List(items) => {
            let mut list = column![].spacing(3);
            for item in items {
                list = list.push(row![
                    text("• ").size(15),
                    rich_text(inline_spans(item)).size(15)
                ]);
            }
            list.into()
        }
        markdown::Block::Paragraph(spans) => rich_text(inline_spans(spans)).size(15).into(),
    }
}

fn inline_spans(spans: Vec<markdown::Inline>) -> Vec<Span<'static, Message>> {
    spans
        .into_iter()
        .map(|s| match s {
            markdown::Inline::Text(t) => span(t),
            markdown::Inline::Strong(t) => span(t).font(BOLD),
        })
        .collect()
}

fn inline_text(span: markdown::Inline) -> String {
    match span {
        markdown::Inline::Text(t) | markdown::Inline::Strong(t) => t,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> App {
        App::new(config::Config::default(), "sk-test".to_string()).0
    }

    #[test]
    fn empty_inputs_are_rejected() {
        assert!(matches!(
            validate_inputs("", "question"),
            Err(ChatError::EmptyInput { field: "data" })
        ));
        assert!(matches!(
            validate_inputs("a,b", "   "),
            Err(ChatError::EmptyInput { field: "question" })
        ));
        assert!(validate_inputs("a,b", "sum a").is_ok());
    }

    #[test]
    fn service_failure_appends_one_assistant_entry() {
        let mut app = test_app();
        app.is_loading = true;
        let _ = app.update(Message::ServiceFailed("quota exceeded".to_string()));

        let snapshot = app.transcript.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].0, Sender::Assistant);
        assert!(snapshot[0].1.contains("quota exceeded"));
        assert!(!app.is_loading);
        assert_eq!(app.status, "quota exceeded");
    }

    #[test]
    fn send_with_empty_data_sets_status_only() {
        let mut app = test_app();
        app.question = "what is the mean?".to_string();
        let _ = app.update(Message::Send);
        assert!(app.transcript.snapshot().is_empty());
        assert!(!app.is_loading);
        assert_eq!(app.status, "data is empty");
    }

    #[test]
    fn send_appends_user_entry_and_marks_loading() {
        let mut app = test_app();
        app.data = text_editor::Content::with_text("a,b\n1,2");
        app.question = "sum column a".to_string();
        let _ = app.update(Message::Send);

        assert_eq!(
            app.transcript.snapshot(),
            vec![(Sender::User, "sum column a".to_string())]
        );
        assert!(app.question.is_empty());
        assert!(app.is_loading);
    }

    #[test]
    fn send_while_in_flight_is_rejected() {
        let mut app = test_app();
        app.data = text_editor::Content::with_text("a,b\n1,2");
        app.question = "second question".to_string();
        app.is_loading = true;
        let _ = app.update(Message::Send);

        assert!(app.transcript.snapshot().is_empty());
        assert_eq!(app.question, "second question");
        assert!(app.is_loading);
    }

    #[test]
    fn response_appends_assistant_entry() {
        let mut app = test_app();
        app.transcript.append(Sender::User, "sum column a");
        app.is_loading = true;
        let _ = app.update(Message::ResponseReceived("**3**".to_string()));

        let snapshot = app.transcript.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[1], (Sender::Assistant, "**3**".to_string()));
        assert!(!app.is_loading);
        assert_eq!(app.status, "AI response received.");
    }

    #[test]
    fn clear_resets_transcript() {
        let mut app = test_app();
        app.transcript.append(Sender::User, "hi");
        let _ = app.update(Message::ClearChat);
        assert!(app.transcript.snapshot().is_empty());
    }
}
