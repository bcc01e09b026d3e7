use std::io::Write;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::contract::{NoticeDto, SuggestionDto, UiEvent, ViewUpdate};
use crate::model::Task;
use crate::present::{Notice, Presenter};
use crate::suggestion::Suggestion;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidJson,
    InvalidEvent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransportMessage {
    Ok { update: ViewUpdate },
    Err { error: ErrorResponse },
}

pub fn decode_event(line: &str) -> Result<UiEvent, ErrorResponse> {
    let value: Value = serde_json::from_str(line).map_err(|error| ErrorResponse {
        code: ErrorCode::InvalidJson,
        message: error.to_string(),
    })?;

    serde_json::from_value(value).map_err(|error| ErrorResponse {
        code: ErrorCode::InvalidEvent,
        message: error.to_string(),
    })
}

pub fn encode_message(message: &TransportMessage) -> String {
    serde_json::to_string(message).unwrap_or_else(|error| {
        format!(
            r#"{{"status":"err","error":{{"code":"invalid_event","message":{:?}}}}}"#,
            error.to_string()
        )
    })
}

/// Writes one [`TransportMessage`] per line for every presenter call.
pub struct JsonLinesPresenter<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn write_error(&mut self, error: ErrorResponse) {
        self.write_message(&TransportMessage::Err { error });
    }

    fn write_update(&mut self, update: ViewUpdate) {
        self.write_message(&TransportMessage::Ok { update });
    }

    fn write_message(&mut self, message: &TransportMessage) {
        let mut line = encode_message(message);
        line.push('\n');
        if let Err(error) = self.out.write_all(line.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!(%error, "failed to write transport message");
        }
    }
}

impl<W: Write> Presenter for JsonLinesPresenter<W> {
    fn show_suggestions(&mut self, suggestions: &[Suggestion]) {
        let items = suggestions.iter().map(SuggestionDto::from).collect();
        self.write_update(ViewUpdate::Suggestions(items));
    }

    fn hide_suggestions(&mut self) {
        self.write_update(ViewUpdate::SuggestionsHidden);
    }

    fn select_suggestion(&mut self, index: usize) {
        self.write_update(ViewUpdate::SuggestionSelected(index));
    }

    fn set_query(&mut self, query: &str) {
        self.write_update(ViewUpdate::Query(query.to_string()));
    }

    fn set_loading(&mut self, loading: bool) {
        self.write_update(ViewUpdate::Loading(loading));
    }

    fn show_results(&mut self, tasks: &[Task]) {
        self.write_update(ViewUpdate::Results(tasks.to_vec()));
    }

    fn show_notice(&mut self, notice: &Notice) {
        self.write_update(ViewUpdate::Notice(NoticeDto::from(notice)));
    }
}
