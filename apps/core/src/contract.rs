use serde::{Deserialize, Serialize};

use crate::model::Task;
use crate::present::Notice;
use crate::suggestion::{NavKey, Suggestion};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum UiEvent {
    Input(String),
    Key(NavKey),
    PointerSelect(usize),
    PointerOutside,
    Search,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuggestionDto {
    pub name: String,
    pub highlighted_name: String,
    pub trader: Option<String>,
    pub min_player_level: Option<u32>,
    pub kappa_required: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Guidance,
    NoResults,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoticeDto {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum ViewUpdate {
    Suggestions(Vec<SuggestionDto>),
    SuggestionsHidden,
    SuggestionSelected(usize),
    Query(String),
    Loading(bool),
    Results(Vec<Task>),
    Notice(NoticeDto),
}

impl From<&Suggestion> for SuggestionDto {
    fn from(value: &Suggestion) -> Self {
        Self {
            name: value.task.name.clone(),
            highlighted_name: value.highlighted_name(),
            trader: value.task.trader_name().map(str::to_string),
            min_player_level: value.task.min_player_level,
            kappa_required: value.task.is_kappa_required(),
        }
    }
}

impl From<&Notice> for NoticeDto {
    fn from(value: &Notice) -> Self {
        let level = match value {
            Notice::Guidance(_) => NoticeLevel::Guidance,
            Notice::NoResults => NoticeLevel::NoResults,
            Notice::Error(_) => NoticeLevel::Error,
        };
        Self {
            level,
            message: value.message().to_string(),
        }
    }
}
