use std::io::Write;

use crate::model::Task;
use crate::suggestion::Suggestion;

pub const GUIDANCE_MESSAGE: &str = "Please enter at least 3 characters to search.";
pub const NO_RESULTS_MESSAGE: &str = "No tasks found.";
pub const FETCH_FAILED_MESSAGE: &str =
    "Failed to fetch quests. Please check your query or try again later.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Guidance(String),
    NoResults,
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Self::Guidance(message) | Self::Error(message) => message,
            Self::NoResults => NO_RESULTS_MESSAGE,
        }
    }
}

/// Receives everything the session wants shown. Rendering technology is up
/// to the implementation.
pub trait Presenter {
    fn show_suggestions(&mut self, suggestions: &[Suggestion]);
    fn hide_suggestions(&mut self);
    fn select_suggestion(&mut self, index: usize);
    fn set_query(&mut self, query: &str);
    fn set_loading(&mut self, loading: bool);
    fn show_results(&mut self, tasks: &[Task]);
    fn show_notice(&mut self, notice: &Notice);
}

pub struct TextPresenter<W: Write> {
    out: W,
}

impl<W: Write> TextPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(error) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!(%error, "failed to write presenter output");
        }
    }
}

impl<W: Write> Presenter for TextPresenter<W> {
    fn show_suggestions(&mut self, suggestions: &[Suggestion]) {
        let text: String = suggestions
            .iter()
            .enumerate()
            .map(|(index, suggestion)| format!("{:>2}. {}\n", index + 1, suggestion_line(suggestion)))
            .collect();
        self.emit(&text);
    }

    fn hide_suggestions(&mut self) {}

    fn select_suggestion(&mut self, index: usize) {
        self.emit(&format!("> {}\n", index + 1));
    }

    fn set_query(&mut self, query: &str) {
        self.emit(&format!("query: {query}\n"));
    }

    fn set_loading(&mut self, loading: bool) {
        if loading {
            self.emit("Loading...\n");
        }
    }

    fn show_results(&mut self, tasks: &[Task]) {
        let text = tasks.iter().map(quest_card).collect::<Vec<_>>().join("\n");
        self.emit(&text);
    }

    fn show_notice(&mut self, notice: &Notice) {
        self.emit(&format!("{}\n", notice.message()));
    }
}

pub fn suggestion_line(suggestion: &Suggestion) -> String {
    let task = &suggestion.task;
    let mut line = format!(
        "{} - {}",
        suggestion.highlighted.render("[", "]"),
        task.trader_name().unwrap_or("Unknown Trader")
    );
    if let Some(level) = task.min_player_level {
        line.push_str(&format!(" (Level {level})"));
    }
    if task.is_kappa_required() {
        line.push_str(" [Kappa]");
    }
    line
}

pub fn quest_card(task: &Task) -> String {
    let mut card = String::new();
    card.push_str(&format!("== {} ==\n", task.name));
    card.push_str(&format!("Trader: {}\n", task.trader_name().unwrap_or("N/A")));
    if let Some(link) = task.wiki_link.as_deref() {
        card.push_str(&format!("Wiki Guide: {link}\n"));
    }

    card.push_str("Requirements\n");
    card.push_str(&format!(
        "  Player Level: {}\n",
        task.min_player_level
            .map(|level| level.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    ));
    card.push_str(&format!("  Kappa Required: {}\n", check_mark(task.is_kappa_required())));
    card.push_str(&format!(
        "  Lightkeeper Required: {}\n",
        check_mark(task.is_lightkeeper_required())
    ));
    for requirement in &task.trader_requirements {
        let trader = requirement
            .trader
            .as_ref()
            .and_then(|trader| trader.name.as_deref())
            .unwrap_or("N/A");
        match requirement.level {
            Some(level) => card.push_str(&format!("  {trader}: LL{level}\n")),
            None => card.push_str(&format!("  {trader}\n")),
        }
    }

    if !task.reward_items().is_empty() || !task.trader_standing().is_empty() {
        card.push_str("Rewards\n");
    }
    for reward in task.reward_items() {
        let name = reward
            .item
            .as_ref()
            .and_then(|item| item.name.as_deref())
            .unwrap_or("Unknown item");
        card.push_str(&format!("  {name} ×{}\n", format_number(reward.quantity.unwrap_or(1.0))));
    }
    for standing in task.trader_standing() {
        let trader = standing
            .trader
            .as_ref()
            .and_then(|trader| trader.name.as_deref())
            .unwrap_or("N/A");
        let value = standing.standing.unwrap_or(0.0);
        let sign = if value > 0.0 { "+" } else { "" };
        card.push_str(&format!("  {trader} standing {sign}{}\n", format_number(value)));
    }

    if !task.objectives.is_empty() {
        card.push_str("Objectives\n");
    }
    for (index, objective) in task.objectives.iter().enumerate() {
        let description = objective.description.as_deref().unwrap_or("");
        let optional = if objective.optional.unwrap_or(false) {
            " (Optional)"
        } else {
            ""
        };
        card.push_str(&format!("  {}. {description}{optional}\n", index + 1));
    }

    card
}

fn check_mark(value: bool) -> &'static str {
    if value {
        "✓"
    } else {
        "✗"
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::{format_number, quest_card, suggestion_line};
    use crate::model::{Objective, Task};
    use crate::suggestion::Suggestion;

    #[test]
    fn card_falls_back_when_fields_are_missing() {
        let card = quest_card(&Task::named("Shootout Picnic"));
        assert!(card.contains("== Shootout Picnic =="));
        assert!(card.contains("Trader: N/A"));
        assert!(card.contains("Player Level: N/A"));
        assert!(card.contains("Kappa Required: ✗"));
        assert!(!card.contains("Objectives"));
    }

    #[test]
    fn card_numbers_objectives_and_marks_optional() {
        let mut task = Task::named("The Punisher - Part 1").with_trader("Prapor");
        task.objectives = vec![
            Objective {
                id: None,
                kind: None,
                description: Some("Eliminate Scavs".to_string()),
                optional: Some(false),
            },
            Objective {
                id: None,
                kind: None,
                description: Some("Find the stash".to_string()),
                optional: Some(true),
            },
        ];

        let card = quest_card(&task);
        assert!(card.contains("Trader: Prapor"));
        assert!(card.contains("  1. Eliminate Scavs\n"));
        assert!(card.contains("  2. Find the stash (Optional)\n"));
    }

    #[test]
    fn suggestion_line_marks_matches() {
        let task = Task::named("Shootout Picnic").with_min_level(12);
        let line = suggestion_line(&Suggestion::new(task, "sh"));
        assert_eq!(line, "[Sh]ootout Picnic - Unknown Trader (Level 12)");
    }

    #[test]
    fn whole_numbers_render_without_fraction() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(0.02), "0.02");
    }
}
