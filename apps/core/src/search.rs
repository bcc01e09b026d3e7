use crate::model::{normalize_for_search, Task};

pub const SUGGESTION_LIMIT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchKind {
    FullQuery,
    TokenOnly,
}

/// Filters `tasks` down to those whose name contains the query (or one of its
/// multi-character words) and orders them: full-query matches first, then
/// shorter names, then input order.
pub fn rank(tasks: &[Task], query: &str, limit: Option<usize>) -> Vec<Task> {
    if limit == Some(0) || tasks.is_empty() {
        return Vec::new();
    }

    let normalized_query = normalize_for_search(query);
    if normalized_query.is_empty() {
        return Vec::new();
    }

    let tokens: Vec<&str> = normalized_query
        .split_whitespace()
        .filter(|token| token.chars().count() > 1)
        .collect();

    let mut scored: Vec<(MatchKind, usize, usize, &Task)> = tasks
        .iter()
        .enumerate()
        .filter_map(|(index, task)| {
            let name = task.name.to_lowercase();
            classify(&name, &normalized_query, &tokens)
                .map(|kind| (kind, name.chars().count(), index, task))
        })
        .collect();

    scored.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| a.1.cmp(&b.1))
            .then_with(|| a.2.cmp(&b.2))
    });

    scored
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|(_, _, _, task)| task.clone())
        .collect()
}

pub fn rank_suggestions(tasks: &[Task], query: &str) -> Vec<Task> {
    rank(tasks, query, Some(SUGGESTION_LIMIT))
}

pub fn rank_all(tasks: &[Task], query: &str) -> Vec<Task> {
    rank(tasks, query, None)
}

fn classify(name: &str, query: &str, tokens: &[&str]) -> Option<MatchKind> {
    if name.contains(query) {
        return Some(MatchKind::FullQuery);
    }

    if tokens.iter().any(|token| name.contains(token)) {
        return Some(MatchKind::TokenOnly);
    }

    None
}
