use std::io::Write;
use std::path::PathBuf;

use thiserror::Error;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

use crate::cache::CacheKey;
use crate::config::{self, Config, ConfigError};
use crate::model::normalize_for_search;
use crate::present::{Notice, Presenter, TextPresenter};
use crate::remote::FetchError;
use crate::search::rank_suggestions;
use crate::session::{QuestSearchSession, SearchOutcome, SessionError};
use crate::suggestion::{Suggestion, MIN_SUGGESTION_CHARS};
use crate::transport::{decode_event, JsonLinesPresenter};

const USAGE: &str = "usage: questfind-core [--config <path>] \
(--search <query> | --suggest <query> | --refresh | --interactive)";

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("session error: {0}")]
    Session(#[from] SessionError),
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("search failed: {0}")]
    SearchFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Search(String),
    Suggest(String),
    Refresh,
    Interactive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub config_path: Option<PathBuf>,
    pub mode: Mode,
}

pub fn parse_cli_args(args: &[String]) -> Result<RuntimeOptions, String> {
    let mut config_path = None;
    let mut mode = None;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let next_mode = match arg.as_str() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| format!("--config requires a path\n{USAGE}"))?;
                config_path = Some(PathBuf::from(value));
                continue;
            }
            "--search" => Mode::Search(required_value(&mut iter, "--search")?),
            "--suggest" => Mode::Suggest(required_value(&mut iter, "--suggest")?),
            "--refresh" => Mode::Refresh,
            "--interactive" => Mode::Interactive,
            "-h" | "--help" => return Err(USAGE.to_string()),
            other => return Err(format!("unknown argument '{other}'\n{USAGE}")),
        };

        if mode.replace(next_mode).is_some() {
            return Err(format!("only one mode may be given\n{USAGE}"));
        }
    }

    Ok(RuntimeOptions {
        config_path,
        mode: mode.unwrap_or(Mode::Interactive),
    })
}

fn required_value<'a>(
    iter: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> Result<String, String> {
    iter.next()
        .cloned()
        .ok_or_else(|| format!("{flag} requires a value\n{USAGE}"))
}

pub fn run_with_options(options: RuntimeOptions) -> Result<(), RuntimeError> {
    let config = config::load(options.config_path.as_deref())?;
    if !config.config_path.exists() {
        config::save(&config)?;
        eprintln!(
            "[questfind-core] wrote default config to {}",
            config.config_path.display()
        );
    }

    if let Err(error) = crate::logging::init(&config.log_level) {
        eprintln!("[questfind-core] logging disabled: {error}");
    }
    tracing::info!(
        endpoint = %config.endpoint,
        store_path = %config.store_path.display(),
        mode = ?options.mode,
        "startup"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        match options.mode {
            Mode::Search(query) => run_search(&config, &query).await,
            Mode::Suggest(query) => run_suggest(&config, &query).await,
            Mode::Refresh => run_refresh(&config).await,
            Mode::Interactive => run_interactive(&config).await,
        }
    })
}

async fn run_search(cfg: &Config, query: &str) -> Result<(), RuntimeError> {
    let mut session = QuestSearchSession::from_config(cfg, TextPresenter::new(std::io::stdout()))?;
    session.set_input(query);
    match session.search().await {
        SearchOutcome::Failed(message) => Err(RuntimeError::SearchFailed(message)),
        _ => Ok(()),
    }
}

async fn run_suggest(cfg: &Config, query: &str) -> Result<(), RuntimeError> {
    let mut presenter = TextPresenter::new(std::io::stdout());
    let query = normalize_for_search(query);
    if query.chars().count() < MIN_SUGGESTION_CHARS {
        presenter.show_notice(&Notice::Guidance(format!(
            "Please enter at least {MIN_SUGGESTION_CHARS} characters for suggestions."
        )));
        return Ok(());
    }

    let session = QuestSearchSession::from_config(cfg, TextPresenter::new(std::io::sink()))?;
    let tasks = session.cache().resolve(&CacheKey::AllTasks).await?;
    let suggestions: Vec<Suggestion> = rank_suggestions(&tasks, &query)
        .into_iter()
        .map(|task| Suggestion::new(task, &query))
        .collect();

    if suggestions.is_empty() {
        presenter.show_notice(&Notice::NoResults);
    } else {
        presenter.show_suggestions(&suggestions);
    }
    Ok(())
}

async fn run_refresh(cfg: &Config) -> Result<(), RuntimeError> {
    let session = QuestSearchSession::from_config(cfg, TextPresenter::new(std::io::sink()))?;
    let changed = session.cache().refresh(&CacheKey::AllTasks).await?;
    let mut out = std::io::stdout();
    if changed {
        writeln!(out, "Task list updated.")?;
    } else {
        writeln!(out, "Task list unchanged.")?;
    }
    Ok(())
}

async fn run_interactive(cfg: &Config) -> Result<(), RuntimeError> {
    let mut session =
        QuestSearchSession::from_config(cfg, JsonLinesPresenter::new(std::io::stdout()))?;
    let (tx, rx) = mpsc::channel(64);

    let reader = tokio::spawn(async move {
        let mut errors = JsonLinesPresenter::new(std::io::stdout());
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(error) => {
                    tracing::error!(%error, "failed to read stdin");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match decode_event(&line) {
                Ok(event) => {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Err(error) => errors.write_error(error),
            }
        }
    });

    session.run(rx).await;
    let _ = reader.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{parse_cli_args, Mode};

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn defaults_to_interactive() {
        let options = parse_cli_args(&[]).unwrap();
        assert_eq!(options.mode, Mode::Interactive);
        assert_eq!(options.config_path, None);
    }

    #[test]
    fn parses_search_with_config_path() {
        let options =
            parse_cli_args(&args(&["--config", "/tmp/qf.toml", "--search", "shootout"])).unwrap();
        assert_eq!(options.mode, Mode::Search("shootout".to_string()));
        assert_eq!(options.config_path, Some(PathBuf::from("/tmp/qf.toml")));
    }

    #[test]
    fn rejects_missing_values_and_conflicting_modes() {
        assert!(parse_cli_args(&args(&["--suggest"])).is_err());
        assert!(parse_cli_args(&args(&["--config"])).is_err());
        assert!(parse_cli_args(&args(&["--refresh", "--interactive"])).is_err());
        assert!(parse_cli_args(&args(&["--verbose"])).is_err());
    }
}
