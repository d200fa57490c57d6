use std::io;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Фильтр из `LOG_LEVEL`/`RUST_LOG`, уже выбранного в [`Settings`](crate::settings::Settings).
fn level_filter(directives: &str) -> Result<EnvFilter> {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse(directives)
        .with_context(|| format!("некорректный уровень логов: {directives}"))
}

/// Логи идут в stderr: stdout занят выводом команд.
pub(crate) fn init_logging(directives: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(level_filter(directives)?)
        .with_writer(io::stderr)
        .without_time()
        .compact()
        .try_init()
        .map_err(|err| anyhow!("не удалось включить логи: {err}"))
}
