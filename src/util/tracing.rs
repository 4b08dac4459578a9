use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::Layer;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;

// default name (fixed)
const APP_SERVICE_NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Deserialize, Debug)]
pub struct LoggingConfig {
    pub app_name: Option<String>,
    pub level: Option<String>,
    pub file_name: Option<String>,
    pub file_dir: Option<String>,
    #[serde(default)]
    pub use_json: bool,
    #[serde(default = "default_use_stdout")]
    pub use_stdout: bool,
}

fn default_use_stdout() -> bool {
    true
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self {
            app_name: None,
            level: None,
            file_name: None,
            file_dir: None,
            use_json: false,
            use_stdout: true,
        }
    }

    pub fn level(&self) -> tracing::Level {
        self.level
            .as_deref()
            .and_then(|l| tracing::Level::from_str(l).ok())
            .unwrap_or(tracing::Level::INFO)
    }

    pub fn app_name(&self) -> String {
        self.app_name
            .clone()
            .unwrap_or_else(|| APP_SERVICE_NAME.to_string())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load_tracing_config_from_env() -> Result<LoggingConfig> {
    load_tracing_config_from_vars(env::vars())
}

pub fn load_tracing_config_from_vars<I>(vars: I) -> Result<LoggingConfig>
where
    I: IntoIterator<Item = (String, String)>,
{
    envy::prefixed("LOG_")
        .from_iter::<_, LoggingConfig>(vars)
        .context("cannot read logging config from env:")
}

pub fn tracing_init(conf: LoggingConfig) -> Result<()> {
    let subscriber = setup_layer_from_logging_config(&conf)?;
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;
    tracing::info!(app = %conf.app_name(), level = %conf.level(), "logging initialized");
    Ok(())
}

pub fn tracing_init_from_env() -> Result<()> {
    match load_tracing_config_from_env() {
        Ok(conf) => tracing_init(conf),
        Err(e) => {
            eprintln!("failed to load logging config from env: {e:?}");
            Err(e)
        }
    }
}

fn create_log_file(conf: &LoggingConfig) -> Result<Option<File>> {
    let Some(file_name) = conf.file_name.as_deref() else {
        return Ok(None);
    };
    let dir = match conf.file_dir.as_deref() {
        Some(d) => PathBuf::from(d),
        None => env::current_dir().context("resolve current directory for log file")?,
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("create log file directory {:?}", dir.as_os_str()))?;
    let path: PathBuf = Path::new(&dir).join(file_name);
    let file = File::create(&path)
        .with_context(|| format!("create log file to {:?}", path.as_os_str()))?;
    Ok(Some(file))
}

pub fn setup_layer_from_logging_config(
    conf: &LoggingConfig,
) -> Result<Box<dyn Subscriber + Send + Sync + 'static>> {
    let lv = conf.level();
    // RUST_LOG directives refine the configured level
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(lv).into())
        .from_env_lossy();

    let (json_file, text_file) = match create_log_file(conf)? {
        Some(f) if conf.use_json => (Some(f), None),
        Some(f) => (None, Some(f)),
        None => (None, None),
    };

    let subscriber = Box::new(
        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_file.map(|f| {
                Layer::new()
                    .with_writer(Mutex::new(f).with_max_level(lv))
                    .with_ansi(false)
                    .json()
            }))
            .with(text_file.map(|f| {
                Layer::new()
                    .with_writer(Mutex::new(f).with_max_level(lv))
                    .with_ansi(false)
            }))
            .with(if !conf.use_json && conf.use_stdout {
                Some(tracing_subscriber::fmt::layer().pretty())
            } else {
                None
            })
            .with(if conf.use_json && conf.use_stdout {
                Some(tracing_subscriber::fmt::layer().json())
            } else {
                None
            }),
    );
    Ok(subscriber)
}

// for simple stdout logging
pub fn tracing_init_test(level: tracing::Level) {
    let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
}
