use serde_derive::Deserialize;
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// Environment variable holding a tracing filter directive.
pub const LOG_ENV: &str = "TODOLIST_LOG";

#[derive(Deserialize)]
pub struct Log {
    pub level: String,
    #[serde(default)]
    pub ansi: bool,
}

/// setup log from an optional environment filter and the config file
///
/// if the environment filter is present, then the config is not used. Events
/// go to stderr so they do not interleave with the rendered list.
pub fn setup(
    env_filter: Result<EnvFilter, tracing_subscriber::filter::FromEnvError>,
    config: &Option<Log>,
) {
    let (env_filter, ansi) = match (env_filter, config) {
        (Ok(env_filter), config) => (env_filter, config.as_ref().map_or(true, |c| c.ansi)),
        (Err(_), Some(config)) => match EnvFilter::try_new(&config.level) {
            Ok(env_filter) => (env_filter, config.ansi),
            Err(_) => return,
        },
        (Err(_), None) => return,
    };
    let sbuilder = Subscriber::builder()
        .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc3339())
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter);
    let ss = sbuilder.with_ansi(ansi).finish();
    if let Err(err) = tracing::subscriber::set_global_default(ss) {
        eprintln!("setting tracing default subscriber failed: {}", err);
    }
}
