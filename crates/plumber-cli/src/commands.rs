use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use plumber_server::{PlumberServer, ServerConfig};
use plumber_store::InMemoryDocumentStore;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => {
            let config = load_config(cli.config.as_deref(), &args, cli.verbose)?;
            cmd_serve(config)
        }
        Command::Config(args) => {
            let config = load_config(cli.config.as_deref(), &ServeArgs::default(), cli.verbose)?;
            cmd_config(&config, args)
        }
    }
}

/// Resolve the configuration, start logging at its level, then validate so
/// validation warnings reach the log.
fn load_config(path: Option<&Path>, args: &ServeArgs, verbose: bool) -> anyhow::Result<ServerConfig> {
    let config = resolve_config(path, std::env::vars(), args)?;
    init_tracing(&config.log_level, verbose);
    config.validate()?;
    Ok(config)
}

/// Defaults, then the config file, then the environment, then flags.
fn resolve_config<I>(path: Option<&Path>, env: I, args: &ServeArgs) -> anyhow::Result<ServerConfig>
where
    I: IntoIterator<Item = (String, String)>,
{
    let config = match path {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    let mut config = config.apply_env(env)?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(stages) = args.stages {
        config.stages = stages;
    }
    Ok(config)
}

fn env_filter(level: &str, verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { level };
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_tracing(level: &str, verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level, verbose))
        .try_init();
}

fn cmd_serve(config: ServerConfig) -> anyhow::Result<()> {
    tracing::debug!(?config, "effective configuration");
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting tokio runtime")?;
    runtime.block_on(async {
        let store = Arc::new(InMemoryDocumentStore::new());
        PlumberServer::new(config, store).serve().await
    })?;
    Ok(())
}

fn cmd_config(config: &ServerConfig, args: ConfigArgs) -> anyhow::Result<()> {
    if !args.check {
        print!("{}", config.to_toml_string()?);
    }
    println!(
        "{} {} stage(s) on {}",
        "✓".green().bold(),
        config.stages.to_string().bold(),
        config.bind_addr.to_string().yellow()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_without_file_or_env() {
        let config = resolve_config(None, env(&[]), &ServeArgs::default()).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn flags_beat_env_beat_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "stages = 2\nbind_addr = \"127.0.0.1:7000\"").unwrap();

        let from_file = resolve_config(Some(file.path()), env(&[]), &ServeArgs::default()).unwrap();
        assert_eq!(from_file.stages, 2);

        let from_env = resolve_config(Some(file.path()), env(&[("STAGES_QTY", "5")]), &ServeArgs::default()).unwrap();
        assert_eq!(from_env.stages, 5);
        assert_eq!(from_env.bind_addr.port(), 7000);

        let args = ServeArgs {
            bind: Some("127.0.0.1:7100".parse().unwrap()),
            stages: Some(9),
        };
        let from_flags = resolve_config(Some(file.path()), env(&[("STAGES_QTY", "5")]), &args).unwrap();
        assert_eq!(from_flags.stages, 9);
        assert_eq!(from_flags.bind_addr.port(), 7100);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn zero_stages_warning_reaches_the_log() {
        let config = resolve_config(None, env(&[]), &ServeArgs::default()).unwrap();
        assert_eq!(config.stages, 0);

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(env_filter(&config.log_level, false))
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || config.validate().unwrap());

        let log = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(log.contains("no stages configured"), "{log}");
    }

    #[test]
    fn invalid_config_is_rejected_after_resolution() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_body_bytes = 0").unwrap();
        let config = resolve_config(Some(file.path()), env(&[]), &ServeArgs::default()).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(resolve_config(Some(missing.as_path()), env(&[]), &ServeArgs::default()).is_err());
    }
}
