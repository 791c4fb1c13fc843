use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use lyrics_sidekick::cli::{Cli, Commands, ConfigAction};
use lyrics_sidekick::config::Config;
use lyrics_sidekick::lyrics::LrcParser;
use lyrics_sidekick::{app, logging, output, transliterate};
use owo_colors::OwoColorize;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);
    tracing::debug!(version = %lyrics_sidekick::version_string(), "sidekick starting");

    match cli.command {
        None => {
            let config = load_config(&cli)?;
            run_live(config).await?;
        }
        Some(Commands::Parse { ref file, json }) => {
            let config = load_config(&cli)?;
            let raw = std::fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let timeline = LrcParser::new((&config.karaoke).into()).parse(&raw)?;
            if json {
                println!("{}", output::timeline_json(&timeline)?);
            } else {
                print!("{}", output::format_timeline(&timeline));
            }
        }
        Some(Commands::Play {
            ref file,
            speed,
            start,
        }) => {
            let config = load_config(&cli)?;
            let summary = app::run_play(config, file, speed, start).await?;
            if !cli.quiet {
                eprintln!(
                    "{}",
                    format!("Played {} words.", summary.words).dimmed()
                );
            }
        }
        Some(Commands::Transliterate { ref text }) => {
            println!("{}", transliterate::transliterate(&text.join(" ")));
        }
        Some(Commands::Config { ref action }) => {
            handle_config_command(action, &cli)?;
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "sidekick", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config), which must exist
/// 2. Default config path (~/.config/lyrics-sidekick/config.toml)
/// 3. Built-in defaults
///
/// Environment variables and then CLI flags are applied on top.
fn load_config(cli: &Cli) -> Result<Config> {
    let config = match cli.config.as_deref() {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path()?)?,
    };
    let mut config = config.with_env_overrides();
    cli.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

#[cfg(all(feature = "spotify", feature = "lrclib"))]
async fn run_live(config: Config) -> Result<()> {
    app::run_live(config).await?;
    Ok(())
}

#[cfg(not(all(feature = "spotify", feature = "lrclib")))]
async fn run_live(_config: Config) -> Result<()> {
    anyhow::bail!("live karaoke needs the `spotify` and `lrclib` features; try `sidekick play <FILE>`")
}

fn handle_config_command(action: &ConfigAction, cli: &Cli) -> Result<()> {
    match action {
        ConfigAction::Dump => {
            let config = load_config(cli)?;
            print!("{}", config.to_display_toml()?);
        }
        ConfigAction::Path => {
            let path = match cli.config.as_deref() {
                Some(path) => path.to_path_buf(),
                None => Config::default_path()?,
            };
            print_path(&path);
        }
    }
    Ok(())
}

fn print_path(path: &Path) {
    if path.exists() {
        println!("{}", path.display());
    } else {
        println!("{} {}", path.display(), "(not created yet)".dimmed());
    }
}
