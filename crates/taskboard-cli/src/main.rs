use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use taskboard_cli::{render_text, run, ReplayReport, Script, SeedFile};
use taskboard_core::BoardConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let json = Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print the report as JSON");

    Command::new("taskboard")
        .version(taskboard_core::VERSION)
        .about("Task board: group roster and task assignment")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Board configuration (TOML)"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .default_value("text")
                .value_parser(["text", "json"])
                .help("Log output format"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("demo")
                .about("Seed Ann and Bo, create Team1, and assign a task")
                .arg(json.clone()),
        )
        .subcommand(
            Command::new("replay")
                .about("Apply a scripted session to a seeded store")
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Seed file with employees and groups"),
                )
                .arg(
                    Arg::new("script")
                        .long("script")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Script of [[step]] actions"),
                )
                .arg(json),
        )
}

fn init_tracing(format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(matches: &ArgMatches) -> Result<BoardConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => BoardConfig::load(path)
            .with_context(|| format!("cannot load config {}", path.display())),
        None => Ok(BoardConfig::default()),
    }
}

fn print_report(report: &ReplayReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", render_text(report));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(
        matches
            .get_one::<String>("log-format")
            .map_or("text", String::as_str),
    );
    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("demo", args)) => {
            let report = run(SeedFile::demo(), &Script::demo(), config).await;
            print_report(&report, args.get_flag("json"))
        }
        Some(("replay", args)) => {
            let seed_path = args
                .get_one::<PathBuf>("seed")
                .context("--seed is required")?;
            let script_path = args
                .get_one::<PathBuf>("script")
                .context("--script is required")?;
            let seed = SeedFile::load(seed_path)?;
            let script = Script::load(script_path)?;

            tracing::info!(
                "Replaying {} steps over {} employees and {} groups",
                script.steps.len(),
                seed.employees.len(),
                seed.groups.len()
            );
            let report = run(seed, &script, config).await;
            print_report(&report, args.get_flag("json"))
        }
        _ => {
            cli().print_help()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn global_options_parse_after_subcommand() {
        let matches = cli()
            .try_get_matches_from(["taskboard", "demo", "--log-format", "json", "--json"])
            .unwrap();
        assert_eq!(
            matches.get_one::<String>("log-format").map(String::as_str),
            Some("json")
        );
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "demo");
        assert!(args.get_flag("json"));
    }

    #[test]
    fn replay_requires_both_files() {
        assert!(cli()
            .try_get_matches_from(["taskboard", "replay", "--seed", "seed.toml"])
            .is_err());
    }
}
