use anyhow::{Context, Result};
use cg_cli::{build_registry, init_tracing, AppConfig};
use cg_resolver::ResolveContext;
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;
use tracing::info;

fn cli() -> Command {
    Command::new("cg")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Resolve content records into node trees")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .default_value("cg.toml")
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log as JSON lines"),
        )
        .subcommand(
            Command::new("resolve")
                .about("Resolve one candidate and print the node as JSON")
                .arg(
                    Arg::new("candidate")
                        .required(true)
                        .help("Identifier or slug to resolve"),
                )
                .arg(
                    Arg::new("hint")
                        .long("hint")
                        .default_value("")
                        .help("Routing hint passed to providers"),
                )
                .arg(
                    Arg::new("unpublished")
                        .long("unpublished")
                        .action(ArgAction::SetTrue)
                        .help("Return draft content"),
                )
                .arg(
                    Arg::new("hot-reload")
                        .long("hot-reload")
                        .action(ArgAction::SetTrue)
                        .help("Mark nodes for live preview"),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let config_path = matches
        .get_one::<PathBuf>("config")
        .context("missing --config")?;
    let config = AppConfig::load(config_path)?;
    init_tracing(&config.log_filter, matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("resolve", args)) => {
            let candidate = args
                .get_one::<String>("candidate")
                .context("missing candidate")?;
            let hint = args.get_one::<String>("hint").map_or("", String::as_str);

            let registry = build_registry(&config)?;
            registry.set_accept_unpublished(args.get_flag("unpublished"));
            info!(providers = ?registry.names(), candidate, "resolving");

            let ctx = ResolveContext::new().with_hot_reload(args.get_flag("hot-reload"));
            let node = registry
                .resolve(candidate, hint, &ctx)
                .await
                .with_context(|| format!("resolving '{candidate}'"))?;

            println!("{}", serde_json::to_string_pretty(&node)?);
            Ok(())
        }
        _ => unreachable!("subcommand is required"),
    }
}
