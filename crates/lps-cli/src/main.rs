//! `lps`: inspect and update learning profiles from the command line

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use lps_engine::{EngineConfig, FileEngine, ModelReply};
use lps_profile::schema;
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let user = || {
        Arg::new("user")
            .required(true)
            .help("User id or platform e-mail")
    };

    Command::new("lps")
        .version(lps_engine::VERSION)
        .about("Learning profile state engine")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .env("LPS_DATA_DIR")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Data directory, overrides the configuration file"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("show")
                .about("Print the stored profile")
                .arg(user()),
        )
        .subcommand(
            Command::new("ensure")
                .about("Create the profile if missing and print it")
                .arg(user()),
        )
        .subcommand(
            Command::new("apply")
                .about("Validate and merge a JSON patch")
                .arg(user())
                .arg(
                    Arg::new("patch")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Patch file, '-' for stdin"),
                ),
        )
        .subcommand(
            Command::new("absorb")
                .about("Absorb a model service reply")
                .arg(user())
                .arg(
                    Arg::new("reply")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Reply file, '-' for stdin"),
                ),
        )
        .subcommand(
            Command::new("summary")
                .about("Print the plain-text summary")
                .arg(user()),
        )
        .subcommand(
            Command::new("audit")
                .about("Report missing required fields")
                .arg(user()),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

fn load_config(matches: &ArgMatches) -> Result<EngineConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::from_toml_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = matches.get_one::<PathBuf>("data-dir") {
        config = config.with_data_dir(dir);
    }
    Ok(config)
}

fn user_arg(args: &ArgMatches) -> Result<&str> {
    args.get_one::<String>("user")
        .map(String::as_str)
        .context("missing user id")
}

fn read_json(args: &ArgMatches, name: &str) -> Result<Value> {
    let path = args
        .get_one::<PathBuf>(name)
        .with_context(|| format!("missing {name} argument"))?;
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    serde_json::from_str(&raw).with_context(|| format!("parsing {name} as JSON"))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(matches: ArgMatches) -> Result<()> {
    let engine = FileEngine::open(load_config(&matches)?);

    match matches.subcommand() {
        Some(("show", args)) => match engine.get_profile(user_arg(args)?).await? {
            Some(profile) => print_json(&profile)?,
            None => bail!("no profile stored for {}", user_arg(args)?),
        },
        Some(("ensure", args)) => {
            let profile = engine.ensure_exists(user_arg(args)?).await?;
            print_json(&profile)?;
        }
        Some(("apply", args)) => {
            let patch = read_json(args, "patch")?;
            let profile = engine.update_profile(user_arg(args)?, &patch).await?;
            print_json(&profile)?;
        }
        Some(("absorb", args)) => {
            let reply: ModelReply = serde_json::from_value(read_json(args, "reply")?)
                .context("reply is not a model service answer")?;
            let turn = engine.absorb_reply(user_arg(args)?, &reply).await?;
            print_json(&turn)?;
        }
        Some(("summary", args)) => {
            println!("{}", engine.summary(user_arg(args)?).await?);
        }
        Some(("audit", args)) => {
            let user = user_arg(args)?;
            let Some(profile) = engine.get_profile(user).await? else {
                bail!("no profile stored for {user}");
            };
            let violations = schema::audit(&profile);
            if violations.is_empty() {
                println!("{user}: complete");
            }
            for violation in violations {
                println!("{user}: {violation}");
            }
        }
        _ => bail!("unknown command"),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json-logs"));
    run(matches).await
}
