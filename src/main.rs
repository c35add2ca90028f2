use std::io;
use std::path::Path;
use std::process;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use clap::{
    crate_authors, crate_name, crate_version, value_parser, Arg, ArgMatches, Command,
};
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use gdrive_client::{is_debug, DriveConfig, GoogleDrive};

#[derive(Debug, Error)]
enum ExitStatusError {
    #[error("exit with status {0}")]
    Failure(i32),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let matches = get_cli_args();

    let str = matches
        .get_one::<String>("log-level")
        .map_or("INFO", String::as_str);
    let log_level = Level::from_str(str).map_err(|_| anyhow!("Invalid log level {str}"))?;
    let guard = log_init(log_level)?;

    match async_main(&matches).await {
        Ok(()) => Ok(()),
        Err(err) => {
            if let Some(ExitStatusError::Failure(code)) = err.downcast_ref::<ExitStatusError>() {
                drop(guard);
                process::exit(*code);
            }
            error!("{err}");
            drop(guard);
            Err(err)
        }
    }
}

fn get_cli_args() -> ArgMatches {
    let parent = || {
        Arg::new("parent")
            .long("parent")
            .short('P')
            .value_name("FOLDER_ID")
            .help("Id of the folder to create it in, defaults to the root of My Drive")
    };
    Command::new(crate_name!())
        .version(crate_version!())
        .author(crate_authors!())
        .arg_required_else_help(true)
        .subcommand_required(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .short('l')
                .value_name("log-level")
                .default_value("INFO")
                .global(true)
                .help("Log level, possible values: TRACE, DEBUG, INFO, WARN, ERROR"),
        )
        .arg(
            Arg::new("credentials")
                .long("credentials")
                .short('c')
                .value_name("CREDENTIALS_FILE")
                .default_value("credentials.json")
                .global(true)
                .help("OAuth client secret downloaded from https://console.cloud.google.com/apis/credentials"),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .short('t')
                .value_name("TOKEN_FILE")
                .default_value("token.json")
                .global(true)
                .help("Where the access and refresh tokens are kept between runs. Created after the first authorization"),
        )
        .arg(
            Arg::new("page-size")
                .long("page-size")
                .short('p')
                .value_name("N")
                .default_value("10")
                .value_parser(value_parser!(i32).range(1..=1000))
                .global(true)
                .help("Max number of results for searches, only the first page is fetched"),
        )
        .subcommand(
            Command::new("list").about("List files").arg(
                Arg::new("query")
                    .long("query")
                    .short('q')
                    .value_name("QUERY")
                    .help("Drive search query, by default everything that is not a folder"),
            ),
        )
        .subcommand(
            Command::new("find-folder")
                .about("Print the ids of everything with the given name")
                .arg(Arg::new("name").required(true).value_name("NAME")),
        )
        .subcommand(
            Command::new("create-folder")
                .about("Create a folder and print its id")
                .arg(Arg::new("name").required(true).value_name("NAME"))
                .arg(parent()),
        )
        .subcommand(
            Command::new("upload")
                .about("Upload a local file and print its id")
                .arg(Arg::new("path").required(true).value_name("PATH"))
                .arg(parent()),
        )
        .get_matches()
}

pub fn log_init(level: Level) -> Result<WorkerGuard> {
    let directive = format!("gdrive_client={}", level.as_str()).parse::<Directive>()?;
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env()?
        .add_directive(directive);

    // stdout is for command output
    let (writer, guard) = tracing_appender::non_blocking(io::stderr());
    let builder = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(filter);
    if is_debug() {
        builder.pretty().init();
    } else {
        builder.init();
    }

    Ok(guard)
}

fn config_from_args(matches: &ArgMatches) -> DriveConfig {
    let mut config = DriveConfig::default();
    if let Some(path) = matches.get_one::<String>("credentials") {
        config = config.with_client_secret_path(path);
    }
    if let Some(path) = matches.get_one::<String>("token") {
        config = config.with_token_path(path);
    }
    if let Some(page_size) = matches.get_one::<i32>("page-size") {
        config = config.with_page_size(*page_size);
    }
    config
}

async fn async_main(matches: &ArgMatches) -> Result<()> {
    let config = config_from_args(matches);
    let drive = GoogleDrive::connect(&config).await.map_err(|err| {
        error!(err = %err, "cannot connect to Google Drive");
        ExitStatusError::Failure(1)
    })?;

    let res = match matches.subcommand() {
        Some(("list", matches)) => {
            let query = matches.get_one::<String>("query").map(String::as_str);
            drive.list_files(query).await.map(|items| {
                if items.is_empty() {
                    println!("No files found.");
                } else {
                    println!("Files:");
                    for item in items {
                        println!("{item}");
                    }
                }
            })
        }
        Some(("find-folder", matches)) => {
            let name = required(matches, "name")?;
            drive.find_folder_by_name(name).await.map(|ids| {
                for id in ids {
                    println!("{id}");
                }
            })
        }
        Some(("create-folder", matches)) => {
            let name = required(matches, "name")?;
            let parent = matches.get_one::<String>("parent").map(String::as_str);
            drive
                .create_folder(name, parent)
                .await
                .map(|id| println!("{id}"))
        }
        Some(("upload", matches)) => {
            let path = Path::new(required(matches, "path")?);
            let parent = matches.get_one::<String>("parent").map(String::as_str);
            drive
                .upload_file(parent, path)
                .await
                .map(|item| println!("{}", item.id))
        }
        _ => return Err(anyhow!("unknown command")),
    };
    res.map_err(|err| {
        error!(err = %err);
        ExitStatusError::Failure(1)
    })?;
    info!("Bye!");

    Ok(())
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing argument {id}"))
}
