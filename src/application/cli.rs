use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgGroup;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::AnalysisKind;
use crate::domain::models::BackendName;
use crate::domain::models::ChatStoreBox;
use crate::domain::models::SessionRecord;
use crate::domain::models::StoreName;
use crate::domain::services::actions::help_text;
use crate::domain::services::run_analysis;
use crate::domain::services::Templates;
use crate::infrastructure::backends::BackendManager;
use crate::infrastructure::stores::StoreManager;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

fn format_session(session: &SessionRecord) -> String {
    return format!(
        "- (ID: {}) {}, {}",
        session.id,
        session.updated_at.format("%Y-%m-%dT%H:%M:%S"),
        session.title,
    );
}

fn store() -> Result<ChatStoreBox> {
    return StoreManager::get(StoreName::parse(Config::get(ConfigKey::Store))?);
}

async fn print_sessions_list() -> Result<()> {
    let mut sessions = store()?
        .list_chats()
        .await?
        .iter()
        .map(|session| {
            return format_session(session);
        })
        .collect::<Vec<String>>();

    sessions.reverse();

    if sessions.is_empty() {
        println!("There are no sessions available. You should start your first one!");
    } else {
        println!("{}", sessions.join("\n"));
    }

    return Ok(());
}

async fn delete_sessions(matches: &clap::ArgMatches) -> Result<()> {
    let store = store()?;

    if matches.get_flag("all") {
        for session in store.list_chats().await? {
            store.delete_chat(&session.id).await?;
            println!("Deleted session {}", session.id);
        }
        return Ok(());
    }

    if let Some(id) = matches.get_one::<String>("session-id") {
        store.delete_chat(id).await?;
        println!("Deleted session {id}");
    }

    return Ok(());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if !config_file_path.parent().unwrap().exists() {
        fs::create_dir_all(config_file_path.parent().unwrap()).await?;
    }

    let mut file = fs::File::create(config_file_path.clone()).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    let config_path_display = config_file_path.as_os_str().to_str().unwrap();
    println!("Created default config file at {config_path_display}");
    return Ok(());
}

async fn run_analyze(matches: &clap::ArgMatches) -> Result<()> {
    let kind = AnalysisKind::parse(matches.get_one::<String>("analysis").unwrap())?;
    let file = matches.get_one::<String>("file").unwrap();
    let input = fs::read_to_string(file).await?;

    let backend = BackendManager::get(BackendName::parse(Config::get(ConfigKey::Backend))?)?;
    backend.health_check().await?;

    let report = run_analysis(&backend, kind, &input).await?;
    println!("{report}");

    return Ok(());
}

fn print_templates(matches: &clap::ArgMatches) -> Result<()> {
    if let Some(("show", show_matches)) = matches.subcommand() {
        let name = show_matches.get_one::<String>("name").unwrap();
        println!("{}", Templates::get(name)?);
        return Ok(());
    }

    for name in Templates::list() {
        println!("- {name}");
    }

    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_sessions_delete() -> Command {
    return Command::new("delete")
        .about("Delete one or all sessions.")
        .arg(
            clap::Arg::new("session-id")
                .short('i')
                .long("id")
                .help("Session ID")
                .num_args(1),
        )
        .arg(
            clap::Arg::new("all")
                .long("all")
                .help("Delete all sessions.")
                .num_args(0)
                .action(ArgAction::SetTrue),
        )
        .group(
            ArgGroup::new("delete-args")
                .args(["session-id", "all"])
                .required(true),
        );
}

fn subcommand_sessions() -> Command {
    return Command::new("sessions")
        .about("Manage past chat sessions.")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("list").about("List all previous sessions with their ids and titles."),
        )
        .subcommand(
            Command::new("open").about("Open a previous session by ID.").arg(
                clap::Arg::new(ConfigKey::SessionID.to_string())
                    .short('i')
                    .long("id")
                    .help("Session ID")
                    .required(true),
            ),
        )
        .subcommand(subcommand_sessions_delete());
}

fn subcommand_templates() -> Command {
    return Command::new("templates")
        .about("Browse the snippet template library.")
        .subcommand(Command::new("list").about("List all templates."))
        .subcommand(
            Command::new("show").about("Print a template by name.").arg(
                clap::Arg::new("name")
                    .help("Template name, as shown by list.")
                    .required(true),
            ),
        );
}

fn subcommand_analyze() -> Command {
    return Command::new("analyze")
        .about("Run a one-shot analysis without starting a chat.")
        .arg(
            clap::Arg::new("analysis")
                .help("Which analysis to run.")
                .value_parser(PossibleValuesParser::new(AnalysisKind::VARIANTS))
                .required(true),
        )
        .arg(
            clap::Arg::new("file")
                .short('f')
                .long("file")
                .help("Path to a file holding the text to analyze.")
                .required(true),
        );
}

fn arg_backend() -> Arg {
    return Arg::new(ConfigKey::Backend.to_string())
        .short('b')
        .long(ConfigKey::Backend.to_string())
        .env("CAREERSPARK_BACKEND")
        .num_args(1)
        .help(format!(
            "The backend hosting a model to connect to. [default: {}]",
            Config::default(ConfigKey::Backend)
        ))
        .value_parser(PossibleValuesParser::new(BackendName::VARIANTS));
}

fn arg_backend_health_check_timeout() -> Arg {
    return Arg::new(ConfigKey::BackendHealthCheckTimeout.to_string())
        .long(ConfigKey::BackendHealthCheckTimeout.to_string())
        .env("CAREERSPARK_BACKEND_HEALTH_CHECK_TIMEOUT")
        .num_args(1)
        .help(
            format!("Time to wait in milliseconds before timing out when doing a healthcheck. [default: {}]", Config::default(ConfigKey::BackendHealthCheckTimeout)),
        );
}

fn arg_model() -> Arg {
    return Arg::new(ConfigKey::Model.to_string())
        .short('m')
        .long(ConfigKey::Model.to_string())
        .env("CAREERSPARK_MODEL")
        .num_args(1)
        .help(format!(
            "The model on the backend to consume. [default: {}]",
            Config::default(ConfigKey::Model)
        ));
}

fn subcommand_chat() -> Command {
    return Command::new("chat")
        .about("Start a new chat session.")
        .arg(arg_backend())
        .arg(arg_backend_health_check_timeout())
        .arg(arg_model());
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return Paint::new(format!("CHAT {line}")).underline().bold().to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    return Command::new("careerspark")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_analyze())
        .subcommand(subcommand_chat())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_sessions())
        .subcommand(subcommand_templates())
        .arg(arg_backend())
        .arg(arg_backend_health_check_timeout())
        .arg(arg_model())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("CAREERSPARK_CONFIG_FILE")
                .num_args(1)
                .help(format!(
                    "Path to configuration file [default: {}]",
                    Config::default(ConfigKey::ConfigFile)
                ))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::GeminiURL.to_string())
                .long(ConfigKey::GeminiURL.to_string())
                .env("CAREERSPARK_GEMINI_URL")
                .num_args(1)
                .help(format!(
                    "Gemini API URL. Can be swapped to a compatible proxy. [default: {}]",
                    Config::default(ConfigKey::GeminiURL)
                ))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::GeminiToken.to_string())
                .long(ConfigKey::GeminiToken.to_string())
                .env("CAREERSPARK_GEMINI_TOKEN")
                .num_args(1)
                .help("Gemini API token.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Store.to_string())
                .long(ConfigKey::Store.to_string())
                .env("CAREERSPARK_STORE")
                .num_args(1)
                .help(format!(
                    "The store persisting chat sessions. [default: {}]",
                    Config::default(ConfigKey::Store)
                ))
                .value_parser(PossibleValuesParser::new(StoreName::VARIANTS))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::SupabaseURL.to_string())
                .long(ConfigKey::SupabaseURL.to_string())
                .env("CAREERSPARK_SUPABASE_URL")
                .num_args(1)
                .help("Supabase project URL when using the supabase store.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::SupabaseKey.to_string())
                .long(ConfigKey::SupabaseKey.to_string())
                .env("CAREERSPARK_SUPABASE_KEY")
                .num_args(1)
                .help("Supabase anon key when using the supabase store.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::RequestMaxAttempts.to_string())
                .long(ConfigKey::RequestMaxAttempts.to_string())
                .env("CAREERSPARK_REQUEST_MAX_ATTEMPTS")
                .num_args(1)
                .help(format!(
                    "Maximum attempts for a single model request, including retries. [default: {}]",
                    Config::default(ConfigKey::RequestMaxAttempts)
                ))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::StorePollSeconds.to_string())
                .long(ConfigKey::StorePollSeconds.to_string())
                .env("CAREERSPARK_STORE_POLL_SECONDS")
                .num_args(1)
                .help(format!(
                    "Seconds between change-feed polls against the store. [default: {}]",
                    Config::default(ConfigKey::StorePollSeconds)
                ))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Username.to_string())
                .short('u')
                .long(ConfigKey::Username.to_string())
                .env("CAREERSPARK_USERNAME")
                .num_args(1)
                .help("Your user name displayed against your own messages.")
                .global(true),
        );
}

/// Returns true when the process should continue into the chat UI.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("analyze", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            run_analyze(subcmd_matches).await?;
        }
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            return Ok(true);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
            }
            _ => {}
        },
        Some(("sessions", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            match subcmd_matches.subcommand() {
                Some(("list", _)) => {
                    print_sessions_list().await?;
                }
                Some(("open", open_matches)) => {
                    if let Some(session_id) =
                        open_matches.get_one::<String>(&ConfigKey::SessionID.to_string())
                    {
                        Config::set(ConfigKey::SessionID, session_id);
                        return Ok(true);
                    }
                }
                Some(("delete", delete_matches)) => {
                    delete_sessions(delete_matches).await?;
                }
                _ => {}
            }
        }
        Some(("templates", subcmd_matches)) => {
            print_templates(subcmd_matches)?;
        }
        _ => {
            Config::load(build(), vec![&matches]).await?;
            return Ok(true);
        }
    }

    return Ok(false);
}
