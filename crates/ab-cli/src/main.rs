//! `ab`: inspect the component registry, generate code from a project file,
//! and move projects in and out of the local store.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::RunTarget;

const DEFAULT_STORE: &str = ".appbuilder";

/// App Builder command line
#[derive(Parser, Debug)]
#[command(name = "ab")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory of the local project store
    #[arg(long, global = true, default_value = DEFAULT_STORE)]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the component palette by category
    Components,

    /// Generate index.html, styles.css and script.js for a page
    Generate {
        /// Project file (as written by `ab export`)
        project: PathBuf,

        /// Page id; defaults to the project's current page
        #[arg(short, long)]
        page: Option<String>,

        /// Output directory
        #[arg(short, long, default_value = "./dist")]
        out: PathBuf,
    },

    /// Export a page as one self-contained HTML file
    ExportHtml {
        /// Project file (as written by `ab export`)
        project: PathBuf,

        /// Page id; defaults to the project's current page
        #[arg(short, long)]
        page: Option<String>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Replace the stored project with a project file
    Import {
        file: PathBuf,
    },

    /// Write the stored project to a timestamped project file
    Export {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Run an API, a SQL query, or a datasource connection test
    Run {
        #[command(subcommand)]
        target: RunCommand,
    },
}

#[derive(Subcommand, Debug)]
enum RunCommand {
    /// Send an API request
    Api { id: String },
    /// Execute a SQL query
    Query { id: String },
    /// Test a datasource connection
    Datasource { id: String },
}

impl From<RunCommand> for RunTarget {
    fn from(cmd: RunCommand) -> Self {
        match cmd {
            RunCommand::Api { id } => RunTarget::Api(id),
            RunCommand::Query { id } => RunTarget::Query(id),
            RunCommand::Datasource { id } => RunTarget::Datasource(id),
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Components => {
            print!("{}", commands::components_listing());
            Ok(true)
        }
        Command::Generate { project, page, out } => {
            commands::generate(&project, page.as_deref(), &out).map(|written| {
                for path in written {
                    println!("wrote {}", path.display());
                }
                true
            })
        }
        Command::ExportHtml { project, page, out } => {
            commands::export_html(&project, page.as_deref(), &out).map(|path| {
                println!("wrote {}", path.display());
                true
            })
        }
        Command::Import { file } => commands::import(&cli.store, &file).map(|pages| {
            println!("imported {} ({pages} pages) into {}", file.display(), cli.store.display());
            true
        }),
        Command::Export { out } => commands::export(&cli.store, &out).map(|path| {
            println!("wrote {}", path.display());
            true
        }),
        Command::Run { target } => commands::run(&cli.store, &target.into()).await,
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            log::debug!("{err:?}");
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}
