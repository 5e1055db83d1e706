///
/// hostdbi CLI - Query SQLite databases through the hostdbi driver
///
/// Commands:
/// - hostdbi query <db> <sql>: Fetch a result and print it as a frame
/// - hostdbi exec <db> <sql>: Run statements and print rows changed
/// - hostdbi tables <db>: List tables
/// - hostdbi version: Print the linked SQLite version
///
/// `--config` reads a hostdbi.toml; `HOSTDBI_*` environment variables
/// override it either way.
///

mod render;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

use hostdbi_core::report::raise;
use hostdbi_core::{load_config, DbiConfig, DbiError};
use hostdbi_sqlite::Driver;

#[derive(Parser)]
#[command(name = "hostdbi")]
#[command(author, version, about = "Query SQLite databases through hostdbi", long_about = None)]
struct Cli {
    /// Driver configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log driver activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query and print the fetched rows
    Query {
        /// Database file
        database: String,

        /// SQL text
        sql: String,

        /// Fetch at most this many rows
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Run statements that return no rows
    Exec {
        /// Database file
        database: String,

        /// SQL text
        sql: String,
    },

    /// List the tables in a database
    Tables {
        /// Database file
        database: String,
    },

    /// Print the SQLite library version
    Version,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let config = match read_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let driver_name = config.driver_name.clone();
    let mut driver = Driver::new(config);

    if let Err(e) = run(&mut driver, cli.command) {
        eprintln!("{}", raise(&driver_name, &e));
        std::process::exit(1);
    }
}

fn read_config(path: Option<&std::path::Path>) -> Result<DbiConfig, DbiError> {
    let mut config = match path {
        Some(p) => load_config(p)?,
        None => DbiConfig::default(),
    };
    config.apply_env_with(|name| std::env::var(name).ok());
    Ok(config)
}

fn run(driver: &mut Driver, command: Commands) -> Result<(), DbiError> {
    match command {
        Commands::Query {
            database,
            sql,
            limit,
        } => {
            let conn = driver.connect(&database)?;
            let res = driver.send_query(conn, &sql)?;
            let n = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
            let table = driver.fetch(res, n)?;
            print!("{}", render::render_table(&table));

            let info = driver.result_info(res)?;
            if !info.completed {
                println!("({} rows fetched, more available)", info.row_count);
            }
            driver.disconnect(conn)?;
        }
        Commands::Exec { database, sql } => {
            let conn = driver.connect(&database)?;
            let changed = driver.exec(conn, &sql)?;
            println!("{} rows changed", changed);
            driver.disconnect(conn)?;
        }
        Commands::Tables { database } => {
            let conn = driver.connect(&database)?;
            let table = driver.get_query(
                conn,
                "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
            )?;
            if let Some(names) = table.column("name").and_then(|c| c.as_string()) {
                for name in names {
                    println!("{}", name);
                }
            }
            driver.disconnect(conn)?;
        }
        Commands::Version => {
            for (name, number) in Driver::library_versions() {
                println!("{} ({})", name, number);
            }
        }
    }
    Ok(())
}
