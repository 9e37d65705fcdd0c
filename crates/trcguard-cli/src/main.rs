use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "trcguard", version, about = "trcguard CLI")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate a SELECT statement into tuple relational calculus.
    Trc {
        /// The SQL statement.
        #[arg(long)]
        sql: String,

        /// Knowledge graph document used to check table names.
        #[arg(long, env = "TRCGUARD_KG")]
        kg: Option<PathBuf>,

        /// Natural-language request; prints a full explanation when given.
        #[arg(long)]
        nl: Option<String>,
    },

    /// Run the three-stage validation gauntlet on a statement.
    Validate {
        /// The SQL statement.
        #[arg(long)]
        sql: String,

        /// Knowledge graph document holding the schema policy.
        #[arg(long, env = "TRCGUARD_KG")]
        kg: PathBuf,

        /// The natural-language request the statement was generated from.
        #[arg(long, default_value = "")]
        nl: String,

        /// Skip table and column checks for SELECT statements.
        #[arg(long, default_value_t = false)]
        no_semantic: bool,

        /// Print the result as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Generate a knowledge graph document from CREATE TABLE statements.
    Kg {
        /// DDL file.
        schema: PathBuf,

        /// Output file. Prints to stdout when omitted.
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Trc { sql, kg, nl } => commands::trc::run(&sql, kg.as_deref(), nl.as_deref())?,

        Command::Validate {
            sql,
            kg,
            nl,
            no_semantic,
            json,
        } => {
            if !commands::validate::run(&sql, &kg, &nl, !no_semantic, json)? {
                std::process::exit(1);
            }
        }

        Command::Kg { schema, out } => commands::kg::run(&schema, out.as_deref())?,
    }

    Ok(())
}
