//! Command line interface of the `rdfs-studio` binary.
//!
//! ```sh
//! rdfs-studio start --port 8080
//! rdfs-studio export vocab.rdf --output vocab.ttl
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::{
    boot::{self, ServeParams},
    editor::Editor,
    environment::{resolve_from_env, Environment},
    Error, Result,
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Specify the environment [default: `RDFS_STUDIO_ENV` or development]
    #[arg(short, long, global = true)]
    environment: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the editor server
    Start {
        /// server bind address
        #[arg(short, long, action)]
        binding: Option<String>,
        /// server port address
        #[arg(short, long, action)]
        port: Option<i32>,
    },
    /// Convert an RDF document to Turtle
    Export {
        /// Turtle, N-Triples, N3 or RDF/XML input
        input: PathBuf,
        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Runs the command line.
///
/// # Errors
///
/// Returns the error of the executed command.
pub async fn main() -> Result<()> {
    let cli = Cli::parse();
    let environment: Environment = cli.environment.unwrap_or_else(resolve_from_env).into();

    match cli.command {
        Commands::Start { binding, port } => {
            let ctx = boot::load(&environment)?;
            let mut params = ServeParams::from_config(&ctx.config);
            if let Some(port) = port {
                params.port = port;
            }
            if let Some(binding) = binding {
                params.binding = binding;
            }
            boot::start(ctx, params).await
        }
        Commands::Export { input, output } => {
            let turtle = export(&input)?;
            match output {
                Some(path) => std::fs::write(path, turtle)?,
                None => print!("{turtle}"),
            }
            Ok(())
        }
    }
}

/// Loads `input` as a user ontology and serializes it as Turtle.
///
/// # Errors
///
/// Fails when the file cannot be read or parsed.
pub fn export(input: &std::path::Path) -> Result<String> {
    let bytes = std::fs::read(input)?;
    let file_name = input
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::BadRequest(format!("invalid file name `{}`", input.display())))?;
    let mut editor = Editor::default();
    editor.upload(&bytes, file_name)?;
    Ok(editor.to_turtle()?)
}
