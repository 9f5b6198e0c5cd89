//! Command-line front end.
//!
//! Each subcommand is a plain function returning `Result<_, String>`, so the
//! binary only has to print the message and exit non-zero.

pub mod draft;
pub mod import;
pub mod render;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::drafts::DraftStore;
use crate::form::ReportForm;
use crate::pipeline::structuring::ExtractionEngine;

#[derive(Parser, Debug)]
#[command(name = "diario-obra")]
#[command(version, about = "Diário de obra: importa dados de documentos Word e gera o relatório em PDF", long_about = None)]
pub struct Cli {
    /// Directory holding saved drafts (defaults to the app data dir)
    #[arg(long, global = true)]
    pub drafts_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract report fields from a .docx file
    Import {
        /// Word document (.docx)
        file: PathBuf,

        /// Extraction engine: heuristic or llm
        #[arg(short, long, default_value = "heuristic")]
        engine: ExtractionEngine,

        /// Form JSON to merge the extracted fields into
        #[arg(long)]
        form: Option<PathBuf>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a form and write the PDF report
    Render {
        /// Form JSON
        form: PathBuf,

        #[command(flatten)]
        options: RenderArgs,
    },

    /// Manage saved drafts
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct RenderArgs {
    /// Image to attach (repeatable)
    #[arg(short, long = "image")]
    pub images: Vec<PathBuf>,

    /// Output PDF (defaults to Diario_Obra_<folha>_<data>.pdf)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Stamp configuration JSON
    #[arg(long, conflicts_with = "no_stamp")]
    pub stamp: Option<PathBuf>,

    /// Leave the engineer's stamp out
    #[arg(long)]
    pub no_stamp: bool,
}

#[derive(Subcommand, Debug)]
pub enum DraftAction {
    /// Save a form as a draft (new, or overwrite with --id)
    Save {
        form: PathBuf,
        #[arg(long)]
        id: Option<uuid::Uuid>,
    },
    /// List drafts, newest first
    List,
    /// Print a draft's form JSON
    Show { id: uuid::Uuid },
    /// Delete a draft
    Delete { id: uuid::Uuid },
    /// Render a draft to PDF
    Render {
        id: uuid::Uuid,
        #[command(flatten)]
        options: RenderArgs,
    },
}

/// Run a parsed command line.
pub fn execute(cli: Cli) -> Result<(), String> {
    let store = || {
        cli.drafts_dir
            .clone()
            .map(DraftStore::new)
            .unwrap_or_else(DraftStore::open_default)
    };

    match cli.command {
        Command::Import {
            file,
            engine,
            form,
            output,
        } => import::import_command(&file, engine, form.as_deref(), output.as_deref()),
        Command::Render { form, options } => {
            let path = render::render_form_file(&form, &options)?;
            println!("{}", path.display());
            Ok(())
        }
        Command::Draft { action } => draft::draft_command(&store(), action),
    }
}

pub(crate) fn read_form(path: &Path) -> Result<ReportForm, String> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Não foi possível ler {}: {e}", path.display()))?;
    serde_json::from_slice(&bytes).map_err(|e| format!("Formulário inválido em {}: {e}", path.display()))
}

/// Pretty JSON to `output`, or to stdout.
pub(crate) fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| format!("Erro ao gerar JSON: {e}"))?;
    match output {
        Some(path) => std::fs::write(path, json)
            .map_err(|e| format!("Não foi possível gravar {}: {e}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
