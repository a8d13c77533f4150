//! Stencil - a rich-text editing core with a placeholder extension.
//!
//! # Usage
//!
//! ```bash
//! stencil letter.txt
//! stencil --insert StudentName letter.txt
//! stencil --list-entries
//! stencil --json --pretty letter.txt
//! ```
//!
//! Loads a document in data form, applies any requested insertions at the
//! end of the document, and prints the result (data form by default, model
//! JSON with `--json`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use stencil::config::{
    clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags, ConfigFlags,
};
use stencil::editor::Editor;
use stencil::model::Selection;
use stencil::placeholder::{insert_placeholder, PlaceholderExtension};

/// A rich-text editing core with a placeholder extension
#[derive(Parser, Debug)]
#[command(name = "stencil", version, about, long_about = None)]
struct Cli {
    /// Document to load, in data form (omit for an empty document)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Insert a placeholder with this type at the end of the document
    /// (repeatable)
    #[arg(short, long, value_name = "TYPE")]
    insert: Vec<String>,

    /// Print the document model as JSON instead of the data form
    #[arg(long)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Print the dropdown entries and exit
    #[arg(long)]
    list_entries: bool,

    /// Comma-separated dropdown entries replacing the stock four
    #[arg(long, value_name = "LIST")]
    entries: Option<String>,

    /// Save current command-line flags as defaults in .stencilrc
    #[arg(long)]
    save: bool,

    /// Clear saved defaults in .stencilrc
    #[arg(long)]
    clear: bool,
}

fn build_extension(entries: Option<&str>) -> PlaceholderExtension {
    entries.map_or_else(PlaceholderExtension::new, |list| {
        PlaceholderExtension::with_entries(
            list.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(ToOwned::to_owned)
                .collect(),
        )
    })
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    let extension = build_extension(cli.entries.as_deref().or(effective.entries.as_deref()));
    let mut editor = Editor::new();
    editor
        .add_extension(&extension)
        .context("Failed to initialize placeholder extension")?;

    if cli.list_entries {
        for entry in extension.entries() {
            println!("{entry}");
        }
        return Ok(());
    }

    if let Some(file) = &cli.file {
        let data = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        editor
            .set_data(data.trim_end_matches('\n'))
            .with_context(|| format!("Failed to parse {}", file.display()))?;
    }

    for type_tag in &cli.insert {
        // Each insertion lands at the end of the current content.
        let end = editor.document.width();
        editor
            .document
            .change(&editor.schema, |writer| {
                writer.set_selection(Selection::collapsed(end));
                Ok(())
            })
            .context("Failed to move selection")?;
        insert_placeholder(&mut editor, type_tag)
            .with_context(|| format!("Failed to insert placeholder `{type_tag}`"))?;
    }

    if effective.json {
        let json = if effective.pretty {
            serde_json::to_string_pretty(&editor.document)
        } else {
            serde_json::to_string(&editor.document)
        }
        .context("Failed to serialize document")?;
        println!("{json}");
    } else {
        println!("{}", editor.get_data());
    }

    Ok(())
}
