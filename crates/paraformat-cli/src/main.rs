use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use paraformat_core::{
    ClassList, Document, DocumentAccess, Format, PluginOptions, active_formats, apply, decode,
    element_format_ids, encode, selection_label, unwrap_temporary_blocks,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "paraformat-cli", about = "Apply paragraph formats to XHTML fragments")]
struct Cli {
    /// Log rewrite steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the canonical key of a format
    Encode {
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        id: Option<String>,
        /// Class tokens, space-delimited
        #[arg(long)]
        class: Option<String>,
    },
    /// Print a format key as JSON
    Decode { format_id: String },
    /// Rewrite the blocks marked `data-selected` in a fragment
    Apply {
        format_id: String,
        /// Fragment file; stdin when absent
        input: Option<PathBuf>,
        #[arg(long, default_value = "p", conflicts_with = "no_default_tag")]
        default_tag: String,
        /// Rewrite as a host without a default block tag
        #[arg(long)]
        no_default_tag: bool,
        /// Keep the neutral wrappers made when there is no default tag
        #[arg(long)]
        keep_temp: bool,
        #[arg(long)]
        sanitized: bool,
    },
    /// Print which configured formats match the first `data-selected` block
    Active {
        input: Option<PathBuf>,
        /// JSON options file (`formats`, `showSelection`)
        #[arg(long)]
        options: Option<PathBuf>,
        #[arg(long, default_value = "p")]
        default_tag: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(message) = run(cli.command) {
        eprintln!("{}", message);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Encode { tag, id, class } => {
            let format = Format {
                title: None,
                tag,
                id,
                class_list: class.map(ClassList::Text),
            };
            println!("{}", encode(&format));
        }
        Command::Decode { format_id } => {
            let json = serde_json::to_string(&decode(&format_id))
                .map_err(|err| format!("failed to serialize format: {}", err))?;
            println!("{}", json);
        }
        Command::Apply {
            format_id,
            input,
            default_tag,
            no_default_tag,
            keep_temp,
            sanitized,
        } => {
            let default_tag = (!no_default_tag).then_some(default_tag.as_str());
            let mut doc = load_document(input.as_deref())?.with_default_tag(default_tag);
            let blocks = doc.selection().to_vec();
            let format = decode(&format_id);

            let report = apply(&mut doc, &format, &blocks)
                .map_err(|err| format!("failed to apply {}: {}", format_id, err))?;
            tracing::info!(
                replaced = report.replaced,
                unwrapped = report.unwrapped,
                merged = report.merged,
                "rewrite finished"
            );
            if !keep_temp {
                unwrap_temporary_blocks(&mut doc)
                    .map_err(|err| format!("failed to unwrap temporary blocks: {}", err))?;
            }

            let html = if sanitized {
                doc.to_html_sanitized()
            } else {
                doc.to_html()
            };
            println!("{}", html);
        }
        Command::Active {
            input,
            options,
            default_tag,
        } => {
            let options = match options {
                Some(path) => load_options(&path)?,
                None => PluginOptions::default(),
            };
            let doc = load_document(input.as_deref())?;
            let block = doc
                .selection()
                .first()
                .map(|block| doc.element_format(block));
            let ids = element_format_ids(block.as_ref(), Some(default_tag.as_str()));

            for id in &ids {
                println!("id\t{}", id);
            }
            for format in active_formats(&options.formats, &ids) {
                println!("active\t{}", format.title.as_deref().unwrap_or_default());
            }
            if let Some(label) = selection_label(&options, &ids) {
                println!("label\t{}", label);
            }
        }
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String, String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .map_err(|err| format!("failed to read {}: {}", path.display(), err)),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|err| format!("failed to read stdin: {}", err))?;
            Ok(buffer)
        }
    }
}

fn load_document(path: Option<&Path>) -> Result<Document, String> {
    let source = read_input(path)?;
    Document::from_xhtml(source.trim()).map_err(|err| err.to_string())
}

fn load_options(path: &Path) -> Result<PluginOptions, String> {
    let source = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    serde_json::from_str(&source)
        .map_err(|err| format!("invalid options in {}: {}", path.display(), err))
}
