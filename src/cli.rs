use clap::{Parser, Subcommand};
use simplelog::TerminalMode;

use crate::sources::SourceRegistry;
use crate::storage::Gost;

#[derive(Parser, Debug)]
#[command(name = "gostbot")]
#[command(author, version, about = "Telegram bot for looking up Russian national standards (GOST)", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot and the health server
    Run,

    /// Fill the catalogue from the public GOST portals
    Populate {
        /// Import from a single source (e.g. gost.ru)
        #[arg(short, long, conflicts_with = "all")]
        source: Option<String>,

        /// List the available sources and exit
        #[arg(long)]
        list_sources: bool,

        /// Import from all sources (default)
        #[arg(long)]
        all: bool,
    },

    /// Search the local catalogue
    Search {
        /// Number, designation or part of the title
        text: String,

        /// Maximum number of results
        #[arg(short, long, default_value_t = crate::core::config::search::RESULT_LIMIT)]
        limit: usize,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The bot logs to the terminal as usual; `populate` and `search` print
    /// their results on stdout, so their log lines go to stderr.
    pub fn terminal_mode(&self) -> TerminalMode {
        match self.command {
            Some(Commands::Run) | None => TerminalMode::Mixed,
            Some(Commands::Populate { .. }) | Some(Commands::Search { .. }) => TerminalMode::Stderr,
        }
    }
}

/// Renders `gostbot search` output: a JSON array, or one GOST per line with
/// its description indented below.
pub fn render_search_results(text: &str, gosts: &[Gost], json: bool) -> serde_json::Result<String> {
    if json {
        return serde_json::to_string_pretty(gosts);
    }
    if gosts.is_empty() {
        return Ok(format!("Nothing found for '{}'", text.trim()));
    }

    let lines: Vec<String> = gosts
        .iter()
        .map(|gost| {
            if gost.description.is_empty() {
                gost.name.clone()
            } else {
                format!("{}\n    {}", gost.name, gost.description)
            }
        })
        .collect();
    Ok(lines.join("\n"))
}

/// One `  - name: base_url` line per source.
pub fn format_source_list(registry: &SourceRegistry) -> String {
    let mut out = String::from("Available sources:");
    for source in registry.sources() {
        out.push_str(&format!("\n  - {}: {}", source.name(), source.base_url()));
    }
    out
}
