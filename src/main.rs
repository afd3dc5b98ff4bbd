use chrono::NaiveDate;
use clap::Parser;
use eyre::{Context, Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use slack_chat_export::archive::{Export, Scope};
use slack_chat_export::convert::{self, ConvertOptions, Progress};

/// Convert a Slack workspace export archive into a single chronological
/// Markdown log.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the Slack export zip archive.
    #[arg(value_name = "ARCHIVE")]
    archive: PathBuf,

    /// Earliest date to include (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    start_date: Option<NaiveDate>,

    /// Latest date to include (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    end_date: Option<NaiveDate>,

    /// Primary user: their messages render as plain log entries instead of
    /// quoted dialogue. Any Slack identifier works (id, name, real name).
    #[arg(long, value_name = "NAME")]
    me: Option<String>,

    /// Comma-separated users to include (e.g. "alice,bob").
    /// Defaults to everyone.
    #[arg(long, value_name = "USERS", value_delimiter = ',')]
    users: Option<Vec<String>>,

    /// Comma-separated channels to include.
    /// Defaults to all channels.
    #[arg(long, value_name = "CHANNELS", value_delimiter = ',')]
    channels: Option<Vec<String>>,

    /// Directory for downloaded attachments.
    /// Defaults to ./assets if not set in config.
    #[arg(long, value_name = "DIR")]
    assets: Option<PathBuf>,

    /// Directory receiving the generated Markdown file.
    /// Defaults to the current directory.
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Path to a specific configuration file.
    /// Defaults to $XDG_CONFIG_HOME/slack-chat-export/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// List the user names present in the archive and exit.
    #[arg(long)]
    list_users: bool,

    /// List the channel names present in the archive and exit.
    #[arg(long)]
    list_channels: bool,

    /// Suppress standard output (progress bars, summary).
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Deserialize, Default)]
struct FileConfig {
    asset_path: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    my_user_name: Option<String>,
    users: Option<Vec<String>>,
    channels: Option<Vec<String>>,
}

fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = if let Some(p) = explicit_path {
        if !p.exists() {
            return Err(eyre!("Config file not found: {}", p.display()));
        }
        Some(p.to_path_buf())
    } else {
        // Search: XDG/OS config dir, then nothing
        dirs::config_dir()
            .map(|d| d.join("slack-chat-export/config.toml"))
            .filter(|p| p.exists())
    };

    match path {
        None => Ok(FileConfig::default()),
        Some(p) => {
            let content = fs::read_to_string(&p)
                .wrap_err_with(|| format!("Failed to read config: {}", p.display()))?;
            toml::from_str(&content)
                .wrap_err_with(|| format!("Failed to parse config: {}", p.display()))
        }
    }
}

/// Progress sink backed by an indicatif bar, hidden under --quiet.
struct BarProgress {
    bar: ProgressBar,
    quiet: bool,
}

impl BarProgress {
    fn new(quiet: bool) -> Self {
        Self {
            bar: ProgressBar::hidden(),
            quiet,
        }
    }
}

impl Progress for BarProgress {
    fn begin(&mut self, task: &str, total: usize) {
        self.bar = if self.quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(total as u64);
            bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)",
                )
                .unwrap()
                .progress_chars("=>-"),
            );
            bar.println(format!("{task}..."));
            bar
        };
    }

    fn step(&mut self) {
        self.bar.inc(1);
    }

    fn finish(&mut self) {
        self.bar.finish_and_clear();
    }
}

fn loading_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        ProgressBar::hidden()
    } else {
        let s = ProgressBar::new_spinner();
        s.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        s.set_message("Loading archive...");
        s.enable_steady_tick(Duration::from_millis(80));
        s
    }
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().cloned().collect::<Vec<_>>().join(", ")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load config file (CLI path > default path)
    let file_cfg = load_file_config(cli.config.as_deref())?;

    if !cli.archive.exists() {
        return Err(eyre!("Archive not found at: {}", cli.archive.display()));
    }

    if cli.list_users {
        for name in convert::list_users(&cli.archive)? {
            println!("{name}");
        }
        return Ok(());
    }
    if cli.list_channels {
        for name in convert::list_channels(&cli.archive)? {
            println!("{name}");
        }
        return Ok(());
    }

    // 2. Resolve everything else (CLI > Config > Default)
    let asset_path = cli
        .assets
        .or(file_cfg.asset_path)
        .unwrap_or_else(|| PathBuf::from("assets"));
    let out_dir = cli
        .out_dir
        .or(file_cfg.out_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    let scope = Scope {
        start_date: cli.start_date,
        end_date: cli.end_date,
        my_user_name: cli.me.or(file_cfg.my_user_name),
        users: cli.users.or(file_cfg.users),
        channels: cli.channels.or(file_cfg.channels),
    };

    // 3. Open the archive once; the summary and the conversion share it
    let spinner = loading_spinner(cli.quiet);
    let export = Export::open(&cli.archive, &scope)
        .wrap_err_with(|| format!("Failed to load archive: {}", cli.archive.display()))?;
    spinner.finish_and_clear();

    if !cli.quiet {
        eprintln!("Selected options:");
        eprintln!("\tChannels: {}", join(export.channel_names()));
        eprintln!("\tUsers: {}", join(export.user_names()));
        eprintln!("\tPrimary user: {}", export.primary_user());
        eprintln!(
            "\tDate range: {} to {}",
            export.start_date(),
            export.end_date()
        );
    }

    // 4. Run the conversion
    let options = ConvertOptions {
        asset_path,
        out_dir,
    };
    let mut progress = BarProgress::new(cli.quiet);
    let out_path =
        convert::convert_export(&export, &options, &mut progress).wrap_err("Conversion failed")?;

    if !cli.quiet {
        eprintln!("Wrote {}", out_path.display());
    }

    Ok(())
}
