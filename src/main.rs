use chrono::NaiveDate;
use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use replaycli::{cli, config, utils};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Defaults to `list-tracks` when invoked without a subcommand.
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authenticate with Spotify
    Auth(AuthOptions),

    /// Remove stored tokens
    Logout,

    /// List tracks from listening history (default command)
    #[clap(alias = "list")]
    ListTracks(ListTracksOptions),

    /// Create a playlist from listening history
    #[clap(alias = "create")]
    CreatePlaylist(CreatePlaylistOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct AuthOptions {
    /// Use manual copy-paste flow (no redirect listener needed)
    #[clap(long)]
    pub manual: bool,
}

#[derive(Parser, Debug, Clone, Default)]
pub struct ListTracksOptions {
    /// Use a specific date (YYYY-MM-DD). Default: today
    #[clap(long, value_parser = utils::parse_date)]
    pub date: Option<NaiveDate>,

    /// Show all tracks including duplicates. Default: show only unique tracks
    #[clap(long)]
    pub all: bool,

    /// Print day-window boundaries and per-page fetch statistics
    #[clap(long)]
    pub debug: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CreatePlaylistOptions {
    /// Preview what would happen without creating the playlist
    #[clap(long)]
    pub dry_run: bool,

    /// Use a specific date (YYYY-MM-DD). Default: today
    #[clap(long, value_parser = utils::parse_date)]
    pub date: Option<NaiveDate>,

    /// Print day-window boundaries and per-page fetch statistics
    #[clap(long)]
    pub debug: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    config::load_env().await;

    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or(Command::ListTracks(ListTracksOptions::default()));

    match command {
        Command::Auth(opt) => cli::auth(opt.manual).await,
        Command::Logout => cli::logout().await,
        Command::ListTracks(opt) => cli::list_tracks(opt.date, opt.all, opt.debug).await,
        Command::CreatePlaylist(opt) => {
            cli::create_playlist(opt.date, opt.dry_run, opt.debug).await
        }
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
