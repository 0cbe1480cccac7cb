mod boost;
mod imagine;
mod model;
mod posts;
mod profile;
mod sync;
mod top;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[clap(version, about = "Engagement helpers for an imagine.art account")]
struct Args {
    /// Path to the post ids file
    #[clap(short, long, global = true, default_value = "./post_ids.txt")]
    file: PathBuf,
    /// Base URL of the API (defaults to the public endpoint)
    #[clap(long, global = true)]
    api: Option<String>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a fresh post ids file
    Init,
    /// Fetch the published posts of an account and append any new ids
    Sync(SyncArgs),
    /// Rank the published posts by likes and rewrite the top list
    Top(TopArgs),
    /// Register a view on every tracked post
    Views,
    /// Favorite a random selection of tracked posts
    Like(LikeArgs),
    /// Favorite the current top ranked posts
    LikeTop(LikeTopArgs),
    /// Register a download on a random selection of tracked posts
    Download(DownloadArgs),
    /// Print engagement totals and rankings for a profile
    Profile(ProfileArgs),
}

#[derive(clap::Args, Debug)]
struct SyncArgs {
    /// Account whose published posts to harvest
    #[clap(short, long)]
    user: String,
    /// Page size for the published feed
    #[clap(long, default_value_t = 5000)]
    limit: u32,
}

#[derive(clap::Args, Debug)]
struct TopArgs {
    /// Account whose published posts to rank
    #[clap(short, long)]
    user: String,
    /// Page size for the published feed
    #[clap(long, default_value_t = 3000)]
    limit: u32,
    /// How many of the best liked posts to keep
    #[clap(short = 'n', long, default_value_t = 50)]
    count: usize,
}

#[derive(clap::Args, Debug)]
struct LikeArgs {
    /// How many random posts to like
    #[clap(short = 'n', long, default_value_t = 500)]
    count: usize,
}

#[derive(clap::Args, Debug)]
struct LikeTopArgs {
    /// How many of the ranked posts to like
    #[clap(short = 'n', long, default_value_t = 45)]
    count: usize,
}

#[derive(clap::Args, Debug)]
struct DownloadArgs {
    /// How many random posts to download
    #[clap(short = 'n', long, default_value_t = 150)]
    count: usize,
}

#[derive(clap::Args, Debug)]
struct ProfileArgs {
    /// Username or profile URL; prompts when omitted
    username: Option<String>,
    /// Page size for the published feed
    #[clap(long, default_value_t = 3000)]
    limit: u32,
    /// Rows per ranking table
    #[clap(short = 'n', long, default_value_t = 10)]
    count: usize,
}

/// Settings shared by every subcommand.
struct AppOptions {
    file: PathBuf,
    api: Url,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = main2().await {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

async fn main2() -> anyhow::Result<()> {
    let Args { file, api, command } = Args::parse();
    let api = imagine::parse_api_base(api.as_deref().unwrap_or(imagine::DEFAULT_API_BASE))?;
    let opts = AppOptions { file, api };

    match command {
        Command::Init => posts::init(&opts.file).await,
        Command::Sync(args) => sync::run(&opts, &args).await,
        Command::Top(args) => top::run(&opts, &args).await,
        Command::Views => boost::views(&opts).await,
        Command::Like(args) => boost::like(&opts, &args).await,
        Command::LikeTop(args) => boost::like_top(&opts, &args).await,
        Command::Download(args) => boost::download(&opts, &args).await,
        Command::Profile(args) => profile::run(&opts, &args).await,
    }
}
