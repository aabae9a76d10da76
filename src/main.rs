use anyhow::Result;
use clap::Parser;
use release_pins::{
    builder::{BuildOptions, DEFAULT_MAX_VERSIONS},
    commands::{self, resolve_platform},
    config::{Config, DEFAULT_REPO, DEFAULT_TIMEOUT_SECS, Settings},
    github::GitHubRepo,
    http::RetryPolicy,
    platform::Platform,
    runtime::RealRuntime,
    store::DEFAULT_OUTPUT,
};
use std::path::PathBuf;
use std::time::Duration;

/// release-pins - pinned release metadata for toolchain installers
///
/// Builds a version -> platform -> {url, sha256, version} mapping from a
/// project's GitHub releases and answers "latest release for platform X"
/// queries against it.
///
/// If the GITHUB_TOKEN environment variable is set, it will be used for authentication.
///
/// Examples:
///   release-pins update             # Pin the 10 newest Bun releases
///   release-pins update -n 3        # Pin only the 3 newest
///   release-pins latest -p linux-x64
#[derive(Parser, Debug)]
#[command(name = "release-pins", version = env!("RELEASE_PINS_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Mapping file to write or read (also via RELEASE_PINS_OUTPUT)
    #[arg(
        long,
        short = 'o',
        env = "RELEASE_PINS_OUTPUT",
        value_name = "PATH",
        default_value = DEFAULT_OUTPUT,
        global = true
    )]
    output: PathBuf,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Rebuild the mapping from the newest releases
    Update(UpdateArgs),

    /// Print the newest release entry for a platform
    Latest(PlatformArgs),

    /// List every pinned release for a platform, newest first
    List(PlatformArgs),
}

#[derive(clap::Args, Debug)]
struct UpdateArgs {
    /// How many of the most recent versions to process
    #[arg(
        long,
        short = 'n',
        default_value_t = DEFAULT_MAX_VERSIONS as u16,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    count: u16,

    /// Keep releases marked as pre-releases
    #[arg(long)]
    include_prereleases: bool,

    /// The GitHub repository in the format "owner/repo"
    #[arg(long, value_name = "OWNER/REPO", default_value = DEFAULT_REPO)]
    repo: GitHubRepo,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", value_name = "URL")]
    api_url: Option<String>,

    /// Base URL release archives are downloaded from
    #[arg(
        long = "download-url",
        value_name = "URL",
        default_value = release_pins::asset::DEFAULT_DOWNLOAD_URL
    )]
    download_url: String,

    /// Prefix of release tags in front of the version
    #[arg(long, default_value = release_pins::asset::DEFAULT_TAG_PREFIX)]
    tag_prefix: String,

    /// Archive file name in front of the platform target
    #[arg(long, default_value = release_pins::asset::DEFAULT_ASSET_STEM)]
    asset_stem: String,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,
}

#[derive(clap::Args, Debug)]
struct PlatformArgs {
    /// Platform identifier (defaults to the current host)
    #[arg(long, short = 'p', value_name = "ID")]
    platform: Option<Platform>,
}

impl UpdateArgs {
    fn settings(self, output: PathBuf) -> Settings {
        Settings {
            repo: self.repo,
            api_url: self.api_url,
            download_url: self.download_url,
            tag_prefix: self.tag_prefix,
            asset_stem: self.asset_stem,
            timeout: Duration::from_secs(self.timeout),
            retry: RetryPolicy::default(),
            output,
        }
    }
}

fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(cli.verbose)),
    )
    .init();
    let runtime = RealRuntime;

    match cli.command {
        Commands::Update(args) => {
            let count = usize::from(args.count);
            let options = BuildOptions {
                include_prereleases: args.include_prereleases,
            };
            let config = Config::new(&runtime, args.settings(cli.output))?;
            commands::update(&runtime, config, count, options).await?;
        }
        Commands::Latest(args) => {
            let platform = resolve_platform(args.platform)?;
            commands::latest(&runtime, &cli.output, platform)?;
        }
        Commands::List(args) => {
            let platform = resolve_platform(args.platform)?;
            commands::list(&runtime, &cli.output, platform)?;
        }
    }
    Ok(())
}
