// Entrypoint for the CLI application.
// - Parses arguments, sets up logging and builds the API client.
// - Runs the chosen prompt and prints the resolved ids, one per line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use mangadex_cli::api::ApiClient;
use mangadex_cli::commands::{self, CommandOptions, DEFAULT_PAGE_SIZE};
use mangadex_cli::config::{self, Config};
use mangadex_cli::models::{CoverType, Item};
use mangadex_cli::selector::{PromptHooks, Selector};
use mangadex_cli::ui::{self, StdConsole};

#[derive(Parser, Debug)]
#[command(name = "mangadex-cli", version, about = "Browse MangaDex and pick manga or lists to download")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, default_value_t = DEFAULT_PAGE_SIZE, help = "Results shown per page")]
    page_size: usize,

    #[arg(long, global = true, default_value = "original", help = "Cover used by preview: original, 512px, 256px or none")]
    cover: String,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search manga by title
    Search {
        text: String,
        #[arg(short = 'f', long = "filter", help = "Search filter as key=value, may be repeated")]
        filters: Vec<String>,
        #[arg(long, help = "Choose this label without prompting (\"*\" for all)")]
        pick: Option<String>,
    },
    /// Manga from your library, e.g. `status:reading`
    Library {
        input: Option<String>,
        #[arg(long)]
        pick: Option<String>,
    },
    /// Saved lists, yours or `user:<id or url>`
    Lists {
        input: Option<String>,
        #[arg(long)]
        pick: Option<String>,
    },
    /// Lists you follow
    FollowedLists {
        #[arg(long)]
        pick: Option<String>,
    },
    /// Manga uploaded by `group:<id or url>`
    Group {
        input: String,
        #[arg(long)]
        pick: Option<String>,
    },
    /// Random manga, e.g. `content_rating:safe,suggestive`
    Random {
        input: Option<String>,
        #[arg(long)]
        pick: Option<String>,
    },
    /// Store an API token for the library commands
    Login,
    /// Forget the stored API token
    Logout,
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.format_target(false).init();
}

/// Run `selector` and print every resolved id.
fn emit<T, H>(selector: Selector<T, H>, pick: Option<&str>) -> Result<()>
where
    T: Item + Clone,
    H: PromptHooks<T>,
{
    let mut console = StdConsole::new();
    let mut count = 0;
    for id in selector.resolve(pick, &mut console)? {
        println!("{}", id?);
        count += 1;
    }
    info!("{} item(s) selected", count);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::from_env();
    let opts = CommandOptions {
        page_size: cli.page_size.max(1),
        cover: cli.cover.parse::<CoverType>()?,
        image_viewer: config.image_viewer.clone(),
    };
    let mut client = ApiClient::new(&config).context("Failed to build HTTP client")?;

    match cli.command {
        Commands::Search { text, filters, pick } => {
            emit(commands::search(&client, &opts, &text, &filters)?, pick.as_deref())
        }
        Commands::Library { input, pick } => {
            emit(commands::library_manga(&client, &opts, input.as_deref())?, pick.as_deref())
        }
        Commands::Lists { input, pick } => {
            emit(commands::library_lists(&client, &opts, input.as_deref())?, pick.as_deref())
        }
        Commands::FollowedLists { pick } => {
            emit(commands::followed_lists(&client, &opts)?, pick.as_deref())
        }
        Commands::Group { input, pick } => {
            emit(commands::group_manga(&client, &opts, Some(input.as_str()))?, pick.as_deref())
        }
        Commands::Random { input, pick } => {
            emit(commands::random_manga(&client, &opts, input.as_deref())?, pick.as_deref())
        }
        Commands::Login => {
            let token = ui::read_secret("MangaDex API token")?;
            client.set_token(&token);
            let user = client.me().context("Token was rejected")?;
            config::persist_token(&token)?;
            println!("Welcome {}!", user.name());
            Ok(())
        }
        Commands::Logout => {
            if config::forget_token()? {
                println!("Logged out");
            } else {
                println!("No stored token");
            }
            Ok(())
        }
    }
}
