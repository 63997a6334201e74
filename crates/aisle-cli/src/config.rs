use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use aisle_core::{AppError, FilterSet, HttpConfig, SearchConfig, SortKey, StorefrontConfig};

/// Storefront used when neither a flag, the environment nor storefront.toml
/// names one: the backend's local development address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "aisle")]
#[command(
    author,
    version,
    about = "Incremental product search for a storefront API"
)]
#[command(after_help = "Examples:
  aisle search \"vitamin c serum\" --sort price_asc --pages 2
  aisle search soap --category skincare --skin-type oily
  aisle interactive
  STOREFRONT_URL=https://shop.example.com/api aisle interactive

Configuration (lowest to highest precedence):
  ~/.config/aisle/storefront.toml, environment variables, command line flags")]
pub struct Config {
    /// Storefront API base URL; the products route is resolved beneath it
    #[arg(long, env = "STOREFRONT_URL", global = true)]
    pub base_url: Option<String>,

    /// Custom path to storefront.toml configuration file
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Products requested per page (1-100)
    #[arg(long, env = "AISLE_PER_PAGE", global = true)]
    pub per_page: Option<u32>,

    /// Quiet period after typing before a query is sent, in milliseconds
    #[arg(long, env = "AISLE_DEBOUNCE_MS", global = true)]
    pub debounce_ms: Option<u64>,

    /// HTTP request timeout in seconds
    #[arg(long, env = "AISLE_HTTP_TIMEOUT_SECS", global = true)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one search and print the results
    #[command(after_help = "Example: aisle search \"clay mask\" --sort name_asc --pages 3")]
    Search {
        /// Search query text
        query: String,

        #[command(flatten)]
        facets: FacetArgs,

        /// Number of pages to load
        #[arg(short, long, default_value = "1")]
        pages: u32,
    },
    /// Type queries line by line, as a search screen would receive them
    #[command(after_help = "Commands inside the session:
  <text>                 replace the query text (debounced)
  :more                  load the next page
  :refresh               pull to refresh
  :retry                 retry after a failure
  :sort KEY              latest, price_asc, price_desc, name_asc, name_desc
  :filter key=value ...  category, item_type, skin_type, concern (empty value clears)
  :facets                list the values each filter accepts
  :clear                 clear the query
  :quit                  leave")]
    Interactive {
        /// Initial query, fetched immediately
        #[arg(short, long)]
        query: Option<String>,

        #[command(flatten)]
        facets: FacetArgs,
    },
}

/// Sort and filter flags shared by both commands.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FacetArgs {
    /// Sort order: latest, price_asc, price_desc, name_asc, name_desc
    #[arg(short, long, default_value = "latest")]
    pub sort: SortKey,

    /// Restrict to a category
    #[arg(long)]
    pub category: Option<String>,

    /// Restrict to an item type
    #[arg(long)]
    pub item_type: Option<String>,

    /// Restrict to a skin type
    #[arg(long)]
    pub skin_type: Option<String>,

    /// Restrict to a skin concern
    #[arg(long)]
    pub concern: Option<String>,
}

impl FacetArgs {
    pub fn filters(&self) -> FilterSet {
        FilterSet {
            category: self.category.clone(),
            item_type: self.item_type.clone(),
            skin_type: self.skin_type.clone(),
            concern: self.concern.clone(),
        }
    }
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub search: SearchConfig,
    pub http: HttpConfig,
}

impl Config {
    /// Layers command line and environment values over the optional
    /// storefront.toml contents and built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the resulting page size is out of
    /// range.
    pub fn resolve(&self, file: Option<StorefrontConfig>) -> Result<Settings, AppError> {
        let file = file.unwrap_or_default();

        let mut search = file.search_config(SearchConfig::default());
        if let Some(per_page) = self.per_page {
            search = search.with_per_page(per_page);
        }
        if let Some(ms) = self.debounce_ms {
            search = search.with_debounce(Duration::from_millis(ms));
        }
        search.validate()?;

        let mut http = file.http_config(HttpConfig::default());
        if let Some(secs) = self.timeout_secs {
            http.timeout = Duration::from_secs(secs);
        }

        let base_url = self
            .base_url
            .clone()
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Settings {
            base_url,
            search,
            http,
        })
    }
}
