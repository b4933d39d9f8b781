use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the coralpress binary.
#[derive(Debug, Parser)]
#[command(
    name = "coralpress",
    version,
    about = "Localized marketing site server"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "CORALPRESS_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the public HTTP service.
    Serve(Box<ServeArgs>),
    /// Render a rich-text JSON document to stdout.
    Render(RenderArgs),
    /// Ask a running server to drop cached responses.
    Revalidate(RevalidateArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the content directory.
    #[arg(long = "content-root", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub content_root: Option<PathBuf>,

    /// Override the locale served at `/`.
    #[arg(long = "default-locale", value_name = "LOCALE")]
    pub default_locale: Option<String>,

    /// Toggle the response cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the maximum number of cached responses.
    #[arg(long = "cache-response-limit", value_name = "COUNT")]
    pub cache_response_limit: Option<usize>,

    /// Override how long cached responses stay fresh.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS")]
    pub cache_ttl_seconds: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// Rich-text document to render (`-` for stdin).
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Submitted form value for `{{KEY}}` placeholders in link targets.
    #[arg(long = "submission", value_name = "KEY=VALUE", value_parser = parse_submission)]
    pub submission: Vec<(String, String)>,

    /// Resolve internal links to pages of this locale instead of raw ids.
    #[arg(long = "locale", value_name = "LOCALE")]
    pub locale: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct RevalidateArgs {
    #[command(flatten)]
    pub target: RevalidateTarget,

    /// Override the revalidation endpoint URL.
    #[arg(long = "endpoint", value_name = "URL")]
    pub endpoint: Option<String>,

    /// Locale of the changed page.
    #[arg(long = "locale", value_name = "LOCALE", requires = "change")]
    pub locale: Option<String>,

    /// Slug of the changed page or global.
    #[arg(long = "slug", value_name = "SLUG", requires = "change")]
    pub slug: Option<String>,

    /// Id of the changed team member.
    #[arg(long = "id", value_name = "ID", requires = "change")]
    pub id: Option<String>,
}

/// Kinds of committed content change the write hook understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChangeKind {
    PageSaved,
    PageDeleted,
    TeamMemberSaved,
    TeamMemberDeleted,
    GlobalSaved,
}

#[derive(Debug, Args, Clone)]
#[group(required = true, multiple = false)]
pub struct RevalidateTarget {
    /// Invalidate every response built from this tag.
    #[arg(long = "tag", value_name = "TAG")]
    pub tag: Option<String>,

    /// Invalidate the responses cached for this path.
    #[arg(long = "path", value_name = "PATH")]
    pub path: Option<String>,

    /// Send every invalidation a content change implies, through the write hook.
    #[arg(long = "change", value_name = "KIND", value_enum)]
    pub change: Option<ChangeKind>,
}

fn parse_submission(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got `{raw}`")),
    }
}
