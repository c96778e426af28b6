use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "artpick",
    version,
    about = "cross-page selection over a paginated artwork collection",
    long_about = "artpick shows a remote artwork collection one page at a time and keeps a selection that spans pages.\n\nExamples:\n  artpick\n  artpick -n 25 -p 3\n  artpick --demo 250 -o selection.json\n  artpick --config ~/.artpick/config.yml\n\nType 'help' at the prompt for the table commands."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv, -vvv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the selection to FILE on quit."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'O',
        long = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Selection file format: text or json (default: from extension)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'u',
        long = "url",
        visible_alias = "base-url",
        value_name = "URL",
        help_heading = "Source",
        help = "Artworks endpoint (default: https://api.artic.edu/api/v1/artworks)."
    )]
    pub url: Option<String>,

    #[arg(
        long = "demo",
        value_name = "COUNT",
        help_heading = "Source",
        help = "Use an offline collection of COUNT records instead of the API."
    )]
    pub demo: Option<usize>,

    #[arg(
        short = 'C',
        long = "config",
        value_name = "FILE",
        help_heading = "Source",
        help = "Path to config file (defaults to ~/.artpick/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "write-config",
        help_heading = "Source",
        help = "Write a default config file if none exists, then exit."
    )]
    pub write_config: bool,

    #[arg(
        short = 'n',
        long = "page-size",
        visible_alias = "rows",
        value_name = "N",
        help_heading = "Paging",
        help = "Records per page (default: 10)."
    )]
    pub page_size: Option<usize>,

    #[arg(
        short = 'p',
        long = "page",
        value_name = "N",
        help_heading = "Paging",
        help = "Page to open first, 1-based (default: 1)."
    )]
    pub page: Option<usize>,

    #[arg(
        long = "no-reuse-page",
        help_heading = "Paging",
        help = "Always refetch every page during bulk selection."
    )]
    pub no_reuse_page: bool,

    #[arg(
        short = 'r',
        long = "rate",
        value_name = "RPS",
        help_heading = "HTTP",
        help = "Request rate limit in requests per second (0 = unlimited)."
    )]
    pub rate: Option<u32>,

    #[arg(
        short = 'T',
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Request timeout in seconds (default: 10)."
    )]
    pub timeout: Option<usize>,

    #[arg(
        short = 'x',
        long = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP proxy for all requests."
    )]
    pub proxy: Option<String>,

    #[arg(
        long = "user-agent",
        value_name = "UA",
        help_heading = "HTTP",
        help = "User-Agent header sent with every request."
    )]
    pub user_agent: Option<String>,
}
