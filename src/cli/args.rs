use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "noshow",
    version,
    about = "restaurant no-show prediction console",
    long_about = "Noshow is a console client for a restaurant no-show prediction service: score a reservation, browse the prediction history with load-more paging, and pull aggregate stats.\n\nExamples:\n  noshow health\n  noshow predict -n \"Dana Cruz\" -g 4 -l 21 -m 7 --deposit\n  noshow history --all -o history.json\n  noshow history -I\n\nTip: Use --init-config to persist connection settings and keep invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'a',
        long = "api",
        global = true,
        visible_alias = "api-url",
        value_name = "URL",
        help_heading = "Connection",
        help = "Prediction API base URL."
    )]
    pub api_url: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        global = true,
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Connection",
        help = "Path to config file (defaults to ~/.noshow/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Connection",
        help = "Write a default config file to ~/.noshow/config.yml and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 't',
        long = "to",
        global = true,
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "Connection",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        long = "proxy",
        global = true,
        value_name = "URL",
        help_heading = "Connection",
        help = "Route API requests through an HTTP proxy."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'P',
        long = "ps",
        global = true,
        visible_alias = "page-size",
        value_name = "N",
        help_heading = "History",
        help = "Records fetched per history page."
    )]
    pub page_size: Option<usize>,

    #[arg(
        short = 'o',
        long = "out",
        global = true,
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the loaded history to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'F',
        long = "fmt",
        global = true,
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Export format: text, json, or csv (inferred from the file name when omitted)."
    )]
    pub output_format: Option<String>,

    #[arg(long = "no-color", global = true, help_heading = "Output")]
    pub no_color: bool,

    #[arg(
        short = 'c',
        long = "clr",
        global = true,
        visible_alias = "color",
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Score a reservation and print the prediction.
    Predict(PredictArgs),
    /// Browse recent predictions with load-more paging.
    History(HistoryArgs),
    /// Aggregate statistics over recent predictions.
    Stats(StatsArgs),
    /// Fetch one stored prediction by id.
    Show {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Check API and database health.
    Health,
}

#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    #[arg(
        short = 'n',
        long = "name",
        value_name = "NAME",
        help_heading = "Reservation",
        help = "Customer name on the reservation."
    )]
    pub name: String,

    #[arg(
        short = 'g',
        long = "party-size",
        value_name = "N",
        help_heading = "Reservation",
        help = "Number of guests."
    )]
    pub party_size: u32,

    #[arg(
        short = 'l',
        long = "lead-time",
        value_name = "DAYS",
        help_heading = "Reservation",
        help = "Days between booking and the visit."
    )]
    pub lead_time: u32,

    #[arg(
        short = 'm',
        long = "month",
        value_name = "1-12",
        help_heading = "Reservation",
        help = "Month of the visit."
    )]
    pub month: u32,

    #[arg(
        long = "deposit",
        help_heading = "Reservation",
        help = "A deposit has been paid."
    )]
    pub deposit: bool,

    #[arg(
        long = "special-requests",
        value_name = "N",
        default_value_t = 0,
        help_heading = "Reservation",
        help = "Number of special requests attached to the booking."
    )]
    pub special_requests: u32,

    #[arg(
        long = "repeat-guest",
        help_heading = "Guest",
        help = "The customer has visited before."
    )]
    pub repeat_guest: bool,

    #[arg(
        long = "cancellations",
        value_name = "N",
        default_value_t = 0,
        help_heading = "Guest",
        help = "Number of previous cancellations by this customer."
    )]
    pub cancellations: u32,
}

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    #[arg(
        short = 'p',
        long = "pages",
        value_name = "N",
        default_value_t = 1,
        help = "Number of pages to load up front."
    )]
    pub pages: usize,

    #[arg(
        short = 'A',
        long = "all",
        help = "Keep loading until the server reports everything loaded."
    )]
    pub all: bool,

    #[arg(
        short = 'I',
        long = "interactive",
        help = "Prompt for more/less/reload/quit after the first page."
    )]
    pub interactive: bool,

    #[arg(
        short = 's',
        long = "search",
        value_name = "QUERY",
        help = "Filter by customer name or risk level."
    )]
    pub search: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    #[arg(
        short = 'L',
        long = "limit",
        value_name = "N",
        help = "Number of recent predictions to aggregate."
    )]
    pub limit: Option<usize>,
}
