use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "permreport",
    version,
    about = "direct-permissions report client",
    long_about = "permreport queries the direct-permissions report of a content-management site, renders it as a sortable table and triggers spreadsheet downloads.\n\nExamples:\n  permreport -u https://dms.example.com/share/page/report sites\n  permreport -u https://dms.example.com/share/page/report report --site finance --status active\n  permreport report --user alice --sort role --sort role -o perms.csv\n  permreport download --site finance -o perms.xlsx\n\nTip: Use --config to persist the page URL and credentials."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    #[arg(
        short = 'u',
        long = "url",
        global = true,
        value_name = "URL",
        help_heading = "Connection",
        help = "Page URL the report is served from (endpoints are derived from it)."
    )]
    pub url: Option<String>,

    #[arg(
        short = 'C',
        long = "config",
        global = true,
        value_name = "FILE",
        help_heading = "Connection",
        help = "Path to config file (defaults to ~/.permreport/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "user-name",
        visible_alias = "login",
        global = true,
        value_name = "USER",
        help_heading = "Connection",
        help = "Basic-auth user name."
    )]
    pub user_name: Option<String>,

    #[arg(
        long = "password",
        global = true,
        value_name = "PASSWORD",
        env = "PERMREPORT_PASSWORD",
        hide_env_values = true,
        help_heading = "Connection",
        help = "Basic-auth password."
    )]
    pub password: Option<String>,

    #[arg(
        short = 'H',
        long = "header",
        global = true,
        value_name = "HEADER",
        help_heading = "HTTP",
        help = "Add a header to all requests (format: 'Key: Value')."
    )]
    pub header: Option<String>,

    #[arg(
        short = 'p',
        long = "proxy",
        global = true,
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'T',
        long = "timeout",
        global = true,
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'v',
        long = "verbose",
        global = true,
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase verbosity (-v, -vv, -vvv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'n',
        long = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the department options.
    Sites,

    /// Look up usernames starting with TEXT.
    Users {
        #[arg(value_name = "TEXT")]
        text: String,
    },

    /// Feed username edits from stdin (one line per edit) through the
    /// debounced autocomplete and print the suggestions.
    Suggest {
        #[arg(
            long = "debounce",
            value_name = "MS",
            help = "Quiet period before a search is sent."
        )]
        debounce_ms: Option<u64>,
    },

    /// Fetch the report and render it.
    Report(ReportArgs),

    /// Download the spreadsheet export.
    Download(DownloadArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(
        short = 's',
        long = "site",
        visible_alias = "department",
        value_name = "SHORT_NAME",
        help_heading = "Filters",
        help = "Department (site short name); 'all' for every department."
    )]
    pub site: Option<String>,

    #[arg(
        short = 'S',
        long = "status",
        value_name = "STATUS",
        help_heading = "Filters",
        help = "User status: all, active or inactive."
    )]
    pub status: Option<String>,

    #[arg(
        short = 'U',
        long = "user",
        value_name = "USERNAME",
        help_heading = "Filters",
        help = "Username search text."
    )]
    pub user: Option<String>,

    #[arg(
        short = 'f',
        long = "from",
        value_name = "YYYY-MM-DD",
        conflicts_with = "no_date",
        help_heading = "Filters",
        help = "Only permissions from this date (defaults to today)."
    )]
    pub from: Option<String>,

    #[arg(
        long = "no-date",
        help_heading = "Filters",
        help = "Do not send a from-date."
    )]
    pub no_date: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    #[arg(
        long = "sort",
        value_name = "COLUMN",
        action = ArgAction::Append,
        help_heading = "Table",
        help = "Sort by column (repeatable; repeating a column toggles direction)."
    )]
    pub sort: Vec<String>,

    #[arg(
        long = "copy-row",
        value_name = "N",
        help_heading = "Table",
        help = "Copy the node reference of row N to the terminal clipboard."
    )]
    pub copy_row: Option<usize>,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the report to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'F',
        long = "format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text, json, csv, html)."
    )]
    pub format: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    #[arg(
        long = "form",
        value_name = "FILE",
        help_heading = "Filters",
        help = "JSON capture of a host page's inputs, used to find the username when --user is not given."
    )]
    pub form: Option<String>,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        required_unless_present = "print_url",
        help_heading = "Output",
        help = "File to save the export to."
    )]
    pub output: Option<String>,

    #[arg(
        long = "print-url",
        help_heading = "Output",
        help = "Print the download URL instead of fetching it."
    )]
    pub print_url: bool,
}
