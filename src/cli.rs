use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fieldplan", version, about = "Field visit planning CLI")]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        short,
        long,
        global = true,
        action = ArgAction::Count,
        help = "Increase log verbosity (-v info, -vv debug)"
    )]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Whoami,
    Client {
        #[command(subcommand)]
        command: ClientCommands,
    },
    Agent {
        #[command(subcommand)]
        command: AgentCommands,
    },
    Route {
        #[command(subcommand)]
        command: RouteCommands,
    },
    Activity {
        #[command(subcommand)]
        command: ActivityCommands,
    },
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    Visit {
        #[command(subcommand)]
        command: VisitCommands,
    },
    /// Bulk generation and clearing over a date range
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Write the visible visits to a spreadsheet
    Export {
        #[command(flatten)]
        interval: Interval,
        #[arg(long)]
        agent: Option<String>,
        #[arg(long, value_enum, default_value_t = ExportFormat::Xlsx)]
        format: ExportFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Report {
        #[command(flatten)]
        interval: Interval,
        #[arg(long)]
        agent: Option<String>,
    },
    /// Wipe all data except the admin account
    Reset {
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct Interval {
    #[arg(long)]
    pub from: Option<NaiveDate>,
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

#[derive(Args, Debug, Clone)]
pub struct ClientFields {
    #[arg(long)]
    pub county: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ClientCommands {
    Add {
        name: String,
        #[command(flatten)]
        fields: ClientFields,
    },
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Show {
        id: String,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: ClientFields,
        #[arg(long, help = "Visits per month (clamped to 0..=50)")]
        count: Option<i64>,
        #[arg(
            long,
            value_delimiter = ',',
            conflicts_with = "clear_weeks",
            help = "Weeks of month, e.g. 1,3"
        )]
        weeks: Option<Vec<u8>>,
        #[arg(long, default_value_t = false, help = "Select no weeks (no generated visits)")]
        clear_weeks: bool,
    },
    Remove {
        id: String,
    },
    /// Remove every client and every visit
    Clear {
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Merge clients from an xlsx/xls/ods or csv file
    Import {
        file: PathBuf,
        #[arg(long)]
        sheet: Option<String>,
    },
    Contact {
        #[command(subcommand)]
        command: ContactCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ContactCommands {
    Add {
        client: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        role: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    Update {
        client: String,
        contact: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    Remove {
        client: String,
        contact: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum AgentCommands {
    Add { name: String },
    List,
    Rename { id: String, name: String },
    Remove { id: String },
}

#[derive(Subcommand, Debug)]
pub enum RouteCommands {
    Add {
        name: String,
        #[arg(long)]
        agent: Option<String>,
    },
    List,
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, conflicts_with = "clear_agent")]
        agent: Option<String>,
        #[arg(long, default_value_t = false)]
        clear_agent: bool,
    },
    Remove {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ActivityCommands {
    Add { name: String },
    List,
    Rename { id: String, name: String },
    Remove { id: String },
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, value_enum, default_value_t = Role::Agent)]
        role: Role,
        #[arg(long)]
        agent: Option<String>,
    },
    List,
    Remove {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum VisitCommands {
    Add {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        route: Option<String>,
        #[arg(long = "activity")]
        activities: Vec<String>,
        #[arg(long, default_value = "")]
        other: String,
        #[arg(long, default_value = "")]
        details: String,
        #[arg(long, default_value = "")]
        obs: String,
    },
    Update {
        id: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        client: Option<String>,
        #[arg(long, conflicts_with = "clear_agent")]
        agent: Option<String>,
        #[arg(long, default_value_t = false)]
        clear_agent: bool,
        #[arg(long, conflicts_with = "clear_route")]
        route: Option<String>,
        #[arg(long, default_value_t = false)]
        clear_route: bool,
        #[arg(long = "activity", conflicts_with = "clear_activities")]
        activities: Option<Vec<String>>,
        #[arg(long, default_value_t = false)]
        clear_activities: bool,
        #[arg(long)]
        other: Option<String>,
        #[arg(long)]
        details: Option<String>,
        #[arg(long)]
        obs: Option<String>,
    },
    Remove {
        id: String,
    },
    List {
        #[command(flatten)]
        interval: Interval,
        #[arg(long)]
        agent: Option<String>,
    },
    /// Persistently reorder the visit list
    Sort {
        #[arg(long, value_enum, default_value_t = SortMode::Date)]
        by: SortMode,
    },
}

#[derive(Subcommand, Debug)]
pub enum PlanCommands {
    Generate {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
    Clear {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum Role {
    #[serde(rename = "coordonator")]
    #[value(name = "coordonator", alias = "admin")]
    Administrator,
    #[serde(rename = "agent")]
    Agent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "coordonator",
            Role::Agent => "agent",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SortMode {
    Date,
    Client,
    Agent,
    Route,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}
