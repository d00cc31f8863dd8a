use crate::cli::Role;
use crate::domain::constants::{DEFAULT_MONTHLY_COUNT, DEFAULT_MONTHLY_WEEKS};
use serde::{Deserialize, Serialize};

fn default_monthly_count() -> u32 {
    DEFAULT_MONTHLY_COUNT
}

fn default_monthly_weeks() -> Vec<u8> {
    DEFAULT_MONTHLY_WEEKS.to_vec()
}

fn default_freq_type() -> String {
    "monthly".to_string()
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

#[derive(Serialize)]
pub struct JsonErr {
    pub ok: bool,
    pub error: ErrorBody,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct State {
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub agents: Vec<Agent>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub visits: Vec<Visit>,
    #[serde(default)]
    pub users: Vec<User>,
}

impl State {
    pub fn client(&self, id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }

    pub fn agent_name(&self, id: Option<&str>) -> Option<&str> {
        let id = id?;
        self.agents
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.name.as_str())
    }

    pub fn route(&self, id: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.id == id)
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Client {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_freq_type")]
    pub freq_type: String,
    #[serde(default = "default_monthly_count")]
    pub monthly_count: u32,
    /// Selected weeks-of-month, sorted and deduplicated, each in `1..=5`.
    #[serde(default = "default_monthly_weeks")]
    pub monthly_weeks: Vec<u8>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

impl Client {
    pub fn new(name: &str, county: &str, address: &str, phone: &str) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            county: county.to_string(),
            address: address.to_string(),
            phone: phone.to_string(),
            freq_type: default_freq_type(),
            monthly_count: DEFAULT_MONTHLY_COUNT,
            monthly_weeks: default_monthly_weeks(),
            contacts: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Contact {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Visit {
    pub id: String,
    /// ISO calendar date (`YYYY-MM-DD`).
    pub date: chrono::NaiveDate,
    pub client_id: String,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub route_id: Option<String>,
    #[serde(default)]
    pub activity_ids: Vec<String>,
    #[serde(default)]
    pub other_activity: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub obs: String,
}

impl Visit {
    /// A bare visit for `client_id` on `date`: no agent, route, activities or notes.
    pub fn skeleton(client_id: &str, date: chrono::NaiveDate) -> Self {
        Self {
            id: new_id(),
            date,
            client_id: client_id.to_string(),
            agent_id: None,
            route_id: None,
            activity_ids: Vec::new(),
            other_activity: String::new(),
            details: String::new(),
            obs: String::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Agent {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Route {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub agent_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Activity {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub pass_hash: String,
    pub role: Role,
    #[serde(default)]
    pub agent_id: Option<String>,
}

/// Public view of a user, without the credential hash.
#[derive(Serialize, Debug)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub agent_id: Option<String>,
    pub agent_name: Option<String>,
}

/// Login record persisted between invocations.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionRecord {
    pub user_id: String,
}

#[derive(Serialize)]
pub struct WhoAmI {
    pub username: String,
    pub role: Role,
    pub agent_id: Option<String>,
}

#[derive(Serialize)]
pub struct GenerateReport {
    pub from: chrono::NaiveDate,
    pub to: chrono::NaiveDate,
    pub added: usize,
}

#[derive(Serialize)]
pub struct ClearReport {
    pub from: chrono::NaiveDate,
    pub to: chrono::NaiveDate,
    pub removed: usize,
}

#[derive(Serialize, Debug)]
pub struct ImportReport {
    pub sheet: String,
    pub added: usize,
    pub updated: usize,
}

#[derive(Serialize)]
pub struct ExportReport {
    pub path: String,
    pub rows: usize,
}

/// Row as listed to the user: a visit plus resolved display names.
#[derive(Serialize)]
pub struct VisitRow {
    pub id: String,
    pub day: String,
    pub date: chrono::NaiveDate,
    pub client_id: String,
    pub client: String,
    pub agent_id: Option<String>,
    pub agent: Option<String>,
    pub route_id: Option<String>,
    pub activities: String,
    pub details: String,
    pub obs: String,
    pub editable: bool,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct CountItem {
    pub name: String,
    pub visits: usize,
}

#[derive(Serialize, Debug)]
pub struct PlanReport {
    pub visits: usize,
    pub unique_clients: usize,
    pub by_agent: Vec<CountItem>,
    pub by_route: Vec<CountItem>,
}

/// Authenticated actor for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Administrator { user_id: String, username: String },
    FieldAgent {
        user_id: String,
        username: String,
        agent_id: String,
    },
}

impl Session {
    pub fn username(&self) -> &str {
        match self {
            Session::Administrator { username, .. } | Session::FieldAgent { username, .. } => {
                username
            }
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Session::Administrator { .. } => Role::Administrator,
            Session::FieldAgent { .. } => Role::Agent,
        }
    }

    /// Bound agent, `None` for administrators.
    pub fn agent_id(&self) -> Option<&str> {
        match self {
            Session::Administrator { .. } => None,
            Session::FieldAgent { agent_id, .. } => Some(agent_id),
        }
    }
}
