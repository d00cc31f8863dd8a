use crate::cli::Role;
use crate::domain::constants::{DEFAULT_ADMIN_USERNAME, MIN_PASSWORD_LEN};
use crate::domain::models::{
    new_id, Activity, Agent, Client, Contact, Route, Session, State, User, UserView,
};
use crate::error::{not_found, validation};
use crate::services::auth::hash_password;
use crate::services::policy::{can_manage_roster, require};
use crate::services::schedule::{clamp_monthly_count, normalize_weeks};
use crate::services::settings::DefaultSettings;

#[derive(Debug, Default, Clone)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub county: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub monthly_count: Option<i64>,
    pub monthly_weeks: Option<Vec<u8>>,
}

#[derive(Debug, Default, Clone)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

fn required_name(raw: &str, what: &str) -> anyhow::Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(validation(format!("{} name is required", what)));
    }
    Ok(name.to_string())
}

fn ensure_agent_exists(state: &State, agent_id: &str) -> anyhow::Result<()> {
    if state.agents.iter().any(|a| a.id == agent_id) {
        Ok(())
    } else {
        Err(not_found("agent", agent_id))
    }
}

pub fn new_client(
    defaults: &DefaultSettings,
    name: &str,
    county: &str,
    address: &str,
    phone: &str,
) -> Client {
    let mut c = Client::new(name, county, address, phone);
    c.monthly_count = clamp_monthly_count(i64::from(defaults.monthly_count));
    c.monthly_weeks = normalize_weeks(&defaults.monthly_weeks);
    c
}

/// Short county code: existing 2-3 letter uppercase codes are kept.
pub fn county_abbr(county: &str) -> String {
    let s = county.trim();
    if s.is_empty() {
        return String::new();
    }
    if (2..=3).contains(&s.chars().count()) && s.chars().all(|c| c.is_ascii_uppercase()) {
        return s.to_string();
    }
    let upper = s.to_uppercase();
    let parts: Vec<&str> = upper.split_whitespace().collect();
    match parts.as_slice() {
        [one] => one.chars().take(2).collect(),
        [first, second, ..] => first
            .chars()
            .take(1)
            .chain(second.chars().take(1))
            .collect(),
        [] => String::new(),
    }
}

pub fn client_label(c: &Client) -> String {
    let ab = county_abbr(&c.county);
    if ab.is_empty() {
        c.name.clone()
    } else {
        format!("{} ({})", c.name, ab)
    }
}

pub fn search_clients<'a>(state: &'a State, query: Option<&str>) -> Vec<&'a Client> {
    let mut out: Vec<&Client> = match query.map(|q| q.trim().to_lowercase()) {
        Some(q) if !q.is_empty() => state
            .clients
            .iter()
            .filter(|c| {
                [&c.name, &c.county, &c.address, &c.phone]
                    .iter()
                    .any(|f| f.to_lowercase().contains(&q))
            })
            .collect(),
        _ => state.clients.iter().collect(),
    };
    out.sort_by_key(|c| c.name.to_lowercase());
    out
}

pub fn add_client(
    session: &Session,
    state: &mut State,
    defaults: &DefaultSettings,
    name: &str,
    county: &str,
    address: &str,
    phone: &str,
) -> anyhow::Result<Client> {
    require(can_manage_roster(session), "only administrators can add clients")?;
    let name = required_name(name, "client")?;
    let c = new_client(defaults, &name, county.trim(), address.trim(), phone.trim());
    state.clients.push(c.clone());
    Ok(c)
}

pub fn update_client(
    session: &Session,
    state: &mut State,
    id: &str,
    patch: ClientPatch,
) -> anyhow::Result<Client> {
    require(can_manage_roster(session), "only administrators can edit clients")?;
    let name = patch
        .name
        .as_deref()
        .map(|n| required_name(n, "client"))
        .transpose()?;
    let c = state
        .clients
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| not_found("client", id))?;
    if let Some(n) = name {
        c.name = n;
    }
    if let Some(v) = patch.county {
        c.county = v.trim().to_string();
    }
    if let Some(v) = patch.address {
        c.address = v.trim().to_string();
    }
    if let Some(v) = patch.phone {
        c.phone = v.trim().to_string();
    }
    if let Some(n) = patch.monthly_count {
        c.monthly_count = clamp_monthly_count(n);
    }
    if let Some(w) = patch.monthly_weeks {
        c.monthly_weeks = normalize_weeks(&w);
    }
    Ok(c.clone())
}

/// Removes the client and its visits; returns the number of visits dropped.
pub fn remove_client(session: &Session, state: &mut State, id: &str) -> anyhow::Result<usize> {
    require(can_manage_roster(session), "only administrators can delete clients")?;
    if state.client(id).is_none() {
        return Err(not_found("client", id));
    }
    state.clients.retain(|c| c.id != id);
    let before = state.visits.len();
    state.visits.retain(|v| v.client_id != id);
    Ok(before - state.visits.len())
}

pub fn clear_clients(session: &Session, state: &mut State) -> anyhow::Result<usize> {
    require(can_manage_roster(session), "only administrators can clear clients")?;
    let removed = state.clients.len();
    state.clients.clear();
    state.visits.clear();
    Ok(removed)
}

pub fn add_contact(
    session: &Session,
    state: &mut State,
    client_id: &str,
    mut contact: Contact,
) -> anyhow::Result<Contact> {
    require(can_manage_roster(session), "only administrators can edit contacts")?;
    let c = state
        .clients
        .iter_mut()
        .find(|c| c.id == client_id)
        .ok_or_else(|| not_found("client", client_id))?;
    contact.id = new_id();
    c.contacts.push(contact.clone());
    Ok(contact)
}

pub fn update_contact(
    session: &Session,
    state: &mut State,
    client_id: &str,
    contact_id: &str,
    patch: ContactPatch,
) -> anyhow::Result<Contact> {
    require(can_manage_roster(session), "only administrators can edit contacts")?;
    let c = state
        .clients
        .iter_mut()
        .find(|c| c.id == client_id)
        .ok_or_else(|| not_found("client", client_id))?;
    let ct = c
        .contacts
        .iter_mut()
        .find(|ct| ct.id == contact_id)
        .ok_or_else(|| not_found("contact", contact_id))?;
    for (field, value) in [
        (&mut ct.name, patch.name),
        (&mut ct.role, patch.role),
        (&mut ct.phone, patch.phone),
        (&mut ct.email, patch.email),
        (&mut ct.notes, patch.notes),
    ] {
        if let Some(v) = value {
            *field = v.trim().to_string();
        }
    }
    Ok(ct.clone())
}

pub fn remove_contact(
    session: &Session,
    state: &mut State,
    client_id: &str,
    contact_id: &str,
) -> anyhow::Result<()> {
    require(can_manage_roster(session), "only administrators can edit contacts")?;
    let c = state
        .clients
        .iter_mut()
        .find(|c| c.id == client_id)
        .ok_or_else(|| not_found("client", client_id))?;
    let before = c.contacts.len();
    c.contacts.retain(|ct| ct.id != contact_id);
    if c.contacts.len() == before {
        return Err(not_found("contact", contact_id));
    }
    Ok(())
}

pub fn add_agent(session: &Session, state: &mut State, name: &str) -> anyhow::Result<Agent> {
    require(can_manage_roster(session), "only administrators can add agents")?;
    let a = Agent {
        id: new_id(),
        name: required_name(name, "agent")?,
    };
    state.agents.push(a.clone());
    Ok(a)
}

pub fn rename_agent(
    session: &Session,
    state: &mut State,
    id: &str,
    name: &str,
) -> anyhow::Result<Agent> {
    require(can_manage_roster(session), "only administrators can rename agents")?;
    let name = required_name(name, "agent")?;
    let a = state
        .agents
        .iter_mut()
        .find(|a| a.id == id)
        .ok_or_else(|| not_found("agent", id))?;
    a.name = name;
    Ok(a.clone())
}

/// Deletes the agent and detaches it from routes, visits and users.
pub fn remove_agent(session: &Session, state: &mut State, id: &str) -> anyhow::Result<()> {
    require(can_manage_roster(session), "only administrators can delete agents")?;
    ensure_agent_exists(state, id)?;
    state.agents.retain(|a| a.id != id);
    for r in state.routes.iter_mut().filter(|r| r.agent_id.as_deref() == Some(id)) {
        r.agent_id = None;
    }
    for v in state.visits.iter_mut().filter(|v| v.agent_id.as_deref() == Some(id)) {
        v.agent_id = None;
    }
    for u in state.users.iter_mut().filter(|u| u.agent_id.as_deref() == Some(id)) {
        u.agent_id = None;
    }
    Ok(())
}

pub fn add_route(
    session: &Session,
    state: &mut State,
    name: &str,
    agent_id: Option<&str>,
) -> anyhow::Result<Route> {
    require(can_manage_roster(session), "only administrators can add routes")?;
    let name = required_name(name, "route")?;
    if let Some(a) = agent_id {
        ensure_agent_exists(state, a)?;
    }
    let r = Route {
        id: new_id(),
        name,
        agent_id: agent_id.map(str::to_string),
    };
    state.routes.push(r.clone());
    Ok(r)
}

/// `agent_id`: `None` leaves the agent unchanged, `Some(None)` clears it.
pub fn update_route(
    session: &Session,
    state: &mut State,
    id: &str,
    name: Option<&str>,
    agent_id: Option<Option<&str>>,
) -> anyhow::Result<Route> {
    require(can_manage_roster(session), "only administrators can edit routes")?;
    let name = name.map(|n| required_name(n, "route")).transpose()?;
    if let Some(Some(a)) = agent_id {
        ensure_agent_exists(state, a)?;
    }
    let r = state
        .routes
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| not_found("route", id))?;
    if let Some(n) = name {
        r.name = n;
    }
    if let Some(a) = agent_id {
        r.agent_id = a.map(str::to_string);
    }
    Ok(r.clone())
}

pub fn remove_route(session: &Session, state: &mut State, id: &str) -> anyhow::Result<()> {
    require(can_manage_roster(session), "only administrators can delete routes")?;
    if state.route(id).is_none() {
        return Err(not_found("route", id));
    }
    state.routes.retain(|r| r.id != id);
    for v in state.visits.iter_mut().filter(|v| v.route_id.as_deref() == Some(id)) {
        v.route_id = None;
    }
    Ok(())
}

pub fn seed_activities(state: &mut State, names: &[String]) -> bool {
    if !state.activities.is_empty() {
        return false;
    }
    state.activities = names
        .iter()
        .filter(|n| !n.trim().is_empty())
        .map(|n| Activity {
            id: new_id(),
            name: n.trim().to_string(),
        })
        .collect();
    true
}

pub fn add_activity(session: &Session, state: &mut State, name: &str) -> anyhow::Result<Activity> {
    require(can_manage_roster(session), "only administrators can add activities")?;
    let a = Activity {
        id: new_id(),
        name: required_name(name, "activity")?,
    };
    state.activities.push(a.clone());
    Ok(a)
}

pub fn rename_activity(
    session: &Session,
    state: &mut State,
    id: &str,
    name: &str,
) -> anyhow::Result<Activity> {
    require(can_manage_roster(session), "only administrators can rename activities")?;
    let name = required_name(name, "activity")?;
    let a = state
        .activities
        .iter_mut()
        .find(|a| a.id == id)
        .ok_or_else(|| not_found("activity", id))?;
    a.name = name;
    Ok(a.clone())
}

/// Deletes the activity and strips it from every visit.
pub fn remove_activity(session: &Session, state: &mut State, id: &str) -> anyhow::Result<()> {
    require(can_manage_roster(session), "only administrators can delete activities")?;
    if !state.activities.iter().any(|a| a.id == id) {
        return Err(not_found("activity", id));
    }
    state.activities.retain(|a| a.id != id);
    for v in &mut state.visits {
        v.activity_ids.retain(|a| a != id);
    }
    Ok(())
}

pub fn create_user(
    session: &Session,
    state: &mut State,
    username: &str,
    password: &str,
    role: Role,
    agent_id: Option<&str>,
) -> anyhow::Result<UserView> {
    require(can_manage_roster(session), "only administrators can create users")?;
    let username = username.trim();
    if username.is_empty() {
        return Err(validation("username is required"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if state.users.iter().any(|u| u.username == username) {
        return Err(validation(format!("username already exists: {}", username)));
    }
    let agent_id = match role {
        Role::Agent => {
            let a = agent_id.ok_or_else(|| validation("agent users need a bound agent (--agent)"))?;
            ensure_agent_exists(state, a)?;
            Some(a.to_string())
        }
        Role::Administrator => None,
    };
    let user = User {
        id: new_id(),
        username: username.to_string(),
        pass_hash: hash_password(password),
        role,
        agent_id,
    };
    state.users.push(user.clone());
    Ok(user_view(state, &user))
}

pub fn user_view(state: &State, u: &User) -> UserView {
    UserView {
        id: u.id.clone(),
        username: u.username.clone(),
        role: u.role,
        agent_id: u.agent_id.clone(),
        agent_name: state.agent_name(u.agent_id.as_deref()).map(str::to_string),
    }
}

pub fn list_users(session: &Session, state: &State) -> anyhow::Result<Vec<UserView>> {
    require(can_manage_roster(session), "only administrators can list users")?;
    let mut users: Vec<&User> = state.users.iter().collect();
    users.sort_by(|a, b| a.username.cmp(&b.username));
    Ok(users.into_iter().map(|u| user_view(state, u)).collect())
}

pub fn remove_user(session: &Session, state: &mut State, id: &str) -> anyhow::Result<()> {
    require(can_manage_roster(session), "only administrators can delete users")?;
    let user = state.user(id).ok_or_else(|| not_found("user", id))?;
    if user.username == DEFAULT_ADMIN_USERNAME {
        return Err(validation("the admin account cannot be deleted"));
    }
    state.users.retain(|u| u.id != id);
    Ok(())
}

/// Wipes the roster, keeping only the `admin` account, and re-seeds activities.
pub fn reset(session: &Session, state: &mut State, defaults: &DefaultSettings) -> anyhow::Result<()> {
    require(can_manage_roster(session), "only administrators can reset the roster")?;
    let admin = state
        .users
        .iter()
        .find(|u| u.username == DEFAULT_ADMIN_USERNAME)
        .cloned();
    *state = State {
        users: admin.into_iter().collect(),
        ..State::default()
    };
    seed_activities(state, &defaults.activities);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Visit;
    use crate::error::error_code;
    use chrono::NaiveDate;

    fn admin() -> Session {
        Session::Administrator {
            user_id: "u0".into(),
            username: "admin".into(),
        }
    }

    fn field_agent() -> Session {
        Session::FieldAgent {
            user_id: "u1".into(),
            username: "ion".into(),
            agent_id: "A1".into(),
        }
    }

    fn visit(client: &str, agent: Option<&str>, route: Option<&str>) -> Visit {
        let mut v = Visit::skeleton(client, NaiveDate::from_ymd_opt(2025, 10, 6).unwrap());
        v.agent_id = agent.map(str::to_string);
        v.route_id = route.map(str::to_string);
        v
    }

    #[test]
    fn county_abbreviations() {
        assert_eq!(county_abbr("MM"), "MM");
        assert_eq!(county_abbr("Cluj"), "CL");
        assert_eq!(county_abbr("Satu Mare"), "SM");
        assert_eq!(county_abbr("  "), "");
        let mut c = Client::new("Acme", "Bistrita Nasaud", "", "");
        assert_eq!(client_label(&c), "Acme (BN)");
        c.county.clear();
        assert_eq!(client_label(&c), "Acme");
    }

    #[test]
    fn add_client_requires_name_and_admin() {
        let mut s = State::default();
        let d = DefaultSettings::default();
        let err = add_client(&admin(), &mut s, &d, "  ", "", "", "").unwrap_err();
        assert_eq!(error_code(&err), "VALIDATION");
        let err = add_client(&field_agent(), &mut s, &d, "Acme", "", "", "").unwrap_err();
        assert_eq!(error_code(&err), "PERMISSION_DENIED");
        let c = add_client(&admin(), &mut s, &d, " Acme ", "Cluj", "", "").unwrap();
        assert_eq!(c.name, "Acme");
        assert_eq!(c.monthly_count, 2);
        assert_eq!(c.monthly_weeks, vec![1, 3]);
    }

    #[test]
    fn update_client_normalizes_cadence() {
        let mut s = State::default();
        let c = add_client(&admin(), &mut s, &DefaultSettings::default(), "Acme", "", "", "").unwrap();
        let patch = ClientPatch {
            monthly_count: Some(80),
            monthly_weeks: Some(vec![4, 2, 9, 2]),
            ..ClientPatch::default()
        };
        let c = update_client(&admin(), &mut s, &c.id, patch).unwrap();
        assert_eq!(c.monthly_count, 50);
        assert_eq!(c.monthly_weeks, vec![2, 4]);
    }

    #[test]
    fn cleared_weeks_leave_no_selected_weeks() {
        let mut s = State::default();
        let c = add_client(&admin(), &mut s, &DefaultSettings::default(), "Acme", "", "", "").unwrap();
        let patch = ClientPatch {
            monthly_weeks: Some(Vec::new()),
            ..ClientPatch::default()
        };
        let c = update_client(&admin(), &mut s, &c.id, patch).unwrap();
        assert!(c.monthly_weeks.is_empty());
        assert_eq!(c.monthly_count, 2);
    }

    #[test]
    fn contact_update_edits_only_given_fields() {
        let mut s = State::default();
        let c = add_client(&admin(), &mut s, &DefaultSettings::default(), "Acme", "", "", "").unwrap();
        let ct = add_contact(
            &admin(),
            &mut s,
            &c.id,
            Contact {
                name: "Maria".into(),
                role: "achizitii".into(),
                phone: "0744".into(),
                ..Contact::default()
            },
        )
        .unwrap();
        let patch = ContactPatch {
            phone: Some(" 0722 ".into()),
            email: Some("maria@acme.ro".into()),
            ..ContactPatch::default()
        };
        let updated = update_contact(&admin(), &mut s, &c.id, &ct.id, patch).unwrap();
        assert_eq!(updated.name, "Maria");
        assert_eq!(updated.role, "achizitii");
        assert_eq!(updated.phone, "0722");
        assert_eq!(s.clients[0].contacts[0].email, "maria@acme.ro");

        let missing = update_contact(&admin(), &mut s, &c.id, "nope", ContactPatch::default());
        assert_eq!(error_code(&missing.unwrap_err()), "NOT_FOUND");
        let denied = update_contact(&field_agent(), &mut s, &c.id, &ct.id, ContactPatch::default());
        assert_eq!(error_code(&denied.unwrap_err()), "PERMISSION_DENIED");
    }

    #[test]
    fn removing_client_drops_its_visits() {
        let mut s = State::default();
        let c = add_client(&admin(), &mut s, &DefaultSettings::default(), "Acme", "", "", "").unwrap();
        s.visits.push(visit(&c.id, None, None));
        s.visits.push(visit("other", None, None));
        assert_eq!(remove_client(&admin(), &mut s, &c.id).unwrap(), 1);
        assert_eq!(s.visits.len(), 1);
    }

    #[test]
    fn agent_removal_nulls_references() {
        let mut s = State::default();
        let a = add_agent(&admin(), &mut s, "Ion").unwrap();
        let r = add_route(&admin(), &mut s, "Nord", Some(&a.id)).unwrap();
        s.visits.push(visit("c1", Some(&a.id), Some(&r.id)));
        create_user(&admin(), &mut s, "ion", "secret", Role::Agent, Some(&a.id)).unwrap();

        remove_agent(&admin(), &mut s, &a.id).unwrap();

        assert!(s.agents.is_empty());
        assert_eq!(s.routes[0].agent_id, None);
        assert_eq!(s.visits[0].agent_id, None);
        assert_eq!(s.visits[0].route_id.as_deref(), Some(r.id.as_str()));
        assert_eq!(s.users[0].agent_id, None);
    }

    #[test]
    fn route_and_activity_removal_detach_visits() {
        let mut s = State::default();
        let r = add_route(&admin(), &mut s, "Nord", None).unwrap();
        let act = add_activity(&admin(), &mut s, "comanda").unwrap();
        let mut v = visit("c1", None, Some(&r.id));
        v.activity_ids = vec![act.id.clone(), "keep".into()];
        s.visits.push(v);

        remove_route(&admin(), &mut s, &r.id).unwrap();
        remove_activity(&admin(), &mut s, &act.id).unwrap();

        assert_eq!(s.visits[0].route_id, None);
        assert_eq!(s.visits[0].activity_ids, vec!["keep".to_string()]);
    }

    #[test]
    fn user_creation_rules() {
        let mut s = State::default();
        let short = create_user(&admin(), &mut s, "ion", "abc", Role::Administrator, None);
        assert_eq!(error_code(&short.unwrap_err()), "VALIDATION");
        let unbound = create_user(&admin(), &mut s, "ion", "secret", Role::Agent, None);
        assert_eq!(error_code(&unbound.unwrap_err()), "VALIDATION");
        let ghost = create_user(&admin(), &mut s, "ion", "secret", Role::Agent, Some("nope"));
        assert_eq!(error_code(&ghost.unwrap_err()), "NOT_FOUND");

        create_user(&admin(), &mut s, "maria", "secret", Role::Administrator, Some("ignored")).unwrap();
        assert_eq!(s.users[0].agent_id, None);
        let dup = create_user(&admin(), &mut s, "maria", "secret", Role::Administrator, None);
        assert_eq!(error_code(&dup.unwrap_err()), "VALIDATION");
    }

    #[test]
    fn admin_account_survives_reset_and_delete() {
        let mut s = State::default();
        crate::services::auth::ensure_default_admin(&mut s);
        let admin_id = s.users[0].id.clone();
        add_agent(&admin(), &mut s, "Ion").unwrap();
        add_client(&admin(), &mut s, &DefaultSettings::default(), "Acme", "", "", "").unwrap();

        assert!(remove_user(&admin(), &mut s, &admin_id).is_err());
        reset(&admin(), &mut s, &DefaultSettings::default()).unwrap();

        assert_eq!(s.users.len(), 1);
        assert!(s.clients.is_empty() && s.agents.is_empty());
        let names: Vec<_> = s.activities.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["comanda", "incasare", "comanda + incasare"]);
    }

    #[test]
    fn search_matches_any_field_case_insensitively() {
        let mut s = State::default();
        let d = DefaultSettings::default();
        add_client(&admin(), &mut s, &d, "Beta", "Cluj", "", "").unwrap();
        add_client(&admin(), &mut s, &d, "alfa", "Alba", "", "0722").unwrap();
        let names: Vec<_> = search_clients(&s, Some("AL")).iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["alfa"]);
        let all: Vec<_> = search_clients(&s, None).iter().map(|c| c.name.clone()).collect();
        assert_eq!(all, vec!["alfa", "Beta"]);
    }
}
