use crate::cli::SortMode;
use crate::domain::models::{new_id, Session, State, Visit, VisitRow};
use crate::error::{not_found, validation, PlanError};
use crate::services::export::{activity_text, day_name};
use crate::services::policy::{
    can_bulk_clear, can_bulk_generate, can_edit, require, route_default_agent, stamp_manual_agent,
    visible_visits,
};
use crate::services::roster::client_label;
use crate::services::schedule::{generate, DateRange};
use chrono::NaiveDate;

#[derive(Debug, Default, Clone)]
pub struct NewVisit {
    pub date: Option<NaiveDate>,
    pub client_id: Option<String>,
    pub agent_id: Option<String>,
    pub route_id: Option<String>,
    pub activities: Vec<String>,
    pub other_activity: String,
    pub details: String,
    pub obs: String,
}

/// Field updates; for `agent_id`/`route_id`, `Some(None)` clears the reference.
#[derive(Debug, Default, Clone)]
pub struct VisitPatch {
    pub date: Option<NaiveDate>,
    pub client_id: Option<String>,
    pub agent_id: Option<Option<String>>,
    pub route_id: Option<Option<String>>,
    pub activities: Option<Vec<String>>,
    pub other_activity: Option<String>,
    pub details: Option<String>,
    pub obs: Option<String>,
}

fn resolve_activities(state: &State, names: &[String]) -> anyhow::Result<Vec<String>> {
    let mut ids = Vec::new();
    for n in names {
        let n = n.trim();
        let a = state
            .activities
            .iter()
            .find(|a| a.name == n)
            .ok_or_else(|| not_found("activity", n))?;
        if !ids.contains(&a.id) {
            ids.push(a.id.clone());
        }
    }
    Ok(ids)
}

fn check_refs(
    state: &State,
    client_id: Option<&str>,
    agent_id: Option<&str>,
    route_id: Option<&str>,
) -> anyhow::Result<()> {
    if let Some(c) = client_id {
        state.client(c).ok_or_else(|| not_found("client", c))?;
    }
    if let Some(a) = agent_id {
        if !state.agents.iter().any(|x| x.id == a) {
            return Err(not_found("agent", a));
        }
    }
    if let Some(r) = route_id {
        state.route(r).ok_or_else(|| not_found("route", r))?;
    }
    Ok(())
}

pub fn add_manual_visit(
    session: &Session,
    state: &mut State,
    input: NewVisit,
) -> anyhow::Result<Visit> {
    let date = input.date.ok_or_else(|| validation("visit date is required"))?;
    let client_id = input
        .client_id
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| validation("visit client is required"))?;
    let mut agent_id = stamp_manual_agent(session, input.agent_id.as_deref())?;
    check_refs(
        state,
        Some(&client_id),
        agent_id.as_deref(),
        input.route_id.as_deref(),
    )?;
    let activity_ids = resolve_activities(state, &input.activities)?;

    if let Some(default) = route_default_agent(
        session,
        agent_id.as_deref(),
        input.route_id.as_deref().and_then(|r| state.route(r)),
    ) {
        agent_id = Some(default);
    }

    let v = Visit {
        id: new_id(),
        date,
        client_id,
        agent_id,
        route_id: input.route_id,
        activity_ids,
        other_activity: input.other_activity.trim().to_string(),
        details: input.details.trim().to_string(),
        obs: input.obs.trim().to_string(),
    };
    state.visits.push(v.clone());
    Ok(v)
}

pub fn update_visit(
    session: &Session,
    state: &mut State,
    id: &str,
    patch: VisitPatch,
) -> anyhow::Result<Visit> {
    let current = state
        .visits
        .iter()
        .find(|v| v.id == id)
        .ok_or_else(|| not_found("visit", id))?;
    require(can_edit(session, current), "this visit belongs to another agent")?;

    if let (Session::FieldAgent { .. }, Some(new_agent)) = (session, &patch.agent_id) {
        if new_agent.as_deref() != current.agent_id.as_deref() {
            return Err(PlanError::PermissionDenied(
                "field agents cannot reassign visits".to_string(),
            )
            .into());
        }
    }

    check_refs(
        state,
        patch.client_id.as_deref(),
        patch.agent_id.as_ref().and_then(|a| a.as_deref()),
        patch.route_id.as_ref().and_then(|r| r.as_deref()),
    )?;
    let activity_ids = patch
        .activities
        .as_deref()
        .map(|names| resolve_activities(state, names))
        .transpose()?;

    let mut v = current.clone();
    if let Some(d) = patch.date {
        v.date = d;
    }
    if let Some(c) = patch.client_id {
        v.client_id = c;
    }
    if let Some(a) = patch.agent_id {
        v.agent_id = a;
    }
    if let Some(ids) = activity_ids {
        v.activity_ids = ids;
    }
    if let Some(o) = patch.other_activity {
        v.other_activity = o.trim().to_string();
    }
    if let Some(d) = patch.details {
        v.details = d.trim().to_string();
    }
    if let Some(o) = patch.obs {
        v.obs = o.trim().to_string();
    }
    if let Some(r) = patch.route_id {
        v.route_id = r;
        if let Some(default) = route_default_agent(
            session,
            v.agent_id.as_deref(),
            v.route_id.as_deref().and_then(|r| state.route(r)),
        ) {
            v.agent_id = Some(default);
        }
    }

    if let Some(slot) = state.visits.iter_mut().find(|x| x.id == id) {
        *slot = v.clone();
    }
    Ok(v)
}

pub fn remove_visit(session: &Session, state: &mut State, id: &str) -> anyhow::Result<()> {
    let v = state
        .visits
        .iter()
        .find(|v| v.id == id)
        .ok_or_else(|| not_found("visit", id))?;
    require(can_edit(session, v), "this visit belongs to another agent")?;
    state.visits.retain(|v| v.id != id);
    Ok(())
}

pub fn generate_visits(
    session: &Session,
    state: &mut State,
    range: &DateRange,
) -> anyhow::Result<usize> {
    require(
        can_bulk_generate(session),
        "only administrators can generate visits",
    )?;
    let generation = generate(&state.clients, &state.visits, range);
    state.visits.extend(generation.visits);
    Ok(generation.added)
}

pub fn clear_visits(
    session: &Session,
    state: &mut State,
    range: &DateRange,
) -> anyhow::Result<usize> {
    require(
        can_bulk_clear(session),
        "only administrators can clear visits in bulk",
    )?;
    let before = state.visits.len();
    state.visits.retain(|v| !range.contains(v.date));
    Ok(before - state.visits.len())
}

/// Visits the session may see, optionally limited to an interval.
pub fn list_visits<'a>(
    session: &Session,
    state: &'a State,
    range: Option<&DateRange>,
    agent_filter: Option<&str>,
) -> Vec<&'a Visit> {
    visible_visits(session, &state.visits, agent_filter)
        .into_iter()
        .filter(|v| range.map(|r| r.contains(v.date)).unwrap_or(true))
        .collect()
}

pub fn sort_visits(state: &mut State, mode: SortMode) {
    let State {
        visits,
        clients,
        agents,
        routes,
        ..
    } = state;
    let key = |v: &Visit| -> String {
        let name = match mode {
            SortMode::Date => None,
            SortMode::Client => clients
                .iter()
                .find(|c| c.id == v.client_id)
                .map(|c| c.name.as_str()),
            SortMode::Agent => v
                .agent_id
                .as_deref()
                .and_then(|id| agents.iter().find(|a| a.id == id))
                .map(|a| a.name.as_str()),
            SortMode::Route => v
                .route_id
                .as_deref()
                .and_then(|id| routes.iter().find(|r| r.id == id))
                .map(|r| r.name.as_str()),
        };
        name.unwrap_or_default().to_lowercase()
    };
    visits.sort_by(|a, b| key(a).cmp(&key(b)).then_with(|| a.date.cmp(&b.date)));
}

pub fn visit_row(session: &Session, state: &State, v: &Visit) -> VisitRow {
    VisitRow {
        id: v.id.clone(),
        day: day_name(v.date).to_string(),
        date: v.date,
        client_id: v.client_id.clone(),
        client: state.client(&v.client_id).map(client_label).unwrap_or_default(),
        agent_id: v.agent_id.clone(),
        agent: state.agent_name(v.agent_id.as_deref()).map(str::to_string),
        route_id: v.route_id.clone(),
        activities: activity_text(state, v),
        details: v.details.clone(),
        obs: v.obs.clone(),
        editable: can_edit(session, v),
    }
}
