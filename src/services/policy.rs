use crate::domain::models::{Route, Session, Visit};
use crate::error::PlanError;

pub fn is_admin(session: &Session) -> bool {
    matches!(session, Session::Administrator { .. })
}

pub fn can_edit(session: &Session, visit: &Visit) -> bool {
    match session {
        Session::Administrator { .. } => true,
        Session::FieldAgent { agent_id, .. } => visit.agent_id.as_deref() == Some(agent_id.as_str()),
    }
}

pub fn can_bulk_generate(session: &Session) -> bool {
    is_admin(session)
}

pub fn can_bulk_clear(session: &Session) -> bool {
    is_admin(session)
}

pub fn can_import_clients(session: &Session) -> bool {
    is_admin(session)
}

pub fn can_manage_roster(session: &Session) -> bool {
    is_admin(session)
}

pub fn require(allowed: bool, action: &str) -> anyhow::Result<()> {
    if allowed {
        Ok(())
    } else {
        Err(PlanError::PermissionDenied(action.to_string()).into())
    }
}

/// Field agents see only their own visits and `agent_filter` is ignored for them.
pub fn visible_visits<'a>(
    session: &Session,
    visits: &'a [Visit],
    agent_filter: Option<&str>,
) -> Vec<&'a Visit> {
    match session {
        Session::FieldAgent { agent_id, .. } => visits
            .iter()
            .filter(|v| v.agent_id.as_deref() == Some(agent_id.as_str()))
            .collect(),
        Session::Administrator { .. } => match agent_filter {
            Some(a) => visits
                .iter()
                .filter(|v| v.agent_id.as_deref() == Some(a))
                .collect(),
            None => visits.iter().collect(),
        },
    }
}

/// Agent recorded on a manually created visit.
pub fn stamp_manual_agent(
    session: &Session,
    requested: Option<&str>,
) -> anyhow::Result<Option<String>> {
    match session {
        Session::Administrator { .. } => Ok(requested.map(str::to_string)),
        Session::FieldAgent { agent_id, .. } => {
            if let Some(r) = requested {
                if r != agent_id {
                    return Err(PlanError::PermissionDenied(
                        "field agents can only create visits for themselves".to_string(),
                    )
                    .into());
                }
            }
            Ok(Some(agent_id.clone()))
        }
    }
}

/// Agent the visit should take from `route`: only for administrators, only while unset.
pub fn route_default_agent(
    session: &Session,
    current_agent: Option<&str>,
    route: Option<&Route>,
) -> Option<String> {
    if !is_admin(session) || current_agent.is_some() {
        return None;
    }
    route.and_then(|r| r.agent_id.clone())
}
