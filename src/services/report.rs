use crate::domain::constants::{NO_ENTRY_LABEL, REPORT_TOP_N};
use crate::domain::models::{CountItem, PlanReport, Session, State, Visit};
use crate::services::schedule::DateRange;
use crate::services::visits::list_visits;
use std::collections::HashSet;

/// Counts per key in first-seen order, highest first, truncated to the top entries.
fn top_counts<'a>(
    visits: &[&'a Visit],
    key: impl Fn(&'a Visit) -> Option<&'a str>,
    label: impl Fn(&str) -> String,
) -> Vec<CountItem> {
    let mut counts: Vec<(Option<&str>, usize)> = Vec::new();
    for v in visits {
        let k = key(*v);
        match counts.iter_mut().find(|(existing, _)| *existing == k) {
            Some((_, n)) => *n += 1,
            None => counts.push((k, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(REPORT_TOP_N)
        .map(|(k, n)| CountItem {
            name: k.map(&label).unwrap_or_else(|| NO_ENTRY_LABEL.to_string()),
            visits: n,
        })
        .collect()
}

pub fn build_report(
    session: &Session,
    state: &State,
    range: Option<&DateRange>,
    agent_filter: Option<&str>,
) -> PlanReport {
    let visits = list_visits(session, state, range, agent_filter);
    let unique: HashSet<&str> = visits
        .iter()
        .map(|v| v.client_id.as_str())
        .filter(|c| !c.is_empty())
        .collect();

    let by_agent = top_counts(
        &visits,
        |v| v.agent_id.as_deref(),
        |id| state.agent_name(Some(id)).unwrap_or(id).to_string(),
    );
    let by_route = top_counts(
        &visits,
        |v| v.route_id.as_deref(),
        |id| state.route(id).map(|r| r.name.as_str()).unwrap_or(id).to_string(),
    );

    PlanReport {
        visits: visits.len(),
        unique_clients: unique.len(),
        by_agent,
        by_route,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Agent, Route};
    use chrono::NaiveDate;

    fn admin() -> Session {
        Session::Administrator {
            user_id: "u0".into(),
            username: "admin".into(),
        }
    }

    fn visit(client: &str, day: u32, agent: Option<&str>, route: Option<&str>) -> Visit {
        let mut v = Visit::skeleton(client, NaiveDate::from_ymd_opt(2025, 10, day).unwrap());
        v.agent_id = agent.map(str::to_string);
        v.route_id = route.map(str::to_string);
        v
    }

    fn fixture() -> State {
        let mut s = State::default();
        s.agents = vec![
            Agent { id: "A1".into(), name: "Ion".into() },
            Agent { id: "A2".into(), name: "Ana".into() },
        ];
        s.routes = vec![Route { id: "R1".into(), name: "Nord".into(), agent_id: None }];
        s.visits = vec![
            visit("c1", 6, Some("A1"), Some("R1")),
            visit("c2", 6, Some("A2"), None),
            visit("c1", 20, Some("A2"), Some("R1")),
            visit("c3", 21, None, Some("GONE")),
            visit("c2", 22, Some("A2"), None),
        ];
        s
    }

    #[test]
    fn counts_visits_clients_and_named_buckets() {
        let s = fixture();
        let r = build_report(&admin(), &s, None, None);
        assert_eq!(r.visits, 5);
        assert_eq!(r.unique_clients, 3);
        assert_eq!(
            r.by_agent,
            vec![
                CountItem { name: "Ana".into(), visits: 3 },
                CountItem { name: "Ion".into(), visits: 1 },
                CountItem { name: "(fără)".into(), visits: 1 },
            ]
        );
        assert_eq!(r.by_route[0], CountItem { name: "Nord".into(), visits: 2 });
        assert_eq!(r.by_route[1].name, "(fără)");
        assert_eq!(r.by_route[2].name, "GONE");
    }

    #[test]
    fn field_agent_report_is_scoped() {
        let s = fixture();
        let ion = Session::FieldAgent {
            user_id: "u1".into(),
            username: "ion".into(),
            agent_id: "A1".into(),
        };
        let r = build_report(&ion, &s, None, Some("A2"));
        assert_eq!((r.visits, r.unique_clients), (1, 1));
    }

    #[test]
    fn interval_limits_report() {
        let s = fixture();
        let from = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 10, 31).unwrap();
        let range = DateRange::new(from, to).unwrap();
        let r = build_report(&admin(), &s, Some(&range), None);
        assert_eq!(r.visits, 3);
    }

    #[test]
    fn buckets_are_capped() {
        let mut s = State::default();
        for i in 0..10 {
            s.visits.push(visit("c", 1, Some(&format!("A{}", i)), None));
        }
        let r = build_report(&admin(), &s, None, None);
        assert_eq!(r.by_agent.len(), REPORT_TOP_N);
    }
}
