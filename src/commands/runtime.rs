use crate::commands::{current_session, interval_range, or_dash, persist};
use crate::*;
use serde_json::json;

fn row_line(r: &VisitRow) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
        r.id,
        r.day,
        format_date_ro(r.date),
        r.client,
        r.agent.as_deref().unwrap_or("-"),
        or_dash(&r.activities),
        or_dash(&r.details)
    )
}

pub fn handle_runtime_commands(
    cli: &Cli,
    state: &mut State,
    store: &FileStore,
    settings: &Settings,
) -> anyhow::Result<()> {
    let session = current_session(store, state)?;
    match &cli.command {
        Commands::Visit { command } => match command {
            VisitCommands::Add {
                date,
                client,
                agent,
                route,
                activities,
                other,
                details,
                obs,
            } => {
                let input = NewVisit {
                    date: *date,
                    client_id: client.clone(),
                    agent_id: agent.clone(),
                    route_id: route.clone(),
                    activities: activities.clone(),
                    other_activity: other.clone(),
                    details: details.clone(),
                    obs: obs.clone(),
                };
                let v = add_manual_visit(&session, state, input)?;
                persist(store, state, &session, "visit.add", json!({"id": v.id, "date": v.date}))?;
                let row = visit_row(&session, state, &v);
                print_one(cli.json, row, |r| format!("added visit {}", row_line(r)))?;
            }
            VisitCommands::Update {
                id,
                date,
                client,
                agent,
                clear_agent,
                route,
                clear_route,
                activities,
                clear_activities,
                other,
                details,
                obs,
            } => {
                let patch = VisitPatch {
                    date: *date,
                    client_id: client.clone(),
                    agent_id: if *clear_agent {
                        Some(None)
                    } else {
                        agent.clone().map(Some)
                    },
                    route_id: if *clear_route {
                        Some(None)
                    } else {
                        route.clone().map(Some)
                    },
                    activities: if *clear_activities {
                        Some(Vec::new())
                    } else {
                        activities.clone()
                    },
                    other_activity: other.clone(),
                    details: details.clone(),
                    obs: obs.clone(),
                };
                let v = update_visit(&session, state, id, patch)?;
                persist(store, state, &session, "visit.update", json!({"id": v.id}))?;
                let row = visit_row(&session, state, &v);
                print_one(cli.json, row, |r| format!("updated visit {}", row_line(r)))?;
            }
            VisitCommands::Remove { id } => {
                remove_visit(&session, state, id)?;
                persist(store, state, &session, "visit.remove", json!({"id": id}))?;
                print_one(cli.json, id, |id| format!("removed visit {}", id))?;
            }
            VisitCommands::List { interval, agent } => {
                let range = interval_range(interval)?;
                let rows: Vec<VisitRow> = list_visits(&session, state, range.as_ref(), agent.as_deref())
                    .into_iter()
                    .map(|v| visit_row(&session, state, v))
                    .collect();
                print_out(cli.json, &rows, row_line)?;
            }
            VisitCommands::Sort { by } => {
                sort_visits(state, *by);
                persist(store, state, &session, "visit.sort", json!({"by": format!("{:?}", by).to_lowercase()}))?;
                print_one(cli.json, state.visits.len(), |n| format!("sorted {} visits", n))?;
            }
        },
        Commands::Plan { command } => match command {
            PlanCommands::Generate { from, to } => {
                let range = DateRange::new(*from, *to)?;
                let added = generate_visits(&session, state, &range)?;
                persist(store, state, &session, "plan.generate", json!({"from": from, "to": to, "added": added}))?;
                log::info!("generated {} visits for {}..{}", added, from, to);
                let report = GenerateReport {
                    from: *from,
                    to: *to,
                    added,
                };
                print_one(cli.json, report, |r| {
                    format!("generated {} visits ({} .. {})", r.added, r.from, r.to)
                })?;
            }
            PlanCommands::Clear { from, to } => {
                let range = DateRange::new(*from, *to)?;
                let removed = clear_visits(&session, state, &range)?;
                persist(store, state, &session, "plan.clear", json!({"from": from, "to": to, "removed": removed}))?;
                let report = ClearReport {
                    from: *from,
                    to: *to,
                    removed,
                };
                print_one(cli.json, report, |r| {
                    format!("removed {} visits ({} .. {})", r.removed, r.from, r.to)
                })?;
            }
        },
        Commands::Export {
            interval,
            agent,
            format,
            out,
        } => {
            let range = interval_range(interval)?;
            let rows = export_rows(&session, state, range.as_ref(), agent.as_deref());
            let path = match out {
                Some(p) => p.clone(),
                None => settings
                    .export_dir()
                    .join(export_file_name(range.as_ref(), *format)),
            };
            write_export(&path, *format, &rows)?;
            store.audit(
                session.username(),
                "export",
                json!({"path": path.to_string_lossy(), "rows": rows.len()}),
            );
            let report = ExportReport {
                path: path.to_string_lossy().to_string(),
                rows: rows.len(),
            };
            print_one(cli.json, report, |r| format!("exported {} rows to {}", r.rows, r.path))?;
        }
        Commands::Report { interval, agent } => {
            let range = interval_range(interval)?;
            let report = build_report(&session, state, range.as_ref(), agent.as_deref());
            print_one(cli.json, report, |r| {
                let mut lines = vec![
                    format!("visits: {}", r.visits),
                    format!("unique clients: {}", r.unique_clients),
                    "by agent:".to_string(),
                ];
                lines.extend(r.by_agent.iter().map(|c| format!("  {}: {}", c.name, c.visits)));
                lines.push("by route:".to_string());
                lines.extend(r.by_route.iter().map(|c| format!("  {}: {}", c.name, c.visits)));
                lines.join("\n")
            })?;
        }
        _ => {}
    }
    Ok(())
}
