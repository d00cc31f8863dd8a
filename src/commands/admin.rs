use crate::commands::{current_session, or_dash, persist};
use crate::*;
use serde_json::json;

fn confirm(yes: bool, what: &str) -> anyhow::Result<()> {
    if yes {
        Ok(())
    } else {
        Err(validation(format!("{} is destructive; pass --yes to confirm", what)))
    }
}

fn weeks_text(weeks: &[u8]) -> String {
    weeks
        .iter()
        .map(|w| w.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn handle_auth_commands(cli: &Cli, state: &State, store: &FileStore) -> anyhow::Result<bool> {
    let sessions = FileSessionProvider::new(store.session_path());
    match &cli.command {
        Commands::Login { username, password } => {
            let session = sessions.sign_in(state, username, password)?;
            store.audit(session.username(), "login", json!({}));
            let who = WhoAmI {
                username: session.username().to_string(),
                role: session.role(),
                agent_id: session.agent_id().map(str::to_string),
            };
            print_one(cli.json, who, |w| {
                format!("logged in as {} ({})", w.username, w.role.as_str())
            })?;
        }
        Commands::Logout => {
            sessions.sign_out()?;
            print_one(cli.json, "logged out", |s| s.to_string())?;
        }
        Commands::Whoami => {
            let session = sessions.current_session(state)?;
            let who = WhoAmI {
                username: session.username().to_string(),
                role: session.role(),
                agent_id: session.agent_id().map(str::to_string),
            };
            print_one(cli.json, who, |w| match &w.agent_id {
                Some(a) => format!("{}\t{}\tagent={}", w.username, w.role.as_str(), a),
                None => format!("{}\t{}", w.username, w.role.as_str()),
            })?;
        }
        _ => return Ok(false),
    }
    Ok(true)
}

pub fn handle_roster_commands(
    cli: &Cli,
    state: &mut State,
    store: &FileStore,
    settings: &Settings,
) -> anyhow::Result<bool> {
    let defaults = &settings.defaults;
    match &cli.command {
        Commands::Client { command } => {
            let session = current_session(store, state)?;
            handle_client_commands(cli.json, command, &session, state, store, defaults)?;
        }
        Commands::Agent { command } => {
            let session = current_session(store, state)?;
            match command {
                AgentCommands::Add { name } => {
                    let a = add_agent(&session, state, name)?;
                    persist(store, state, &session, "agent.add", json!({"id": a.id, "name": a.name}))?;
                    print_one(cli.json, a, |a| format!("added agent {}\t{}", a.id, a.name))?;
                }
                AgentCommands::List => {
                    let mut agents = state.agents.clone();
                    agents.sort_by_key(|a| a.name.to_lowercase());
                    print_out(cli.json, &agents, |a| format!("{}\t{}", a.id, a.name))?;
                }
                AgentCommands::Rename { id, name } => {
                    let a = rename_agent(&session, state, id, name)?;
                    persist(store, state, &session, "agent.rename", json!({"id": a.id, "name": a.name}))?;
                    print_one(cli.json, a, |a| format!("renamed agent {}\t{}", a.id, a.name))?;
                }
                AgentCommands::Remove { id } => {
                    remove_agent(&session, state, id)?;
                    persist(store, state, &session, "agent.remove", json!({"id": id}))?;
                    print_one(cli.json, id, |id| format!("removed agent {}", id))?;
                }
            }
        }
        Commands::Route { command } => {
            let session = current_session(store, state)?;
            match command {
                RouteCommands::Add { name, agent } => {
                    let r = add_route(&session, state, name, agent.as_deref())?;
                    persist(store, state, &session, "route.add", json!({"id": r.id, "name": r.name}))?;
                    print_one(cli.json, r, |r| format!("added route {}\t{}", r.id, r.name))?;
                }
                RouteCommands::List => {
                    let mut routes = state.routes.clone();
                    routes.sort_by_key(|r| r.name.to_lowercase());
                    print_out(cli.json, &routes, |r| {
                        format!(
                            "{}\t{}\t{}",
                            r.id,
                            r.name,
                            state.agent_name(r.agent_id.as_deref()).unwrap_or("-")
                        )
                    })?;
                }
                RouteCommands::Update {
                    id,
                    name,
                    agent,
                    clear_agent,
                } => {
                    let agent_change = if *clear_agent {
                        Some(None)
                    } else {
                        agent.as_deref().map(Some)
                    };
                    let r = update_route(&session, state, id, name.as_deref(), agent_change)?;
                    persist(store, state, &session, "route.update", json!({"id": r.id}))?;
                    print_one(cli.json, r, |r| format!("updated route {}\t{}", r.id, r.name))?;
                }
                RouteCommands::Remove { id } => {
                    remove_route(&session, state, id)?;
                    persist(store, state, &session, "route.remove", json!({"id": id}))?;
                    print_one(cli.json, id, |id| format!("removed route {}", id))?;
                }
            }
        }
        Commands::Activity { command } => {
            let session = current_session(store, state)?;
            match command {
                ActivityCommands::Add { name } => {
                    let a = add_activity(&session, state, name)?;
                    persist(store, state, &session, "activity.add", json!({"id": a.id, "name": a.name}))?;
                    print_one(cli.json, a, |a| format!("added activity {}\t{}", a.id, a.name))?;
                }
                ActivityCommands::List => {
                    let mut acts = state.activities.clone();
                    acts.sort_by_key(|a| a.name.to_lowercase());
                    print_out(cli.json, &acts, |a| format!("{}\t{}", a.id, a.name))?;
                }
                ActivityCommands::Rename { id, name } => {
                    let a = rename_activity(&session, state, id, name)?;
                    persist(store, state, &session, "activity.rename", json!({"id": a.id, "name": a.name}))?;
                    print_one(cli.json, a, |a| format!("renamed activity {}\t{}", a.id, a.name))?;
                }
                ActivityCommands::Remove { id } => {
                    remove_activity(&session, state, id)?;
                    persist(store, state, &session, "activity.remove", json!({"id": id}))?;
                    print_one(cli.json, id, |id| format!("removed activity {}", id))?;
                }
            }
        }
        Commands::User { command } => {
            let session = current_session(store, state)?;
            match command {
                UserCommands::Create {
                    username,
                    password,
                    role,
                    agent,
                } => {
                    let u = create_user(&session, state, username, password, *role, agent.as_deref())?;
                    persist(store, state, &session, "user.create", json!({"id": u.id, "username": u.username}))?;
                    print_one(cli.json, u, |u| {
                        format!("created user {}\t{}\t{}", u.id, u.username, u.role.as_str())
                    })?;
                }
                UserCommands::List => {
                    let users = list_users(&session, state)?;
                    print_out(cli.json, &users, |u| {
                        format!(
                            "{}\t{}\t{}\t{}",
                            u.id,
                            u.username,
                            u.role.as_str(),
                            u.agent_name.as_deref().unwrap_or("-")
                        )
                    })?;
                }
                UserCommands::Remove { id } => {
                    remove_user(&session, state, id)?;
                    persist(store, state, &session, "user.remove", json!({"id": id}))?;
                    print_one(cli.json, id, |id| format!("removed user {}", id))?;
                }
            }
        }
        Commands::Reset { yes } => {
            let session = current_session(store, state)?;
            confirm(*yes, "reset")?;
            reset(&session, state, defaults)?;
            persist(store, state, &session, "reset", json!({}))?;
            print_one(cli.json, "reset", |_| "all data reset".to_string())?;
        }
        _ => return Ok(false),
    }
    Ok(true)
}

fn handle_client_commands(
    json: bool,
    command: &ClientCommands,
    session: &Session,
    state: &mut State,
    store: &FileStore,
    defaults: &DefaultSettings,
) -> anyhow::Result<()> {
    match command {
        ClientCommands::Add { name, fields } => {
            let c = add_client(
                session,
                state,
                defaults,
                name,
                fields.county.as_deref().unwrap_or(""),
                fields.address.as_deref().unwrap_or(""),
                fields.phone.as_deref().unwrap_or(""),
            )?;
            persist(store, state, session, "client.add", json!({"id": c.id, "name": c.name}))?;
            print_one(json, c, |c| format!("added client {}\t{}", c.id, client_label(c)))?;
        }
        ClientCommands::List { search } => {
            let clients: Vec<Client> = search_clients(state, search.as_deref())
                .into_iter()
                .cloned()
                .collect();
            print_out(json, &clients, |c| {
                format!(
                    "{}\t{}\t{}\t{}x weeks {}",
                    c.id,
                    client_label(c),
                    or_dash(&c.phone),
                    c.monthly_count,
                    weeks_text(&c.monthly_weeks)
                )
            })?;
        }
        ClientCommands::Show { id } => {
            let c = state.client(id).cloned().ok_or_else(|| not_found("client", id))?;
            print_one(json, c, |c| {
                let mut lines = vec![
                    format!("id: {}", c.id),
                    format!("name: {}", c.name),
                    format!("county: {}", or_dash(&c.county)),
                    format!("address: {}", or_dash(&c.address)),
                    format!("phone: {}", or_dash(&c.phone)),
                    format!(
                        "cadence: {} per month, weeks {}",
                        c.monthly_count,
                        weeks_text(&c.monthly_weeks)
                    ),
                ];
                for ct in &c.contacts {
                    lines.push(format!(
                        "contact: {}\t{}\t{}\t{}",
                        ct.id,
                        ct.name,
                        or_dash(&ct.role),
                        or_dash(&ct.phone)
                    ));
                }
                lines.join("\n")
            })?;
        }
        ClientCommands::Update {
            id,
            name,
            fields,
            count,
            weeks,
            clear_weeks,
        } => {
            let patch = ClientPatch {
                name: name.clone(),
                county: fields.county.clone(),
                address: fields.address.clone(),
                phone: fields.phone.clone(),
                monthly_count: *count,
                monthly_weeks: if *clear_weeks {
                    Some(Vec::new())
                } else {
                    weeks.clone()
                },
            };
            let c = update_client(session, state, id, patch)?;
            persist(store, state, session, "client.update", json!({"id": c.id}))?;
            print_one(json, c, |c| format!("updated client {}\t{}", c.id, client_label(c)))?;
        }
        ClientCommands::Remove { id } => {
            let visits = remove_client(session, state, id)?;
            persist(store, state, session, "client.remove", json!({"id": id, "visits": visits}))?;
            print_one(json, json!({"id": id, "visits_removed": visits}), |_| {
                format!("removed client {} and {} visits", id, visits)
            })?;
        }
        ClientCommands::Clear { yes } => {
            confirm(*yes, "client clear")?;
            let removed = clear_clients(session, state)?;
            persist(store, state, session, "client.clear", json!({"clients": removed}))?;
            print_one(json, json!({"clients_removed": removed}), |_| {
                format!("removed {} clients and all visits", removed)
            })?;
        }
        ClientCommands::Import { file, sheet } => {
            let report = import_clients(session, state, defaults, file, sheet.as_deref())?;
            persist(
                store,
                state,
                session,
                "client.import",
                json!({"sheet": report.sheet, "added": report.added, "updated": report.updated}),
            )?;
            print_one(json, report, |r| {
                format!("imported sheet {}: {} added, {} updated", r.sheet, r.added, r.updated)
            })?;
        }
        ClientCommands::Contact { command } => match command {
            ContactCommands::Add {
                client,
                name,
                role,
                phone,
                email,
                notes,
            } => {
                let contact = Contact {
                    id: String::new(),
                    name: name.clone(),
                    role: role.clone(),
                    phone: phone.clone(),
                    email: email.clone(),
                    notes: notes.clone(),
                };
                let ct = add_contact(session, state, client, contact)?;
                persist(store, state, session, "contact.add", json!({"client": client, "id": ct.id}))?;
                print_one(json, ct, |ct| format!("added contact {}\t{}", ct.id, ct.name))?;
            }
            ContactCommands::Update {
                client,
                contact,
                name,
                role,
                phone,
                email,
                notes,
            } => {
                let patch = ContactPatch {
                    name: name.clone(),
                    role: role.clone(),
                    phone: phone.clone(),
                    email: email.clone(),
                    notes: notes.clone(),
                };
                let ct = update_contact(session, state, client, contact, patch)?;
                persist(store, state, session, "contact.update", json!({"client": client, "id": ct.id}))?;
                print_one(json, ct, |ct| format!("updated contact {}\t{}", ct.id, ct.name))?;
            }
            ContactCommands::Remove { client, contact } => {
                remove_contact(session, state, client, contact)?;
                persist(store, state, session, "contact.remove", json!({"client": client, "id": contact}))?;
                print_one(json, contact, |id| format!("removed contact {}", id))?;
            }
        },
    }
    Ok(())
}
