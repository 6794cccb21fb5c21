//! The single place the browser [`Model`] changes.
//!
//! [`update`] takes one message, mutates the model and hands back the
//! [`Command`] that should run next. It never blocks and never performs I/O.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::browser::command::{Command, ExitAction, SshTarget};
use crate::browser::message::Msg;
use crate::browser::model::{
    DeleteTarget, Filter, Mode, Model, Notification, NotificationKind, Project, Stamp,
};
use crate::browser::resource::{EnrichmentLookups, Product, Resource, sort_rows};
use crate::browser::wizard;
use crate::config::{
    DebugAction, DialogAction, FilterAction, GlobalAction, KeyResolver, NavAction, ResourceAction,
};

const PAGE: usize = 10;

/// The first command of a session.
pub fn init(model: &mut Model) -> Command {
    if model.project.is_some() {
        load_current(model)
    } else {
        open_projects(model)
    }
}

pub fn update(model: &mut Model, msg: Msg) -> Command {
    match msg {
        Msg::Key(key) => on_key(model, key),
        Msg::Paste(text) => {
            on_paste(model, &text);
            Command::None
        }

        Msg::ProjectsLoaded(result) => on_projects_loaded(model, result),
        Msg::DefaultProjectSaved(Ok(())) => Command::None,
        Msg::DefaultProjectSaved(Err(err)) => {
            warn!(%err, "Could not save the default project");
            notify(
                model,
                format!("Could not save default project: {err}"),
                NotificationKind::Error,
            )
        }

        Msg::ResourcesLoaded {
            stamp,
            background,
            result,
        } => on_resources_loaded(model, stamp, background, result),
        Msg::InstancesEnriched { stamp, lookups } => {
            on_instances_enriched(model, &stamp, &lookups);
            Command::None
        }
        Msg::DetailLoaded { stamp, id, result } => on_detail_loaded(model, &stamp, &id, result),
        Msg::ResourceDeleted {
            stamp,
            name,
            result,
        } => on_resource_deleted(model, &stamp, &name, result),

        Msg::RefreshTick { stamp, generation } => on_refresh_tick(model, stamp, generation),
        Msg::ClearNotification { id } => {
            if model.notification.as_ref().is_some_and(|n| n.id == id) {
                model.notification = None;
            }
            Command::None
        }

        Msg::ClipboardCopied(Ok(label)) => {
            notify(model, format!("Copied id of {label}"), NotificationKind::Info)
        }
        Msg::ClipboardCopied(Err(err)) => {
            notify(model, format!("Clipboard: {err}"), NotificationKind::Error)
        }
        Msg::SshFinished(Ok(())) => notify(model, "SSH session ended", NotificationKind::Info),
        Msg::SshFinished(Err(err)) => notify(model, err, NotificationKind::Error),

        Msg::Wizard(msg) => wizard::handle_msg(model, msg),
    }
}

// === Shared transitions ===

/// Fetch the current product in the foreground.
pub(crate) fn load_current(model: &mut Model) -> Command {
    let Some(stamp) = model.stamp() else {
        return open_projects(model);
    };
    model.mode = Mode::Loading;
    model.pending_detail = None;
    model.error = None;
    model.loading_label = format!("Loading {}", model.current_product.title());
    Command::FetchResources {
        stamp,
        background: false,
    }
}

pub(crate) fn notify(model: &mut Model, text: impl Into<String>, kind: NotificationKind) -> Command {
    let id = model.next_notification_id();
    model.notification = Some(Notification {
        id,
        text: text.into(),
        kind,
    });
    Command::ExpireNotification {
        id,
        delay: model.settings.notification_ttl,
    }
}

fn open_projects(model: &mut Model) -> Command {
    model.project = None;
    clear_data(model);
    model.mode = Mode::Loading;
    model.error = None;
    model.loading_label = "Loading projects".to_string();
    Command::FetchProjects
}

fn clear_data(model: &mut Model) {
    model.current_data.clear();
    model.data_product = None;
    model.detail_data = None;
    model.pending_detail = None;
    model.filter = Filter::default();
    model.selected = 0;
}

fn switch_product(model: &mut Model, product: Product) -> Command {
    debug!(from = ?model.current_product, to = ?product, "Switching product");
    model.current_product = product;
    clear_data(model);
    load_current(model)
}

/// Land in `mode`, or remember it as the place to return to when the debug
/// view is on top.
fn settle(model: &mut Model, mode: Mode) {
    if model.mode == Mode::Debug {
        model.debug_return = mode;
    } else {
        model.mode = mode;
    }
}

/// Start a new refresh chain for the instance list, superseding any other.
fn arm_refresh(model: &mut Model, stamp: Stamp) -> Command {
    if stamp.product != Product::Instances || model.settings.refresh_interval.is_zero() {
        return Command::None;
    }
    model.refresh_generation += 1;
    Command::ScheduleRefresh {
        stamp,
        generation: model.refresh_generation,
        delay: model.settings.refresh_interval,
    }
}

fn back_to_table(model: &mut Model) -> Command {
    model.detail_data = None;
    model.pending_detail = None;
    if !model.has_cached_table() {
        return load_current(model);
    }
    model.mode = if model.current_data.is_empty() {
        Mode::Empty
    } else {
        Mode::Table
    };
    model.clamp_selection();
    model.stamp().map_or(Command::None, |stamp| arm_refresh(model, stamp))
}

// === Messages ===

fn on_projects_loaded(model: &mut Model, result: Result<Vec<Project>, ApiError>) -> Command {
    if model.project.is_some() || model.effective_mode() != Mode::Loading {
        debug!("Discarding project list");
        return Command::None;
    }
    match result {
        Ok(mut projects) => {
            projects.sort_by(|a, b| {
                a.description
                    .to_lowercase()
                    .cmp(&b.description.to_lowercase())
                    .then_with(|| a.id.cmp(&b.id))
            });
            info!(count = projects.len(), "Projects loaded");
            let mode = if projects.is_empty() {
                Mode::Empty
            } else {
                Mode::ProjectSelect
            };
            model.projects = projects;
            model.selected = 0;
            settle(model, mode);
        }
        Err(err) => {
            warn!(%err, "Could not list projects");
            model.error = Some(err.to_string());
            settle(model, Mode::Error);
        }
    }
    Command::None
}

fn on_resources_loaded(
    model: &mut Model,
    stamp: Stamp,
    background: bool,
    result: Result<Vec<Resource>, ApiError>,
) -> Command {
    if !model.is_current(&stamp) {
        debug!(product = ?stamp.product, "Discarding stale resource list");
        return Command::None;
    }

    let mut rows = match result {
        Ok(rows) => rows,
        Err(err) if background => {
            warn!(product = ?stamp.product, %err, "Background refresh failed");
            return Command::None;
        }
        Err(err) => {
            warn!(product = ?stamp.product, %err, "Resource list failed");
            if model.effective_mode() == Mode::Loading && model.pending_detail.is_none() {
                model.error = Some(err.to_string());
                settle(model, Mode::Error);
            }
            return Command::None;
        }
    };

    sort_rows(&mut rows);
    let had_table = model.has_cached_table();
    let cursor_id = model
        .visible_indices()
        .get(model.selected)
        .map(|&i| model.current_data[i].id.clone());

    if background && had_table {
        let previous: HashMap<String, _> = std::mem::take(&mut model.current_data)
            .into_iter()
            .map(|r| (r.id, r.enrichment))
            .collect();
        for row in &mut rows {
            if let Some(enrichment) = previous.get(&row.id) {
                row.enrichment = enrichment.clone();
            }
        }
    }

    debug!(product = ?stamp.product, count = rows.len(), background, "Resources loaded");
    model.current_data = rows;
    model.data_product = Some(stamp.product);

    let visible = model.visible_indices();
    model.selected = cursor_id
        .and_then(|id| visible.iter().position(|&i| model.current_data[i].id == id))
        .unwrap_or(model.selected);
    model.clamp_selection();

    let listed = if model.current_data.is_empty() {
        Mode::Empty
    } else {
        Mode::Table
    };
    match model.effective_mode() {
        Mode::Loading if !background && model.pending_detail.is_none() => settle(model, listed),
        Mode::Table | Mode::Empty if background => settle(model, listed),
        _ => {}
    }

    if stamp.product != Product::Instances {
        return Command::None;
    }
    let regions: BTreeSet<String> = model
        .current_data
        .iter()
        .filter_map(|r| r.region().map(str::to_string))
        .collect();
    let enrich = if regions.is_empty() {
        Command::None
    } else {
        Command::EnrichInstances {
            stamp: stamp.clone(),
            regions: regions.into_iter().collect(),
        }
    };
    if background {
        enrich
    } else {
        let refresh = arm_refresh(model, stamp);
        Command::batch([enrich, refresh])
    }
}

fn on_instances_enriched(model: &mut Model, stamp: &Stamp, lookups: &EnrichmentLookups) {
    if !model.is_current(stamp) || model.data_product != Some(Product::Instances) {
        debug!("Discarding stale enrichment");
        return;
    }
    for row in &mut model.current_data {
        row.enrichment = lookups.enrichment_for(row);
    }
    if let Some(detail) = model.detail_data.as_mut() {
        detail.enrichment = lookups.enrichment_for(detail);
    }
}

fn on_detail_loaded(
    model: &mut Model,
    stamp: &Stamp,
    id: &str,
    result: Result<Resource, ApiError>,
) -> Command {
    if !model.is_current(stamp) || model.pending_detail.as_deref() != Some(id) {
        debug!(id, "Discarding stale detail");
        return Command::None;
    }
    model.pending_detail = None;
    match result {
        Ok(mut resource) => {
            if let Some(row) = model.current_data.iter().find(|r| r.id == resource.id) {
                resource.enrichment = row.enrichment.clone();
            }
            model.detail_data = Some(resource);
            settle(model, Mode::Detail);
        }
        Err(err) => {
            warn!(id, %err, "Detail failed");
            model.error = Some(err.to_string());
            settle(model, Mode::Error);
        }
    }
    Command::None
}

fn on_resource_deleted(
    model: &mut Model,
    stamp: &Stamp,
    name: &str,
    result: Result<(), ApiError>,
) -> Command {
    let current = model.is_current(stamp);
    match result {
        Ok(()) => {
            info!(name, "Resource deleted");
            let note = notify(model, format!("Deleted {name}"), NotificationKind::Success);
            // The wizard and an open confirm dialog keep the screen; the
            // wizard reloads the list when it closes.
            let busy = matches!(model.effective_mode(), Mode::Wizard | Mode::DeleteConfirm);
            if !current || busy || model.wizard.is_some() {
                return note;
            }
            model.detail_data = None;
            let reload = load_current(model);
            Command::batch([reload, note])
        }
        Err(err) => {
            warn!(name, %err, "Delete failed");
            if current && model.effective_mode() == Mode::Loading {
                model.error = Some(format!("Could not delete {name}: {err}"));
                settle(model, Mode::Error);
                Command::None
            } else {
                notify(
                    model,
                    format!("Could not delete {name}: {err}"),
                    NotificationKind::Error,
                )
            }
        }
    }
}

fn on_refresh_tick(model: &mut Model, stamp: Stamp, generation: u64) -> Command {
    let qualifies = generation == model.refresh_generation
        && model.is_current(&stamp)
        && stamp.product == Product::Instances
        && matches!(model.mode, Mode::Table | Mode::Empty);
    if !qualifies {
        debug!(generation, "Refresh chain ended");
        return Command::None;
    }
    Command::batch([
        Command::FetchResources {
            stamp: stamp.clone(),
            background: true,
        },
        Command::ScheduleRefresh {
            stamp,
            generation,
            delay: model.settings.refresh_interval,
        },
    ])
}

// === Input ===

/// Which handler owns the keyboard, picked once per key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputHandler {
    Wizard,
    DeleteConfirm,
    Debug,
    Filter,
    Default,
}

impl InputHandler {
    const fn for_model(model: &Model) -> Self {
        match model.mode {
            Mode::Wizard => Self::Wizard,
            Mode::DeleteConfirm => Self::DeleteConfirm,
            Mode::Debug => Self::Debug,
            _ if model.filter.active => Self::Filter,
            _ => Self::Default,
        }
    }
}

fn on_key(model: &mut Model, key: KeyEvent) -> Command {
    let keys = Arc::clone(&model.keys);
    match InputHandler::for_model(model) {
        InputHandler::Wizard => wizard::handle_key(model, key),
        InputHandler::DeleteConfirm => on_delete_confirm_key(model, &keys, key),
        InputHandler::Debug => on_debug_key(model, &keys, key),
        InputHandler::Filter => on_filter_key(model, &keys, key),
        InputHandler::Default => on_default_key(model, &keys, key),
    }
}

fn on_paste(model: &mut Model, text: &str) {
    match InputHandler::for_model(model) {
        InputHandler::Wizard => wizard::handle_paste(model, text),
        InputHandler::Filter => {
            model.filter.input.push_str(text.trim_end_matches(['\r', '\n']));
            model.selected = 0;
        }
        _ => {}
    }
}

fn on_delete_confirm_key(model: &mut Model, keys: &KeyResolver, key: KeyEvent) -> Command {
    if keys.matches(&key, DialogAction::Confirm) {
        let Some(target) = model.delete_target.take() else {
            model.mode = Mode::Table;
            return Command::None;
        };
        let Some(stamp) = model.stamp() else {
            return Command::None;
        };
        info!(name = %target.resource.name, path = %target.path, "Deleting resource");
        model.mode = Mode::Loading;
        model.loading_label = format!("Deleting {}", target.resource.name);
        return Command::DeleteResource {
            stamp,
            name: target.resource.name,
            path: target.path,
        };
    }
    if keys.matches(&key, DialogAction::Cancel) {
        model.mode = model
            .delete_target
            .take()
            .map_or(Mode::Table, |target| target.return_mode);
    }
    Command::None
}

fn on_debug_key(model: &mut Model, keys: &KeyResolver, key: KeyEvent) -> Command {
    let last = model.debug_log.len().saturating_sub(1);
    if keys.matches(&key, GlobalAction::Back)
        || keys.matches(&key, GlobalAction::Debug)
        || keys.matches(&key, GlobalAction::Quit)
    {
        model.mode = model.debug_return;
        return match model.mode {
            Mode::Table | Mode::Empty => model
                .stamp()
                .map_or(Command::None, |stamp| arm_refresh(model, stamp)),
            _ => Command::None,
        };
    }
    if keys.matches(&key, DebugAction::Clear) {
        model.debug_log.clear();
        model.debug_scroll = 0;
    } else if keys.matches(&key, NavAction::Up) {
        model.debug_scroll = model.debug_scroll.saturating_sub(1);
    } else if keys.matches(&key, NavAction::Down) {
        model.debug_scroll = (model.debug_scroll + 1).min(last);
    } else if keys.matches(&key, NavAction::PageUp) {
        model.debug_scroll = model.debug_scroll.saturating_sub(PAGE);
    } else if keys.matches(&key, NavAction::PageDown) {
        model.debug_scroll = (model.debug_scroll + PAGE).min(last);
    } else if keys.matches(&key, NavAction::Home) {
        model.debug_scroll = 0;
    } else if keys.matches(&key, NavAction::End) {
        model.debug_scroll = last;
    }
    Command::None
}

fn on_filter_key(model: &mut Model, keys: &KeyResolver, key: KeyEvent) -> Command {
    if keys.matches(&key, FilterAction::Exit) {
        model.filter = Filter::default();
        model.selected = 0;
        return Command::None;
    }
    match key.code {
        KeyCode::Enter => model.filter.active = false,
        KeyCode::Up => model.selected = model.selected.saturating_sub(1),
        KeyCode::Down => {
            model.selected = (model.selected + 1).min(model.row_count().saturating_sub(1));
        }
        KeyCode::Backspace => {
            model.filter.input.pop();
            model.selected = 0;
        }
        KeyCode::Char(c) if (key.modifiers - KeyModifiers::SHIFT).is_empty() => {
            model.filter.input.push(c);
            model.selected = 0;
        }
        _ => {}
    }
    Command::None
}

/// Cursor movement shared by the list views. Returns whether the key moved it.
fn navigate(model: &mut Model, keys: &KeyResolver, key: &KeyEvent) -> bool {
    let last = model.row_count().saturating_sub(1);
    let selected = if keys.matches(key, NavAction::Up) {
        model.selected.saturating_sub(1)
    } else if keys.matches(key, NavAction::Down) {
        (model.selected + 1).min(last)
    } else if keys.matches(key, NavAction::PageUp) {
        model.selected.saturating_sub(PAGE)
    } else if keys.matches(key, NavAction::PageDown) {
        (model.selected + PAGE).min(last)
    } else if keys.matches(key, NavAction::Home) {
        0
    } else if keys.matches(key, NavAction::End) {
        last
    } else {
        return false;
    };
    model.selected = selected;
    true
}

/// Tab, BackTab and the digit keys.
fn product_key(model: &Model, keys: &KeyResolver, key: &KeyEvent) -> Option<Product> {
    model.project.as_ref()?;
    if keys.matches(key, GlobalAction::NextProduct) {
        return Some(model.current_product.next());
    }
    if keys.matches(key, GlobalAction::PrevProduct) {
        return Some(model.current_product.prev());
    }
    match key.code {
        KeyCode::Char(c) if key.modifiers.is_empty() => Product::from_digit(c),
        _ => None,
    }
}

fn on_default_key(model: &mut Model, keys: &KeyResolver, key: KeyEvent) -> Command {
    if keys.matches(&key, GlobalAction::Quit) {
        return Command::Quit { exit: None };
    }
    if keys.matches(&key, GlobalAction::Debug) {
        model.debug_return = model.mode;
        model.debug_scroll = 0;
        model.mode = Mode::Debug;
        return Command::None;
    }
    if let Some(product) = product_key(model, keys, &key) {
        if model.mode != Mode::ProjectSelect {
            return switch_product(model, product);
        }
    }

    match model.mode {
        Mode::ProjectSelect => on_project_select_key(model, keys, &key),
        Mode::Table => on_table_key(model, keys, &key),
        Mode::Detail => on_detail_key(model, keys, &key),
        Mode::Loading => {
            if keys.matches(&key, GlobalAction::Back) && model.has_cached_table() {
                return back_to_table(model);
            }
            Command::None
        }
        Mode::Error | Mode::Empty => on_error_key(model, keys, &key),
        Mode::Wizard | Mode::DeleteConfirm | Mode::Debug => Command::None,
    }
}

fn on_project_select_key(model: &mut Model, keys: &KeyResolver, key: &KeyEvent) -> Command {
    if navigate(model, keys, key) {
        return Command::None;
    }
    if keys.matches(key, ResourceAction::Reload) {
        return open_projects(model);
    }
    if !keys.matches(key, NavAction::Select) {
        return Command::None;
    }
    let Some(project) = model.projects.get(model.selected).cloned() else {
        return Command::None;
    };
    info!(project = %project.id, "Project selected");
    model.project = Some(project.id.clone());
    model.current_product = Product::Instances;
    clear_data(model);
    let load = load_current(model);
    Command::batch([Command::SaveDefaultProject(project.id), load])
}

fn on_table_key(model: &mut Model, keys: &KeyResolver, key: &KeyEvent) -> Command {
    if navigate(model, keys, key) {
        return Command::None;
    }
    if keys.matches(key, NavAction::Select) {
        return open_detail(model);
    }
    if keys.matches(key, FilterAction::Toggle) {
        model.filter.active = true;
        return Command::None;
    }
    if keys.matches(key, GlobalAction::Back) {
        if !model.filter.input.is_empty() {
            model.filter = Filter::default();
            model.selected = 0;
        }
        return Command::None;
    }
    if keys.matches(key, GlobalAction::Projects) {
        return open_projects(model);
    }
    resource_action(model, keys, key)
}

fn on_detail_key(model: &mut Model, keys: &KeyResolver, key: &KeyEvent) -> Command {
    if keys.matches(key, GlobalAction::Back) {
        return back_to_table(model);
    }
    if keys.matches(key, ResourceAction::Reload) {
        return open_detail(model);
    }
    resource_action(model, keys, key)
}

fn on_error_key(model: &mut Model, keys: &KeyResolver, key: &KeyEvent) -> Command {
    if keys.matches(key, ResourceAction::Reload) {
        return if model.project.is_some() {
            load_current(model)
        } else {
            open_projects(model)
        };
    }
    if keys.matches(key, GlobalAction::Back) && model.has_cached_table() {
        return back_to_table(model);
    }
    if keys.matches(key, GlobalAction::Projects) {
        return open_projects(model);
    }
    if model.mode == Mode::Empty
        && model.current_product == Product::Instances
        && keys.matches(key, ResourceAction::Create)
    {
        return wizard::start(model);
    }
    Command::None
}

/// Actions on the highlighted row, or on the resource shown in detail.
fn resource_action(model: &mut Model, keys: &KeyResolver, key: &KeyEvent) -> Command {
    if keys.matches(key, ResourceAction::Reload) {
        return load_current(model);
    }
    if keys.matches(key, ResourceAction::Create) {
        if model.current_product == Product::Instances {
            return wizard::start(model);
        }
        return Command::None;
    }
    if keys.matches(key, ResourceAction::Delete) {
        return confirm_delete(model);
    }
    if keys.matches(key, ResourceAction::Copy) {
        return match model.selected_resource() {
            Some(resource) => Command::CopyToClipboard {
                text: resource.id.clone(),
                label: resource.name.clone(),
            },
            None => Command::None,
        };
    }
    let on_exit = keys.matches(key, ResourceAction::SshOnExit);
    if on_exit || keys.matches(key, ResourceAction::Ssh) {
        return match ssh_target(model) {
            Ok(target) if on_exit => Command::Quit {
                exit: Some(ExitAction::Ssh(target)),
            },
            Ok(target) => Command::Ssh(target),
            Err(err) => notify(model, err, NotificationKind::Error),
        };
    }
    Command::None
}

fn open_detail(model: &mut Model) -> Command {
    let (Some(resource), Some(stamp)) = (model.selected_resource().cloned(), model.stamp()) else {
        return Command::None;
    };
    let path = model
        .current_product
        .detail_path(&stamp.project, &resource);
    model.mode = Mode::Loading;
    model.loading_label = format!("Loading {}", resource.name);
    model.pending_detail = Some(resource.id.clone());
    Command::FetchDetail {
        stamp,
        id: resource.id,
        path,
    }
}

fn confirm_delete(model: &mut Model) -> Command {
    let (Some(resource), Some(project)) =
        (model.selected_resource().cloned(), model.project.clone())
    else {
        return Command::None;
    };
    let product = model.current_product;
    let Some(path) = product.delete_path(&project, &resource) else {
        return notify(
            model,
            format!("{} cannot be deleted from here", resource.name),
            NotificationKind::Error,
        );
    };
    model.delete_target = Some(DeleteTarget {
        product,
        resource,
        path,
        return_mode: model.mode,
    });
    model.mode = Mode::DeleteConfirm;
    Command::None
}

/// Where `ssh` should connect for the selected instance.
pub fn ssh_target(model: &Model) -> Result<SshTarget, String> {
    if model.current_product != Product::Instances {
        return Err("SSH is only available for instances".to_string());
    }
    let resource = model
        .selected_resource()
        .ok_or_else(|| "No instance selected".to_string())?;
    let host = resource
        .enrichment
        .floating_ip
        .clone()
        .or_else(|| resource.public_ipv4())
        .ok_or_else(|| format!("{} has no public IPv4 address", resource.name))?;
    let user = resource
        .raw
        .pointer("/image/user")
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())
        .map_or_else(|| model.settings.ssh_user.clone(), str::to_string);
    Ok(SshTarget { user, host })
}
