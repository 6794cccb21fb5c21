//! Executes leaf [`Command`]s against the outside world.
//!
//! Every effect resolves to at most one [`Msg`]. Failures never escape as
//! errors; they travel inside the message so `update` decides what they mean.

use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::api::{self, Api, ApiError};
use crate::browser::command::{Command, WizardCommand};
use crate::browser::message::{Msg, WizardMsg};
use crate::browser::model::{Project, Stamp};
use crate::browser::resource::{EnrichmentLookups, ListShape, Resource};
use crate::browser::saga;
use crate::browser::wizard::{
    Flavor, FloatingIp, Image, PrivateNetwork, SshKey, StepOptions, WizardStamp, WizardStep,
};
use crate::config::ConfigStore;

/// Collaborators the commands run against.
#[derive(Clone)]
pub struct Env {
    pub api: Arc<dyn Api>,
    pub store: Arc<dyn ConfigStore>,
}

/// Run one leaf command. `None`, `Batch`, `Quit` and `Ssh` belong to the
/// application loop and produce nothing here.
pub async fn execute(env: &Env, command: Command) -> Option<Msg> {
    let api = env.api.as_ref();
    match command {
        Command::None | Command::Batch(_) | Command::Quit { .. } | Command::Ssh(_) => {
            warn!(?command, "Command is not executable by the runtime");
            None
        }

        Command::FetchProjects => Some(Msg::ProjectsLoaded(fetch_projects(api).await)),
        Command::SaveDefaultProject(project) => {
            let result = env
                .store
                .set_default_project(&project)
                .map_err(|e| e.to_string());
            Some(Msg::DefaultProjectSaved(result))
        }

        Command::FetchResources { stamp, background } => {
            let result = fetch_resources(api, &stamp).await;
            Some(Msg::ResourcesLoaded {
                stamp,
                background,
                result,
            })
        }
        Command::EnrichInstances { stamp, regions } => {
            let lookups = enrich_instances(api, &stamp.project, &regions).await;
            Some(Msg::InstancesEnriched { stamp, lookups })
        }
        Command::FetchDetail { stamp, id, path } => {
            let result = api::get::<Value>(api, &path).await.and_then(|value| {
                Resource::from_value(stamp.product, value).ok_or_else(|| ApiError::Decode {
                    path: path.clone(),
                    detail: "object has no id".to_string(),
                })
            });
            Some(Msg::DetailLoaded { stamp, id, result })
        }
        Command::DeleteResource { stamp, name, path } => {
            let result = api::delete::<Value>(api, &path).await.map(|_| ());
            Some(Msg::ResourceDeleted {
                stamp,
                name,
                result,
            })
        }

        Command::ScheduleRefresh {
            stamp,
            generation,
            delay,
        } => {
            tokio::time::sleep(delay).await;
            Some(Msg::RefreshTick { stamp, generation })
        }
        Command::ExpireNotification { id, delay } => {
            tokio::time::sleep(delay).await;
            Some(Msg::ClearNotification { id })
        }

        Command::CopyToClipboard { text, label } => {
            let result = tokio::task::spawn_blocking(move || copy_to_clipboard(&text))
                .await
                .map_err(|e| e.to_string())
                .and_then(|r| r)
                .map(|()| label);
            Some(Msg::ClipboardCopied(result))
        }

        Command::Wizard(command) => execute_wizard(api, command).await.map(Msg::from),
    }
}

fn copy_to_clipboard(text: &str) -> Result<(), String> {
    let mut clipboard = arboard::Clipboard::new().map_err(|e| e.to_string())?;
    clipboard.set_text(text).map_err(|e| e.to_string())
}

// === Projects and resources ===

async fn fetch_projects(api: &dyn Api) -> Result<Vec<Project>, ApiError> {
    let ids: Vec<String> = api::get(api, "/v1/cloud/project").await?;
    try_join_all(ids.into_iter().map(|id| async move {
        let detail: Value = api::get(api, &format!("/v1/cloud/project/{id}")).await?;
        let description = detail
            .get("description")
            .and_then(Value::as_str)
            .filter(|d| !d.is_empty())
            .unwrap_or(&id)
            .to_string();
        Ok::<_, ApiError>(Project { id, description })
    }))
    .await
}

async fn fetch_resources(api: &dyn Api, stamp: &Stamp) -> Result<Vec<Resource>, ApiError> {
    let product = stamp.product;
    let path = product.list_path(&stamp.project);
    let values: Vec<Value> = match product.list_shape() {
        ListShape::Objects => api::get(api, &path).await?,
        ListShape::Ids => {
            let ids: Vec<String> = api::get(api, &path).await?;
            debug!(product = ?product, count = ids.len(), "Fetching items one by one");
            try_join_all(ids.iter().map(|id| {
                let path = product.item_path(&stamp.project, id);
                async move { api::get::<Value>(api, &path).await }
            }))
            .await?
        }
    };
    Ok(values
        .into_iter()
        .filter_map(|v| Resource::from_value(product, v))
        .collect())
}

/// Image names and floating IPs for every region, best effort.
async fn enrich_instances(api: &dyn Api, project: &str, regions: &[String]) -> EnrichmentLookups {
    let base = format!("/v1/cloud/project/{project}");
    let per_region = join_all(regions.iter().map(|region| region_lookups(api, &base, region))).await;
    per_region
        .into_iter()
        .fold(EnrichmentLookups::default(), |mut all, lookups| {
            all.merge(lookups);
            all
        })
}

async fn region_lookups(api: &dyn Api, base: &str, region: &str) -> EnrichmentLookups {
    let images_path = format!("{base}/image?region={region}");
    let ips_path = format!("{base}/region/{region}/floatingip");
    let (images, ips) = tokio::join!(
        api::get::<Vec<Image>>(api, &images_path),
        api::get::<Vec<FloatingIp>>(api, &ips_path),
    );

    let mut lookups = EnrichmentLookups::default();
    match images {
        Ok(images) => lookups
            .image_names
            .extend(images.into_iter().map(|i| (i.id, i.name))),
        Err(err) => warn!(region, %err, "Image lookup failed"),
    }
    match ips {
        Ok(ips) => {
            for ip in ips.into_iter().filter(FloatingIp::is_attached) {
                let Some(entity) = ip.associated_entity.as_ref() else {
                    continue;
                };
                for key in ["id", "ip"] {
                    if let Some(k) = entity.get(key).and_then(Value::as_str) {
                        lookups.floating_ips.insert(k.to_string(), ip.ip.clone());
                    }
                }
            }
        }
        Err(err) => warn!(region, %err, "Floating IP lookup failed"),
    }
    lookups
}

// === Wizard ===

async fn execute_wizard(api: &dyn Api, command: WizardCommand) -> Option<WizardMsg> {
    match command {
        WizardCommand::LoadStep {
            stamp,
            project,
            region,
            os_type,
        } => {
            if !stamp.step.loads_options() {
                return None;
            }
            let result = load_step(api, stamp, &project, &region, os_type.as_deref()).await;
            Some(WizardMsg::StepLoaded { stamp, result })
        }

        WizardCommand::CreateSshKey {
            run,
            project,
            region,
            name,
            public_key,
        } => {
            let body = json!({ "name": name, "publicKey": public_key, "region": region });
            let result = api::post(api, &format!("/v1/cloud/project/{project}/sshkey"), body).await;
            Some(WizardMsg::SshKeyCreated { run, result })
        }

        WizardCommand::CreateNetwork {
            run,
            project,
            region,
            name,
            vlan_id,
        } => {
            let mut body = json!({ "name": name, "regions": [region] });
            if let Some(vlan) = vlan_id {
                body["vlanId"] = json!(vlan);
            }
            let path = format!("/v1/cloud/project/{project}/network/private");
            let result = api::post(api, &path, body).await;
            Some(WizardMsg::NetworkCreated { run, result })
        }

        WizardCommand::Provision {
            run,
            step,
            request,
            context,
            poll,
        } => {
            let result = saga::run_step(api, &request, step, &context, poll).await;
            Some(WizardMsg::ProvisionStepDone { run, step, result })
        }

        WizardCommand::Cleanup {
            run,
            project,
            entries,
        } => {
            let outcomes = saga::cleanup(api, &project, entries).await;
            Some(WizardMsg::CleanupFinished { run, outcomes })
        }
    }
}

async fn load_step(
    api: &dyn Api,
    stamp: WizardStamp,
    project: &str,
    region: &str,
    os_type: Option<&str>,
) -> Result<StepOptions, ApiError> {
    let base = format!("/v1/cloud/project/{project}");
    let options = match stamp.step {
        WizardStep::Region => {
            let mut regions: Vec<String> = api::get(api, &format!("{base}/region")).await?;
            regions.sort();
            StepOptions::Regions(regions)
        }
        WizardStep::Flavor => {
            let flavors: Vec<Flavor> = api::get(api, &format!("{base}/flavor?region={region}")).await?;
            let mut flavors: Vec<Flavor> = flavors.into_iter().filter(|f| f.available).collect();
            flavors.sort_by(|a, b| a.name.cmp(&b.name));
            StepOptions::Flavors(flavors)
        }
        WizardStep::Image => {
            let mut path = format!("{base}/image?region={region}");
            if let Some(os) = os_type.filter(|os| !os.is_empty()) {
                path.push_str(&format!("&osType={os}"));
            }
            let mut images: Vec<Image> = api::get(api, &path).await?;
            images.sort_by(|a, b| a.name.cmp(&b.name));
            StepOptions::Images(images)
        }
        WizardStep::SshKey => {
            let mut keys: Vec<SshKey> = api::get(api, &format!("{base}/sshkey?region={region}")).await?;
            keys.sort_by(|a, b| a.name.cmp(&b.name));
            StepOptions::SshKeys(keys)
        }
        WizardStep::Network => {
            let public_path = format!("{base}/network/public");
            let private_path = format!("{base}/network/private");
            let (public, private) = tokio::join!(
                api::get::<Vec<Value>>(api, &public_path),
                api::get::<Vec<PrivateNetwork>>(api, &private_path),
            );
            let public_id = public?
                .iter()
                .find_map(|n| n.get("id").and_then(Value::as_str).map(str::to_string));
            let mut private: Vec<PrivateNetwork> =
                private?.into_iter().filter(|n| n.in_region(region)).collect();
            private.sort_by(|a, b| a.name.cmp(&b.name));
            StepOptions::Networks { public_id, private }
        }
        WizardStep::FloatingIp => {
            let ips: Vec<FloatingIp> =
                api::get(api, &format!("{base}/region/{region}/floatingip")).await?;
            StepOptions::FloatingIps(ips.into_iter().filter(|ip| !ip.is_attached()).collect())
        }
        WizardStep::Name | WizardStep::Confirm => StepOptions::Regions(Vec::new()),
    };
    debug!(step = ?stamp.step, region, "Wizard step loaded");
    Ok(options)
}
