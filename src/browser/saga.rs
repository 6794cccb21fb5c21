//! Resource creation with compensating cleanup.
//!
//! Every resource the wizard creates is recorded on a [`Ledger`] before the
//! next creation is attempted. Each [`ResourceKind`] knows the delete call
//! that undoes it, so rolling back is a walk over the ledger in reverse.

use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{self, Api, ApiError};
use crate::browser::resource::{Product, Resource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    SshKey,
    Network,
    Subnet { network: String },
    Gateway,
    FloatingIp,
    Instance,
}

impl ResourceKind {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SshKey => "SSH key",
            Self::Network => "private network",
            Self::Subnet { .. } => "subnet",
            Self::Gateway => "gateway",
            Self::FloatingIp => "floating IP",
            Self::Instance => "instance",
        }
    }
}

/// A resource created by the current wizard run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub kind: ResourceKind,
    pub id: String,
    pub name: String,
    pub region: String,
}

impl LedgerEntry {
    pub fn new(kind: ResourceKind, id: impl Into<String>, name: impl Into<String>, region: &str) -> Self {
        Self {
            kind,
            id: id.into(),
            name: name.into(),
            region: region.to_string(),
        }
    }

    /// The call that deletes this resource.
    pub fn delete_path(&self, project: &str) -> String {
        let base = format!("/v1/cloud/project/{project}");
        let id = &self.id;
        let region = &self.region;
        match &self.kind {
            ResourceKind::SshKey => format!("{base}/sshkey/{id}"),
            ResourceKind::Network => format!("{base}/network/private/{id}"),
            ResourceKind::Subnet { network } => {
                format!("{base}/network/private/{network}/subnet/{id}")
            }
            ResourceKind::Gateway => format!("{base}/region/{region}/gateway/{id}"),
            ResourceKind::FloatingIp => format!("{base}/region/{region}/floatingip/{id}"),
            ResourceKind::Instance => format!("{base}/instance/{id}"),
        }
    }
}

impl fmt::Display for LedgerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() || self.name == self.id {
            write!(f, "{} {}", self.kind.label(), self.id)
        } else {
            write!(f, "{} {} ({})", self.kind.label(), self.name, self.id)
        }
    }
}

/// Resources created so far, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn record(&mut self, entry: LedgerEntry) {
        debug!(entry = %entry, "Ledger: recorded");
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn find(&self, kind: &ResourceKind) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| &e.kind == kind)
    }

    /// Empty the ledger, handing back what it held.
    pub fn take(&mut self) -> Vec<LedgerEntry> {
        std::mem::take(&mut self.entries)
    }
}

/// Address plan for a subnet: the gateway keeps the first host address and
/// DHCP hands out the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetSpec {
    pub cidr: String,
    pub start: Ipv4Addr,
    pub end: Ipv4Addr,
}

impl SubnetSpec {
    pub fn parse(cidr: &str) -> Result<Self, String> {
        let (addr, prefix) = cidr
            .trim()
            .split_once('/')
            .ok_or_else(|| format!("`{cidr}` is not in a.b.c.d/n form"))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| format!("`{addr}` is not an IPv4 address"))?;
        let prefix: u32 = prefix
            .parse()
            .map_err(|_| format!("`{prefix}` is not a prefix length"))?;
        if !(8..=29).contains(&prefix) {
            return Err("prefix length must be between 8 and 29".to_string());
        }

        let mask = u32::MAX << (32 - prefix);
        let network = u32::from(addr) & mask;
        if network != u32::from(addr) {
            return Err(format!("{addr} is not the network address of /{prefix}"));
        }
        let broadcast = network | !mask;

        Ok(Self {
            cidr: format!("{addr}/{prefix}"),
            start: Ipv4Addr::from(network + 2),
            end: Ipv4Addr::from(broadcast - 1),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FloatingIpChoice {
    #[default]
    None,
    New,
    Existing {
        id: String,
        ip: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateNetworkPlan {
    pub id: String,
    pub name: String,
    /// Present when the network was created in this run and still needs its subnet.
    pub new_subnet: Option<SubnetSpec>,
}

/// Everything the creation sequence needs, captured when the user confirms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub project: String,
    pub region: String,
    pub name: String,
    pub flavor_id: String,
    pub image_id: String,
    pub ssh_key_id: Option<String>,
    pub public_network_id: Option<String>,
    pub private_network: Option<PrivateNetworkPlan>,
    pub floating_ip: FloatingIpChoice,
}

impl ProvisionRequest {
    fn network_is_new(&self) -> bool {
        self.private_network
            .as_ref()
            .is_some_and(|n| n.new_subnet.is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
    CreateSubnet,
    CreateInstance,
    WaitForPrivateIp,
    AttachFloatingIp,
}

impl ProvisionStep {
    pub const fn label(self) -> &'static str {
        match self {
            Self::CreateSubnet => "Creating subnet",
            Self::CreateInstance => "Creating instance",
            Self::WaitForPrivateIp => "Waiting for private IP",
            Self::AttachFloatingIp => "Attaching floating IP",
        }
    }
}

/// Ordered steps for a request.
pub fn plan(request: &ProvisionRequest) -> Vec<ProvisionStep> {
    let mut steps = Vec::new();
    if request.network_is_new() {
        steps.push(ProvisionStep::CreateSubnet);
    }
    steps.push(ProvisionStep::CreateInstance);
    if request.floating_ip != FloatingIpChoice::None {
        steps.push(ProvisionStep::WaitForPrivateIp);
        steps.push(ProvisionStep::AttachFloatingIp);
    }
    steps
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("instance {0} went into ERROR state")]
    InstanceFailed(String),

    #[error("instance {id} had no private IP after {attempts} checks")]
    Timeout { id: String, attempts: u32 },

    #[error("{0} requires an instance, but none was created")]
    MissingInstance(&'static str),

    /// The step failed after creating some resources.
    #[error("{source}")]
    Partial {
        created: Vec<LedgerEntry>,
        source: Box<ProvisionError>,
    },
}

impl ProvisionError {
    /// Split off whatever the failed step created.
    pub fn into_parts(self) -> (Vec<LedgerEntry>, Self) {
        match self {
            Self::Partial { created, source } => (created, *source),
            other => (Vec::new(), other),
        }
    }
}

/// Result of one step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutput {
    /// Resources the step created, to be put on the ledger.
    pub created: Vec<LedgerEntry>,
    pub private_ip: Option<String>,
}

/// Progress carried between steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepContext {
    pub instance_id: Option<String>,
    pub private_ip: Option<String>,
}

pub async fn run_step(
    api: &dyn Api,
    request: &ProvisionRequest,
    step: ProvisionStep,
    context: &StepContext,
    poll: PollPolicy,
) -> Result<StepOutput, ProvisionError> {
    let base = format!("/v1/cloud/project/{}", request.project);
    let region = request.region.as_str();
    info!(step = ?step, region, "Provisioning step");

    match step {
        ProvisionStep::CreateSubnet => {
            let Some(network) = &request.private_network else {
                return Ok(StepOutput::default());
            };
            let Some(subnet) = &network.new_subnet else {
                return Ok(StepOutput::default());
            };
            let body = json!({
                "dhcp": true,
                "noGateway": false,
                "network": subnet.cidr,
                "start": subnet.start.to_string(),
                "end": subnet.end.to_string(),
                "region": region,
            });
            let path = format!("{base}/network/private/{}/subnet", network.id);
            let created: Value = api::post(api, &path, body).await?;
            let id = required_id(&created, &path)?;
            Ok(StepOutput {
                created: vec![LedgerEntry::new(
                    ResourceKind::Subnet {
                        network: network.id.clone(),
                    },
                    id,
                    subnet.cidr.clone(),
                    region,
                )],
                private_ip: None,
            })
        }

        ProvisionStep::CreateInstance => {
            let mut networks = Vec::new();
            if let Some(public) = &request.public_network_id {
                networks.push(json!({ "networkId": public }));
            }
            if let Some(private) = &request.private_network {
                networks.push(json!({ "networkId": private.id }));
            }

            let mut body = json!({
                "name": request.name,
                "flavorId": request.flavor_id,
                "imageId": request.image_id,
                "region": region,
            });
            if let Some(key) = &request.ssh_key_id {
                body["sshKeyId"] = json!(key);
            }
            if !networks.is_empty() {
                body["networks"] = Value::Array(networks);
            }

            let path = format!("{base}/instance");
            let created: Value = api::post(api, &path, body).await?;
            let id = required_id(&created, &path)?;
            Ok(StepOutput {
                created: vec![LedgerEntry::new(
                    ResourceKind::Instance,
                    id,
                    request.name.clone(),
                    region,
                )],
                private_ip: None,
            })
        }

        ProvisionStep::WaitForPrivateIp => {
            let id = context
                .instance_id
                .as_deref()
                .ok_or(ProvisionError::MissingInstance("waiting for an IP"))?;
            let ip = wait_for_private_ip(api, &format!("{base}/instance/{id}"), id, poll).await?;
            Ok(StepOutput {
                created: Vec::new(),
                private_ip: Some(ip),
            })
        }

        ProvisionStep::AttachFloatingIp => {
            let id = context
                .instance_id
                .as_deref()
                .ok_or(ProvisionError::MissingInstance("attaching a floating IP"))?;
            attach_floating_ip(api, request, &base, id, context.private_ip.as_deref()).await
        }
    }
}

async fn wait_for_private_ip(
    api: &dyn Api,
    path: &str,
    id: &str,
    poll: PollPolicy,
) -> Result<String, ProvisionError> {
    for attempt in 0..poll.attempts {
        if attempt > 0 {
            tokio::time::sleep(poll.interval).await;
        }
        let raw: Value = api::get(api, path).await?;
        let status = raw.get("status").and_then(Value::as_str).unwrap_or_default();
        if status == "ERROR" {
            return Err(ProvisionError::InstanceFailed(id.to_string()));
        }
        let active = status == "ACTIVE";
        let ip = Resource::from_value(Product::Instances, raw).and_then(|r| r.private_ip());
        if let (Some(ip), true) = (ip, active) {
            debug!(instance = id, %ip, attempt, "Instance has a private IP");
            return Ok(ip);
        }
    }
    Err(ProvisionError::Timeout {
        id: id.to_string(),
        attempts: poll.attempts,
    })
}

async fn attach_floating_ip(
    api: &dyn Api,
    request: &ProvisionRequest,
    base: &str,
    instance_id: &str,
    private_ip: Option<&str>,
) -> Result<StepOutput, ProvisionError> {
    let region = request.region.as_str();
    match &request.floating_ip {
        FloatingIpChoice::None => Ok(StepOutput::default()),

        FloatingIpChoice::Existing { id, ip } => {
            let path = format!("{base}/region/{region}/floatingip/{id}/attach");
            let _: Value = api::post(api, &path, json!({ "instanceId": instance_id })).await?;
            info!(floating_ip = %ip, instance = instance_id, "Attached existing floating IP");
            Ok(StepOutput::default())
        }

        FloatingIpChoice::New => {
            let mut body = json!({});
            if let Some(ip) = private_ip {
                body["ip"] = json!(ip);
            }
            if request.network_is_new() {
                body["gateway"] = json!({ "model": "s", "name": format!("{}-gw", request.name) });
            }
            let path = format!("{base}/region/{region}/instance/{instance_id}/floatingIp");
            let created: Value = api::post(api, &path, body).await?;

            let mut entries = Vec::new();
            if let Some(gateway) = created.get("gatewayId").and_then(Value::as_str) {
                entries.push(LedgerEntry::new(ResourceKind::Gateway, gateway, "", region));
            }
            let id = match required_id(&created, &path) {
                Ok(id) => id,
                Err(err) if entries.is_empty() => return Err(err.into()),
                Err(err) => {
                    return Err(ProvisionError::Partial {
                        created: entries,
                        source: Box::new(err.into()),
                    });
                }
            };
            let ip = created.get("ip").and_then(Value::as_str).unwrap_or_default();
            entries.push(LedgerEntry::new(ResourceKind::FloatingIp, id, ip, region));
            Ok(StepOutput {
                created: entries,
                private_ip: None,
            })
        }
    }
}

fn required_id(value: &Value, path: &str) -> Result<String, ApiError> {
    value
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::Decode {
            path: path.to_string(),
            detail: "response has no id".to_string(),
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOutcome {
    pub entry: LedgerEntry,
    pub error: Option<String>,
}

impl CleanupOutcome {
    pub const fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Delete every entry, newest first, without stopping at failures.
pub async fn cleanup(api: &dyn Api, project: &str, entries: Vec<LedgerEntry>) -> Vec<CleanupOutcome> {
    let mut outcomes = Vec::with_capacity(entries.len());
    for entry in entries.into_iter().rev() {
        let path = entry.delete_path(project);
        let error = match api::delete::<Value>(api, &path).await {
            Ok(_) => {
                info!(entry = %entry, "Cleanup: deleted");
                None
            }
            Err(err) => {
                warn!(entry = %entry, error = %err, "Cleanup: delete failed");
                Some(err.to_string())
            }
        };
        outcomes.push(CleanupOutcome { entry, error });
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::api::mock::MockApi;

    const BASE: &str = "/v1/cloud/project/p1";
    const NO_WAIT: PollPolicy = PollPolicy {
        interval: Duration::ZERO,
        attempts: 3,
    };

    fn request(floating_ip: FloatingIpChoice, new_network: bool) -> ProvisionRequest {
        ProvisionRequest {
            project: "p1".into(),
            region: "GRA11".into(),
            name: "web".into(),
            flavor_id: "f1".into(),
            image_id: "img1".into(),
            ssh_key_id: Some("k1".into()),
            public_network_id: None,
            private_network: Some(PrivateNetworkPlan {
                id: "net1".into(),
                name: "backend".into(),
                new_subnet: new_network.then(|| SubnetSpec::parse("10.0.0.0/24").unwrap()),
            }),
            floating_ip,
        }
    }

    #[test]
    fn test_subnet_spec() {
        let spec = SubnetSpec::parse("10.0.0.0/24").unwrap();
        assert_eq!(spec.start, Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(spec.end, Ipv4Addr::new(10, 0, 0, 254));

        let spec = SubnetSpec::parse("192.168.4.0/22").unwrap();
        assert_eq!(spec.end, Ipv4Addr::new(192, 168, 7, 254));

        assert!(SubnetSpec::parse("10.0.0.1/24").is_err());
        assert!(SubnetSpec::parse("10.0.0.0").is_err());
        assert!(SubnetSpec::parse("10.0.0.0/31").is_err());
        assert!(SubnetSpec::parse("300.0.0.0/24").is_err());
    }

    #[test]
    fn test_plan() {
        use ProvisionStep::*;
        assert_eq!(plan(&request(FloatingIpChoice::None, false)), vec![CreateInstance]);
        assert_eq!(
            plan(&request(FloatingIpChoice::New, true)),
            vec![CreateSubnet, CreateInstance, WaitForPrivateIp, AttachFloatingIp]
        );
        let existing = FloatingIpChoice::Existing {
            id: "fip".into(),
            ip: "1.2.3.4".into(),
        };
        assert_eq!(
            plan(&request(existing, false)),
            vec![CreateInstance, WaitForPrivateIp, AttachFloatingIp]
        );
    }

    #[test]
    fn test_delete_paths() {
        let subnet = LedgerEntry::new(
            ResourceKind::Subnet {
                network: "net1".into(),
            },
            "sub1",
            "",
            "GRA11",
        );
        assert_eq!(
            subnet.delete_path("p1"),
            "/v1/cloud/project/p1/network/private/net1/subnet/sub1"
        );
        let fip = LedgerEntry::new(ResourceKind::FloatingIp, "f1", "1.2.3.4", "GRA11");
        assert_eq!(
            fip.delete_path("p1"),
            "/v1/cloud/project/p1/region/GRA11/floatingip/f1"
        );
    }

    #[tokio::test]
    async fn test_create_instance_body() {
        let api = MockApi::new().on(
            Method::Post,
            &format!("{BASE}/instance"),
            serde_json::json!({ "id": "i1" }),
        );
        let req = request(FloatingIpChoice::None, false);
        let out = run_step(&api, &req, ProvisionStep::CreateInstance, &StepContext::default(), NO_WAIT)
            .await
            .unwrap();

        assert_eq!(out.created, vec![LedgerEntry::new(ResourceKind::Instance, "i1", "web", "GRA11")]);
        let body = api.body_of(Method::Post, &format!("{BASE}/instance")).unwrap();
        assert_eq!(body["sshKeyId"], "k1");
        assert_eq!(body["networks"], serde_json::json!([{ "networkId": "net1" }]));
    }

    #[tokio::test]
    async fn test_wait_for_private_ip_polls_until_active() {
        let path = format!("{BASE}/instance/i1");
        let api = MockApi::new()
            .on(Method::Get, &path, serde_json::json!({ "id": "i1", "status": "BUILD" }))
            .on(
                Method::Get,
                &path,
                serde_json::json!({
                    "id": "i1",
                    "status": "ACTIVE",
                    "ipAddresses": [{ "ip": "10.0.0.7", "type": "private", "version": 4 }]
                }),
            );
        let ctx = StepContext {
            instance_id: Some("i1".into()),
            private_ip: None,
        };
        let out = run_step(&api, &request(FloatingIpChoice::New, false), ProvisionStep::WaitForPrivateIp, &ctx, NO_WAIT)
            .await
            .unwrap();
        assert_eq!(out.private_ip.as_deref(), Some("10.0.0.7"));
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_wait_for_private_ip_errors() {
        let path = format!("{BASE}/instance/i1");
        let ctx = StepContext {
            instance_id: Some("i1".into()),
            private_ip: None,
        };
        let req = request(FloatingIpChoice::New, false);

        let failed = MockApi::new().on(Method::Get, &path, serde_json::json!({ "id": "i1", "status": "ERROR" }));
        let err = run_step(&failed, &req, ProvisionStep::WaitForPrivateIp, &ctx, NO_WAIT)
            .await
            .unwrap_err();
        assert_eq!(err, ProvisionError::InstanceFailed("i1".into()));

        let slow = MockApi::new().on(Method::Get, &path, serde_json::json!({ "id": "i1", "status": "BUILD" }));
        let err = run_step(&slow, &req, ProvisionStep::WaitForPrivateIp, &ctx, NO_WAIT)
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Timeout { attempts: 3, .. }));
        assert_eq!(slow.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_new_floating_ip_records_gateway_then_ip() {
        let path = format!("{BASE}/region/GRA11/instance/i1/floatingIp");
        let api = MockApi::new().on(
            Method::Post,
            &path,
            serde_json::json!({ "id": "fip1", "ip": "51.0.0.1", "gatewayId": "gw1" }),
        );
        let ctx = StepContext {
            instance_id: Some("i1".into()),
            private_ip: Some("10.0.0.7".into()),
        };
        let out = run_step(&api, &request(FloatingIpChoice::New, true), ProvisionStep::AttachFloatingIp, &ctx, NO_WAIT)
            .await
            .unwrap();

        let kinds: Vec<&ResourceKind> = out.created.iter().map(|e| &e.kind).collect();
        assert_eq!(kinds, [&ResourceKind::Gateway, &ResourceKind::FloatingIp]);
        let body = api.body_of(Method::Post, &path).unwrap();
        assert_eq!(body["ip"], "10.0.0.7");
        assert_eq!(body["gateway"]["name"], "web-gw");
    }

    #[tokio::test]
    async fn test_gateway_is_kept_when_floating_ip_has_no_id() {
        let path = format!("{BASE}/region/GRA11/instance/i1/floatingIp");
        let api = MockApi::new().on(
            Method::Post,
            &path,
            serde_json::json!({ "ip": "51.0.0.1", "gatewayId": "gw1" }),
        );
        let ctx = StepContext {
            instance_id: Some("i1".into()),
            private_ip: Some("10.0.0.7".into()),
        };
        let err = run_step(&api, &request(FloatingIpChoice::New, true), ProvisionStep::AttachFloatingIp, &ctx, NO_WAIT)
            .await
            .unwrap_err();

        let (created, err) = err.into_parts();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].kind, ResourceKind::Gateway);
        assert_eq!(created[0].id, "gw1");
        assert!(matches!(err, ProvisionError::Api(ApiError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_attach_without_instance_fails() {
        let err = run_step(
            &MockApi::new(),
            &request(FloatingIpChoice::New, false),
            ProvisionStep::AttachFloatingIp,
            &StepContext::default(),
            NO_WAIT,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ProvisionError::MissingInstance(_)));
    }

    #[tokio::test]
    async fn test_cleanup_attempts_everything_in_reverse() {
        let entries = vec![
            LedgerEntry::new(ResourceKind::Network, "net1", "backend", "GRA11"),
            LedgerEntry::new(
                ResourceKind::Subnet {
                    network: "net1".into(),
                },
                "sub1",
                "10.0.0.0/24",
                "GRA11",
            ),
            LedgerEntry::new(ResourceKind::Instance, "i1", "web", "GRA11"),
        ];
        let api = MockApi::new()
            .on(Method::Delete, &format!("{BASE}/instance/i1"), Value::Null)
            .fail(Method::Delete, &format!("{BASE}/network/private/net1/subnet/sub1"), 409)
            .on(Method::Delete, &format!("{BASE}/network/private/net1"), Value::Null);

        let outcomes = cleanup(&api, "p1", entries).await;

        let order: Vec<&str> = outcomes.iter().map(|o| o.entry.id.as_str()).collect();
        assert_eq!(order, ["i1", "sub1", "net1"]);
        let ok: Vec<bool> = outcomes.iter().map(CleanupOutcome::succeeded).collect();
        assert_eq!(ok, [true, false, true]);
        assert_eq!(api.calls().len(), 3);
    }

    #[test]
    fn test_ledger() {
        let mut ledger = Ledger::default();
        assert!(ledger.is_empty());
        ledger.record(LedgerEntry::new(ResourceKind::SshKey, "k1", "laptop", "GRA11"));
        assert_eq!(ledger.len(), 1);
        assert!(ledger.find(&ResourceKind::SshKey).is_some());
        assert_eq!(ledger.entries()[0].to_string(), "SSH key laptop (k1)");
        assert_eq!(ledger.take().len(), 1);
        assert!(ledger.is_empty());
    }
}
