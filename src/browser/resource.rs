//! Resource categories and the rows shown for them.

use std::collections::HashMap;

use serde_json::Value;

/// How a product's list endpoint answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListShape {
    /// An array of full objects.
    Objects,
    /// An array of ids, each of which must be fetched on its own.
    Ids,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Product {
    Instances,
    Kubernetes,
    Networks,
    Storage,
    Databases,
    SshKeys,
}

impl Product {
    pub const ALL: [Self; 6] = [
        Self::Instances,
        Self::Kubernetes,
        Self::Networks,
        Self::Storage,
        Self::Databases,
        Self::SshKeys,
    ];

    pub const fn title(self) -> &'static str {
        match self {
            Self::Instances => "Instances",
            Self::Kubernetes => "Kubernetes",
            Self::Networks => "Networks",
            Self::Storage => "Storage",
            Self::Databases => "Databases",
            Self::SshKeys => "SSH Keys",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// `1`..`6` select a product directly.
    pub fn from_digit(c: char) -> Option<Self> {
        let n = c.to_digit(10)? as usize;
        n.checked_sub(1).and_then(|i| Self::ALL.get(i)).copied()
    }

    const fn segment(self) -> &'static str {
        match self {
            Self::Instances => "instance",
            Self::Kubernetes => "kube",
            Self::Networks => "network/private",
            Self::Storage => "storage",
            Self::Databases => "database/service",
            Self::SshKeys => "sshkey",
        }
    }

    pub const fn list_shape(self) -> ListShape {
        match self {
            Self::Kubernetes | Self::Databases => ListShape::Ids,
            _ => ListShape::Objects,
        }
    }

    pub fn list_path(self, project: &str) -> String {
        format!("/v1/cloud/project/{project}/{}", self.segment())
    }

    pub fn item_path(self, project: &str, id: &str) -> String {
        format!("/v1/cloud/project/{project}/{}/{id}", self.segment())
    }

    pub fn detail_path(self, project: &str, resource: &Resource) -> String {
        self.item_path(project, &resource.id)
    }

    /// Managed databases are deleted through their engine's endpoint.
    pub fn delete_path(self, project: &str, resource: &Resource) -> Option<String> {
        match self {
            Self::Databases => {
                let engine = resource.raw.get("engine").and_then(Value::as_str)?;
                Some(format!(
                    "/v1/cloud/project/{project}/database/{engine}/{}",
                    resource.id
                ))
            }
            _ => Some(self.item_path(project, &resource.id)),
        }
    }

    const fn name_key(self) -> &'static str {
        match self {
            Self::Databases => "description",
            _ => "name",
        }
    }

    pub const fn columns(self) -> &'static [Column] {
        match self {
            Self::Instances => INSTANCE_COLUMNS,
            Self::Kubernetes => KUBE_COLUMNS,
            Self::Networks => NETWORK_COLUMNS,
            Self::Storage => STORAGE_COLUMNS,
            Self::Databases => DATABASE_COLUMNS,
            Self::SshKeys => SSH_KEY_COLUMNS,
        }
    }
}

/// Lookups added to an instance row after the list itself has rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub image_name: Option<String>,
    pub floating_ip: Option<String>,
}

/// Region-wide lookups fetched after the instance list has rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentLookups {
    /// Image id to image name.
    pub image_names: HashMap<String, String>,
    /// Floating IP address by the id, and by the private IP, of the entity it
    /// is attached to.
    pub floating_ips: HashMap<String, String>,
}

impl EnrichmentLookups {
    pub fn is_empty(&self) -> bool {
        self.image_names.is_empty() && self.floating_ips.is_empty()
    }

    pub fn merge(&mut self, other: Self) {
        self.image_names.extend(other.image_names);
        self.floating_ips.extend(other.floating_ips);
    }

    pub fn enrichment_for(&self, resource: &Resource) -> Enrichment {
        let image_name = resource
            .raw
            .get("imageId")
            .and_then(Value::as_str)
            .and_then(|id| self.image_names.get(id))
            .cloned();
        let floating_ip = self
            .floating_ips
            .get(&resource.id)
            .or_else(|| {
                resource
                    .private_ip()
                    .and_then(|ip| self.floating_ips.get(&ip))
            })
            .cloned();
        Enrichment {
            image_name,
            floating_ip,
        }
    }
}

/// One row of a product table.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub raw: Value,
    pub enrichment: Enrichment,
}

impl Resource {
    /// Build a row from an API object. Objects without an `id` are skipped.
    pub fn from_value(product: Product, raw: Value) -> Option<Self> {
        let id = scalar(raw.get("id")?)?;
        let name = raw
            .get(product.name_key())
            .and_then(scalar)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| id.clone());
        Some(Self {
            id,
            name,
            raw,
            enrichment: Enrichment::default(),
        })
    }

    /// A top-level field rendered as text, `-` when absent.
    pub fn field(&self, key: &str) -> String {
        self.raw
            .get(key)
            .and_then(scalar)
            .unwrap_or_else(|| "-".to_string())
    }

    pub fn region(&self) -> Option<&str> {
        self.raw.get("region").and_then(Value::as_str)
    }

    pub fn public_ipv4(&self) -> Option<String> {
        self.ip_address("public", 4)
    }

    pub fn private_ip(&self) -> Option<String> {
        self.ip_address("private", 4)
    }

    fn ip_address(&self, kind: &str, version: u64) -> Option<String> {
        self.raw
            .get("ipAddresses")?
            .as_array()?
            .iter()
            .find(|ip| {
                ip.get("type").and_then(Value::as_str) == Some(kind)
                    && ip.get("version").and_then(Value::as_u64) == Some(version)
            })
            .and_then(|ip| ip.get("ip"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Searchable text for the filter.
    pub fn haystack(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.id.as_str()];
        fields.extend(self.region());
        fields.extend(self.raw.get("status").and_then(Value::as_str));
        fields
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Stable display order, independent of the order results arrived in.
pub fn sort_rows(rows: &mut [Resource]) {
    rows.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
}

pub struct Column {
    pub title: &'static str,
    pub width: u16,
    pub value: fn(&Resource) -> String,
}

const fn column(title: &'static str, width: u16, value: fn(&Resource) -> String) -> Column {
    Column {
        title,
        width,
        value,
    }
}

fn name(r: &Resource) -> String {
    r.name.clone()
}

fn id(r: &Resource) -> String {
    r.id.clone()
}

fn region(r: &Resource) -> String {
    r.field("region")
}

fn status(r: &Resource) -> String {
    r.field("status")
}

const INSTANCE_COLUMNS: &[Column] = &[
    column("Name", 28, name),
    column("Status", 10, status),
    column("Region", 8, region),
    column("Flavor", 12, |r| {
        r.raw
            .pointer("/flavor/name")
            .and_then(Value::as_str)
            .map_or_else(|| r.field("flavorId"), str::to_string)
    }),
    column("Image", 22, |r| {
        r.enrichment
            .image_name
            .clone()
            .unwrap_or_else(|| "…".to_string())
    }),
    column("Public IP", 16, |r| r.public_ipv4().unwrap_or_default()),
    column("Floating IP", 16, |r| {
        r.enrichment.floating_ip.clone().unwrap_or_default()
    }),
];

const KUBE_COLUMNS: &[Column] = &[
    column("Name", 28, name),
    column("Status", 12, status),
    column("Region", 8, region),
    column("Version", 8, |r| r.field("version")),
    column("Id", 36, id),
];

const NETWORK_COLUMNS: &[Column] = &[
    column("Name", 28, name),
    column("VLAN", 6, |r| r.field("vlanId")),
    column("Status", 10, status),
    column("Regions", 30, |r| {
        r.raw
            .get("regions")
            .and_then(Value::as_array)
            .map(|regions| {
                regions
                    .iter()
                    .filter_map(|reg| reg.get("region").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default()
    }),
];

const STORAGE_COLUMNS: &[Column] = &[
    column("Name", 28, name),
    column("Region", 8, region),
    column("Objects", 10, |r| r.field("storedObjects")),
    column("Bytes", 14, |r| r.field("storedBytes")),
];

const DATABASE_COLUMNS: &[Column] = &[
    column("Description", 28, name),
    column("Engine", 12, |r| r.field("engine")),
    column("Version", 8, |r| r.field("version")),
    column("Plan", 10, |r| r.field("plan")),
    column("Status", 10, status),
];

const SSH_KEY_COLUMNS: &[Column] = &[
    column("Name", 28, name),
    column("Id", 36, id),
    column("Regions", 30, |r| {
        r.raw
            .get("regions")
            .and_then(Value::as_array)
            .map(|regions| {
                regions
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default()
    }),
];

#[cfg(test)]
pub(crate) fn row(product: Product, id: &str, name: &str) -> Resource {
    Resource::from_value(product, serde_json::json!({ "id": id, "name": name }))
        .unwrap()
}
