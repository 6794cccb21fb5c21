//! The create-instance wizard.
//!
//! `Region → Flavor → Image → SshKey → Network → [FloatingIp] → Name → Confirm`
//!
//! Each list step loads its options on entry, offers cursor movement and a
//! filter, and records the choice when it is left. The SSH key and network
//! steps can open an inline form that creates the resource on the spot; any
//! such resource goes on the run's [`Ledger`] so a later failure can roll it
//! back.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::browser::command::{Command, WizardCommand};
use crate::browser::message::WizardMsg;
use crate::browser::model::{Mode, Model, NotificationKind};
use crate::browser::resource::Product;
use crate::browser::saga::{
    self, CleanupOutcome, FloatingIpChoice, Ledger, LedgerEntry, PollPolicy, PrivateNetworkPlan,
    ProvisionError, ProvisionRequest, ProvisionStep, ResourceKind, StepContext, StepOutput,
    SubnetSpec,
};
use crate::browser::update;
use crate::config::{DialogAction, FilterAction, FormAction, GlobalAction, KeyResolver, NavAction};
use crate::search::Matcher;

const DEFAULT_CIDR: &str = "10.0.0.0/24";
const MAX_VLAN: u16 = 4000;
const PAGE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Region,
    Flavor,
    Image,
    SshKey,
    Network,
    FloatingIp,
    Name,
    Confirm,
}

impl WizardStep {
    pub const fn title(self) -> &'static str {
        match self {
            Self::Region => "Region",
            Self::Flavor => "Flavor",
            Self::Image => "Image",
            Self::SshKey => "SSH key",
            Self::Network => "Network",
            Self::FloatingIp => "Floating IP",
            Self::Name => "Name",
            Self::Confirm => "Confirm",
        }
    }

    pub(crate) const fn loads_options(self) -> bool {
        !matches!(self, Self::Name | Self::Confirm)
    }
}

/// Identity of a step load, checked when its result arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardStamp {
    pub run: u64,
    pub step: WizardStep,
}

// === Options offered by the steps ===

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flavor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub vcpus: u32,
    /// MiB.
    #[serde(default)]
    pub ram: u64,
    /// GiB.
    #[serde(default)]
    pub disk: u64,
    #[serde(default)]
    pub os_type: String,
    #[serde(default = "available_default")]
    pub available: bool,
}

const fn available_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub os_type: String,
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshKey {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub regions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRegion {
    pub region: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateNetwork {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub vlan_id: Option<u32>,
    #[serde(default)]
    pub regions: Vec<NetworkRegion>,
}

impl PrivateNetwork {
    pub fn in_region(&self, region: &str) -> bool {
        self.regions.iter().any(|r| r.region == region)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloatingIp {
    pub id: String,
    pub ip: String,
    #[serde(default)]
    pub associated_entity: Option<serde_json::Value>,
}

impl FloatingIp {
    pub fn is_attached(&self) -> bool {
        matches!(self.associated_entity, Some(ref v) if !v.is_null())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOptions {
    Regions(Vec<String>),
    Flavors(Vec<Flavor>),
    Images(Vec<Image>),
    SshKeys(Vec<SshKey>),
    Networks {
        public_id: Option<String>,
        private: Vec<PrivateNetwork>,
    },
    FloatingIps(Vec<FloatingIp>),
}

/// The chosen private network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkChoice {
    pub network: PrivateNetwork,
    pub new_subnet: Option<SubnetSpec>,
}

// === Inline forms ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SshKeyField {
    Name,
    PublicKey,
    Create,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkField {
    Name,
    Vlan,
    Cidr,
    Create,
    Cancel,
}

const SSH_KEY_FIELDS: [SshKeyField; 4] = [
    SshKeyField::Name,
    SshKeyField::PublicKey,
    SshKeyField::Create,
    SshKeyField::Cancel,
];

const NETWORK_FIELDS: [NetworkField; 5] = [
    NetworkField::Name,
    NetworkField::Vlan,
    NetworkField::Cidr,
    NetworkField::Create,
    NetworkField::Cancel,
];

fn cycle<T: Copy + PartialEq>(order: &[T], current: T, forward: bool) -> T {
    let i = order.iter().position(|f| *f == current).unwrap_or(0);
    let n = order.len();
    let next = if forward { (i + 1) % n } else { (i + n - 1) % n };
    order[next]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshKeyForm {
    pub name: String,
    pub public_key: String,
    pub focus: SshKeyField,
    pub submitting: bool,
}

impl Default for SshKeyForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            public_key: String::new(),
            focus: SshKeyField::Name,
            submitting: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkForm {
    pub name: String,
    pub vlan: String,
    pub cidr: String,
    pub focus: NetworkField,
    pub submitting: bool,
    /// Validated subnet plan, kept until the network exists.
    pub subnet: Option<SubnetSpec>,
}

impl Default for NetworkForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            vlan: String::new(),
            cidr: DEFAULT_CIDR.to_string(),
            focus: NetworkField::Name,
            submitting: false,
            subnet: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineForm {
    SshKey(SshKeyForm),
    Network(NetworkForm),
}

impl InlineForm {
    pub const fn submitting(&self) -> bool {
        match self {
            Self::SshKey(f) => f.submitting,
            Self::Network(f) => f.submitting,
        }
    }

    fn focused_text(&mut self) -> Option<&mut String> {
        match self {
            Self::SshKey(f) => match f.focus {
                SshKeyField::Name => Some(&mut f.name),
                SshKeyField::PublicKey => Some(&mut f.public_key),
                SshKeyField::Create | SshKeyField::Cancel => None,
            },
            Self::Network(f) => match f.focus {
                NetworkField::Name => Some(&mut f.name),
                NetworkField::Vlan => Some(&mut f.vlan),
                NetworkField::Cidr => Some(&mut f.cidr),
                NetworkField::Create | NetworkField::Cancel => None,
            },
        }
    }

    fn move_focus(&mut self, forward: bool) {
        match self {
            Self::SshKey(f) => f.focus = cycle(&SSH_KEY_FIELDS, f.focus, forward),
            Self::Network(f) => f.focus = cycle(&NETWORK_FIELDS, f.focus, forward),
        }
    }
}

// === Wizard state ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardPhase {
    Editing,
    Provisioning {
        plan: Vec<ProvisionStep>,
        index: usize,
        request: Box<ProvisionRequest>,
        context: StepContext,
    },
    CleanupPending {
        error: String,
    },
    CleaningUp {
        error: String,
    },
    CleanupReport {
        error: String,
        outcomes: Vec<CleanupOutcome>,
    },
}

/// One selectable line of a list step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardRow {
    Region(usize),
    Flavor(usize),
    Image(usize),
    SshKey(usize),
    CreateSshKey,
    PublicToggle,
    NoPrivateNetwork,
    Network(usize),
    CreateNetwork,
    NoFloatingIp,
    NewFloatingIp,
    FloatingIp(usize),
}

#[derive(Debug, Clone)]
pub struct WizardData {
    pub run: u64,
    pub project: String,
    pub step: WizardStep,
    pub phase: WizardPhase,

    // Transient per-step state.
    pub selected_index: usize,
    pub filter_input: String,
    pub filter_active: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub form: Option<InlineForm>,

    // Loaded options.
    pub regions: Vec<String>,
    pub flavors: Vec<Flavor>,
    pub images: Vec<Image>,
    pub ssh_keys: Vec<SshKey>,
    pub public_network_id: Option<String>,
    pub networks: Vec<PrivateNetwork>,
    pub floating_ips: Vec<FloatingIp>,

    // Confirmed choices.
    pub selected_region: Option<String>,
    pub selected_flavor: Option<Flavor>,
    pub selected_image: Option<Image>,
    pub selected_ssh_key: Option<SshKey>,
    pub public_network: bool,
    pub private_network: Option<NetworkChoice>,
    pub floating_ip: FloatingIpChoice,
    pub name: String,

    /// Subnet plans for networks created in this run, by network id.
    pub new_subnets: Vec<(String, SubnetSpec)>,
    pub ledger: Ledger,
    pub poll: PollPolicy,
}

/// How a key press leaves the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Exit {
    Cancelled,
    CleanupDeclined,
    ReportDismissed,
    Created(String),
}

enum Outcome {
    Stay(Command),
    Exit(Exit),
}

impl From<Command> for Outcome {
    fn from(command: Command) -> Self {
        Self::Stay(command)
    }
}

impl WizardData {
    pub fn new(run: u64, project: String, poll: PollPolicy) -> Self {
        Self {
            run,
            project,
            step: WizardStep::Region,
            phase: WizardPhase::Editing,
            selected_index: 0,
            filter_input: String::new(),
            filter_active: false,
            loading: false,
            error: None,
            form: None,
            regions: Vec::new(),
            flavors: Vec::new(),
            images: Vec::new(),
            ssh_keys: Vec::new(),
            public_network_id: None,
            networks: Vec::new(),
            floating_ips: Vec::new(),
            selected_region: None,
            selected_flavor: None,
            selected_image: None,
            selected_ssh_key: None,
            public_network: true,
            private_network: None,
            floating_ip: FloatingIpChoice::None,
            name: String::new(),
            new_subnets: Vec::new(),
            ledger: Ledger::default(),
            poll,
        }
    }

    pub const fn stamp(&self) -> WizardStamp {
        WizardStamp {
            run: self.run,
            step: self.step,
        }
    }

    fn region(&self) -> String {
        self.selected_region.clone().unwrap_or_default()
    }

    /// Move to `step`, resetting only the per-step transient fields.
    pub fn enter_step(&mut self, step: WizardStep) -> Command {
        debug!(run = self.run, step = ?step, "Wizard: entering step");
        self.step = step;
        self.selected_index = 0;
        self.filter_input.clear();
        self.filter_active = false;
        self.error = None;
        self.form = None;

        if step == WizardStep::Name && self.name.is_empty() {
            if let (Some(flavor), Some(region)) = (&self.selected_flavor, &self.selected_region) {
                self.name = format!("{}-{}", flavor.name, region.to_lowercase());
            }
        }

        if !step.loads_options() {
            self.loading = false;
            return Command::None;
        }
        self.loading = true;
        WizardCommand::LoadStep {
            stamp: self.stamp(),
            project: self.project.clone(),
            region: self.region(),
            os_type: self.selected_flavor.as_ref().map(|f| f.os_type.clone()),
        }
        .into()
    }

    /// Whether the floating IP step is part of the path.
    pub const fn needs_floating_ip_step(&self) -> bool {
        !self.public_network && self.private_network.is_some()
    }

    /// Rows of the current list step after filtering.
    pub fn visible_rows(&self) -> Vec<WizardRow> {
        let matcher = Matcher::new();
        let pattern = self.filter_input.as_str();
        let keep = |fields: &[&str]| matcher.matches_any(fields.iter().copied(), pattern);

        match self.step {
            WizardStep::Region => (0..self.regions.len())
                .filter(|&i| keep(&[&self.regions[i]]))
                .map(WizardRow::Region)
                .collect(),
            WizardStep::Flavor => (0..self.flavors.len())
                .filter(|&i| keep(&[&self.flavors[i].name]))
                .map(WizardRow::Flavor)
                .collect(),
            WizardStep::Image => (0..self.images.len())
                .filter(|&i| keep(&[&self.images[i].name]))
                .map(WizardRow::Image)
                .collect(),
            WizardStep::SshKey => (0..self.ssh_keys.len())
                .filter(|&i| keep(&[&self.ssh_keys[i].name]))
                .map(WizardRow::SshKey)
                .chain([WizardRow::CreateSshKey])
                .collect(),
            WizardStep::Network => [WizardRow::PublicToggle, WizardRow::NoPrivateNetwork]
                .into_iter()
                .chain(
                    (0..self.networks.len())
                        .filter(|&i| keep(&[&self.networks[i].name, &self.networks[i].id]))
                        .map(WizardRow::Network),
                )
                .chain([WizardRow::CreateNetwork])
                .collect(),
            WizardStep::FloatingIp => [WizardRow::NoFloatingIp, WizardRow::NewFloatingIp]
                .into_iter()
                .chain(
                    (0..self.floating_ips.len())
                        .filter(|&i| keep(&[&self.floating_ips[i].ip]))
                        .map(WizardRow::FloatingIp),
                )
                .collect(),
            WizardStep::Name | WizardStep::Confirm => Vec::new(),
        }
    }

    pub fn current_row(&self) -> Option<WizardRow> {
        self.visible_rows().get(self.selected_index).copied()
    }

    fn move_cursor(&mut self, delta: isize) {
        let max = self.visible_rows().len().saturating_sub(1);
        self.selected_index = self.selected_index.saturating_add_signed(delta).min(max);
    }

    fn clear_after_region(&mut self) {
        self.selected_flavor = None;
        self.selected_image = None;
        self.selected_ssh_key = None;
        self.private_network = None;
        self.public_network = true;
        self.floating_ip = FloatingIpChoice::None;
        self.name.clear();
    }

    // === Key handling ===

    fn on_key(&mut self, keys: &KeyResolver, key: KeyEvent) -> Outcome {
        match &self.phase {
            WizardPhase::Editing => {}
            WizardPhase::Provisioning { .. } | WizardPhase::CleaningUp { .. } => {
                return Command::None.into();
            }
            WizardPhase::CleanupPending { .. } => return self.on_cleanup_prompt(keys, key),
            WizardPhase::CleanupReport { .. } => return Outcome::Exit(Exit::ReportDismissed),
        }

        if self.form.is_some() {
            return self.on_form_key(keys, key).into();
        }

        match self.step {
            WizardStep::Name => self.on_name_key(keys, key),
            WizardStep::Confirm => self.on_confirm_key(keys, key),
            _ if self.filter_active => self.on_filter_key(key).into(),
            _ => self.on_list_key(keys, key),
        }
    }

    fn on_list_key(&mut self, keys: &KeyResolver, key: KeyEvent) -> Outcome {
        if keys.matches(&key, GlobalAction::Back) {
            return self.back();
        }
        if keys.matches(&key, GlobalAction::Quit) {
            return Outcome::Exit(Exit::Cancelled);
        }
        if self.loading {
            return Command::None.into();
        }

        if keys.matches(&key, NavAction::Up) {
            self.move_cursor(-1);
        } else if keys.matches(&key, NavAction::Down) {
            self.move_cursor(1);
        } else if keys.matches(&key, NavAction::PageUp) {
            self.move_cursor(-(PAGE as isize));
        } else if keys.matches(&key, NavAction::PageDown) {
            self.move_cursor(PAGE as isize);
        } else if keys.matches(&key, NavAction::Home) {
            self.selected_index = 0;
        } else if keys.matches(&key, NavAction::End) {
            self.selected_index = self.visible_rows().len().saturating_sub(1);
        } else if keys.matches(&key, FilterAction::Toggle) {
            self.filter_active = true;
        } else if keys.matches(&key, FormAction::Toggle)
            && self.current_row() == Some(WizardRow::PublicToggle)
        {
            self.public_network = !self.public_network;
        } else if keys.matches(&key, NavAction::Select) {
            return self.select_current();
        }
        Command::None.into()
    }

    fn on_filter_key(&mut self, key: KeyEvent) -> Command {
        match key.code {
            KeyCode::Esc => {
                self.filter_input.clear();
                self.filter_active = false;
                self.selected_index = 0;
            }
            KeyCode::Enter => self.filter_active = false,
            KeyCode::Up => self.move_cursor(-1),
            KeyCode::Down => self.move_cursor(1),
            KeyCode::Backspace => {
                self.filter_input.pop();
                self.selected_index = 0;
            }
            KeyCode::Char(c) if is_text(key.modifiers) => {
                self.filter_input.push(c);
                self.selected_index = 0;
            }
            _ => {}
        }
        Command::None
    }

    fn on_name_key(&mut self, keys: &KeyResolver, key: KeyEvent) -> Outcome {
        match key.code {
            KeyCode::Backspace => {
                self.name.pop();
                Command::None.into()
            }
            KeyCode::Char(c) if is_text(key.modifiers) => {
                self.name.push(c);
                Command::None.into()
            }
            _ if keys.matches(&key, GlobalAction::Back) => self.back(),
            _ if keys.matches(&key, NavAction::Select) => match validate_name(&self.name) {
                Ok(()) => self.enter_step(WizardStep::Confirm).into(),
                Err(err) => {
                    self.error = Some(err);
                    Command::None.into()
                }
            },
            _ => Command::None.into(),
        }
    }

    fn on_confirm_key(&mut self, keys: &KeyResolver, key: KeyEvent) -> Outcome {
        if keys.matches(&key, GlobalAction::Back) {
            return self.back();
        }
        if keys.matches(&key, NavAction::Select) || keys.matches(&key, DialogAction::Confirm) {
            return self.start_provisioning().into();
        }
        Command::None.into()
    }

    fn on_cleanup_prompt(&mut self, keys: &KeyResolver, key: KeyEvent) -> Outcome {
        if keys.matches(&key, DialogAction::Confirm) {
            let entries = self.ledger.entries().to_vec();
            info!(run = self.run, count = entries.len(), "Wizard: cleaning up");
            let error = match &self.phase {
                WizardPhase::CleanupPending { error } => error.clone(),
                _ => String::new(),
            };
            self.phase = WizardPhase::CleaningUp { error };
            return Command::from(WizardCommand::Cleanup {
                run: self.run,
                project: self.project.clone(),
                entries,
            })
            .into();
        }
        if keys.matches(&key, DialogAction::Cancel) {
            return Outcome::Exit(Exit::CleanupDeclined);
        }
        Command::None.into()
    }

    fn on_form_key(&mut self, keys: &KeyResolver, key: KeyEvent) -> Command {
        let Some(form) = self.form.as_mut() else {
            return Command::None;
        };
        if form.submitting() {
            return Command::None;
        }

        if keys.matches(&key, GlobalAction::Back) {
            self.form = None;
            self.error = None;
            return Command::None;
        }
        if keys.matches(&key, FormAction::NextField) {
            form.move_focus(true);
            return Command::None;
        }
        if keys.matches(&key, FormAction::PrevField) {
            form.move_focus(false);
            return Command::None;
        }

        match key.code {
            KeyCode::Enter => self.activate_form_focus(),
            KeyCode::Backspace => {
                if let Some(text) = form.focused_text() {
                    text.pop();
                }
                Command::None
            }
            KeyCode::Char(c) if is_text(key.modifiers) => {
                if let Some(text) = form.focused_text() {
                    text.push(c);
                }
                Command::None
            }
            _ => Command::None,
        }
    }

    /// Pasted text goes to whichever text field has focus.
    fn on_paste(&mut self, text: &str) {
        if !matches!(self.phase, WizardPhase::Editing) {
            return;
        }
        let text = text.trim_end_matches(['\r', '\n']);
        if let Some(form) = self.form.as_mut() {
            if !form.submitting() {
                if let Some(field) = form.focused_text() {
                    field.push_str(text);
                }
            }
        } else if self.step == WizardStep::Name {
            self.name.push_str(text);
        } else if self.filter_active {
            self.filter_input.push_str(text);
            self.selected_index = 0;
        }
    }

    fn activate_form_focus(&mut self) -> Command {
        let run = self.run;
        let project = self.project.clone();
        let region = self.region();
        let Some(form) = self.form.as_mut() else {
            return Command::None;
        };
        let cancel = matches!(
            form,
            InlineForm::SshKey(SshKeyForm { focus: SshKeyField::Cancel, .. })
                | InlineForm::Network(NetworkForm { focus: NetworkField::Cancel, .. })
        );
        let create = matches!(
            form,
            InlineForm::SshKey(SshKeyForm { focus: SshKeyField::Create, .. })
                | InlineForm::Network(NetworkForm { focus: NetworkField::Create, .. })
        );

        if cancel {
            self.form = None;
            self.error = None;
            return Command::None;
        }
        if !create {
            form.move_focus(true);
            return Command::None;
        }

        let result = match form {
            InlineForm::SshKey(f) => validate_ssh_key(f).map(|()| {
                f.submitting = true;
                WizardCommand::CreateSshKey {
                    run,
                    project,
                    region,
                    name: f.name.trim().to_string(),
                    public_key: f.public_key.trim().to_string(),
                }
            }),
            InlineForm::Network(f) => validate_network(f).map(|(vlan_id, subnet)| {
                f.submitting = true;
                f.subnet = Some(subnet);
                WizardCommand::CreateNetwork {
                    run,
                    project,
                    region,
                    name: f.name.trim().to_string(),
                    vlan_id,
                }
            }),
        };

        match result {
            Ok(command) => {
                self.error = None;
                command.into()
            }
            Err(err) => {
                self.error = Some(err);
                Command::None
            }
        }
    }

    fn back(&mut self) -> Outcome {
        let previous = match self.step {
            WizardStep::Region => return Outcome::Exit(Exit::Cancelled),
            WizardStep::Flavor => {
                if !self.ledger.is_empty() {
                    self.error = Some(
                        "The region is fixed once resources have been created in it".to_string(),
                    );
                    return Command::None.into();
                }
                WizardStep::Region
            }
            WizardStep::Image => WizardStep::Flavor,
            WizardStep::SshKey => WizardStep::Image,
            WizardStep::Network => WizardStep::SshKey,
            WizardStep::FloatingIp => WizardStep::Network,
            WizardStep::Name if self.needs_floating_ip_step() => WizardStep::FloatingIp,
            WizardStep::Name => WizardStep::Network,
            WizardStep::Confirm => WizardStep::Name,
        };
        self.enter_step(previous).into()
    }

    // === Selection ===

    /// Record the highlighted row and move on. Validation failures stay on
    /// the step with an inline error.
    fn select_current(&mut self) -> Outcome {
        let Some(row) = self.current_row() else {
            return Command::None.into();
        };

        let next = match row {
            WizardRow::Region(i) => {
                let region = self.regions[i].clone();
                if self.selected_region.as_deref() != Some(region.as_str()) {
                    self.clear_after_region();
                }
                self.selected_region = Some(region);
                WizardStep::Flavor
            }
            WizardRow::Flavor(i) => {
                let flavor = self.flavors[i].clone();
                if self
                    .selected_image
                    .as_ref()
                    .is_some_and(|img| !img.os_type.is_empty() && img.os_type != flavor.os_type)
                {
                    self.selected_image = None;
                }
                self.selected_flavor = Some(flavor);
                WizardStep::Image
            }
            WizardRow::Image(i) => {
                self.selected_image = Some(self.images[i].clone());
                WizardStep::SshKey
            }
            WizardRow::SshKey(i) => {
                self.selected_ssh_key = Some(self.ssh_keys[i].clone());
                WizardStep::Network
            }
            WizardRow::CreateSshKey => {
                self.form = Some(InlineForm::SshKey(SshKeyForm::default()));
                return Command::None.into();
            }
            WizardRow::CreateNetwork => {
                self.form = Some(InlineForm::Network(NetworkForm::default()));
                return Command::None.into();
            }
            WizardRow::PublicToggle => {
                self.public_network = !self.public_network;
                return Command::None.into();
            }
            WizardRow::NoPrivateNetwork => {
                if !self.public_network {
                    self.error = Some("Select a public network, a private network, or both".into());
                    return Command::None.into();
                }
                self.private_network = None;
                self.floating_ip = FloatingIpChoice::None;
                WizardStep::Name
            }
            WizardRow::Network(i) => {
                if self.public_network && self.public_network_id.is_none() {
                    self.error = Some("No public network is available in this region".into());
                    return Command::None.into();
                }
                let network = self.networks[i].clone();
                let new_subnet = self
                    .new_subnets
                    .iter()
                    .find(|(id, _)| *id == network.id)
                    .map(|(_, spec)| spec.clone());
                self.private_network = Some(NetworkChoice {
                    network,
                    new_subnet,
                });
                if self.needs_floating_ip_step() {
                    WizardStep::FloatingIp
                } else {
                    self.floating_ip = FloatingIpChoice::None;
                    WizardStep::Name
                }
            }
            WizardRow::NoFloatingIp | WizardRow::NewFloatingIp | WizardRow::FloatingIp(_) => {
                if self.private_network.is_none() {
                    self.error = Some("A floating IP needs a private network".into());
                    return Command::None.into();
                }
                self.floating_ip = match row {
                    WizardRow::NewFloatingIp => FloatingIpChoice::New,
                    WizardRow::FloatingIp(i) => FloatingIpChoice::Existing {
                        id: self.floating_ips[i].id.clone(),
                        ip: self.floating_ips[i].ip.clone(),
                    },
                    _ => FloatingIpChoice::None,
                };
                WizardStep::Name
            }
        };

        self.enter_step(next).into()
    }

    /// The request the Confirm step would submit.
    pub fn provision_request(&self) -> Result<ProvisionRequest, String> {
        let region = self.selected_region.clone().ok_or("No region selected")?;
        let flavor = self.selected_flavor.as_ref().ok_or("No flavor selected")?;
        let image = self.selected_image.as_ref().ok_or("No image selected")?;
        let ssh_key = self.selected_ssh_key.as_ref().ok_or("No SSH key selected")?;
        validate_name(&self.name)?;
        if !self.public_network && self.private_network.is_none() {
            return Err("Select a public network, a private network, or both".into());
        }
        if self.floating_ip != FloatingIpChoice::None && self.private_network.is_none() {
            return Err("A floating IP needs a private network".into());
        }

        // Without a private network the default attachment is the public one.
        let public_network_id = if self.public_network && self.private_network.is_some() {
            Some(
                self.public_network_id
                    .clone()
                    .ok_or("No public network is available in this region")?,
            )
        } else {
            None
        };

        Ok(ProvisionRequest {
            project: self.project.clone(),
            region,
            name: self.name.clone(),
            flavor_id: flavor.id.clone(),
            image_id: image.id.clone(),
            ssh_key_id: Some(ssh_key.id.clone()),
            public_network_id,
            private_network: self.private_network.as_ref().map(|choice| PrivateNetworkPlan {
                id: choice.network.id.clone(),
                name: choice.network.name.clone(),
                new_subnet: choice.new_subnet.clone(),
            }),
            floating_ip: self.floating_ip.clone(),
        })
    }

    fn start_provisioning(&mut self) -> Command {
        let request = match self.provision_request() {
            Ok(request) => request,
            Err(err) => {
                self.error = Some(err);
                return Command::None;
            }
        };
        let plan = saga::plan(&request);
        let Some(&first) = plan.first() else {
            return Command::None;
        };
        info!(run = self.run, steps = ?plan, "Wizard: provisioning");

        self.error = None;
        let request = Box::new(request);
        let context = StepContext::default();
        self.phase = WizardPhase::Provisioning {
            plan,
            index: 0,
            request: request.clone(),
            context: context.clone(),
        };
        Command::Wizard(WizardCommand::Provision {
            run: self.run,
            step: first,
            request,
            context,
            poll: self.poll,
        })
    }
}

/// Printable input without control or alt chords.
fn is_text(modifiers: KeyModifiers) -> bool {
    (modifiers - KeyModifiers::SHIFT).is_empty()
}

pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required".into());
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(format!("`{c}` is not allowed in a name (use letters, digits, . _ -)"));
    }
    Ok(())
}

const KEY_PREFIXES: &[&str] = &[
    "ssh-rsa",
    "ssh-ed25519",
    "ssh-dss",
    "ecdsa-sha2-",
    "sk-ssh-ed25519@openssh.com",
    "sk-ecdsa-sha2-",
];

fn validate_ssh_key(form: &SshKeyForm) -> Result<(), String> {
    if form.name.trim().is_empty() {
        return Err("Key name is required".into());
    }
    let mut parts = form.public_key.split_whitespace();
    let algorithm = parts.next().unwrap_or_default();
    let body = parts.next();
    if !KEY_PREFIXES.iter().any(|p| algorithm.starts_with(p)) || body.is_none() {
        return Err("Public key must be an OpenSSH public key (e.g. `ssh-ed25519 AAAA...`)".into());
    }
    Ok(())
}

fn validate_network(form: &NetworkForm) -> Result<(Option<u16>, SubnetSpec), String> {
    if form.name.trim().is_empty() {
        return Err("Network name is required".into());
    }
    let vlan = form.vlan.trim();
    let vlan_id = if vlan.is_empty() {
        None
    } else {
        let id: u16 = vlan
            .parse()
            .map_err(|_| format!("VLAN id `{vlan}` is not a number"))?;
        if id > MAX_VLAN {
            return Err(format!("VLAN id must be between 0 and {MAX_VLAN}"));
        }
        Some(id)
    };
    let subnet = SubnetSpec::parse(&form.cidr)?;
    Ok((vlan_id, subnet))
}

impl WizardData {
    fn apply_options(&mut self, options: StepOptions) {
        match options {
            StepOptions::Regions(regions) => self.regions = regions,
            StepOptions::Flavors(flavors) => self.flavors = flavors,
            StepOptions::Images(images) => self.images = images,
            StepOptions::SshKeys(keys) => self.ssh_keys = keys,
            StepOptions::Networks { public_id, private } => {
                self.public_network_id = public_id;
                self.networks = private;
            }
            StepOptions::FloatingIps(ips) => self.floating_ips = ips,
        }
        self.selected_index = self
            .selected_index
            .min(self.visible_rows().len().saturating_sub(1));
    }

    fn on_step_done(
        &mut self,
        step: ProvisionStep,
        result: Result<StepOutput, ProvisionError>,
    ) -> Outcome {
        let run = self.run;
        let poll = self.poll;
        let WizardPhase::Provisioning {
            plan,
            index,
            request,
            context,
        } = &mut self.phase
        else {
            warn!(run, step = ?step, "Provision result outside of provisioning");
            return Command::None.into();
        };
        if plan.get(*index) != Some(&step) {
            warn!(run, step = ?step, "Unexpected provision step result");
            return Command::None.into();
        }

        match result {
            Ok(output) => {
                for entry in output.created {
                    if entry.kind == ResourceKind::Instance {
                        context.instance_id = Some(entry.id.clone());
                    }
                    self.ledger.record(entry);
                }
                if output.private_ip.is_some() {
                    context.private_ip = output.private_ip;
                }

                *index += 1;
                match plan.get(*index) {
                    Some(&next) => Command::Wizard(WizardCommand::Provision {
                        run,
                        step: next,
                        request: request.clone(),
                        context: context.clone(),
                        poll,
                    })
                    .into(),
                    None => Outcome::Exit(Exit::Created(request.name.clone())),
                }
            }
            Err(err) => {
                let (created, err) = err.into_parts();
                for entry in created {
                    self.ledger.record(entry);
                }
                let error = format!("{} failed: {err}", step.label());
                warn!(run, step = ?step, %err, created = self.ledger.len(), "Provisioning failed");
                if self.ledger.is_empty() {
                    self.phase = WizardPhase::Editing;
                    self.error = Some(error);
                } else {
                    self.phase = WizardPhase::CleanupPending { error };
                }
                Command::None.into()
            }
        }
    }
}

// === Entry points used by `update` ===

/// Open the wizard on top of the instance list.
pub fn start(model: &mut Model) -> Command {
    let Some(project) = model.project.clone() else {
        return Command::None;
    };
    model.wizard_runs += 1;
    let mut wizard = WizardData::new(model.wizard_runs, project, model.settings.poll);
    info!(run = wizard.run, "Wizard: started");
    let command = wizard.enter_step(WizardStep::Region);
    model.wizard = Some(wizard);
    model.mode = Mode::Wizard;
    command
}

pub fn handle_key(model: &mut Model, key: KeyEvent) -> Command {
    let keys = Arc::clone(&model.keys);
    let Some(wizard) = model.wizard.as_mut() else {
        return Command::None;
    };
    match wizard.on_key(&keys, key) {
        Outcome::Stay(command) => command,
        Outcome::Exit(exit) => leave(model, exit),
    }
}

pub fn handle_paste(model: &mut Model, text: &str) {
    if let Some(wizard) = model.wizard.as_mut() {
        wizard.on_paste(text);
    }
}

pub fn handle_msg(model: &mut Model, msg: WizardMsg) -> Command {
    match msg {
        WizardMsg::StepLoaded { stamp, result } => {
            let Some(wizard) = active(model, stamp.run) else {
                debug!(run = stamp.run, "Discarding step load for a closed wizard");
                return Command::None;
            };
            if wizard.stamp() != stamp || wizard.phase != WizardPhase::Editing {
                debug!(step = ?stamp.step, current = ?wizard.step, "Discarding stale step load");
                return Command::None;
            }
            wizard.loading = false;
            match result {
                Ok(options) => wizard.apply_options(options),
                Err(err) => wizard.error = Some(err.to_string()),
            }
            Command::None
        }

        WizardMsg::SshKeyCreated { run, result } => {
            let Some(wizard) = active(model, run) else {
                if let Ok(key) = &result {
                    warn!(id = %key.id, "SSH key created after its wizard closed");
                }
                return Command::None;
            };
            match result {
                Ok(key) => {
                    let region = wizard.region();
                    wizard.ledger.record(LedgerEntry::new(
                        ResourceKind::SshKey,
                        key.id.clone(),
                        key.name.clone(),
                        &region,
                    ));
                    wizard.ssh_keys.push(key);
                    wizard.close_form();
                    wizard.selected_index = wizard.ssh_keys.len() - 1;
                }
                Err(err) => wizard.form_failed(&err),
            }
            Command::None
        }

        WizardMsg::NetworkCreated { run, result } => {
            let Some(wizard) = active(model, run) else {
                if let Ok(network) = &result {
                    warn!(id = %network.id, "Network created after its wizard closed");
                }
                return Command::None;
            };
            match result {
                Ok(network) => {
                    let region = wizard.region();
                    wizard.ledger.record(LedgerEntry::new(
                        ResourceKind::Network,
                        network.id.clone(),
                        network.name.clone(),
                        &region,
                    ));
                    let subnet = match &wizard.form {
                        Some(InlineForm::Network(form)) => form.subnet.clone(),
                        _ => None,
                    };
                    if let Some(subnet) = subnet.or_else(|| SubnetSpec::parse(DEFAULT_CIDR).ok()) {
                        wizard.new_subnets.push((network.id.clone(), subnet));
                    }
                    wizard.networks.push(network);
                    wizard.close_form();
                    // Toggle and "no private network" come first.
                    wizard.selected_index = wizard.networks.len() + 1;
                }
                Err(err) => wizard.form_failed(&err),
            }
            Command::None
        }

        WizardMsg::ProvisionStepDone { run, step, result } => {
            let Some(wizard) = active(model, run) else {
                if let Ok(output) = &result {
                    for entry in &output.created {
                        warn!(entry = %entry, "Resource created after its wizard closed");
                    }
                }
                return Command::None;
            };
            match wizard.on_step_done(step, result) {
                Outcome::Stay(command) => command,
                Outcome::Exit(exit) => leave(model, exit),
            }
        }

        WizardMsg::CleanupFinished { run, outcomes } => {
            let Some(wizard) = active(model, run) else {
                return Command::None;
            };
            let WizardPhase::CleaningUp { error } = &wizard.phase else {
                return Command::None;
            };
            let error = error.clone();
            let failed = outcomes.iter().filter(|o| !o.succeeded()).count();
            info!(run, deleted = outcomes.len() - failed, failed, "Wizard: cleanup finished");
            wizard.phase = WizardPhase::CleanupReport { error, outcomes };
            wizard.ledger.take();
            Command::None
        }
    }
}

impl WizardData {
    fn close_form(&mut self) {
        self.form = None;
        self.error = None;
        self.filter_input.clear();
        self.filter_active = false;
    }

    fn form_failed(&mut self, err: &ApiError) {
        match self.form.as_mut() {
            Some(InlineForm::SshKey(f)) => f.submitting = false,
            Some(InlineForm::Network(f)) => f.submitting = false,
            None => {}
        }
        self.error = Some(err.to_string());
    }
}

fn active(model: &mut Model, run: u64) -> Option<&mut WizardData> {
    model.wizard.as_mut().filter(|w| w.run == run)
}

/// Close the wizard and go back to a freshly loaded instance list.
fn leave(model: &mut Model, exit: Exit) -> Command {
    let Some(mut wizard) = model.wizard.take() else {
        return Command::None;
    };
    let remaining = wizard.ledger.take();
    info!(run = wizard.run, exit = ?exit, remaining = remaining.len(), "Wizard: closed");

    let note = match exit {
        Exit::Created(name) => Some((
            format!("Instance {name} is being created"),
            NotificationKind::Success,
        )),
        Exit::Cancelled if !remaining.is_empty() => {
            let kept: Vec<String> = remaining.iter().map(ToString::to_string).collect();
            Some((format!("Kept {}", kept.join(", ")), NotificationKind::Info))
        }
        Exit::CleanupDeclined => Some((
            format!("Left {} resource(s) in place", remaining.len()),
            NotificationKind::Info,
        )),
        Exit::Cancelled | Exit::ReportDismissed => None,
    };

    model.current_product = Product::Instances;
    let reload = update::load_current(model);
    let notify = note.map_or(Command::None, |(text, kind)| update::notify(model, text, kind));
    Command::batch([reload, notify])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::model::{Settings, test_model};

    fn press(model: &mut Model, code: KeyCode) -> Command {
        handle_key(model, KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(model: &mut Model, text: &str) {
        for c in text.chars() {
            press(model, KeyCode::Char(c));
        }
    }

    fn wizard(model: &Model) -> &WizardData {
        model.wizard.as_ref().unwrap()
    }

    fn load(model: &mut Model, options: StepOptions) {
        let stamp = wizard(model).stamp();
        handle_msg(
            model,
            WizardMsg::StepLoaded {
                stamp,
                result: Ok(options),
            },
        );
    }

    fn flavor(id: &str, name: &str) -> Flavor {
        Flavor {
            id: id.into(),
            name: name.into(),
            vcpus: 2,
            ram: 7000,
            disk: 50,
            os_type: "linux".into(),
            available: true,
        }
    }

    fn network(id: &str, name: &str) -> PrivateNetwork {
        PrivateNetwork {
            id: id.into(),
            name: name.into(),
            vlan_id: Some(0),
            regions: vec![NetworkRegion {
                region: "GRA11".into(),
                status: "ACTIVE".into(),
            }],
        }
    }

    fn ssh_key(id: &str, name: &str) -> SshKey {
        SshKey {
            id: id.into(),
            name: name.into(),
            public_key: "ssh-ed25519 AAAA".into(),
            regions: vec![],
        }
    }

    /// Start a wizard and walk it to the Network step with one existing network.
    fn at_network_step() -> Model {
        let mut model = test_model();
        model.mode = Mode::Table;
        start(&mut model);
        load(&mut model, StepOptions::Regions(vec!["GRA11".into(), "SBG5".into()]));
        press(&mut model, KeyCode::Enter);
        load(&mut model, StepOptions::Flavors(vec![flavor("f1", "b2-7")]));
        press(&mut model, KeyCode::Enter);
        load(
            &mut model,
            StepOptions::Images(vec![Image {
                id: "i1".into(),
                name: "Ubuntu 24.04".into(),
                os_type: "linux".into(),
                user: Some("ubuntu".into()),
            }]),
        );
        press(&mut model, KeyCode::Enter);
        load(&mut model, StepOptions::SshKeys(vec![ssh_key("k1", "laptop")]));
        press(&mut model, KeyCode::Enter);
        load(
            &mut model,
            StepOptions::Networks {
                public_id: Some("pub".into()),
                private: vec![network("n1", "backend")],
            },
        );
        assert_eq!(wizard(&model).step, WizardStep::Network);
        model
    }

    fn provisioning_output(created: Vec<LedgerEntry>) -> Result<StepOutput, ProvisionError> {
        Ok(StepOutput {
            created,
            private_ip: None,
        })
    }

    fn step_done(
        model: &mut Model,
        step: ProvisionStep,
        result: Result<StepOutput, ProvisionError>,
    ) -> Command {
        let run = wizard(model).run;
        handle_msg(model, WizardMsg::ProvisionStepDone { run, step, result })
    }

    fn attach_failure() -> ProvisionError {
        ProvisionError::Api(ApiError::Status {
            method: crate::api::Method::Post,
            path: "/attach".into(),
            status: 500,
            message: "boom".into(),
        })
    }

    #[test]
    fn test_start_loads_regions() {
        let mut model = test_model();
        let command = start(&mut model);
        assert_eq!(model.mode, Mode::Wizard);
        assert_eq!(
            command,
            Command::Wizard(WizardCommand::LoadStep {
                stamp: WizardStamp {
                    run: 1,
                    step: WizardStep::Region,
                },
                project: "p1".into(),
                region: String::new(),
                os_type: None,
            })
        );
        assert!(wizard(&model).loading);
    }

    #[test]
    fn test_public_and_private_goes_to_name() {
        let mut model = at_network_step();
        press(&mut model, KeyCode::Char('j'));
        press(&mut model, KeyCode::Char('j'));
        assert_eq!(wizard(&model).current_row(), Some(WizardRow::Network(0)));
        press(&mut model, KeyCode::Enter);

        let w = wizard(&model);
        assert_eq!(w.step, WizardStep::Name);
        assert_eq!(w.name, "b2-7-gra11");
        assert_eq!(w.private_network.as_ref().map(|c| c.network.id.as_str()), Some("n1"));
        assert!(w.private_network.as_ref().unwrap().new_subnet.is_none());
    }

    #[test]
    fn test_private_only_goes_to_floating_ip() {
        let mut model = at_network_step();
        press(&mut model, KeyCode::Char(' '));
        assert!(!wizard(&model).public_network);
        press(&mut model, KeyCode::Char('j'));
        press(&mut model, KeyCode::Char('j'));
        let command = press(&mut model, KeyCode::Enter);

        assert_eq!(wizard(&model).step, WizardStep::FloatingIp);
        assert!(matches!(
            command,
            Command::Wizard(WizardCommand::LoadStep { ref region, .. }) if region == "GRA11"
        ));

        // Back from Name returns to the floating IP step on this path.
        load(&mut model, StepOptions::FloatingIps(vec![]));
        press(&mut model, KeyCode::Enter);
        assert_eq!(wizard(&model).step, WizardStep::Name);
        press(&mut model, KeyCode::Esc);
        assert_eq!(wizard(&model).step, WizardStep::FloatingIp);
    }

    #[test]
    fn test_neither_network_is_refused() {
        let mut model = at_network_step();
        press(&mut model, KeyCode::Char(' '));
        press(&mut model, KeyCode::Char('j'));
        assert_eq!(wizard(&model).current_row(), Some(WizardRow::NoPrivateNetwork));
        press(&mut model, KeyCode::Enter);
        assert_eq!(wizard(&model).step, WizardStep::Network);
        assert!(wizard(&model).error.is_some());
    }

    #[test]
    fn test_floating_ip_requires_private_network() {
        let mut w = WizardData::new(1, "p1".into(), Settings::default().poll);
        w.selected_region = Some("GRA11".into());
        w.enter_step(WizardStep::FloatingIp);
        w.apply_options(StepOptions::FloatingIps(vec![]));
        w.selected_index = 1;

        w.select_current();
        assert_eq!(w.step, WizardStep::FloatingIp);
        assert_eq!(w.error.as_deref(), Some("A floating IP needs a private network"));
    }

    #[test]
    fn test_entering_step_resets_only_transient_state() {
        let mut model = at_network_step();
        let w = model.wizard.as_mut().unwrap();
        w.filter_input = "back".into();
        w.filter_active = true;
        w.error = Some("old".into());
        w.selected_index = 2;

        w.enter_step(WizardStep::SshKey);
        assert_eq!(w.selected_index, 0);
        assert!(w.filter_input.is_empty());
        assert!(!w.filter_active);
        assert!(w.error.is_none());
        assert!(w.loading);
        assert_eq!(w.selected_region.as_deref(), Some("GRA11"));
        assert_eq!(w.selected_ssh_key.as_ref().map(|k| k.id.as_str()), Some("k1"));
    }

    #[test]
    fn test_changing_region_clears_dependent_choices() {
        let mut model = at_network_step();
        for _ in 0..4 {
            press(&mut model, KeyCode::Esc);
        }
        assert_eq!(wizard(&model).step, WizardStep::Region);
        load(&mut model, StepOptions::Regions(vec!["GRA11".into(), "SBG5".into()]));
        press(&mut model, KeyCode::Char('j'));
        press(&mut model, KeyCode::Enter);

        let w = wizard(&model);
        assert_eq!(w.selected_region.as_deref(), Some("SBG5"));
        assert!(w.selected_flavor.is_none());
        assert!(w.selected_image.is_none());
        assert!(w.selected_ssh_key.is_none());
    }

    #[test]
    fn test_region_is_fixed_once_something_was_created() {
        let mut model = at_network_step();
        model
            .wizard
            .as_mut()
            .unwrap()
            .ledger
            .record(LedgerEntry::new(ResourceKind::SshKey, "k9", "new", "GRA11"));
        press(&mut model, KeyCode::Esc);
        press(&mut model, KeyCode::Esc);
        press(&mut model, KeyCode::Esc);
        assert_eq!(wizard(&model).step, WizardStep::Flavor);

        let command = press(&mut model, KeyCode::Esc);
        assert!(command.is_none());
        assert_eq!(wizard(&model).step, WizardStep::Flavor);
        assert!(wizard(&model).error.is_some());
    }

    #[test]
    fn test_stale_step_load_is_discarded() {
        let mut model = test_model();
        start(&mut model);
        let region_stamp = wizard(&model).stamp();
        load(&mut model, StepOptions::Regions(vec!["GRA11".into()]));
        press(&mut model, KeyCode::Enter);
        assert_eq!(wizard(&model).step, WizardStep::Flavor);

        handle_msg(
            &mut model,
            WizardMsg::StepLoaded {
                stamp: region_stamp,
                result: Ok(StepOptions::Regions(vec!["BHS5".into()])),
            },
        );
        assert_eq!(wizard(&model).regions, vec!["GRA11".to_string()]);
        assert!(wizard(&model).loading);

        // A result from an earlier run is dropped too.
        let old_run = WizardStamp {
            run: 0,
            step: WizardStep::Flavor,
        };
        handle_msg(
            &mut model,
            WizardMsg::StepLoaded {
                stamp: old_run,
                result: Ok(StepOptions::Flavors(vec![flavor("f1", "b2-7")])),
            },
        );
        assert!(wizard(&model).flavors.is_empty());
    }

    #[test]
    fn test_step_load_failure_is_inline() {
        let mut model = test_model();
        start(&mut model);
        let stamp = wizard(&model).stamp();
        handle_msg(
            &mut model,
            WizardMsg::StepLoaded {
                stamp,
                result: Err(ApiError::Network("offline".into())),
            },
        );
        assert!(!wizard(&model).loading);
        assert_eq!(wizard(&model).error.as_deref(), Some("network error: offline"));
        assert_eq!(model.mode, Mode::Wizard);
    }

    #[test]
    fn test_ssh_key_form_creates_and_selects_key() {
        let mut model = at_network_step();
        press(&mut model, KeyCode::Esc);
        load(&mut model, StepOptions::SshKeys(vec![ssh_key("k1", "laptop")]));
        press(&mut model, KeyCode::Char('G'));
        assert_eq!(wizard(&model).current_row(), Some(WizardRow::CreateSshKey));
        press(&mut model, KeyCode::Enter);
        assert!(matches!(wizard(&model).form, Some(InlineForm::SshKey(_))));

        type_text(&mut model, "desk");
        press(&mut model, KeyCode::Tab);
        handle_paste(&mut model, "ssh-ed25519 AAAAC3Nza desk@home\n");
        press(&mut model, KeyCode::Tab);
        let command = press(&mut model, KeyCode::Enter);
        assert_eq!(
            command,
            Command::Wizard(WizardCommand::CreateSshKey {
                run: 1,
                project: "p1".into(),
                region: "GRA11".into(),
                name: "desk".into(),
                public_key: "ssh-ed25519 AAAAC3Nza desk@home".into(),
            })
        );
        assert!(wizard(&model).ledger.is_empty());

        handle_msg(
            &mut model,
            WizardMsg::SshKeyCreated {
                run: 1,
                result: Ok(ssh_key("k2", "desk")),
            },
        );
        let w = wizard(&model);
        assert!(w.form.is_none());
        assert_eq!(w.ledger.entries().len(), 1);
        assert_eq!(w.ledger.entries()[0].kind, ResourceKind::SshKey);
        assert_eq!(w.ledger.entries()[0].id, "k2");
        assert_eq!(w.current_row(), Some(WizardRow::SshKey(1)));
    }

    #[test]
    fn test_form_cancel_has_no_side_effects() {
        let mut model = at_network_step();
        press(&mut model, KeyCode::Char('G'));
        press(&mut model, KeyCode::Enter);
        type_text(&mut model, "scratch");

        let command = press(&mut model, KeyCode::Esc);
        assert!(command.is_none());
        let w = wizard(&model);
        assert!(w.form.is_none());
        assert!(w.ledger.is_empty());
        assert_eq!(w.step, WizardStep::Network);
        assert_eq!(w.networks.len(), 1);
    }

    #[test]
    fn test_form_validation_stays_in_form() {
        let mut form = SshKeyForm {
            name: "desk".into(),
            public_key: "not-a-key".into(),
            ..SshKeyForm::default()
        };
        assert!(validate_ssh_key(&form).is_err());
        form.public_key = "ssh-rsa AAAAB3".into();
        assert!(validate_ssh_key(&form).is_ok());
        form.name = "  ".into();
        assert!(validate_ssh_key(&form).is_err());

        let mut net = NetworkForm {
            name: "backend".into(),
            ..NetworkForm::default()
        };
        assert_eq!(validate_network(&net).unwrap().0, None);
        net.vlan = "4001".into();
        assert!(validate_network(&net).is_err());
        net.vlan = "12".into();
        net.cidr = "10.0.0.1/24".into();
        assert!(validate_network(&net).is_err());
        net.cidr = "192.168.10.0/24".into();
        let (vlan, subnet) = validate_network(&net).unwrap();
        assert_eq!(vlan, Some(12));
        assert_eq!(subnet.cidr, "192.168.10.0/24");
    }

    #[test]
    fn test_network_form_focus_cycles() {
        let mut form = InlineForm::Network(NetworkForm::default());
        let focus = |f: &InlineForm| match f {
            InlineForm::Network(n) => n.focus,
            InlineForm::SshKey(_) => unreachable!(),
        };
        for expected in [
            NetworkField::Vlan,
            NetworkField::Cidr,
            NetworkField::Create,
            NetworkField::Cancel,
            NetworkField::Name,
        ] {
            form.move_focus(true);
            assert_eq!(focus(&form), expected);
        }
        form.move_focus(false);
        assert_eq!(focus(&form), NetworkField::Cancel);
    }

    #[test]
    fn test_name_validation() {
        assert!(validate_name("web-1.prod_a").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("web 1").is_err());
        assert!(validate_name("web/1").is_err());
    }

    #[test]
    fn test_invalid_name_stays_on_step() {
        let mut model = at_network_step();
        press(&mut model, KeyCode::Char('j'));
        press(&mut model, KeyCode::Char('j'));
        press(&mut model, KeyCode::Enter);
        type_text(&mut model, " x");
        press(&mut model, KeyCode::Enter);
        assert_eq!(wizard(&model).step, WizardStep::Name);
        assert!(wizard(&model).error.is_some());

        press(&mut model, KeyCode::Backspace);
        press(&mut model, KeyCode::Backspace);
        press(&mut model, KeyCode::Enter);
        assert_eq!(wizard(&model).step, WizardStep::Confirm);
    }

    /// New network + new subnet + instance, then the floating IP attach fails.
    #[test]
    fn test_failed_attach_leaves_exactly_what_was_created() {
        let mut model = at_network_step();

        // Create a private network through the inline form.
        press(&mut model, KeyCode::Char('G'));
        press(&mut model, KeyCode::Enter);
        type_text(&mut model, "net");
        press(&mut model, KeyCode::Tab);
        press(&mut model, KeyCode::Tab);
        press(&mut model, KeyCode::Tab);
        let command = press(&mut model, KeyCode::Enter);
        assert!(matches!(
            command,
            Command::Wizard(WizardCommand::CreateNetwork { ref name, vlan_id: None, .. }) if name == "net"
        ));
        handle_msg(
            &mut model,
            WizardMsg::NetworkCreated {
                run: 1,
                result: Ok(network("n2", "net")),
            },
        );
        assert_eq!(wizard(&model).current_row(), Some(WizardRow::Network(1)));

        // Private only, with a new floating IP.
        press(&mut model, KeyCode::Char('g'));
        press(&mut model, KeyCode::Char(' '));
        for _ in 0..3 {
            press(&mut model, KeyCode::Char('j'));
        }
        press(&mut model, KeyCode::Enter);
        load(&mut model, StepOptions::FloatingIps(vec![]));
        press(&mut model, KeyCode::Char('j'));
        press(&mut model, KeyCode::Enter);
        press(&mut model, KeyCode::Enter);
        assert_eq!(wizard(&model).step, WizardStep::Confirm);

        let command = press(&mut model, KeyCode::Enter);
        let Command::Wizard(WizardCommand::Provision { step, request, .. }) = command else {
            panic!("expected a provision command");
        };
        assert_eq!(step, ProvisionStep::CreateSubnet);
        assert_eq!(request.floating_ip, FloatingIpChoice::New);
        assert_eq!(request.public_network_id, None);
        assert_eq!(
            request.private_network.as_ref().and_then(|n| n.new_subnet.as_ref()).map(|s| s.cidr.as_str()),
            Some(DEFAULT_CIDR)
        );

        let subnet = LedgerEntry::new(
            ResourceKind::Subnet {
                network: "n2".into(),
            },
            "s1",
            "",
            "GRA11",
        );
        let next = step_done(&mut model, ProvisionStep::CreateSubnet, provisioning_output(vec![subnet]));
        assert!(matches!(
            next,
            Command::Wizard(WizardCommand::Provision { step: ProvisionStep::CreateInstance, .. })
        ));
        let instance = LedgerEntry::new(ResourceKind::Instance, "vm1", "b2-7-gra11", "GRA11");
        let next = step_done(&mut model, ProvisionStep::CreateInstance, provisioning_output(vec![instance]));
        let Command::Wizard(WizardCommand::Provision { step, context, .. }) = next else {
            panic!("expected the wait step");
        };
        assert_eq!(step, ProvisionStep::WaitForPrivateIp);
        assert_eq!(context.instance_id.as_deref(), Some("vm1"));

        let next = step_done(
            &mut model,
            ProvisionStep::WaitForPrivateIp,
            Ok(StepOutput {
                created: vec![],
                private_ip: Some("10.0.0.5".into()),
            }),
        );
        let Command::Wizard(WizardCommand::Provision { step, context, .. }) = next else {
            panic!("expected the attach step");
        };
        assert_eq!(step, ProvisionStep::AttachFloatingIp);
        assert_eq!(context.private_ip.as_deref(), Some("10.0.0.5"));

        let command = step_done(&mut model, ProvisionStep::AttachFloatingIp, Err(attach_failure()));
        assert!(command.is_none());
        let w = wizard(&model);
        assert!(matches!(w.phase, WizardPhase::CleanupPending { .. }));
        let kinds: Vec<&ResourceKind> = w.ledger.entries().iter().map(|e| &e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &ResourceKind::Network,
                &ResourceKind::Subnet {
                    network: "n2".into()
                },
                &ResourceKind::Instance,
            ]
        );
    }

    fn at_confirm() -> Model {
        let mut model = at_network_step();
        press(&mut model, KeyCode::Char('j'));
        press(&mut model, KeyCode::Char('j'));
        press(&mut model, KeyCode::Enter);
        press(&mut model, KeyCode::Enter);
        assert_eq!(wizard(&model).step, WizardStep::Confirm);
        model
    }

    #[test]
    fn test_failure_without_resources_is_inline() {
        let mut model = at_confirm();
        let command = press(&mut model, KeyCode::Enter);
        assert!(matches!(
            command,
            Command::Wizard(WizardCommand::Provision { step: ProvisionStep::CreateInstance, .. })
        ));
        step_done(&mut model, ProvisionStep::CreateInstance, Err(attach_failure()));

        let w = wizard(&model);
        assert_eq!(w.phase, WizardPhase::Editing);
        assert_eq!(w.step, WizardStep::Confirm);
        assert!(w.error.as_deref().unwrap().starts_with("Creating instance failed"));
    }

    #[test]
    fn test_partial_failure_records_what_the_step_created() {
        let mut model = at_confirm();
        press(&mut model, KeyCode::Enter);
        let gateway = LedgerEntry::new(ResourceKind::Gateway, "gw1", "", "GRA11");
        step_done(
            &mut model,
            ProvisionStep::CreateInstance,
            Err(ProvisionError::Partial {
                created: vec![gateway.clone()],
                source: Box::new(attach_failure()),
            }),
        );

        let w = wizard(&model);
        assert_eq!(w.ledger.entries(), [gateway]);
        let WizardPhase::CleanupPending { error } = &w.phase else {
            panic!("expected the cleanup prompt");
        };
        assert!(error.contains("HTTP 500"));
    }

    fn cleanup_pending() -> Model {
        let mut model = at_confirm();
        model
            .wizard
            .as_mut()
            .unwrap()
            .ledger
            .record(LedgerEntry::new(ResourceKind::SshKey, "k9", "desk", "GRA11"));
        press(&mut model, KeyCode::Enter);
        step_done(&mut model, ProvisionStep::CreateInstance, Err(attach_failure()));
        assert!(matches!(wizard(&model).phase, WizardPhase::CleanupPending { .. }));
        model
    }

    #[test]
    fn test_declining_cleanup_keeps_resources() {
        let mut model = cleanup_pending();
        let command = press(&mut model, KeyCode::Char('n'));

        assert!(model.wizard.is_none());
        assert_eq!(model.mode, Mode::Loading);
        assert_eq!(model.current_product, Product::Instances);
        assert!(command.any(&|c| matches!(c, Command::FetchResources { background: false, .. })));
        assert!(!command.any(&|c| matches!(c, Command::Wizard(WizardCommand::Cleanup { .. }))));
        assert_eq!(
            model.notification.as_ref().map(|n| n.kind),
            Some(NotificationKind::Info)
        );
    }

    #[test]
    fn test_accepted_cleanup_reports_then_leaves() {
        let mut model = cleanup_pending();
        let command = press(&mut model, KeyCode::Char('y'));
        let Command::Wizard(WizardCommand::Cleanup { run, project, entries }) = command else {
            panic!("expected a cleanup command");
        };
        assert_eq!(run, 1);
        assert_eq!(project, "p1");
        assert_eq!(entries.len(), 1);
        assert!(matches!(wizard(&model).phase, WizardPhase::CleaningUp { .. }));

        // Keys are ignored while cleanup runs.
        assert!(press(&mut model, KeyCode::Esc).is_none());

        let outcomes = vec![CleanupOutcome {
            entry: entries[0].clone(),
            error: None,
        }];
        handle_msg(&mut model, WizardMsg::CleanupFinished { run, outcomes });
        let w = wizard(&model);
        assert!(matches!(w.phase, WizardPhase::CleanupReport { ref outcomes, .. } if outcomes.len() == 1));
        assert!(w.ledger.is_empty());

        let command = press(&mut model, KeyCode::Enter);
        assert!(model.wizard.is_none());
        assert!(command.any(&|c| matches!(c, Command::FetchResources { .. })));
    }

    #[test]
    fn test_success_reloads_and_notifies() {
        let mut model = at_confirm();
        press(&mut model, KeyCode::Enter);
        let instance = LedgerEntry::new(ResourceKind::Instance, "vm1", "b2-7-gra11", "GRA11");
        let command = step_done(&mut model, ProvisionStep::CreateInstance, provisioning_output(vec![instance]));

        assert!(model.wizard.is_none());
        assert_eq!(model.mode, Mode::Loading);
        assert!(command.any(&|c| matches!(c, Command::FetchResources { .. })));
        assert!(command.any(&|c| matches!(c, Command::ExpireNotification { .. })));
        let note = model.notification.as_ref().unwrap();
        assert_eq!(note.kind, NotificationKind::Success);
        assert!(note.text.contains("b2-7-gra11"));
    }

    #[test]
    fn test_cancel_keeps_created_resources() {
        let mut model = at_network_step();
        model
            .wizard
            .as_mut()
            .unwrap()
            .ledger
            .record(LedgerEntry::new(ResourceKind::Network, "n9", "net", "GRA11"));
        press(&mut model, KeyCode::Char('q'));

        assert!(model.wizard.is_none());
        let note = model.notification.as_ref().unwrap();
        assert_eq!(note.kind, NotificationKind::Info);
        assert!(note.text.contains("n9"));
    }

    #[test]
    fn test_late_result_after_close_is_ignored() {
        let mut model = test_model();
        start(&mut model);
        press(&mut model, KeyCode::Esc);
        assert!(model.wizard.is_none());

        let command = handle_msg(
            &mut model,
            WizardMsg::SshKeyCreated {
                run: 1,
                result: Ok(ssh_key("k5", "late")),
            },
        );
        assert!(command.is_none());
        assert!(model.wizard.is_none());
    }
}
