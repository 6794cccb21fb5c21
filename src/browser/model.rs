use std::sync::Arc;
use std::time::Duration;

use crate::browser::resource::{Product, Resource};
use crate::browser::saga::PollPolicy;
use crate::browser::wizard::WizardData;
use crate::config::{BrowserConfig, KeyResolver};
use crate::debug::DebugLog;
use crate::search::Matcher;

/// Mutually exclusive view states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    ProjectSelect,
    Table,
    Detail,
    Loading,
    Error,
    Empty,
    Wizard,
    DeleteConfirm,
    Debug,
}

/// Identity of a product fetch, checked when its result arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    pub project: String,
    pub product: Product,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub text: String,
    pub kind: NotificationKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub active: bool,
    pub input: String,
}

#[derive(Debug, Clone)]
pub struct DeleteTarget {
    pub product: Product,
    pub resource: Resource,
    pub path: String,
    pub return_mode: Mode,
}

/// Tunables taken from `[browser]`.
#[derive(Debug, Clone)]
pub struct Settings {
    pub refresh_interval: Duration,
    pub notification_ttl: Duration,
    pub ssh_user: String,
    pub poll: PollPolicy,
}

impl From<&BrowserConfig> for Settings {
    fn from(config: &BrowserConfig) -> Self {
        Self {
            refresh_interval: config.refresh_interval(),
            notification_ttl: config.notification_ttl(),
            ssh_user: config.ssh_user.clone(),
            poll: PollPolicy {
                interval: config.ip_poll_interval(),
                attempts: config.ip_poll_attempts,
            },
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from(&BrowserConfig::default())
    }
}

/// The complete browser state.
pub struct Model {
    pub mode: Mode,
    pub loading_label: String,

    pub project: Option<String>,
    pub projects: Vec<Project>,

    pub current_product: Product,
    pub current_data: Vec<Resource>,
    /// Product `current_data` was fetched for.
    pub data_product: Option<Product>,
    pub detail_data: Option<Resource>,
    pub pending_detail: Option<String>,
    pub selected: usize,
    pub filter: Filter,

    pub wizard: Option<WizardData>,
    pub wizard_runs: u64,
    pub delete_target: Option<DeleteTarget>,

    pub notification: Option<Notification>,
    pub error: Option<String>,

    pub debug_log: Arc<DebugLog>,
    pub debug_return: Mode,
    pub debug_scroll: usize,

    /// Bumped on every foreground instance load; older refresh timers see a
    /// different value and stop.
    pub refresh_generation: u64,

    pub settings: Settings,
    pub keys: Arc<KeyResolver>,
    notification_seq: u64,
}

impl Model {
    pub fn new(
        settings: Settings,
        keys: Arc<KeyResolver>,
        debug_log: Arc<DebugLog>,
        project: Option<String>,
    ) -> Self {
        Self {
            mode: Mode::Loading,
            loading_label: String::new(),
            project,
            projects: Vec::new(),
            current_product: Product::Instances,
            current_data: Vec::new(),
            data_product: None,
            detail_data: None,
            pending_detail: None,
            selected: 0,
            filter: Filter::default(),
            wizard: None,
            wizard_runs: 0,
            delete_target: None,
            notification: None,
            error: None,
            debug_log,
            debug_return: Mode::Loading,
            debug_scroll: 0,
            refresh_generation: 0,
            settings,
            keys,
            notification_seq: 0,
        }
    }

    pub fn stamp(&self) -> Option<Stamp> {
        self.project.as_ref().map(|project| Stamp {
            project: project.clone(),
            product: self.current_product,
        })
    }

    pub fn is_current(&self, stamp: &Stamp) -> bool {
        self.project.as_deref() == Some(stamp.project.as_str())
            && self.current_product == stamp.product
    }

    pub fn has_cached_table(&self) -> bool {
        self.data_product == Some(self.current_product)
    }

    /// The mode that is active underneath the debug overlay.
    pub const fn effective_mode(&self) -> Mode {
        match self.mode {
            Mode::Debug => self.debug_return,
            mode => mode,
        }
    }

    /// Indices into `current_data` that pass the filter.
    pub fn visible_indices(&self) -> Vec<usize> {
        if !self.has_cached_table() {
            return Vec::new();
        }
        Matcher::new().filter_indices(&self.current_data, &self.filter.input, Resource::haystack)
    }

    pub fn visible_rows(&self) -> Vec<&Resource> {
        self.visible_indices()
            .into_iter()
            .map(|i| &self.current_data[i])
            .collect()
    }

    /// The resource an action applies to: the detail view's, else the
    /// highlighted row.
    pub fn selected_resource(&self) -> Option<&Resource> {
        match self.effective_mode() {
            Mode::Detail => self.detail_data.as_ref(),
            _ => self
                .visible_indices()
                .get(self.selected)
                .map(|&i| &self.current_data[i]),
        }
    }

    /// Row count of whatever list the cursor moves over.
    pub fn row_count(&self) -> usize {
        match self.mode {
            Mode::ProjectSelect => self.projects.len(),
            _ => self.visible_indices().len(),
        }
    }

    pub fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.row_count().saturating_sub(1));
    }

    pub const fn next_notification_id(&mut self) -> u64 {
        self.notification_seq += 1;
        self.notification_seq
    }
}

#[cfg(test)]
pub(crate) fn test_model() -> Model {
    Model::new(
        Settings::default(),
        Arc::new(KeyResolver::default()),
        Arc::new(DebugLog::new(10)),
        Some("p1".to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::resource::row;

    #[test]
    fn test_visible_rows_follow_filter() {
        let mut model = test_model();
        model.current_data = vec![
            row(Product::Instances, "1", "api"),
            row(Product::Instances, "2", "web-1"),
            row(Product::Instances, "3", "web-2"),
        ];
        model.data_product = Some(Product::Instances);
        model.mode = Mode::Table;

        assert_eq!(model.visible_indices(), vec![0, 1, 2]);
        model.filter.input = "web".into();
        assert_eq!(model.visible_indices(), vec![1, 2]);
        model.selected = 1;
        assert_eq!(model.selected_resource().map(|r| r.id.as_str()), Some("3"));

        model.filter.input = "zzz".into();
        model.clamp_selection();
        assert_eq!(model.selected, 0);
        assert!(model.selected_resource().is_none());
        assert_eq!(model.current_data.len(), 3);
    }

    #[test]
    fn test_rows_hidden_for_other_product() {
        let mut model = test_model();
        model.current_data = vec![row(Product::Instances, "1", "api")];
        model.data_product = Some(Product::Instances);
        model.current_product = Product::SshKeys;
        assert!(model.visible_rows().is_empty());
    }

    #[test]
    fn test_stamp_matching() {
        let mut model = test_model();
        let stamp = model.stamp().unwrap();
        assert!(model.is_current(&stamp));
        model.current_product = Product::Networks;
        assert!(!model.is_current(&stamp));
        model.current_product = Product::Instances;
        model.project = Some("p2".into());
        assert!(!model.is_current(&stamp));
    }
}
