//! Messages consumed by [`update`](crate::browser::update).

use crossterm::event::KeyEvent;

use crate::api::ApiError;
use crate::browser::model::{Project, Stamp};
use crate::browser::resource::{EnrichmentLookups, Resource};
use crate::browser::saga::{CleanupOutcome, ProvisionError, ProvisionStep, StepOutput};
use crate::browser::wizard::{PrivateNetwork, SshKey, StepOptions, WizardStamp};

#[derive(Debug, Clone)]
pub enum Msg {
    // === Input ===
    Key(KeyEvent),
    Paste(String),

    // === Projects ===
    ProjectsLoaded(Result<Vec<Project>, ApiError>),
    DefaultProjectSaved(Result<(), String>),

    // === Resources ===
    ResourcesLoaded {
        stamp: Stamp,
        background: bool,
        result: Result<Vec<Resource>, ApiError>,
    },
    InstancesEnriched {
        stamp: Stamp,
        lookups: EnrichmentLookups,
    },
    DetailLoaded {
        stamp: Stamp,
        id: String,
        result: Result<Resource, ApiError>,
    },
    ResourceDeleted {
        stamp: Stamp,
        name: String,
        result: Result<(), ApiError>,
    },

    // === Timers ===
    RefreshTick {
        stamp: Stamp,
        generation: u64,
    },
    ClearNotification {
        id: u64,
    },

    // === Local effects ===
    ClipboardCopied(Result<String, String>),
    SshFinished(Result<(), String>),

    Wizard(WizardMsg),
}

#[derive(Debug, Clone)]
pub enum WizardMsg {
    StepLoaded {
        stamp: WizardStamp,
        result: Result<StepOptions, ApiError>,
    },
    SshKeyCreated {
        run: u64,
        result: Result<SshKey, ApiError>,
    },
    NetworkCreated {
        run: u64,
        result: Result<PrivateNetwork, ApiError>,
    },
    ProvisionStepDone {
        run: u64,
        step: ProvisionStep,
        result: Result<StepOutput, ProvisionError>,
    },
    CleanupFinished {
        run: u64,
        outcomes: Vec<CleanupOutcome>,
    },
}

impl From<WizardMsg> for Msg {
    fn from(msg: WizardMsg) -> Self {
        Self::Wizard(msg)
    }
}
