//! Side effects requested by [`update`](crate::browser::update).
//!
//! A command is plain data so tests can assert which effect was asked for
//! without running it.

use std::time::Duration;

use crate::browser::model::Stamp;
use crate::browser::saga::{LedgerEntry, PollPolicy, ProvisionRequest, ProvisionStep, StepContext};
use crate::browser::wizard::WizardStamp;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub user: String,
    pub host: String,
}

impl SshTarget {
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

/// What to do once the terminal has been restored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitAction {
    Ssh(SshTarget),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    None,
    Batch(Vec<Command>),
    Quit { exit: Option<ExitAction> },

    // === Projects ===
    FetchProjects,
    SaveDefaultProject(String),

    // === Resources ===
    FetchResources { stamp: Stamp, background: bool },
    EnrichInstances { stamp: Stamp, regions: Vec<String> },
    FetchDetail { stamp: Stamp, id: String, path: String },
    DeleteResource { stamp: Stamp, name: String, path: String },

    // === Timers ===
    ScheduleRefresh { stamp: Stamp, generation: u64, delay: Duration },
    ExpireNotification { id: u64, delay: Duration },

    // === Local effects ===
    CopyToClipboard { text: String, label: String },
    Ssh(SshTarget),

    Wizard(WizardCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardCommand {
    LoadStep {
        stamp: WizardStamp,
        project: String,
        region: String,
        os_type: Option<String>,
    },
    CreateSshKey {
        run: u64,
        project: String,
        region: String,
        name: String,
        public_key: String,
    },
    CreateNetwork {
        run: u64,
        project: String,
        region: String,
        name: String,
        vlan_id: Option<u16>,
    },
    Provision {
        run: u64,
        step: ProvisionStep,
        request: Box<ProvisionRequest>,
        context: StepContext,
        poll: PollPolicy,
    },
    Cleanup {
        run: u64,
        project: String,
        entries: Vec<LedgerEntry>,
    },
}

impl Command {
    /// Combine commands, dropping `None`s and flattening nested batches.
    pub fn batch(commands: impl IntoIterator<Item = Self>) -> Self {
        let mut flat: Vec<Self> = commands
            .into_iter()
            .flat_map(Self::into_leaves)
            .collect();
        match flat.len() {
            0 => Self::None,
            1 => flat.remove(0),
            _ => Self::Batch(flat),
        }
    }

    /// Leaf commands in dispatch order.
    pub fn into_leaves(self) -> Vec<Self> {
        match self {
            Self::None => Vec::new(),
            Self::Batch(commands) => commands.into_iter().flat_map(Self::into_leaves).collect(),
            leaf => vec![leaf],
        }
    }

    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Whether this command, or one in its batch, satisfies `pred`.
    pub fn any(&self, pred: &impl Fn(&Self) -> bool) -> bool {
        match self {
            Self::Batch(commands) => commands.iter().any(|c| c.any(pred)),
            leaf => pred(leaf),
        }
    }
}

impl From<WizardCommand> for Command {
    fn from(command: WizardCommand) -> Self {
        Self::Wizard(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_flattens() {
        assert_eq!(Command::batch([]), Command::None);
        assert_eq!(
            Command::batch([Command::None, Command::FetchProjects]),
            Command::FetchProjects
        );
        let nested = Command::batch([
            Command::Batch(vec![Command::FetchProjects, Command::None]),
            Command::SaveDefaultProject("p".into()),
        ]);
        assert_eq!(
            nested,
            Command::Batch(vec![
                Command::FetchProjects,
                Command::SaveDefaultProject("p".into())
            ])
        );
        assert!(nested.any(&|c| matches!(c, Command::SaveDefaultProject(_))));
    }
}
