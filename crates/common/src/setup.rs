//! Onboarding step derivation.
//!
//! The wizard never remembers where it was: the step is recomputed from
//!  the connector directory and the dashboard-data check every time it is
//!  loaded, which is what makes an interrupted setup resumable.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::connector::{Connector, ConnectorStatus, MAX_CONNECTORS};

/// Which step of the onboarding wizard to present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", content = "data", rename_all = "kebab-case")]
pub enum SetupStep {
    /// Nothing reconciled yet
    None,
    /// Brand new install, pick a cloud and create a connector
    Create,
    /// Connector exists, its container still has to be deployed
    Deploy(Connector),
    /// Connector is deployed and waiting for credentials
    Configure(Connector),
    /// Connector is configured, the initial sync has not produced data yet
    Sync(Connector),
    /// Connector reports a state the wizard cannot continue from
    Error(Connector),
    /// One connected connector, offer to add the other cloud
    ExistingPrompt(Connector),
    /// Every supported cloud is connected
    Full(Vec<Connector>),
}

impl SetupStep {
    pub fn name(&self) -> &'static str {
        match self {
            SetupStep::None => "none",
            SetupStep::Create => "create",
            SetupStep::Deploy(_) => "deploy",
            SetupStep::Configure(_) => "configure",
            SetupStep::Sync(_) => "sync",
            SetupStep::Error(_) => "error",
            SetupStep::ExistingPrompt(_) => "existing-prompt",
            SetupStep::Full(_) => "full",
        }
    }

    /// The single connector this step acts on, if any
    pub fn connector(&self) -> Option<&Connector> {
        match self {
            SetupStep::Deploy(c)
            | SetupStep::Configure(c)
            | SetupStep::Sync(c)
            | SetupStep::Error(c)
            | SetupStep::ExistingPrompt(c) => Some(c),
            SetupStep::None | SetupStep::Create | SetupStep::Full(_) => None,
        }
    }
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Step implied by a connector that has not reached `connected`
fn pending_step(connector: &Connector) -> Option<SetupStep> {
    let step = match connector.status {
        ConnectorStatus::Connected => return None,
        ConnectorStatus::Created => SetupStep::Deploy(connector.clone()),
        ConnectorStatus::NeedsConfiguration => SetupStep::Configure(connector.clone()),
        ConnectorStatus::Error | ConnectorStatus::Configured | ConnectorStatus::Unknown(_) => {
            SetupStep::Error(connector.clone())
        }
    };
    Some(step)
}

/// Derive the wizard step from the directory listing and whether aggregate
///  dashboard data exists.
///
/// Pure: the same inputs always produce the same step. A connector that is
///  not yet connected decides the step on its own and the dashboard flag is
///  not consulted at all.
pub fn derive_setup_step(connectors: &[Connector], dashboard_data_exists: bool) -> SetupStep {
    if let Some(step) = connectors.iter().find_map(pending_step) {
        return step;
    }

    match (dashboard_data_exists, connectors) {
        (false, []) => SetupStep::Create,
        (false, [first, ..]) => SetupStep::Sync(first.clone()),
        (true, []) => SetupStep::Create,
        (true, [only]) => SetupStep::ExistingPrompt(only.clone()),
        (true, all) => {
            if all.len() > MAX_CONNECTORS {
                tracing::warn!(
                    "{} connectors listed, more than the {} supported cloud types",
                    all.len(),
                    MAX_CONNECTORS
                );
            }
            SetupStep::Full(all.to_vec())
        }
    }
}
