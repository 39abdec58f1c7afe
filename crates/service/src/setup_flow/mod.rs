//! Connector onboarding wizard.
//!
//! The step shown is always derived from what the connector directory
//!  reports (see [`derive_setup_step`]); the only things remembered
//!  locally are the cloud selection, the in-progress flag and the last
//!  error message. Every submit is gated on the current step, so an
//!  operation can never run from a step it does not belong to.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use common::prelude::*;

use crate::backend::{BackendError, ConnectorDirectory};

const CREATE_FAILED: &str = "Failed to create connector";
const CONFIGURE_FAILED: &str = "Failed to configure connector";
const SYNC_FAILED: &str = "Sync failed. Please try again.";
const DELETE_FAILED: &str = "Failed to delete connector";

/// What the wizard currently presents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardView {
    pub step: SetupStep,
    /// Cloud the next create call is issued for
    pub selected_kind: CloudKind,
    /// Selection is fixed while adding the missing cloud
    pub kind_locked: bool,
    pub in_progress: bool,
    /// Message from the last failed submit, cleared by the next one
    pub error: Option<String>,
    /// The initial sync finished and setup is done
    pub completed: bool,
}

impl Default for WizardView {
    fn default() -> Self {
        Self {
            step: SetupStep::None,
            selected_kind: CloudKind::default(),
            kind_locked: false,
            in_progress: false,
            error: None,
            completed: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("cannot {operation} from the {step} step")]
    InvalidTransition {
        operation: &'static str,
        step: &'static str,
    },
    #[error("another setup operation is already in progress")]
    Busy,
    #[error("connector type is locked to {0}")]
    KindLocked(CloudKind),
    #[error("invalid credentials: {0}")]
    Credentials(#[from] CredentialError),
    #[error("deleting connector {0} must be confirmed")]
    ConfirmationRequired(String),
    #[error("unknown connector: {0}")]
    UnknownConnector(String),
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl SetupError {
    fn invalid(operation: &'static str, view: &WizardView) -> Self {
        SetupError::InvalidTransition {
            operation,
            step: view.step.name(),
        }
    }

    /// Raised before any request was issued
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            SetupError::Credentials(_)
                | SetupError::ConfirmationRequired(_)
                | SetupError::UnknownConnector(_)
        )
    }
}

/// Clears the in-progress flag when the submit settles, however it settles
struct InFlight<'a> {
    wizard: &'a Mutex<WizardView>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.wizard.lock().in_progress = false;
    }
}

pub struct ConnectorSetupFlow {
    directory: Arc<dyn ConnectorDirectory>,
    wizard: Mutex<WizardView>,
}

impl ConnectorSetupFlow {
    pub fn new(directory: Arc<dyn ConnectorDirectory>) -> Self {
        Self {
            directory,
            wizard: Mutex::new(WizardView::default()),
        }
    }

    pub fn view(&self) -> WizardView {
        self.wizard.lock().clone()
    }

    /// Re-derive the step from the directory and the dashboard-data check.
    ///
    /// Both requests are issued together. On failure the step is left as
    ///  it was and the error is surfaced.
    pub async fn reconcile(&self) -> Result<WizardView, SetupError> {
        let (guard, ()) = self.begin("reconcile", |_| Ok(()))?;

        let (connectors, dashboard_data) = tokio::join!(
            self.directory.list_connectors(),
            self.directory.dashboard_data_exists()
        );

        let result = match (connectors, dashboard_data) {
            (Ok(connectors), Ok(dashboard_data)) => {
                let step = derive_setup_step(&connectors, dashboard_data);
                tracing::info!(
                    step = %step,
                    connectors = connectors.len(),
                    dashboard_data,
                    "reconciled setup step"
                );

                let mut wizard = self.wizard.lock();
                if let Some(connector) = step.connector() {
                    wizard.selected_kind = connector.kind();
                }
                wizard.step = step;
                wizard.kind_locked = false;
                wizard.completed = false;
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!("error reconciling setup: {}", e);
                Err(e.into())
            }
        };

        self.settle(guard, result)
    }

    pub fn select_kind(&self, kind: CloudKind) -> Result<WizardView, SetupError> {
        self.transition(|wizard| {
            if !matches!(wizard.step, SetupStep::Create) {
                return Err(SetupError::invalid("select a cloud", wizard));
            }
            if wizard.kind_locked && wizard.selected_kind != kind {
                return Err(SetupError::KindLocked(wizard.selected_kind));
            }
            wizard.selected_kind = kind;
            Ok(())
        })
    }

    /// Create a connector for the selected cloud.
    ///
    /// Only an explicit `201 Created` counts as success.
    pub async fn create(&self) -> Result<WizardView, SetupError> {
        let (guard, kind) = self.begin("create", |wizard| match wizard.step {
            SetupStep::Create => Ok(wizard.selected_kind),
            _ => Err(SetupError::invalid("create", wizard)),
        })?;

        let result = match self.directory.create_connector(kind).await {
            Ok(outcome) if outcome.status == http::StatusCode::CREATED => match outcome.connector {
                Some(created) => {
                    let name = if created.name.is_empty() {
                        kind.as_str().to_string()
                    } else {
                        created.name
                    };
                    let connector = Connector {
                        id: created.id,
                        connector_type: created.connector_type,
                        name,
                        status: ConnectorStatus::Created,
                    };
                    tracing::info!(connector_id = %connector.id, kind = %kind, "created connector");
                    self.wizard.lock().step = SetupStep::Deploy(connector);
                    Ok(())
                }
                None => Err(SetupError::Rejected(
                    outcome.message.unwrap_or_else(|| CREATE_FAILED.to_string()),
                )),
            },
            Ok(outcome) => {
                tracing::warn!(status = %outcome.status, "create connector was not accepted");
                Err(SetupError::Rejected(
                    outcome.message.unwrap_or_else(|| CREATE_FAILED.to_string()),
                ))
            }
            Err(e) => Err(e.into()),
        };

        self.settle(guard, result)
    }

    /// The operator confirmed the connector container was deployed
    pub fn acknowledge_deployment(&self) -> Result<WizardView, SetupError> {
        self.transition(|wizard| match &wizard.step {
            SetupStep::Deploy(connector) => {
                wizard.step = SetupStep::Configure(connector.clone());
                Ok(())
            }
            _ => Err(SetupError::invalid("acknowledge deployment", wizard)),
        })
    }

    /// Submit credentials for the connector being configured.
    ///
    /// The form is validated before anything is sent; a blank field or a
    ///  form for the wrong cloud leaves the wizard untouched.
    pub async fn configure(&self, form: CredentialForm) -> Result<WizardView, SetupError> {
        let (guard, connector) = self.begin("configure", |wizard| match &wizard.step {
            SetupStep::Configure(connector) => {
                form.validate_for(connector.connector_type)?;
                Ok(connector.clone())
            }
            _ => Err(SetupError::invalid("configure", wizard)),
        })?;

        let body = form.encode();
        let result = match self
            .directory
            .configure_connector(&connector.id, &body)
            .await
        {
            Ok(response) if response.is_updated() => {
                tracing::info!(connector_id = %connector.id, "configured connector");
                self.wizard.lock().step = SetupStep::Sync(connector);
                Ok(())
            }
            Ok(response) => Err(SetupError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| CONFIGURE_FAILED.to_string()),
            )),
            Err(e) => Err(e.into()),
        };

        self.settle(guard, result)
    }

    /// Run the initial sync; setup is complete once it reports `completed`
    pub async fn sync(&self) -> Result<WizardView, SetupError> {
        let (guard, connector) = self.begin("sync", |wizard| match &wizard.step {
            SetupStep::Sync(connector) => Ok(connector.clone()),
            _ => Err(SetupError::invalid("sync", wizard)),
        })?;

        let result = match self.directory.sync_connector(&connector.id).await {
            Ok(response) if response.is_completed() => {
                tracing::info!(connector_id = %connector.id, "initial sync completed");
                self.wizard.lock().completed = true;
                Ok(())
            }
            Ok(response) => Err(SetupError::Rejected(
                response.message.unwrap_or_else(|| SYNC_FAILED.to_string()),
            )),
            Err(e) => Err(e.into()),
        };

        self.settle(guard, result)
    }

    /// Start creating a connector for the cloud that is not connected yet
    pub fn add_missing_kind(&self) -> Result<WizardView, SetupError> {
        self.transition(|wizard| match &wizard.step {
            SetupStep::ExistingPrompt(existing) => {
                wizard.selected_kind = existing.kind().complement();
                wizard.kind_locked = true;
                wizard.step = SetupStep::Create;
                Ok(())
            }
            _ => Err(SetupError::invalid("add the missing cloud", wizard)),
        })
    }

    /// Re-enter configuration for an already connected connector
    pub fn edit(&self, connector_id: &str) -> Result<WizardView, SetupError> {
        self.transition(|wizard| {
            let SetupStep::Full(connectors) = &wizard.step else {
                return Err(SetupError::invalid("edit", wizard));
            };
            let connector = connectors
                .iter()
                .find(|c| c.id == connector_id)
                .cloned()
                .ok_or_else(|| SetupError::UnknownConnector(connector_id.to_string()))?;
            wizard.selected_kind = connector.kind();
            wizard.step = SetupStep::Configure(connector);
            Ok(())
        })
    }

    /// Delete a connector, then start over from what the directory reports
    pub async fn delete(&self, connector_id: &str, confirmed: bool) -> Result<WizardView, SetupError> {
        let (guard, ()) = self.begin("delete", |wizard| {
            let known = match &wizard.step {
                SetupStep::Full(connectors) => connectors.iter().any(|c| c.id == connector_id),
                SetupStep::ExistingPrompt(connector) => connector.id == connector_id,
                _ => return Err(SetupError::invalid("delete", wizard)),
            };
            if !confirmed {
                return Err(SetupError::ConfirmationRequired(connector_id.to_string()));
            }
            if !known {
                return Err(SetupError::UnknownConnector(connector_id.to_string()));
            }
            Ok(())
        })?;

        let result = match self.directory.delete_connector(connector_id).await {
            Ok(response) if response.acknowledged => Ok(()),
            Ok(response) => Err(SetupError::Rejected(
                response.message.unwrap_or_else(|| DELETE_FAILED.to_string()),
            )),
            Err(e) => Err(e.into()),
        };
        self.settle(guard, result)?;

        tracing::info!(connector_id, "deleted connector");
        *self.wizard.lock() = WizardView::default();
        self.reconcile().await
    }

    /// Claim the wizard for a submit, after `accept` checked the step
    fn begin<T>(
        &self,
        operation: &'static str,
        accept: impl FnOnce(&WizardView) -> Result<T, SetupError>,
    ) -> Result<(InFlight<'_>, T), SetupError> {
        let mut wizard = self.wizard.lock();
        if wizard.in_progress {
            tracing::debug!(operation, "rejected while another submit is running");
            return Err(SetupError::Busy);
        }
        let value = accept(&wizard)?;
        wizard.in_progress = true;
        wizard.error = None;
        Ok((
            InFlight {
                wizard: &self.wizard,
            },
            value,
        ))
    }

    fn settle(&self, guard: InFlight<'_>, result: Result<(), SetupError>) -> Result<WizardView, SetupError> {
        drop(guard);
        match result {
            Ok(()) => Ok(self.view()),
            Err(e) => {
                self.wizard.lock().error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Local transition, no request involved
    fn transition(
        &self,
        apply: impl FnOnce(&mut WizardView) -> Result<(), SetupError>,
    ) -> Result<WizardView, SetupError> {
        let mut wizard = self.wizard.lock();
        if wizard.in_progress {
            return Err(SetupError::Busy);
        }
        apply(&mut wizard)?;
        wizard.error = None;
        Ok(wizard.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{connector, FakeDirectory};
    use http::StatusCode;

    fn flow(directory: &Arc<FakeDirectory>) -> ConnectorSetupFlow {
        ConnectorSetupFlow::new(directory.clone())
    }

    fn s3_form() -> CredentialForm {
        CredentialForm::S3(S3Credentials {
            buckets: "finance reports".to_string(),
            aws_access_key_id: "AKIAEXAMPLE".to_string(),
            aws_secret_access_key: "se/cr+et=".to_string(),
        })
    }

    #[tokio::test]
    async fn test_fresh_install_creates_then_deploys() {
        let directory = Arc::new(FakeDirectory::new(vec![], false));
        let flow = flow(&directory);

        let view = flow.reconcile().await.unwrap();
        assert_eq!(view.step, SetupStep::Create);
        assert_eq!(directory.calls(), vec!["list", "dashboard"]);

        flow.select_kind(CloudKind::Aws).unwrap();
        let view = flow.create().await.unwrap();

        let SetupStep::Deploy(created) = &view.step else {
            panic!("expected deploy step, got {}", view.step);
        };
        assert_eq!(created.id, "c1");
        assert_eq!(created.connector_type, ConnectorType::S3);
        assert_eq!(created.name, "AWS");
        assert!(!view.in_progress);
        assert!(view.error.is_none());

        let view = flow.acknowledge_deployment().unwrap();
        assert!(matches!(view.step, SetupStep::Configure(ref c) if c.id == "c1"));
    }

    #[tokio::test]
    async fn test_pending_connector_resumes_at_configure() {
        let directory = Arc::new(FakeDirectory::new(
            vec![connector(
                "c1",
                ConnectorType::S3,
                ConnectorStatus::NeedsConfiguration,
            )],
            true,
        ));
        let flow = flow(&directory);

        let view = flow.reconcile().await.unwrap();
        let SetupStep::Configure(target) = &view.step else {
            panic!("expected configure step, got {}", view.step);
        };
        assert_eq!(target.id, "c1");
        assert_eq!(view.selected_kind, CloudKind::Aws);
        assert_eq!(directory.call_count("create"), 0);

        let view = flow.configure(s3_form()).await.unwrap();
        assert!(matches!(view.step, SetupStep::Sync(ref c) if c.id == "c1"));

        let body = directory.last_configuration().unwrap();
        assert_eq!(body.connector_type, ConnectorType::S3);
        assert_eq!(body.fields["aws_secret_access_key"], "se%2Fcr%2Bet%3D");

        let view = flow.sync().await.unwrap();
        assert!(view.completed);

        let view = flow.reconcile().await.unwrap();
        assert!(matches!(view.step, SetupStep::ExistingPrompt(ref c) if c.id == "c1"));
    }

    #[tokio::test]
    async fn test_delete_from_full_recomputes_step() {
        let directory = Arc::new(FakeDirectory::new(
            vec![
                connector("c1", ConnectorType::S3, ConnectorStatus::Connected),
                connector(
                    "c2",
                    ConnectorType::AzureBlobStorage,
                    ConnectorStatus::Connected,
                ),
            ],
            true,
        ));
        let flow = flow(&directory);

        let view = flow.reconcile().await.unwrap();
        assert!(matches!(view.step, SetupStep::Full(ref all) if all.len() == 2));

        let err = flow.delete("c2", false).await.unwrap_err();
        assert!(matches!(err, SetupError::ConfirmationRequired(ref id) if id == "c2"));
        assert_eq!(directory.call_count("delete"), 0);
        assert!(flow.view().error.is_none());

        let view = flow.delete("c2", true).await.unwrap();
        assert!(matches!(view.step, SetupStep::ExistingPrompt(ref c) if c.id == "c1"));
        assert_eq!(directory.call_count("list"), 2);
    }

    #[tokio::test]
    async fn test_create_requires_201() {
        let directory = Arc::new(FakeDirectory::new(vec![], false));
        directory.set_create_status(StatusCode::OK);
        let flow = flow(&directory);
        flow.reconcile().await.unwrap();

        let err = flow.create().await.unwrap_err();
        assert!(matches!(err, SetupError::Rejected(_)));

        let view = flow.view();
        assert_eq!(view.step, SetupStep::Create);
        assert_eq!(view.error.as_deref(), Some("connector could not be created"));
        assert!(!view.in_progress);
    }

    #[tokio::test]
    async fn test_reconcile_failure_keeps_step() {
        let directory = Arc::new(FakeDirectory::new(vec![], false));
        let flow = flow(&directory);
        flow.reconcile().await.unwrap();

        directory.fail_next("dashboard", BackendError::Transport("connection refused".into()));
        let err = flow.reconcile().await.unwrap_err();
        assert!(matches!(err, SetupError::Backend(BackendError::Transport(_))));

        let view = flow.view();
        assert_eq!(view.step, SetupStep::Create);
        assert!(view.error.unwrap().contains("connection refused"));
        assert!(!view.in_progress);
    }

    #[tokio::test]
    async fn test_blank_credentials_are_rejected_before_sending() {
        let directory = Arc::new(FakeDirectory::new(
            vec![connector(
                "c1",
                ConnectorType::S3,
                ConnectorStatus::NeedsConfiguration,
            )],
            false,
        ));
        let flow = flow(&directory);
        flow.reconcile().await.unwrap();
        let before = flow.view();

        let blank = CredentialForm::S3(S3Credentials {
            buckets: "b".to_string(),
            aws_access_key_id: " ".to_string(),
            aws_secret_access_key: "s".to_string(),
        });
        let err = flow.configure(blank).await.unwrap_err();
        assert!(err.is_user_error());

        let azure = CredentialForm::AzureBlobStorage(AzureCredentials::default());
        let err = flow.configure(azure).await.unwrap_err();
        assert!(matches!(
            err,
            SetupError::Credentials(CredentialError::TypeMismatch { .. })
        ));

        assert_eq!(directory.call_count("configure"), 0);
        assert_eq!(flow.view(), before);
    }

    #[tokio::test]
    async fn test_configure_not_updated_stays_on_step() {
        let directory = Arc::new(FakeDirectory::new(
            vec![connector(
                "c1",
                ConnectorType::S3,
                ConnectorStatus::NeedsConfiguration,
            )],
            false,
        ));
        directory.set_configure_result("noop");
        let flow = flow(&directory);
        flow.reconcile().await.unwrap();

        let err = flow.configure(s3_form()).await.unwrap_err();
        assert!(matches!(err, SetupError::Rejected(_)));
        let view = flow.view();
        assert!(matches!(view.step, SetupStep::Configure(_)));
        assert!(view.error.is_some());

        // a successful resubmit clears the previous error
        directory.set_configure_result("updated");
        let view = flow.configure(s3_form()).await.unwrap();
        assert!(matches!(view.step, SetupStep::Sync(_)));
        assert!(view.error.is_none());
    }

    #[tokio::test]
    async fn test_sync_not_completed_surfaces_message() {
        let directory = Arc::new(FakeDirectory::new(
            vec![connector("c1", ConnectorType::S3, ConnectorStatus::Connected)],
            false,
        ));
        directory.set_sync_status("in_progress");
        let flow = flow(&directory);

        let view = flow.reconcile().await.unwrap();
        assert!(matches!(view.step, SetupStep::Sync(_)));

        assert!(flow.sync().await.is_err());
        let view = flow.view();
        assert!(!view.completed);
        assert_eq!(view.error.as_deref(), Some("sync did not complete"));
    }

    #[tokio::test]
    async fn test_add_missing_kind_locks_selection() {
        let directory = Arc::new(FakeDirectory::new(
            vec![connector("c1", ConnectorType::S3, ConnectorStatus::Connected)],
            true,
        ));
        let flow = flow(&directory);
        flow.reconcile().await.unwrap();

        let view = flow.add_missing_kind().unwrap();
        assert_eq!(view.step, SetupStep::Create);
        assert_eq!(view.selected_kind, CloudKind::Azure);
        assert!(view.kind_locked);

        assert!(matches!(
            flow.select_kind(CloudKind::Aws),
            Err(SetupError::KindLocked(CloudKind::Azure))
        ));

        let view = flow.create().await.unwrap();
        assert!(
            matches!(view.step, SetupStep::Deploy(ref c) if c.connector_type == ConnectorType::AzureBlobStorage)
        );
    }

    #[tokio::test]
    async fn test_edit_only_known_connectors() {
        let directory = Arc::new(FakeDirectory::new(
            vec![
                connector("c1", ConnectorType::S3, ConnectorStatus::Connected),
                connector(
                    "c2",
                    ConnectorType::AzureBlobStorage,
                    ConnectorStatus::Connected,
                ),
            ],
            true,
        ));
        let flow = flow(&directory);
        flow.reconcile().await.unwrap();

        assert!(matches!(
            flow.edit("c9"),
            Err(SetupError::UnknownConnector(ref id)) if id == "c9"
        ));

        let view = flow.edit("c2").unwrap();
        assert!(matches!(view.step, SetupStep::Configure(ref c) if c.id == "c2"));
        assert_eq!(view.selected_kind, CloudKind::Azure);
    }

    #[tokio::test]
    async fn test_operations_are_gated_on_step() {
        let directory = Arc::new(FakeDirectory::new(vec![], false));
        let flow = flow(&directory);

        assert!(matches!(
            flow.create().await,
            Err(SetupError::InvalidTransition { step: "none", .. })
        ));

        flow.reconcile().await.unwrap();
        assert!(matches!(
            flow.acknowledge_deployment(),
            Err(SetupError::InvalidTransition { step: "create", .. })
        ));
        assert!(matches!(
            flow.sync().await,
            Err(SetupError::InvalidTransition { .. })
        ));
        assert_eq!(directory.call_count("sync"), 0);
    }
}
