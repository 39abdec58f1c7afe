/**
 * Clients for the dashboard backend: the connector
 *  directory plus the search and scan endpoints.
 */
pub mod backend;
/**
 * Local console API. Also holds the request types
 *  the CLI uses to talk to it.
 */
pub mod http_server;
/**
 * Polls a scan run until it finishes and keeps the
 *  outcome in the durable store.
 */
pub mod scan_monitor;
/**
 * Keyword, pattern and scan searches over the
 *  configured connectors.
 */
pub mod search;
/**
 * The connector onboarding wizard.
 */
pub mod setup_flow;

mod config;
mod process;
mod state;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use config::{Config as ServiceConfig, DEFAULT_BACKEND_URL, DEFAULT_HTTP_PORT};
pub use process::spawn_service;
pub use scan_monitor::{MonitorConfig, MonitorError, ScanMonitor};
pub use search::{SearchError, SearchSession, SearchView};
pub use setup_flow::{ConnectorSetupFlow, SetupError, WizardView};
pub use state::{State as ServiceState, StateSetupError as ServiceStateSetupError};
