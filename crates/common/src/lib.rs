/**
 * Connectors as the directory reports them.
 *  - Storage types and lifecycle statuses
 *  - The cloud selection offered at creation
 */
pub mod connector;
/**
 * Credential forms submitted while configuring
 *  a connector, and their encoded wire body.
 */
pub mod credentials;
/**
 * Scan run status and the snapshot the
 *  monitor exposes.
 */
pub mod scan;
/**
 * Search modes and the tagged search hits
 *  produced from backend records.
 */
pub mod search;
/**
 * Pure derivation of the onboarding step from
 *  server reported state.
 */
pub mod setup;
/**
 * Durable key/value store for state that has
 *  to survive a restart.
 */
pub mod store;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::connector::{CloudKind, Connector, ConnectorStatus, ConnectorType};
    pub use crate::credentials::{
        AzureCredentials, ConfigurationBody, CredentialError, CredentialForm, S3Credentials,
    };
    pub use crate::scan::{ScanLevel, ScanRun, ScanStatus};
    pub use crate::search::{RawHit, SearchHit, SearchMode, SearchType};
    pub use crate::setup::{derive_setup_step, SetupStep};
    pub use crate::store::{
        clear_search_session, keys, FileStore, MemoryStore, PersistenceStore,
        PersistenceStoreExt, StoreError,
    };
    pub use crate::version::BuildInfo;
}
