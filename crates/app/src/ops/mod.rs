pub mod init;
pub mod scan;
pub mod service;
pub mod setup;
pub mod version;

pub use init::Init;
pub use scan::Scan;
pub use service::Service;
pub use setup::Setup;
pub use version::Version;
