/// Application name
pub const APP_NAME: &str = "Atrium";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the host exposed to plugins. Candidate units that declare a
/// `server_version` range are validated against this value.
pub const HOST_VERSION: &str = "1.4.0";
