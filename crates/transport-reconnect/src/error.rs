use thiserror::Error;

/// Errors returned when installing the reconnection wrapper.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The transport already carries reconnection behavior; wrapping it again
    /// would stack close listeners and retry loops.
    #[error("transport already has reconnection installed")]
    AlreadyInstalled,
}

impl InstallError {
    /// Returns true if the error indicates a double installation.
    pub fn is_already_installed(&self) -> bool {
        matches!(self, InstallError::AlreadyInstalled)
    }
}
