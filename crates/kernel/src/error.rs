/// Errors raised by the service layer.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("service {service} failed: {source}")]
    Service {
        service: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("game is {0:?}, expected {1:?}")]
    InvalidState(crate::GameState, crate::GameState),
}

impl KernelError {
    /// Wrap a service-specific error.
    pub fn service(
        service: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Service {
            service: service.into(),
            source: source.into(),
        }
    }
}
