use thiserror::Error;

/// Failure to bring up or reach a disposable test server.
#[derive(Debug, Error)]
pub enum TestInfraError {
    /// Docker could not start, inspect, or control the container.
    #[error("test container failed: {0}")]
    Container(#[from] testcontainers::TestcontainersError),

    #[error("could not reach the test Redis server: {0}")]
    Redis(#[from] redis::RedisError),
}

pub type Result<T, E = TestInfraError> = std::result::Result<T, E>;
