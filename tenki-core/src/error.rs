use thiserror::Error;

/// Errors surfaced to the user by the forecast service.
///
/// The set is closed on purpose: callers match on it exhaustively, and the
/// `Display` text of each variant is exactly the single line printed to the
/// console on failure.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Neither the remote city table nor the bundled fallback copy could be
    /// loaded. Fatal for the whole run, before any forecast request is made.
    #[error("Could not load configuration from weather service nor backup file.")]
    ConfigUnavailable,

    /// The requested city name is not present in the city table, or its
    /// entry carries no usable identifier.
    #[error("Could not get weather information for specified city.")]
    CityNotFound,

    /// The forecast endpoint answered with a redirect. Never retried.
    #[error("Service moved to another location")]
    ServiceRelocated,

    /// Terminal request failure: a non-retryable status (the server's reason
    /// phrase is carried verbatim) or an unclassified transport/parse error
    /// (generic message).
    #[error("{0}")]
    RequestFailed(String),

    /// All retries were spent without ever seeing a status code.
    #[error("Weather service currently not available")]
    ServiceUnavailable,
}
