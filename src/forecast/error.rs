use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Response from {url} is not valid weather JSON")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Response for ({lat}, {lon}) is missing '{field}'")]
    MissingField {
        lat: f64,
        lon: f64,
        field: &'static str,
    },
}

impl FetchError {
    /// Connection, timeout and non-success status failures, as opposed to a
    /// response that arrived but had the wrong shape.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            FetchError::NetworkRequest(..) | FetchError::HttpStatus { .. }
        )
    }
}
