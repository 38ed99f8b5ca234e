use thiserror::Error;

use crate::domain::venue::VenueId;

/// Venue id has no registered strategy. A hard configuration error:
/// the registry never falls back to a default integration.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no parking strategy registered for venue {0}")]
    UnknownVenue(VenueId),
}

/// Failure talking to a venue's upstream system. Transport-level problems
/// (including timeouts) and malformed responses land here; business-level
/// "no data" outcomes are carried inside the decoded records instead.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
    #[error("could not decode {context}: {message}")]
    Decode { context: String, message: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session backend failure: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::{RegistryError, UpstreamError};
    use crate::domain::venue::VenueId;

    #[test]
    fn unknown_venue_error_names_the_offending_id() {
        let error = RegistryError::UnknownVenue(VenueId(9999));
        assert_eq!(error.to_string(), "no parking strategy registered for venue 9999");
    }

    #[test]
    fn upstream_errors_render_with_context() {
        let status = UpstreamError::UnexpectedStatus {
            status: 502,
            url: "https://park.example/api".to_owned(),
        };
        assert_eq!(status.to_string(), "unexpected status 502 from https://park.example/api");

        let decode = UpstreamError::Decode {
            context: "parking fee response".to_owned(),
            message: "missing field `resCode`".to_owned(),
        };
        assert!(decode.to_string().contains("parking fee response"));
    }
}
