//! Conversions from HTTP client failures into the core error taxonomy.

use std::error::Error as _;

use nexus_core::error::{Error, TransportError};

/// Classify a `reqwest` failure.
pub(crate) fn transport(err: reqwest::Error) -> Error {
    let message = describe(&err);

    let transport = if err.is_timeout() {
        TransportError::Timeout { message }
    } else if is_tls(&err) {
        TransportError::Tls { message }
    } else if err.is_connect() {
        TransportError::Connection { message }
    } else {
        TransportError::Http { message }
    };

    Error::Transport(transport)
}

/// The error and its sources on one line; `reqwest` alone only says
/// "error sending request".
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn is_tls(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string().to_ascii_lowercase();
        if text.contains("certificate") || text.contains("tls") {
            return true;
        }
        source = cause.source();
    }
    false
}
