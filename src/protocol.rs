use crate::candidate::Candidate;
use serde::{Deserialize, Serialize};

/// Requests understood by the scan driver
///
/// Internal callers use this closed type directly, so an unhandled
/// request kind cannot exist past the parse boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    /// Ask for the current snapshot of usable candidates
    RetrieveCandidates,
}

/// Response to a retrieval request: the snapshot, in document order
pub type Response = Vec<Candidate>;

/// Decodes a raw message from the untrusted transport
///
/// An unrecognized or malformed message is logged and produces no
/// request; the caller sends no response and the channel stays open.
pub fn decode_request(raw: &str) -> Option<Request> {
    match serde_json::from_str(raw) {
        Ok(request) => Some(request),
        Err(e) => {
            ::log::error!("Received unexpected message {:?}: {}", raw, e);
            None
        }
    }
}

/// Encodes a response for the transport
pub fn encode_response(response: &Response) -> serde_json::Result<String> {
    serde_json::to_string(response)
}
