//! Transport-facing types: the request descriptor and the response sink.
//!
//! The engine owns no socket handling. An embedding server converts its own
//! request type into a [`Request`] and implements [`ResponseSink`] for its
//! response writer; [`BufferedResponse`] is the in-memory implementation.

mod request;
mod response;

pub use request::{
    parse_accept_language, parse_query_params, HeaderVec, ParamVec, Request, MAX_INLINE_HEADERS,
    MAX_INLINE_PARAMS,
};
pub use response::{status_reason, BufferedResponse, ResponseSink};
