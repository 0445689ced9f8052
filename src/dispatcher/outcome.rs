use http::Method;
use serde_json::Value;
use std::path::PathBuf;

use crate::middleware::Rejection;
use crate::resolver::Resolution;

/// How a request left the pipeline.
#[derive(Debug)]
pub enum Outcome {
    /// The route's handler ran and returned `payload`
    Handled {
        payload: Value,
        resolution: Resolution,
    },
    /// A resource route matched and the file at `path` was handed to the sink
    Served { path: PathBuf, resolution: Resolution },
    NotFound,
    /// The path exists, but not for the request's method
    MethodNotAllowed { allowed: Vec<Method> },
    Rejected(Rejection),
    /// The request's cancellation token fired between two stages
    Cancelled,
}

impl Outcome {
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Outcome::Handled { payload, .. } => Some(payload),
            _ => None,
        }
    }

    pub fn into_payload(self) -> Option<Value> {
        match self {
            Outcome::Handled { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// The matched route, for outcomes that got that far
    pub fn resolution(&self) -> Option<&Resolution> {
        match self {
            Outcome::Handled { resolution, .. } | Outcome::Served { resolution, .. } => {
                Some(resolution)
            }
            _ => None,
        }
    }

    /// HTTP status that best describes the outcome
    pub fn status(&self) -> u16 {
        match self {
            Outcome::Handled { .. } | Outcome::Served { .. } => 200,
            Outcome::NotFound => 404,
            Outcome::MethodNotAllowed { .. } => 405,
            Outcome::Rejected(rejection) => rejection.status,
            // client closed request
            Outcome::Cancelled => 499,
        }
    }

    pub fn is_match(&self) -> bool {
        self.resolution().is_some()
    }
}
