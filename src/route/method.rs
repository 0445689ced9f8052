use http::Method;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::RouteError;

/// Methods a route may be registered for.
pub const SUPPORTED_METHODS: [&str; 8] = [
    "GET", "POST", "PUT", "DELETE", "PATCH", "SEARCH", "OPTIONS", "HEAD",
];

/// HTTP method a route answers to: one concrete method or any method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    /// Wildcard bucket (`*`), considered only after method-specific routes
    Any,
    Only(Method),
}

impl RouteMethod {
    /// Whether a request made with `method` may use this route
    #[inline]
    pub fn accepts(&self, method: &Method) -> bool {
        match self {
            RouteMethod::Any => true,
            RouteMethod::Only(m) => m == method,
        }
    }

    #[inline]
    pub fn is_any(&self) -> bool {
        matches!(self, RouteMethod::Any)
    }

    pub fn as_method(&self) -> Option<&Method> {
        match self {
            RouteMethod::Any => None,
            RouteMethod::Only(m) => Some(m),
        }
    }
}

impl FromStr for RouteMethod {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        if upper == "*" || upper == "ANY" {
            return Ok(RouteMethod::Any);
        }
        if !SUPPORTED_METHODS.contains(&upper.as_str()) {
            return Err(RouteError::InvalidMethod(s.to_string()));
        }
        Method::from_bytes(upper.as_bytes())
            .map(RouteMethod::Only)
            .map_err(|_| RouteError::InvalidMethod(s.to_string()))
    }
}

impl TryFrom<Method> for RouteMethod {
    type Error = RouteError;

    fn try_from(method: Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

impl Display for RouteMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteMethod::Any => f.write_str("*"),
            RouteMethod::Only(m) => f.write_str(m.as_str()),
        }
    }
}
