//! Request routing.
//!
//! Paths have the shape `/{operation}/{params...}`. The operation segment
//! fixes the HTTP method the request must use; the remaining segments are the
//! collection and, for record operations, the key. Empty segments are
//! skipped and extra trailing segments are ignored.
//!
//! Checks run in this order: operation name, method, then parameters. That
//! makes `POST /get` a 405 and `GET /get` a 400.

use axum::http::Method;

use crate::error::{Error, Result};

/// The five record operations reachable over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Get,
    Put,
    Delete,
    History,
    List,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::Get,
        Endpoint::Put,
        Endpoint::Delete,
        Endpoint::History,
        Endpoint::List,
    ];

    /// Looks up the operation named by the first path segment.
    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|endpoint| endpoint.segment() == segment)
    }

    /// The first path segment that selects this operation.
    pub fn segment(&self) -> &'static str {
        match self {
            Endpoint::Get => "get",
            Endpoint::Put => "put",
            Endpoint::Delete => "delete",
            Endpoint::History => "history",
            Endpoint::List => "list",
        }
    }

    /// The only HTTP method this operation accepts.
    pub fn method(&self) -> Method {
        match self {
            Endpoint::Get => Method::GET,
            Endpoint::Put => Method::PUT,
            Endpoint::Delete => Method::DELETE,
            Endpoint::History => Method::POST,
            Endpoint::List => Method::GET,
        }
    }
}

/// A request resolved to an operation plus its path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route<'a> {
    pub endpoint: Endpoint,
    params: Vec<&'a str>,
}

impl<'a> Route<'a> {
    /// Resolves a method and URI path.
    ///
    /// # Errors
    ///
    /// [`Error::MethodNotAllowed`] for an unknown or missing operation, or a
    /// method that does not match the operation.
    pub fn resolve(method: &Method, path: &'a str) -> Result<Self> {
        let mut segments = path.split('/').filter(|segment| !segment.is_empty());

        let endpoint = segments
            .next()
            .and_then(Endpoint::from_segment)
            .ok_or_else(|| Error::MethodNotAllowed(format!("no operation at {}", path)))?;

        if *method != endpoint.method() {
            return Err(Error::MethodNotAllowed(format!(
                "{} requires {}, got {}",
                endpoint.segment(),
                endpoint.method(),
                method
            )));
        }

        Ok(Self {
            endpoint,
            params: segments.collect(),
        })
    }

    /// The collection parameter.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if the path stops after the operation.
    pub fn collection(&self) -> Result<&'a str> {
        self.params
            .first()
            .copied()
            .ok_or_else(|| Error::InvalidInput("Missing collection".to_string()))
    }

    /// The collection and key parameters.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if either is missing.
    pub fn record(&self) -> Result<(&'a str, &'a str)> {
        match self.params.as_slice() {
            [collection, key, ..] => Ok((collection, key)),
            _ => Err(Error::InvalidInput(
                "Missing collection or key".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_resolve_each_operation_with_its_method() {
        let cases = [
            (Method::GET, "/get/cars/honda", Endpoint::Get),
            (Method::PUT, "/put/cars/honda", Endpoint::Put),
            (Method::DELETE, "/delete/cars/honda", Endpoint::Delete),
            (Method::POST, "/history/cars/honda", Endpoint::History),
            (Method::GET, "/list/cars", Endpoint::List),
        ];

        for (method, path, expected) in cases {
            let route = Route::resolve(&method, path).unwrap();
            assert_eq!(route.endpoint, expected, "{} {}", method, path);
        }
    }

    #[test]
    fn should_extract_record_params() {
        // given
        let route = Route::resolve(&Method::GET, "/get/cars/honda").unwrap();

        // when
        let (collection, key) = route.record().unwrap();

        // then
        assert_eq!(collection, "cars");
        assert_eq!(key, "honda");
    }

    #[test]
    fn should_skip_empty_segments_and_ignore_extra_ones() {
        let route = Route::resolve(&Method::GET, "//get//cars/honda/extra/").unwrap();
        assert_eq!(route.record().unwrap(), ("cars", "honda"));
    }

    #[test]
    fn should_reject_method_mismatch() {
        for (method, path) in [
            (Method::GET, "/put/cars/honda"),
            (Method::POST, "/get/cars/honda"),
            (Method::GET, "/history/cars/honda"),
            (Method::PUT, "/delete/cars/honda"),
            (Method::POST, "/list/cars"),
        ] {
            let result = Route::resolve(&method, path);
            assert!(
                matches!(result, Err(Error::MethodNotAllowed(_))),
                "{} {}",
                method,
                path
            );
        }
    }

    #[test]
    fn should_reject_unknown_or_missing_operation() {
        assert!(matches!(
            Route::resolve(&Method::GET, "/fetch/cars/honda"),
            Err(Error::MethodNotAllowed(_))
        ));
        assert!(matches!(
            Route::resolve(&Method::GET, "/"),
            Err(Error::MethodNotAllowed(_))
        ));
        assert!(matches!(
            Route::resolve(&Method::GET, "/GET/cars/honda"),
            Err(Error::MethodNotAllowed(_))
        ));
    }

    #[test]
    fn should_check_method_before_params() {
        assert!(matches!(
            Route::resolve(&Method::POST, "/get"),
            Err(Error::MethodNotAllowed(_))
        ));
    }

    #[test]
    fn should_require_params_per_operation() {
        // given
        let get = Route::resolve(&Method::GET, "/get/cars").unwrap();
        let list = Route::resolve(&Method::GET, "/list/cars").unwrap();
        let bare_list = Route::resolve(&Method::GET, "/list").unwrap();

        // then
        assert!(matches!(get.record(), Err(Error::InvalidInput(_))));
        assert_eq!(list.collection().unwrap(), "cars");
        assert!(matches!(bare_list.collection(), Err(Error::InvalidInput(_))));
    }
}
