//! Prometheus metrics for the record server.

use axum::http::Method;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

/// Labels for HTTP request metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabelsWithStatus {
    pub method: HttpMethod,
    pub endpoint: String,
    pub status: u16,
}

/// HTTP method label value.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Other,
}

impl From<&Method> for HttpMethod {
    fn from(method: &Method) -> Self {
        match *method {
            Method::GET => HttpMethod::Get,
            Method::POST => HttpMethod::Post,
            Method::PUT => HttpMethod::Put,
            Method::DELETE => HttpMethod::Delete,
            _ => HttpMethod::Other,
        }
    }
}

/// Container for all Prometheus metrics.
pub struct Metrics {
    registry: Registry,

    /// Versions appended by successful Put requests.
    pub records_put_total: Counter,

    /// Successful Delete requests.
    pub records_deleted_total: Counter,

    /// Successful List requests.
    pub records_listed_total: Counter,

    /// Items returned across all List responses.
    pub records_list_items_total: Counter,

    /// Requests rejected by the authenticator.
    pub auth_rejections_total: Counter,

    /// Counter of HTTP requests.
    pub http_requests_total: Family<HttpLabelsWithStatus, Counter>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics registry with all metrics registered.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let records_put_total = Counter::default();
        registry.register(
            "records_put_total",
            "Total number of record versions appended",
            records_put_total.clone(),
        );

        let records_deleted_total = Counter::default();
        registry.register(
            "records_deleted_total",
            "Total number of record soft deletes",
            records_deleted_total.clone(),
        );

        let records_listed_total = Counter::default();
        registry.register(
            "records_listed_total",
            "Total number of collection list requests served",
            records_listed_total.clone(),
        );

        let records_list_items_total = Counter::default();
        registry.register(
            "records_list_items_total",
            "Total number of records returned by list requests",
            records_list_items_total.clone(),
        );

        let auth_rejections_total = Counter::default();
        registry.register(
            "auth_rejections_total",
            "Total number of requests rejected for missing or invalid credentials",
            auth_rejections_total.clone(),
        );

        let http_requests_total = Family::<HttpLabelsWithStatus, Counter>::default();
        registry.register(
            "http_requests_total",
            "Total number of HTTP requests",
            http_requests_total.clone(),
        );

        Self {
            registry,
            records_put_total,
            records_deleted_total,
            records_listed_total,
            records_list_items_total,
            auth_rejections_total,
            http_requests_total,
        }
    }

    /// Encode all metrics to Prometheus text format.
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        prometheus_client::encoding::text::encode(&mut buffer, &self.registry)
            .expect("encoding metrics should not fail");
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_register_all_metrics() {
        // given/when
        let metrics = Metrics::new();

        // then
        let encoded = metrics.encode();
        assert!(encoded.contains("# HELP records_put_total"));
        assert!(encoded.contains("# HELP records_deleted_total"));
        assert!(encoded.contains("# HELP records_listed_total"));
        assert!(encoded.contains("# HELP records_list_items_total"));
        assert!(encoded.contains("# HELP auth_rejections_total"));
        assert!(encoded.contains("# HELP http_requests_total"));
    }

    #[test]
    fn should_encode_counter_values() {
        // given
        let metrics = Metrics::new();

        // when
        metrics.records_put_total.inc_by(3);

        // then
        assert!(metrics.encode().contains("records_put_total_total 3"));
    }

    #[test]
    fn should_convert_http_method_to_label() {
        assert!(matches!(HttpMethod::from(&Method::DELETE), HttpMethod::Delete));
        assert!(matches!(HttpMethod::from(&Method::PATCH), HttpMethod::Other));
    }
}
