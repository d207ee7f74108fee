//! Generic HTTP metrics scaler.
//!
//! Fetches a JSON document over HTTP and extracts a numeric value at a
//! dot-separated path. Metadata: `url`, `valueLocation`, exactly one of
//! `targetValue`/`targetAverageValue`, and an optional
//! `activationThreshold`. Auth params may carry a `bearerToken`.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::scaler::{Scaler, ScalerConfig, TargetSpec, TriggerError};

pub struct MetricsApiScaler {
    client: reqwest::Client,
    url: reqwest::Url,
    value_location: String,
    target_value: Option<f64>,
    target_average_value: Option<f64>,
    activation_threshold: f64,
    bearer_token: Option<String>,
    metric_name: String,
}

impl MetricsApiScaler {
    pub fn new(config: &ScalerConfig) -> Result<Self, TriggerError> {
        let url = config.require_metadata("url")?;
        let url = url
            .parse::<reqwest::Url>()
            .map_err(|e| TriggerError::InvalidMetadata {
                key: "url".to_string(),
                message: e.to_string(),
            })?;

        let value_location = config.require_metadata("valueLocation")?.to_string();

        let target_value = config.metadata_f64("targetValue")?;
        let target_average_value = config.metadata_f64("targetAverageValue")?;
        if target_value.is_none() && target_average_value.is_none() {
            return Err(TriggerError::InvalidMetadata {
                key: "targetValue".to_string(),
                message: "one of targetValue or targetAverageValue must be set".to_string(),
            });
        }

        let activation_threshold = config.metadata_f64("activationThreshold")?.unwrap_or(0.0);

        let client = reqwest::Client::builder()
            .timeout(config.global_http_timeout)
            .build()?;

        Ok(Self {
            client,
            url,
            value_location,
            target_value,
            target_average_value,
            activation_threshold,
            bearer_token: config.auth_params.get("bearerToken").cloned(),
            metric_name: format!("metrics-api-{}", config.trigger_index),
        })
    }
}

/// Walk a dot-separated path through a JSON document to a numeric leaf.
///
/// Numeric strings at the leaf are accepted; anything else is an error.
fn value_at(document: &Value, location: &str) -> Result<f64, TriggerError> {
    let mut node = document;
    for segment in location.split('.') {
        node = node
            .get(segment)
            .ok_or_else(|| TriggerError::Read(format!("no value at {location:?}")))?;
    }

    match node {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| TriggerError::Read(format!("value at {location:?} is not finite"))),
        Value::String(s) => s
            .parse::<f64>()
            .map_err(|_| TriggerError::Read(format!("value at {location:?} is not numeric"))),
        other => Err(TriggerError::Read(format!(
            "value at {location:?} is not a number: {other}"
        ))),
    }
}

#[async_trait]
impl Scaler for MetricsApiScaler {
    async fn metric_spec(&self) -> Vec<TargetSpec> {
        vec![TargetSpec {
            metric_name: self.metric_name.clone(),
            target_value: self.target_value,
            target_average_value: self.target_average_value,
        }]
    }

    async fn metrics_and_activity(&self) -> Result<(Vec<f64>, bool), TriggerError> {
        let mut request = self.client.get(self.url.clone());
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?.error_for_status()?;
        let document: Value = response.json().await?;
        let value = value_at(&document, &self.value_location)?;

        debug!(metric = %self.metric_name, value, "read metric value");
        Ok((vec![value], value > self.activation_threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use serde_json::json;

    fn test_config(metadata: &[(&str, &str)]) -> ScalerConfig {
        ScalerConfig {
            workload_name: "projects/p/locations/l/services/api".to_string(),
            trigger_name: "queue-depth".to_string(),
            trigger_type: "metrics-api".to_string(),
            trigger_index: 0,
            trigger_metadata: metadata
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            auth_params: HashMap::new(),
            pod_identity: None,
            global_http_timeout: Duration::from_secs(2),
            as_metric_source: true,
        }
    }

    #[test]
    fn value_at_walks_nested_paths() {
        let doc = json!({"queue": {"stats": {"depth": 42.5}}});
        assert_eq!(value_at(&doc, "queue.stats.depth").unwrap(), 42.5);
    }

    #[test]
    fn value_at_accepts_numeric_strings() {
        let doc = json!({"depth": "17"});
        assert_eq!(value_at(&doc, "depth").unwrap(), 17.0);
    }

    #[test]
    fn value_at_rejects_missing_and_non_numeric() {
        let doc = json!({"depth": [1, 2]});
        assert!(value_at(&doc, "missing").is_err());
        assert!(value_at(&doc, "depth").is_err());
    }

    #[test]
    fn construction_requires_url_location_and_target() {
        assert!(MetricsApiScaler::new(&test_config(&[])).is_err());
        assert!(MetricsApiScaler::new(&test_config(&[
            ("url", "http://example.com/m"),
            ("valueLocation", "depth"),
        ]))
        .is_err());
        assert!(MetricsApiScaler::new(&test_config(&[
            ("url", "not a url"),
            ("valueLocation", "depth"),
            ("targetValue", "100"),
        ]))
        .is_err());

        let scaler = MetricsApiScaler::new(&test_config(&[
            ("url", "http://example.com/m"),
            ("valueLocation", "depth"),
            ("targetAverageValue", "100"),
        ]))
        .unwrap();
        assert_eq!(scaler.target_average_value, Some(100.0));
        assert_eq!(scaler.activation_threshold, 0.0);
    }

    #[tokio::test]
    async fn reads_value_from_a_live_endpoint() {
        use axum::routing::get;

        let app = axum::Router::new().route(
            "/metrics",
            get(|| async { axum::Json(json!({"queue": {"depth": 2000.0}})) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let scaler = MetricsApiScaler::new(&test_config(&[
            ("url", &format!("http://{addr}/metrics")),
            ("valueLocation", "queue.depth"),
            ("targetValue", "1000"),
        ]))
        .unwrap();

        let (values, active) = scaler.metrics_and_activity().await.unwrap();
        assert_eq!(values, vec![2000.0]);
        assert!(active);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_http_error() {
        let scaler = MetricsApiScaler::new(&test_config(&[
            // Port 9 is discard; nothing is listening in the test environment.
            ("url", "http://127.0.0.1:9/metrics"),
            ("valueLocation", "depth"),
            ("targetValue", "100"),
        ]))
        .unwrap();

        assert!(matches!(
            scaler.metrics_and_activity().await,
            Err(TriggerError::Http(_))
        ));
    }
}
