//! VM metrics from the monitor service (`monitor/v2`)

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::region::JdRegion;
use crate::cloudprovider::Result;

pub const SERVICE_CODE_VM: &str = "vm";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DataPoint {
    /// milliseconds since the epoch
    timestamp: i64,
    value: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MetricData {
    data: Vec<DataPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl JdRegion {
    /// Data points of `metric` (e.g. `cpu_util`) for one instance
    pub async fn vm_metric(
        &self,
        instance_id: &str,
        metric: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MetricPoint>> {
        let req = self
            .request("monitor", "v2", &format!("metrics/{}/metricData", metric))
            .param("serviceCode", SERVICE_CODE_VM)
            .param("resourceId", instance_id)
            .param("startTime", start.to_rfc3339_opts(SecondsFormat::Secs, true))
            .param("endTime", end.to_rfc3339_opts(SecondsFormat::Secs, true));

        let series: Vec<MetricData> = self.client().get(&req, "metricDatas").await?;
        Ok(series
            .into_iter()
            .flat_map(|m| m.data)
            .filter_map(|p| {
                Utc.timestamp_millis_opt(p.timestamp)
                    .single()
                    .map(|timestamp| MetricPoint {
                        timestamp,
                        value: p.value,
                    })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::jdcloud::testing::{region, FakeTransport};

    #[tokio::test]
    async fn metric_points_are_flattened() {
        let fake = FakeTransport::default();
        fake.ok(
            "monitor",
            "metrics/cpu_util/metricData",
            json!({"metricDatas": [{
                "metric": {"metric": "cpu_util"},
                "data": [
                    {"timestamp": 1767225600000i64, "value": 12.5},
                    {"timestamp": 1767225660000i64, "value": 13.0}
                ]
            }]}),
        );
        let region = region(&fake);
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 1, 1, 0, 0).unwrap();

        let points = region.vm_metric("i-1", "cpu_util", start, end).await.unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp, start);
        assert_eq!(points[1].value, 13.0);

        let req = &fake.requests()[0];
        assert!(req.query.contains(&("serviceCode".to_string(), "vm".to_string())));
        assert!(req.query.contains(&("resourceId".to_string(), "i-1".to_string())));
        assert!(req.query.contains(&("startTime".to_string(), "2026-01-01T00:00:00Z".to_string())));
    }
}
