//! Wire formats of the dashboard API.

use std::collections::HashMap;

use modcon_core::collection::{DashboardData, FetchKey, Record};
use modcon_core::error::{ModconError, Result};
use modcon_core::permission::PermissionSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /dashboard`.
#[derive(Debug, Serialize)]
pub struct FetchBody<'a> {
    pub keys: &'a [FetchKey],
}

/// Body of the deny endpoints.
#[derive(Debug, Serialize)]
pub struct DenyBody<'a> {
    pub reason: &'a str,
}

/// Response of `POST /dashboard`: one array per requested key, plus the
/// operator's permissions when the backend includes them.
#[derive(Debug, Deserialize)]
pub struct DashboardPayload {
    #[serde(default)]
    pub permissions: Option<PermissionSet>,
    #[serde(flatten)]
    pub datasets: HashMap<String, Value>,
}

impl DashboardPayload {
    /// Converts into domain data, keeping only the requested keys.
    ///
    /// A key the backend did not answer for is left out, so the caller keeps
    /// its previous records for it.
    pub fn into_domain(mut self, keys: &[FetchKey]) -> Result<DashboardData> {
        let mut datasets = HashMap::new();
        for key in keys {
            let name: &str = key.as_ref();
            let Some(value) = self.datasets.remove(name) else {
                tracing::warn!("[Http] Response has no '{}' dataset", key);
                continue;
            };
            let Value::Array(items) = value else {
                return Err(ModconError::Serialization {
                    format: "JSON".to_string(),
                    message: format!("dataset '{key}' is not an array"),
                });
            };
            let records = items
                .into_iter()
                .map(Record::from_value)
                .collect::<Result<Vec<_>>>()?;
            datasets.insert(*key, records);
        }

        Ok(DashboardData {
            datasets,
            permissions: self.permissions,
        })
    }
}

/// Error body returned with non-success statuses.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message).filter(|m| !m.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_keeps_requested_keys_only() {
        let payload: DashboardPayload = serde_json::from_value(json!({
            "bots": [{"id": "1"}, {"id": "2"}],
            "links": [{"id": "l"}],
            "permissions": {"canApproveBots": true, "canDeleteLinks": false},
        }))
        .unwrap();

        let data = payload.into_domain(&[FetchKey::Bots, FetchKey::Sounds]).unwrap();
        assert_eq!(data.datasets[&FetchKey::Bots].len(), 2);
        assert!(!data.datasets.contains_key(&FetchKey::Links));
        assert!(!data.datasets.contains_key(&FetchKey::Sounds));

        let permissions = data.permissions.unwrap();
        assert!(permissions.allows("canApproveBots"));
        assert!(!permissions.allows("canDeleteLinks"));
    }

    #[test]
    fn test_non_array_dataset_rejected() {
        let payload: DashboardPayload =
            serde_json::from_value(json!({"blockedips": {"id": "x"}})).unwrap();
        let err = payload.into_domain(&[FetchKey::BlockedIps]).unwrap_err();
        assert!(matches!(err, ModconError::Serialization { .. }));
    }

    #[test]
    fn test_fetch_body_uses_wire_keys() {
        let body = serde_json::to_value(FetchBody {
            keys: &[FetchKey::BotDenies, FetchKey::BlockedIps],
        })
        .unwrap();
        assert_eq!(body, json!({"keys": ["botdenies", "blockedips"]}));
    }
}
