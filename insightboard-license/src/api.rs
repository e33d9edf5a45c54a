//! License service client.
//!
//! Every response body goes through a typed decode here, so the rest of the
//! crate never sees raw JSON. A validation reply becomes a
//! [`ValidateOutcome`]; anything that is not a JSON reply from the service
//! (connection errors, timeouts, 5xx, non-JSON bodies) is a transport error.

use crate::config::LicenseConfig;
use crate::error::{LicenseError, LicenseResult};
use async_trait::async_trait;
use insightboard_types::{FeatureEntitlement, LicenseRecord, LicenseType};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const VALIDATE_PATH: &str = "/api/license/validate";
pub const DEACTIVATE_PATH: &str = "/api/license/deactivate";
pub const GENERATE_PATH: &str = "/api/license/generate";

/// Body for the validate and deactivate endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseKeyRequest<'a> {
    pub license_key: &'a str,
    pub domain: &'a str,
}

/// Body for the generate endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub email: String,
    pub purchase_code: String,
    #[serde(rename = "type")]
    pub license_type: LicenseType,
}

/// Raw validate reply.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub license: Option<LicenseRecord>,
    #[serde(default)]
    pub features: Option<FeatureEntitlement>,
    #[serde(default)]
    pub remaining_activations: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct DeactivateResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    license: Option<GeneratedLicense>,
}

/// A freshly issued key, as returned by the generate endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedLicense {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub license_type: Option<LicenseType>,
}

/// Decoded result of a validate call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidateOutcome {
    /// The service accepted the key and sent the full license and entitlement.
    Accepted {
        message: String,
        license: LicenseRecord,
        features: FeatureEntitlement,
        remaining_activations: Option<u32>,
    },
    /// The service refused the key.
    Rejected { message: String },
    /// The reply does not match the expected schema.
    Malformed { reason: String },
}

impl ValidateOutcome {
    /// Decodes a validate reply body.
    #[must_use]
    pub fn from_json(body: serde_json::Value) -> Self {
        match serde_json::from_value::<ValidateResponse>(body) {
            Ok(resp) => resp.into(),
            Err(e) => Self::Malformed {
                reason: e.to_string(),
            },
        }
    }
}

impl From<ValidateResponse> for ValidateOutcome {
    fn from(resp: ValidateResponse) -> Self {
        if !resp.success {
            return Self::Rejected {
                message: resp
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "License validation failed".to_string()),
            };
        }
        match (resp.license, resp.features) {
            (Some(license), Some(features)) => Self::Accepted {
                message: resp
                    .message
                    .unwrap_or_else(|| "License activated successfully".to_string()),
                license,
                features,
                remaining_activations: resp.remaining_activations,
            },
            (None, _) => Self::Malformed {
                reason: "successful response without license".to_string(),
            },
            (_, None) => Self::Malformed {
                reason: "successful response without features".to_string(),
            },
        }
    }
}

/// Remote license service operations.
#[async_trait]
pub trait LicenseApi: Send + Sync {
    /// Validates (and, server-side, activates) `license_key` on `domain`.
    async fn validate(&self, license_key: &str, domain: &str) -> LicenseResult<ValidateOutcome>;

    /// Releases the activation of `license_key` on `domain`.
    ///
    /// A refusal is returned as `LicenseError::RemoteRejected`.
    async fn deactivate(&self, license_key: &str, domain: &str) -> LicenseResult<()>;

    /// Issues a new key for a purchase.
    async fn generate(&self, request: &GenerateRequest) -> LicenseResult<GeneratedLicense>;
}

/// HTTP implementation of [`LicenseApi`].
#[derive(Debug, Clone)]
pub struct HttpLicenseApi {
    base_url: String,
    client: Client,
}

impl HttpLicenseApi {
    /// Creates a client for the service at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> LicenseResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Creates a client from the validator configuration.
    pub fn from_config(config: &LicenseConfig) -> LicenseResult<Self> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    /// Returns the service base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Posts `body` and returns the JSON reply.
    ///
    /// 4xx replies still carry a JSON body describing the refusal and are
    /// returned as-is.
    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> LicenseResult<serde_json::Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| LicenseError::Transport(format!("request to {path} failed: {e}")))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(LicenseError::Transport(format!("HTTP {status} from {path}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LicenseError::Transport(format!("failed to read {path} reply: {e}")))?;

        serde_json::from_slice(&bytes).map_err(|e| {
            LicenseError::Transport(format!("HTTP {status} from {path} with non-JSON body: {e}"))
        })
    }
}

#[async_trait]
impl LicenseApi for HttpLicenseApi {
    async fn validate(&self, license_key: &str, domain: &str) -> LicenseResult<ValidateOutcome> {
        let body = self
            .post(VALIDATE_PATH, &LicenseKeyRequest { license_key, domain })
            .await?;
        Ok(ValidateOutcome::from_json(body))
    }

    async fn deactivate(&self, license_key: &str, domain: &str) -> LicenseResult<()> {
        let body = self
            .post(DEACTIVATE_PATH, &LicenseKeyRequest { license_key, domain })
            .await?;
        let resp: DeactivateResponse = serde_json::from_value(body)
            .map_err(|e| LicenseError::MalformedResponse(e.to_string()))?;
        if resp.success {
            Ok(())
        } else {
            Err(LicenseError::RemoteRejected(
                resp.message
                    .unwrap_or_else(|| "License deactivation failed".to_string()),
            ))
        }
    }

    async fn generate(&self, request: &GenerateRequest) -> LicenseResult<GeneratedLicense> {
        let body = self.post(GENERATE_PATH, request).await?;
        let resp: GenerateResponse = serde_json::from_value(body)
            .map_err(|e| LicenseError::MalformedResponse(e.to_string()))?;
        if !resp.success {
            return Err(LicenseError::RemoteRejected(
                resp.message
                    .unwrap_or_else(|| "License generation failed".to_string()),
            ));
        }
        resp.license.ok_or_else(|| {
            LicenseError::MalformedResponse("successful response without license".to_string())
        })
    }
}
