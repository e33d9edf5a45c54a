//! Shared test helpers for license tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use insightboard_license::{
    AiFeatureLevel, DailyRequests, FeatureEntitlement, GenerateRequest, GeneratedLicense,
    LicenseApi, LicenseConfig, LicenseError, LicenseRecord, LicenseResult, LicenseStore,
    LicenseType, LicenseValidator, MemoryLicenseStore, ValidateOutcome,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

pub const DEMO_KEY: &str = "AI-DASH-REG-DEMO-2024";
pub const EXTENDED_KEY: &str = "AI-DASH-EXT-FULL-2024";

/// Installs a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A regular license record bound to `localhost`.
pub fn regular_license() -> LicenseRecord {
    LicenseRecord {
        id: "lic_001".into(),
        key: DEMO_KEY.into(),
        email: "buyer@example.com".into(),
        license_type: LicenseType::Regular,
        domain: Some("localhost".into()),
        is_active: true,
        activation_count: 1,
        max_activations: 1,
        created_at: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
    }
}

/// An extended license record, not bound to a domain.
pub fn extended_license() -> LicenseRecord {
    LicenseRecord {
        id: "lic_002".into(),
        key: EXTENDED_KEY.into(),
        license_type: LicenseType::Extended,
        domain: None,
        max_activations: 5,
        ..regular_license()
    }
}

pub fn regular_features() -> FeatureEntitlement {
    FeatureEntitlement {
        ai_features: AiFeatureLevel::Full,
        daily_requests: DailyRequests::Limited(100),
        custom_branding: true,
        priority_support: false,
        commercial_use: true,
        multiple_projects: false,
        white_label: false,
    }
}

pub fn extended_features() -> FeatureEntitlement {
    FeatureEntitlement {
        ai_features: AiFeatureLevel::Unlimited,
        daily_requests: DailyRequests::Unlimited,
        custom_branding: true,
        priority_support: true,
        commercial_use: true,
        multiple_projects: true,
        white_label: true,
    }
}

/// What the fake service answers to a validate call.
#[derive(Debug, Clone)]
pub enum FakeReply {
    Accept(LicenseRecord, FeatureEntitlement),
    Reject(String),
    Malformed(String),
    Unavailable,
}

/// In-process stand-in for the license service that counts calls.
pub struct FakeApi {
    reply: Mutex<FakeReply>,
    deactivate_ok: AtomicBool,
    pub validate_calls: AtomicUsize,
    pub deactivate_calls: AtomicUsize,
    pub generate_calls: AtomicUsize,
    pub last_request: Mutex<Option<(String, String)>>,
    pub last_generate: Mutex<Option<GenerateRequest>>,
}

impl FakeApi {
    pub fn new(reply: FakeReply) -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(reply),
            deactivate_ok: AtomicBool::new(true),
            validate_calls: AtomicUsize::new(0),
            deactivate_calls: AtomicUsize::new(0),
            generate_calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            last_generate: Mutex::new(None),
        })
    }

    pub fn accepting_regular() -> Arc<Self> {
        Self::new(FakeReply::Accept(regular_license(), regular_features()))
    }

    pub fn set_reply(&self, reply: FakeReply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn set_deactivate_ok(&self, ok: bool) {
        self.deactivate_ok.store(ok, Ordering::SeqCst);
    }

    pub fn validate_count(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    pub fn deactivate_count(&self) -> usize {
        self.deactivate_calls.load(Ordering::SeqCst)
    }

    pub fn generate_count(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<(String, String)> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl LicenseApi for FakeApi {
    async fn validate(&self, license_key: &str, domain: &str) -> LicenseResult<ValidateOutcome> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some((license_key.to_string(), domain.to_string()));
        let reply = self.reply.lock().unwrap().clone();
        match reply {
            FakeReply::Accept(license, features) => Ok(ValidateOutcome::Accepted {
                message: "License activated successfully".into(),
                remaining_activations: Some(license.remaining_activations()),
                license,
                features,
            }),
            FakeReply::Reject(message) => Ok(ValidateOutcome::Rejected { message }),
            FakeReply::Malformed(reason) => Ok(ValidateOutcome::Malformed { reason }),
            FakeReply::Unavailable => Err(LicenseError::Transport("connection refused".into())),
        }
    }

    async fn deactivate(&self, license_key: &str, domain: &str) -> LicenseResult<()> {
        self.deactivate_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some((license_key.to_string(), domain.to_string()));
        if self.deactivate_ok.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LicenseError::RemoteRejected("License not found".into()))
        }
    }

    async fn generate(&self, request: &GenerateRequest) -> LicenseResult<GeneratedLicense> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_generate.lock().unwrap() = Some(request.clone());
        Ok(GeneratedLicense {
            key: "AI-DASH-REG-NEW1-2024".into(),
            email: Some(request.email.clone()),
            license_type: Some(request.license_type),
        })
    }
}

pub fn test_config() -> LicenseConfig {
    LicenseConfig {
        api_base_url: "http://license.test".into(),
        domain: "localhost".into(),
        ..Default::default()
    }
}

/// Builds a validator over a fake service and an in-memory store.
pub fn make_validator(api: Arc<FakeApi>) -> (LicenseValidator, Arc<MemoryLicenseStore>) {
    make_validator_with(api, Arc::new(MemoryLicenseStore::new()), test_config())
}

pub fn make_validator_with(
    api: Arc<FakeApi>,
    store: Arc<MemoryLicenseStore>,
    config: LicenseConfig,
) -> (LicenseValidator, Arc<MemoryLicenseStore>) {
    init_tracing();
    let validator = LicenseValidator::new(
        config,
        api as Arc<dyn LicenseApi>,
        Arc::clone(&store) as Arc<dyn LicenseStore>,
    );
    (validator, store)
}
