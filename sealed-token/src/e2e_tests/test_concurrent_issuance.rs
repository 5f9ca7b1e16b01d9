//! Concurrent issuance under shared settings does not mix up claims.

use std::sync::Arc;

use crate::auth::{SettingsRegistry, TokenService, issue, validate};
use crate::e2e_tests::helpers::*;
use crate::testing::{NOW, test_settings};
use crate::time::SimulatedTimeSource;

const TASKS: usize = 64;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[allow(clippy::disallowed_methods)] // Arc::clone for task handles
async fn test_concurrent_issue_then_validate() {
    let settings = Arc::new(test_settings());

    let mut handles = Vec::with_capacity(TASKS);
    for i in 0..TASKS {
        let settings = Arc::clone(&settings);
        handles.push(tokio::spawn(async move {
            let claims = claims_for(i);
            let token = issue(&claims, &settings, NOW).expect("issue");
            (i, token)
        }));
    }

    let mut tokens = Vec::with_capacity(TASKS);
    for handle in handles {
        tokens.push(handle.await.expect("task"));
    }

    for (i, token) in tokens {
        assert_eq!(validate(token.as_str(), &settings, NOW), Ok(claims_for(i)));
    }
}

#[test]
fn test_shared_service_across_threads() {
    let registry = SettingsRegistry::new(test_settings()).expect("settings");
    let service = TokenService::with_time_source(Arc::new(registry), SimulatedTimeSource::new(NOW));

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let service = &service;
                scope.spawn(move || {
                    let claims = claims_for(i);
                    let token = service.issue(&claims).expect("issue");
                    let validated = service.validate(token.as_str()).expect("validate");
                    assert_eq!(validated, claims);
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread");
        }
    });
}
