// Forbid unwrap() in production code to prevent panics on bad input.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]

//! Developer tool for issuing and inspecting tokens with the settings in the
//! environment.
//!
//! ```text
//! sealed-token issue sub=42 name=alice role=admin role=ops
//! sealed-token validate <token>
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use sealed_token::auth::{ClaimSet, SettingsRegistry, TokenService};
use sealed_token::config::TokenSettings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: sealed-token issue <name=value>... | sealed-token validate <token>";

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sealed_token=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Bad key material is fatal at startup.
    let settings = match TokenSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Failed to load token settings: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded token settings: audience={}, issuer={}, expiration_minutes={}, not_before_minutes={}",
        settings.audience,
        settings.issuer,
        settings.expiration_minutes,
        settings.not_before_minutes
    );

    let registry = match SettingsRegistry::new(settings) {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            tracing::error!("Failed to publish token settings: {e}");
            std::process::exit(1);
        }
    };
    let service = TokenService::new(registry);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.split_first() {
        Some((command, rest)) if command == "issue" => run_issue(&service, rest),
        Some((command, [token])) if command == "validate" => run_validate(&service, token),
        _ => {
            eprintln!("{USAGE}");
            ExitCode::from(2)
        }
    }
}

fn run_issue(service: &TokenService, pairs: &[String]) -> ExitCode {
    let mut claims = ClaimSet::new();
    for pair in pairs {
        let Some((name, value)) = pair.split_once('=') else {
            eprintln!("claim '{pair}' is not of the form name=value");
            return ExitCode::from(2);
        };
        if let Err(e) = claims.push(name, value) {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    }

    match service.issue(&claims) {
        Ok(token) => {
            println!("{token}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Failed to issue token: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_validate(service: &TokenService, token: &str) -> ExitCode {
    match service.validate(token) {
        Ok(claims) => {
            for claim in &claims {
                println!("{}={}", claim.name, claim.value);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            // A developer tool may say why; hosts should use `authenticate`.
            eprintln!("token rejected: {e}");
            ExitCode::FAILURE
        }
    }
}
