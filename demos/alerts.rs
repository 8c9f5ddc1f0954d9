//! Alerts walkthrough
//!
//! Creates, reads, updates and deletes a classic alert, then a threshold
//! alert notifying three webhook targets. Any failure aborts the run.
//!
//! Run with: cargo run --example alerts
//!
//! Environment variables:
//! - WAVEFRONT_ADDRESS: Tenant address, e.g. test.wavefront.com
//! - WAVEFRONT_TOKEN: API token
//! - WAVEFRONT_HTTP_PROXY: Proxy URL (optional)
//! - WAVEFRONT_SKIP_TLS_VERIFY: Accept invalid certificates (optional)
//! - RUST_LOG: Log level (default: info)

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wavefront_api::{Alert, Client, Config, Severity, Target, Trigger, WavefrontError};

const TEMPLATE: &str = include_str!("target-template.tmpl");

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alerts=info,wavefront_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run().await {
        error!(error = %err, "Alerts walkthrough failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), WavefrontError> {
    let client = Client::new(&Config::from_env()?)?;

    classic_alert(&client).await?;
    threshold_alert(&client).await?;

    Ok(())
}

async fn classic_alert(client: &Client) -> Result<(), WavefrontError> {
    let alerts = client.alerts();

    let mut alert = Alert::classic(
        "My First Alert",
        "ts(servers.cpu.usage, dc=dc2) > 10 * 10",
        Severity::Warn,
    )
    .with_target("test@example.com")
    .with_display_expression("ts(servers.cpu.usage, dc=dc2)")
    .with_minutes(2)
    .with_resolve_after_minutes(2)
    .with_tag("dc1")
    .with_tag("synergy");

    alerts.create(&mut alert).await?;

    // The id is now set, so the alert can be updated and deleted
    let id = alert.id.clone().unwrap_or_default();
    info!(id = %id, "alert created");

    let mut lookup = Alert {
        id: Some(id),
        ..Default::default()
    };
    alerts.get(&mut lookup).await?;

    alert.target = "test@example.com,bob@example.com".to_string();
    alerts.update(&mut alert).await?;

    alerts.delete(&mut alert, true).await?;
    info!("alert deleted");

    Ok(())
}

fn webhook_target(description: &str) -> Target {
    Target::webhook("test target", "https://hooks.slack.com/services/test/me")
        .with_description(description)
        .with_content_type("application/json")
        .with_header("Testing", "true")
        .with_trigger(Trigger::AlertOpened)
        .with_trigger(Trigger::AlertResolved)
        .with_template(TEMPLATE)
}

async fn threshold_alert(client: &Client) -> Result<(), WavefrontError> {
    let alerts = client.alerts();
    let targets = client.targets();

    // Threshold alerts only accept alert targets, so create some first
    let mut target_a = webhook_target("testing something A");
    let mut target_b = webhook_target("testing something B");
    let mut target_c = webhook_target("testing something C");

    for target in [&mut target_a, &mut target_b, &mut target_c] {
        targets.create(target).await?;
    }
    info!("alert targets created");

    let reference = |target: &Target| {
        target
            .reference()
            .ok_or(WavefrontError::MissingId { kind: "target" })
    };
    let ref_a = reference(&target_a)?;
    let ref_b = reference(&target_b)?;
    let ref_c = reference(&target_c)?;

    let mut alert = Alert::threshold("My First Threshold Alert")
        .with_threshold(Severity::Smoke, "ts(servers.cpu.usage) > 70")
        .with_threshold(Severity::Warn, "ts(servers.cpu.usage) > 100")
        .with_threshold_target(Severity::Smoke, &ref_a)
        .with_threshold_target(Severity::Warn, &ref_b)
        .with_display_expression("ts(servers.cpu.usage)")
        .with_minutes(2)
        .with_resolve_after_minutes(2)
        .with_tag("dc1")
        .with_tag("synergy");

    alerts.create(&mut alert).await?;

    let id = alert.id.clone().unwrap_or_default();
    info!(id = %id, "threshold alert created");

    alerts.fetch(&id).await?;

    alert = alert.with_threshold_target(Severity::Smoke, &ref_c);
    alerts.update(&mut alert).await?;

    // Alerts go before the targets they reference
    alerts.delete(&mut alert, true).await?;
    info!("threshold alert deleted");

    for target in [&mut target_a, &mut target_b, &mut target_c] {
        targets.delete(target, false).await?;
    }
    info!("alert targets deleted");

    Ok(())
}
