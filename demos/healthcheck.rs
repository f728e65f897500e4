use shiroclient::options::{with_creator, with_endpoint, with_params};
use shiroclient::{CallOutcome, Client, Result};

#[derive(serde::Deserialize, Debug)]
struct HealthCheckReport {
    service_name: String,
    service_version: String,
    status: String,
    timestamp: String,
}

#[derive(serde::Deserialize, Debug)]
struct HealthCheckResponse {
    reports: Vec<HealthCheckReport>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let endpoint = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://127.0.0.1:8082".to_string());
    let client = Client::new([with_endpoint(endpoint), with_creator("martin")]);

    match client
        .call("healthcheck", [with_params(serde_json::json!({}))])
        .await?
    {
        CallOutcome::Success(resp) => {
            let health: HealthCheckResponse = resp.unmarshal()?;
            for report in health.reports {
                println!(
                    "{} {} {} at {}",
                    report.service_name, report.service_version, report.status, report.timestamp
                );
            }
        }
        CallOutcome::Failure(failure) => println!("healthcheck rejected: {failure}"),
    }
    Ok(())
}
