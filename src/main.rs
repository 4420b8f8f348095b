use std::error::Error;
use std::path::Path;

use tracing_subscriber::EnvFilter;

use finsight::{generate_report, FinsightConfig, FraudSummary};

const SAMPLE_GOALS: &str =
    "I want to save for a down payment on a house in 5 years and also start a retirement fund.";

const SAMPLE_TRANSACTIONS: &str = "groceries at local market, coffee at starbucks, \
gas station purchase, dinner at a restaurant, online clothes shopping, \
subscription to streaming service, groceries at local market, \
transfer to cryptocurrency wallet, international flight ticket purchase";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Usage: finsight [config.yaml] [goals] [transactions]
    let args: Vec<String> = std::env::args().skip(1).collect();

    let config = match args.first() {
        Some(path) if Path::new(path).exists() => {
            FinsightConfig::from_file(path)?.with_env_overrides()
        }
        _ => FinsightConfig::default().with_env_overrides(),
    };

    let goals = args.get(1).map(String::as_str).unwrap_or(SAMPLE_GOALS);
    let transactions = args
        .get(2)
        .map(String::as_str)
        .unwrap_or(SAMPLE_TRANSACTIONS);

    let report = generate_report(goals, transactions, &config).await;

    println!(">>> Your Personalized Financial Report");
    match &report.advice {
        Some(advice) => println!("{advice}"),
        None => println!("(advice generation unavailable)"),
    }

    println!();
    println!(">>> Fraud Detection Summary");
    match &report.fraud {
        FraudSummary::Flagged(findings) => {
            println!("Suspicious transactions detected!");
            for finding in findings {
                println!("  Flagged [{}]: {}", finding.index, finding.description);
            }
            println!("Recommendation: review these transactions and consider reporting them.");
        }
        FraudSummary::Clean => println!("No suspicious activity detected today."),
        FraudSummary::Unavailable { reason } => {
            println!("Could not run fraud detection: {reason}")
        }
    }

    println!();
    match &report.audio {
        Some(path) => println!("Audio report saved to {}", path.display()),
        None => println!("(audio report unavailable)"),
    }

    Ok(())
}
