//! Terminal client for the places API.
//!
//! ```text
//! neighborfit-cli search <place name>
//! neighborfit-cli detail <place name> <society number>
//! neighborfit-cli submit <draft.json>
//! ```

use std::env;
use std::time::Duration;

use neighborfit::config::Config;
use neighborfit::detail::{render_detail, DetailView, SocietyHandoff};
use neighborfit::models::PlaceDraft;
use neighborfit::places_client::PlacesClient;
use neighborfit::search::{run_search, SearchOutcome, SearchState};
use neighborfit::submission::{
    run_submission, SubmissionForm, DEFAULT_NOTICE_SECS, SUCCESS_MESSAGE,
};

const USAGE: &str = "usage: neighborfit-cli <search PLACE | detail PLACE N | submit DRAFT.json>";

/// Main entry point for the CLI.
///
/// Loads the same configuration as the view service and runs one flow.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "neighborfit=warn".into()),
        )
        .init();

    let config = Config::from_env()?;
    let client = PlacesClient::new(
        &config.api_url,
        Duration::from_secs(config.request_timeout_secs),
    )?;

    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("search") if args.len() > 1 => search(&client, &args[1..].join(" ")).await,
        Some("detail") if args.len() > 2 => {
            let (number, place) = args[1..]
                .split_last()
                .ok_or_else(|| anyhow::anyhow!(USAGE))?;
            let number: usize = number
                .parse()
                .map_err(|_| anyhow::anyhow!("society number must be a positive integer"))?;
            detail(&client, &place.join(" "), number).await
        }
        Some("submit") if args.len() == 2 => submit(&client, &config, &args[1]).await,
        _ => anyhow::bail!(USAGE),
    }
}

async fn search(client: &PlacesClient, place: &str) -> anyhow::Result<()> {
    let mut state = SearchState::new();
    state.set_place(place);
    state.commit_place();

    if let SearchOutcome::Found(found) = run_search(client, &mut state).await {
        println!("Societies in {}", found.name);
    }
    match state.rows() {
        Some(rows) => {
            for (i, row) in rows.iter().enumerate() {
                println!(
                    "{:>3}. {:<30} {:>18}   best: {}",
                    i + 1,
                    row.name,
                    row.cost_of_living,
                    row.highest_rated
                );
            }
        }
        None => {
            if let Some(text) = state.empty_text() {
                println!("{}", text);
            }
        }
    }
    Ok(())
}

/// Detail needs an in-memory hand-off, so the place is listed first in the
/// same process and the chosen row is handed over.
async fn detail(client: &PlacesClient, place: &str, number: usize) -> anyhow::Result<()> {
    let mut state = SearchState::new();
    state.set_place(place);
    state.commit_place();
    run_search(client, &mut state).await;

    let handoff = state
        .result()
        .zip(number.checked_sub(1))
        .and_then(|(found, index)| SocietyHandoff::from_place(found, index));

    match render_detail(handoff.as_ref()) {
        DetailView::Society(detail) => {
            println!("{}", detail.name);
            println!("in {} ({} of {})", detail.place_name, detail.position, detail.total);
            println!("Cost of Living: {}", detail.cost_of_living);
            for rating in &detail.ratings {
                println!("{}: {}", rating.label, rating.value);
            }
            if let Some(about) = &detail.description {
                println!("\nAbout\n{}", about);
            }
        }
        view @ DetailView::NoData => {
            if let Some(text) = state.message() {
                println!("{}", text);
            }
            println!("{}", view.message().unwrap_or_default());
        }
    }
    Ok(())
}

async fn submit(client: &PlacesClient, config: &Config, path: &str) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(path).await?;
    let draft: PlaceDraft = serde_json::from_str(&raw)?;
    let ttl = i64::try_from(config.success_notice_secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or_else(|| chrono::Duration::seconds(DEFAULT_NOTICE_SECS));
    let mut form = SubmissionForm::with_draft(draft, ttl);

    match run_submission(client, &mut form).await {
        Ok(outcome) => {
            println!("{}", SUCCESS_MESSAGE);
            tracing::debug!("{:?}", outcome);
            Ok(())
        }
        Err(failure) => {
            if !failure.appended.is_empty() {
                eprintln!(
                    "Already added before the failure: {}",
                    failure.appended.join(", ")
                );
            }
            if let neighborfit::errors::AppError::Validation(issues) = failure.error.root() {
                for issue in issues {
                    eprintln!("  - {}", issue);
                }
            }
            anyhow::bail!(form.alert().unwrap_or_default().to_string())
        }
    }
}
