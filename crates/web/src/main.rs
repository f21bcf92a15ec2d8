use anyhow::Context;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod app;
mod config;
mod error;
mod features;

use app::AppState;
use config::Config;
use features::{people, rankings, submissions};

#[derive(OpenApi)]
#[openapi(
    paths(
        submissions::handlers::submit_task,
        submissions::handlers::submit_climb,
        submissions::handlers::submit_lane,
        submissions::handlers::list_submissions,
        submissions::handlers::stream_submissions,
        people::handlers::list_people,
        people::handlers::get_person,
        people::handlers::add_person,
        people::handlers::upload_roster,
        rankings::handlers::get_summary,
        rankings::handlers::get_leaderboard,
        rankings::handlers::get_speed_leaderboard,
    ),
    components(
        schemas(
            tally_storage::dto::submission::SubmitTaskRequest,
            tally_storage::dto::submission::SubmitClimbRequest,
            tally_storage::dto::submission::SubmitLaneTimeRequest,
            tally_storage::dto::submission::SubmissionResponse,
            tally_storage::dto::submission::RejectionResponse,
            tally_storage::dto::person::AddPersonRequest,
            tally_storage::dto::person::PersonDetailResponse,
            tally_storage::dto::person::RosterUploadResponse,
            tally_storage::dto::summary::PersonSummary,
            tally_storage::dto::ranking::LeaderboardEntry,
            tally_storage::dto::ranking::RouteScore,
            tally_storage::dto::ranking::SpeedLeaderboardEntry,
            tally_storage::dto::ranking::LaneTime,
            tally_storage::models::Person,
            tally_storage::models::Attempt,
            tally_storage::models::ClimbResult,
            tally_storage::models::RouteStatus,
            tally_storage::models::Submission,
            tally_storage::models::SubmissionPayload,
            tally_storage::models::TaskStatus,
            tally_storage::models::ScoringPolicy,
            tally_storage::services::RejectionKind,
        )
    ),
    tags(
        (name = "submissions", description = "Task, climb and lane submissions"),
        (name = "people", description = "Roster endpoints"),
        (name = "rankings", description = "Summaries and leaderboards"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting tally API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!(
        "Configuration loaded: {} mode, {} scoring, data in {}",
        config.mode,
        config.policy,
        config.data_dir.display()
    );

    let state = AppState::from_config(&config).context("Failed to initialize tracker")?;

    let app = app::router()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state);

    let bind_address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    axum::serve(listener, app).await?;

    Ok(())
}
