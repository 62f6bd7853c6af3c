use actix_web::{
    body::BoxBody,
    get,
    http::{header::ContentType, StatusCode},
    post, web, App, HttpResponse, HttpServer, ResponseError,
};
use blackjack_sim::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{error, info, Level};

/// Body of a request to play a batch of rounds.
#[derive(Debug, Deserialize)]
struct PlayRequest {
    plays: u32,
}

/// Response to a played batch, the new point of the profit series along with the table state.
#[derive(Serialize)]
struct PlayResponse {
    point: ProfitPoint,
    bankroll: f64,
    running_count: i32,
    true_count: i32,
    remaining_decks: f64,
    ended_early: bool,
}

/// An enum that will handle user facing errors
#[derive(Debug, Error)]
enum UserError {
    #[error("an internal error occurred")]
    InternalError,
    #[error("{0}")]
    SimulationCreationError(String),
    #[error("a game has not been configured yet")]
    SimulatorNotCreated,
    #[error("{0}")]
    BadInput(String),
}

impl ResponseError for UserError {
    fn error_response(&self) -> HttpResponse<BoxBody> {
        HttpResponse::build(self.status_code())
            .content_type(ContentType::plaintext())
            .body(self.to_string())
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            UserError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            UserError::SimulationCreationError(_) => StatusCode::BAD_REQUEST,
            UserError::SimulatorNotCreated => StatusCode::BAD_REQUEST,
            UserError::BadInput(_) => StatusCode::BAD_REQUEST,
        }
    }
}

type AppSimulator = web::Data<Mutex<Option<BlackjackSimulator>>>;

fn lock(app_sim: &AppSimulator) -> Result<MutexGuard<'_, Option<BlackjackSimulator>>, UserError> {
    app_sim.lock().map_err(|_| UserError::InternalError)
}

/// A handler that will configure and build a new `BlackjackSimulator` from the body of the
/// request, replacing any previous game. Fields left out of the body take their default values.
#[post("/config-game-params")]
async fn configure_game(
    params: web::Json<BlackjackSimulatorConfig>,
    app_sim: AppSimulator,
) -> Result<HttpResponse, UserError> {
    let config = BlackjackSimulatorConfig {
        silent: true,
        ..params.into_inner()
    };
    let simulator = BlackjackSimulator::new(config)
        .map_err(|e| UserError::SimulationCreationError(e.to_string()))?;

    *lock(&app_sim)? = Some(simulator);
    info!(?config, "game configured");
    Ok(HttpResponse::Ok().body("game created successfully"))
}

/// A handler that plays `plays` rounds and returns the resulting profit point.
#[post("/play")]
async fn play(
    request: web::Json<PlayRequest>,
    app_sim: AppSimulator,
) -> Result<HttpResponse, UserError> {
    if request.plays == 0 {
        return Err(UserError::BadInput(String::from(
            "plays must be a positive number of rounds",
        )));
    }

    let mut guard = lock(&app_sim)?;
    let simulator = guard.as_mut().ok_or(UserError::SimulatorNotCreated)?;
    let point = simulator.run_batch(request.plays).map_err(|e| {
        error!(error = %e, "batch failed");
        UserError::InternalError
    })?;

    let game = simulator.game();
    Ok(HttpResponse::Ok().json(PlayResponse {
        point,
        bankroll: game.player().balance(),
        running_count: game.running_count(),
        true_count: game.true_count(),
        remaining_decks: game.shoe().remaining_decks(),
        ended_early: simulator.ended_early(),
    }))
}

/// A handler returning the whole profit series recorded so far.
#[get("/outputs")]
async fn outputs(app_sim: AppSimulator) -> Result<HttpResponse, UserError> {
    let guard = lock(&app_sim)?;
    let simulator = guard.as_ref().ok_or(UserError::SimulatorNotCreated)?;
    Ok(HttpResponse::Ok().json(simulator.outputs()))
}

#[get("/summary")]
async fn summary(app_sim: AppSimulator) -> Result<HttpResponse, UserError> {
    let guard = lock(&app_sim)?;
    let simulator = guard.as_ref().ok_or(UserError::SimulatorNotCreated)?;
    Ok(HttpResponse::Ok().json(simulator.summary()))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let address = "127.0.0.1";
    let port = 8080;
    info!("listening at {}:{}", address, port);

    let app_sim: AppSimulator = web::Data::new(Mutex::new(None));

    HttpServer::new(move || {
        App::new()
            .app_data(app_sim.clone())
            .service(configure_game)
            .service(play)
            .service(outputs)
            .service(summary)
    })
    .bind((address, port))?
    .run()
    .await
}
