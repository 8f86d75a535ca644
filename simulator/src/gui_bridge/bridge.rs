use crate::generator::profile::GeneratorConfig;
use crate::gui_bridge::model::BridgeState;
use crate::workflow::runner::Runner;
use anyhow::Context;
use fieldcore::interface::{PipelineRequest, ResultRecord};
use log::{info, warn};
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, PoisonError, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter};

pub type SharedState = Arc<RwLock<BridgeState>>;

/// HTTP endpoint that runs incoming requests and serves the latest record.
pub struct GuiBridge {
    state: SharedState,
}

impl GuiBridge {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(BridgeState::default())),
        }
    }

    /// Binds `addr` and serves on a background thread; returns the bound address.
    pub fn spawn(&self, runner: Arc<Runner>, addr: SocketAddr) -> anyhow::Result<SocketAddr> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("building bridge runtime")?;
        let (bound, server) = {
            let _guard = runtime.enter();
            warp::serve(routes(self.state.clone(), runner))
                .try_bind_ephemeral(addr)
                .with_context(|| format!("binding HTTP bridge to {addr}"))?
        };
        thread::spawn(move || runtime.block_on(server));
        info!("HTTP bridge listening on {bound}");
        Ok(bound)
    }

    pub fn publish(&self, record: &ResultRecord) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        guard.accept(record.clone());
        info!(
            "[bridge] record with {} artifacts published (run {})",
            record.len(),
            guard.runs
        );
    }

    pub fn publish_status(&self, message: &str) {
        info!("[bridge] {message}");
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> BridgeState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Default for GuiBridge {
    fn default() -> Self {
        Self::new()
    }
}

/// `GET /latest`, `GET /metrics`, `POST /run` and `POST /generate`.
pub fn routes(
    state: SharedState,
    runner: Arc<Runner>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let state_filter = warp::any().map(move || state.clone());
    let runner_filter = warp::any().map(move || runner.clone());

    let latest_route = warp::path("latest")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .and(runner_filter.clone())
        .map(|state: SharedState, runner: Arc<Runner>| {
            let mut guard = state.write().unwrap_or_else(PoisonError::into_inner);
            guard.metrics = runner.metrics();
            warp::reply::json(&*guard)
        });

    let metrics_route = warp::path("metrics")
        .and(warp::path::end())
        .and(warp::get())
        .and(runner_filter.clone())
        .map(|runner: Arc<Runner>| warp::reply::json(&runner.metrics()));

    let run_route = warp::path("run")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(state_filter.clone())
        .and(runner_filter.clone())
        .map(
            |request: PipelineRequest, state: SharedState, runner: Arc<Runner>| {
                respond(&state, runner.execute_request(&request))
            },
        );

    let generate_route = warp::path("generate")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(state_filter)
        .and(runner_filter)
        .map(
            |config: GeneratorConfig, state: SharedState, runner: Arc<Runner>| {
                if let Some(description) = config.description.as_ref() {
                    info!("[bridge] generating field: {description}");
                }
                let outcome = runner
                    .generate(&config)
                    .and_then(|inputs| runner.execute(inputs));
                respond(&state, outcome)
            },
        );

    latest_route
        .or(metrics_route)
        .or(run_route)
        .or(generate_route)
}

fn respond(
    state: &SharedState,
    outcome: anyhow::Result<ResultRecord>,
) -> warp::reply::WithStatus<warp::reply::Json> {
    let mut guard = state.write().unwrap_or_else(PoisonError::into_inner);
    match outcome {
        Ok(record) => {
            let reply = warp::reply::json(&record);
            guard.accept(record);
            warp::reply::with_status(reply, StatusCode::OK)
        }
        Err(err) => {
            let message = format!("{err:#}");
            warn!("bridge request failed: {message}");
            guard.reject(message.clone());
            warp::reply::with_status(
                warp::reply::json(&json!({ "error": message })),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
        }
    }
}
