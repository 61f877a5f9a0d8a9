use tracing::info;
use warp::Filter;

pub const LIVENESS_TEXT: &str = "Bot is active and running!";

/// Any GET answers 200 so the hosting platform keeps the process alive.
pub fn routes() -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::get().map(|| LIVENESS_TEXT)
}

pub async fn serve(port: u16) {
    info!(port, "liveness endpoint listening");
    warp::serve(routes()).run(([0, 0, 0, 0], port)).await;
}
