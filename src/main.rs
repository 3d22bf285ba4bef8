use std::sync::Arc;

use characterkb_images::{
    backend::BackendClient,
    config::Config,
    http::{build_client, build_probe_client},
    image_search::{GoogleImageSearch, ImageSearch},
    probe::HttpImageProbe,
    resolver::ImageResolver,
    server::{router, AppState},
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    let http = build_client(config.insecure_ssl).expect("failed to build HTTP client");
    let probe_http =
        build_probe_client(config.insecure_ssl).expect("failed to build probe HTTP client");

    let search: Arc<dyn ImageSearch> = match &config.search {
        Some(creds) => Arc::new(GoogleImageSearch::new(
            http.clone(),
            &creds.api_key,
            &creds.engine_id,
        )),
        None => {
            tracing::warn!("GOOGLE_API_KEY / SEARCH_ENGINE_ID not set; galleries will use placeholders");
            Arc::new(GoogleImageSearch::unconfigured(http.clone()))
        }
    };

    let state = AppState {
        resolver: ImageResolver::new(search, Arc::new(HttpImageProbe::new(probe_http))),
        backend: BackendClient::new(http, &config.backend_url),
        options: config.resolve,
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind).await.unwrap();
    tracing::info!(
        backend = %config.backend_url,
        "listening on {}",
        listener.local_addr().unwrap()
    );
    axum::serve(listener, app).await.unwrap();
}
