use std::time::Duration;

const USER_AGENT: &str = "characterkb-images/0.1";

/// Total deadline for provider and backend requests.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the HTTP client shared by the provider and backend clients.
pub fn build_client(insecure: bool) -> Result<reqwest::Client, reqwest::Error> {
    base_builder(insecure).timeout(REQUEST_TIMEOUT).build()
}

/// Build the client used for image probes. It has no total request
/// deadline: the resolver's per-probe timeout is the only bound.
pub fn build_probe_client(insecure: bool) -> Result<reqwest::Client, reqwest::Error> {
    base_builder(insecure).build()
}

fn base_builder(insecure: bool) -> reqwest::ClientBuilder {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        reqwest::header::HeaderValue::from_static("en-US,en;q=0.9"),
    );

    let builder = reqwest::ClientBuilder::new()
        .connect_timeout(Duration::from_secs(5))
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(USER_AGENT)
        .default_headers(headers);

    if insecure {
        builder.danger_accept_invalid_certs(true)
    } else {
        builder
    }
}

/// Short, log-friendly classification of a transport error.
pub fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("TimeoutError: {}", e)
    } else if e.is_connect() {
        format!("ConnectError: {}", e)
    } else {
        format!("RequestError: {}", e)
    }
}
