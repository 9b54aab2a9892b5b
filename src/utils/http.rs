use std::time::Duration;

use reqwest::{Client, StatusCode};

/// Default timeout for HTTP requests in seconds
pub const DEFAULT_TIMEOUT: u64 = 5;

/// Makes an HTTP GET request to the specified URL
///
/// # Arguments
/// * `url` - The URL to request
/// * `timeout` - Total time allowed for the request
///
/// # Returns
/// * `Ok(String)` - The response body as a string
/// * `Err(String)` - Error message if the request failed
pub async fn web_get_async(url: &str, timeout: Duration) -> Result<String, String> {
    let client = match Client::builder()
        .timeout(timeout)
        .user_agent(concat!("linkforge/", env!("CARGO_PKG_VERSION")))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            return Err(format!("Failed to build HTTP client: {}", e));
        }
    };

    let response = match client.get(url).send().await {
        Ok(resp) => resp,
        Err(e) if e.is_timeout() => {
            return Err(format!("Request timed out after {:?}", timeout));
        }
        Err(e) => {
            return Err(format!("Failed to send request: {}", e));
        }
    };

    if response.status() != StatusCode::OK {
        return Err(format!("HTTP error: {}", response.status()));
    }

    match response.text().await {
        Ok(body) => Ok(body),
        Err(e) => Err(format!("Failed to read response body: {}", e)),
    }
}

/// Synchronous version of web_get_async that uses tokio runtime to run the async function
pub fn web_get(url: &str, timeout: Duration) -> Result<String, String> {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            return Err(format!("Failed to create tokio runtime: {}", e));
        }
    };

    rt.block_on(web_get_async(url, timeout))
}
