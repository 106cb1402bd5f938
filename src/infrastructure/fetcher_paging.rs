use std::time::Duration;

use log::warn;
use serde_json::Value;
use tokio::time::sleep;

use crate::{ApiFetcher, ApiRequest, StdResult, UpdateError};

/// Follows an opaque `next`-URL pagination envelope
/// (`{"results": [...], "next": url|null}`) until the server stops returning a
/// next page, accumulating the `results` of every page in order.
///
/// A failing page stops the loop with what has been gathered so far; some
/// providers terminate their listing with a non-JSON page.
pub async fn follow_next_pages(
    fetcher: &dyn ApiFetcher,
    first_request: ApiRequest,
) -> StdResult<Vec<Value>> {
    let mut results = Vec::new();
    let mut request = first_request.clone();

    loop {
        let page = match fetcher.get(&request).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Stopping pagination at {request}: {e}");
                break;
            }
        };
        if let Some(page_results) = page.get("results").and_then(Value::as_array) {
            results.extend(page_results.iter().cloned());
        }
        match page.get("next").and_then(Value::as_str) {
            Some(next_url) => {
                request = ApiRequest {
                    url: next_url.to_string(),
                    headers: first_request.headers.clone(),
                    // the next URL already embeds its query string
                    query: Vec::new(),
                };
            }
            None => break,
        }
    }

    Ok(results)
}

/// Pages through an array-shaped listing with `page`/`per_page` counters,
/// incrementing the page number until a page shorter than the requested page
/// size signals the end of the listing.
pub async fn fetch_numbered_pages(
    fetcher: &dyn ApiFetcher,
    base_request: &ApiRequest,
    page_size: u32,
) -> StdResult<Vec<Value>> {
    let mut results = Vec::new();
    let mut page_number = 1u32;

    loop {
        let request = base_request
            .clone()
            .with_query("per_page", &page_size.to_string())
            .with_query("page", &page_number.to_string());
        let page = fetcher.get(&request).await?;
        let page_results = page.as_array().ok_or_else(|| UpdateError::MalformedBody {
            url: request.url().to_string(),
        })?;
        results.extend(page_results.iter().cloned());
        if page_results.len() < page_size as usize {
            break;
        }
        page_number += 1;
    }

    Ok(results)
}

/// Whether a payload is the "well-formed but empty" answer of an endpoint whose
/// server-side computation has not finished yet.
pub fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

/// Calls the source until it answers with a non-empty payload, retrying with
/// exponential backoff up to `max_attempts` calls. When attempts are exhausted
/// the last (possibly empty) payload is accepted as final.
pub async fn retry_until_non_empty<F, Fut>(
    max_attempts: u32,
    base_delay: Duration,
    mut call: F,
) -> StdResult<Value>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StdResult<Value>>,
{
    let mut attempts = 0;

    loop {
        let payload = call().await?;
        attempts += 1;
        if !is_empty_payload(&payload) || attempts >= max_attempts {
            return Ok(payload);
        }
        warn!("Empty payload on attempt #{attempts}, retrying");
        sleep(base_delay * (2u32.pow((attempts - 1).min(31)))).await;
    }
}
