use std::collections::HashSet;

use engine_logging::{engine_debug, engine_warn};
use serde_json::Value;
use url::Url;

use crate::fetch::{Fetcher, NoProgress};
use crate::{FailureKind, FetchError};

/// Fetches `url` and follows `rel="next"` links until none is left, returning
/// every record in page order.
///
/// `params` are appended to the first request only; next-page URLs are used as
/// given. Any failure aborts the whole listing and discards what was collected.
/// A page whose body is not a JSON array contributes no records.
pub async fn fetch_all(
    fetcher: &dyn Fetcher,
    url: &str,
    params: &[(&str, String)],
) -> Result<Vec<Value>, FetchError> {
    let mut next = Some(with_params(url, params)?);
    let mut records = Vec::new();
    let mut visited = HashSet::new();
    let mut pages = 0usize;

    while let Some(page_url) = next.take() {
        if !visited.insert(page_url.clone()) {
            engine_warn!("Pagination of {} loops back to {}, stopping", url, page_url);
            break;
        }
        let output = fetcher.fetch(&page_url, &NoProgress).await?;
        pages += 1;
        match serde_json::from_slice::<Value>(&output.bytes) {
            Ok(Value::Array(items)) => records.extend(items),
            Ok(other) => {
                engine_warn!(
                    "Page {} of {} is not a list ({}), ignoring",
                    pages,
                    url,
                    json_kind(&other)
                );
            }
            Err(err) => {
                engine_warn!("Page {} of {} is not valid JSON: {}", pages, url, err);
            }
        }
        next = output.metadata.next_page;
    }

    engine_debug!("Fetched {} records in {} page(s) from {}", records.len(), pages, url);
    Ok(records)
}

fn with_params(url: &str, params: &[(&str, String)]) -> Result<String, FetchError> {
    let mut parsed = Url::parse(url)
        .map_err(|err| FetchError::new(FailureKind::InvalidUrl, format!("{url}: {err}")))?;
    if !params.is_empty() {
        let mut pairs = parsed.query_pairs_mut();
        for (key, value) in params {
            pairs.append_pair(key, value);
        }
    }
    Ok(parsed.into())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
