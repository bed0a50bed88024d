//! Resilient paginated bulk reads
//!
//! Walks a windowed data source in fixed-size pages until a short page
//! signals end-of-data, retrying transient failures with exponential
//! backoff and jitter. Callers get the complete row set or a single
//! aggregated error naming the fetched resource; partial results are never
//! returned.

use anyhow::{anyhow, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Page size and retry parameters for one bulk read
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub page_size: i64,
    /// Retries after the initial attempt, per window
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: 500,
            max_retries: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl FetchOptions {
    pub fn with_page_size(page_size: i64) -> Self {
        Self {
            page_size,
            ..Default::default()
        }
    }
}

/// Fetch the complete row set of a windowed source.
///
/// `query_window(from, to)` returns the rows in the inclusive index window;
/// a page shorter than `page_size` is the end-of-data sentinel (there is no
/// separate "has more" flag).
pub async fn fetch_all_pages<T, F, Fut>(
    label: &str,
    opts: &FetchOptions,
    mut query_window: F,
) -> Result<Vec<T>>
where
    F: FnMut(i64, i64) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let page_size = opts.page_size.max(1);
    let mut rows: Vec<T> = Vec::new();
    let mut from: i64 = 0;

    loop {
        let to = from + page_size - 1;
        let page = fetch_window(label, opts, &mut query_window, from, to).await?;
        let page_len = page.len() as i64;
        rows.extend(page);

        if page_len < page_size {
            break;
        }
        from += page_size;
    }

    Ok(rows)
}

async fn fetch_window<T, F, Fut>(
    label: &str,
    opts: &FetchOptions,
    query_window: &mut F,
    from: i64,
    to: i64,
) -> Result<Vec<T>>
where
    F: FnMut(i64, i64) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        match query_window(from, to).await {
            Ok(page) => return Ok(page),
            Err(err) => {
                if attempt > opts.max_retries {
                    return Err(anyhow!(
                        "fetching {}: giving up after {} attempts: {}",
                        label,
                        attempt,
                        err
                    ));
                }

                let backoff = opts.base_delay.saturating_mul(1u32 << (attempt - 1).min(16));
                let jitter_cap = (opts.base_delay.as_millis() as u64 / 2).max(1);
                let jitter =
                    Duration::from_millis(rand::thread_rng().gen_range(0..jitter_cap));
                let delay = backoff + jitter;

                tracing::warn!(
                    resource = label,
                    attempt,
                    window_from = from,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient fetch error, will retry after backoff"
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}
