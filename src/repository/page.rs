//! Offset pagination over a cursor-only backend.

use tracing::debug;

use crate::store::{Item, ItemKey, QueryRequest, SelectMode, StoreClient, StoreError};

/// Collects every item the query matches, following continuation cursors.
pub async fn collect_all<S: StoreClient>(
    store: &S,
    request: QueryRequest,
) -> Result<Vec<Item>, StoreError> {
    let mut items = Vec::new();
    let mut start_key: Option<ItemKey> = None;
    loop {
        let mut page_request = request.clone();
        page_request.start_key = start_key;
        let response = store.query(page_request).await?;
        items.extend(response.items);
        match response.last_key {
            Some(key) => start_key = Some(key),
            None => return Ok(items),
        }
    }
}

/// Serves one offset page over cursor-only queries.
///
/// Skips `page * limit` items with keys-only queries before fetching the page,
/// so the cost grows with the page index; fine for the short listings this
/// system serves. `limit` counts items scanned before any filter, the way the
/// backend's own limit does, so a filtered page can come back short.
///
/// Returns the page plus the exact total of matching items. A page starting
/// past the end of the data is empty but still reports that total.
pub async fn offset_page<S: StoreClient>(
    store: &S,
    request: QueryRequest,
    page: i32,
    limit: i32,
) -> Result<(Vec<Item>, i64), StoreError> {
    let limit = limit.max(1);
    let total = count_matching(store, request.clone()).await?;

    let mut start_key: Option<ItemKey> = None;
    let mut to_skip = i64::from(page.max(0)) * i64::from(limit);
    while to_skip > 0 {
        let chunk = to_skip.min(i64::from(limit)) as i32;
        let mut skip_request = request.clone();
        skip_request.select = SelectMode::KeysOnly;
        skip_request.filter = None;
        skip_request.limit = Some(chunk);
        skip_request.start_key = start_key;

        let response = store.query(skip_request).await?;
        match response.last_key {
            Some(key) => start_key = Some(key),
            None => {
                debug!(page, limit, total, "offset page starts past the end");
                return Ok((Vec::new(), total));
            }
        }
        to_skip -= i64::from(chunk);
    }

    let mut page_request = request;
    page_request.limit = Some(limit);
    page_request.start_key = start_key;
    let response = store.query(page_request).await?;
    Ok((response.items, total))
}

/// Exact post-filter count. Follows cursors so the total stays right past the
/// backend's scan window.
async fn count_matching<S: StoreClient>(
    store: &S,
    request: QueryRequest,
) -> Result<i64, StoreError> {
    let mut count_request = request;
    count_request.select = SelectMode::CountOnly;
    count_request.limit = None;

    let mut total = 0;
    let mut start_key: Option<ItemKey> = None;
    loop {
        let mut page_request = count_request.clone();
        page_request.start_key = start_key;
        let response = store.query(page_request).await?;
        total += response.count;
        match response.last_key {
            Some(key) => start_key = Some(key),
            None => return Ok(total),
        }
    }
}
