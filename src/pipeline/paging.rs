use std::{collections::HashSet, future::Future};

use crate::{
    error::{Error, Result},
    types::Page,
};

/// Follows a paginated endpoint until the upstream reports no further page.
///
/// `fetch_page` receives the continuation cursor of the previous page
/// (`None` for the first one). Items are returned in listing order. A cursor
/// seen before in the same listing is treated as an upstream failure
/// instead of looping.
pub async fn drain<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = fetch_page(cursor.take()).await?;
        items.extend(page.items);

        match page.next {
            Some(next) if !seen.insert(next.clone()) => {
                return Err(Error::upstream(
                    "pagination",
                    format!("next cursor {next} points at a page already listed"),
                ));
            }
            Some(next) => cursor = Some(next),
            None => return Ok(items),
        }
    }
}
