//! Cursor-driven paging over remote listings.

use futures::Stream;
use futures::stream;
use std::future::Future;

/// One page of a remote listing plus the cursor for the page after it.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }

    /// A page that the source reports as the final one.
    #[must_use]
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }
}

/// Lazily walks a listing page by page.
///
/// `fetch` is called with `None` for the first page and with the previous
/// page's cursor afterwards. The stream ends on an empty page (which is not
/// yielded), after a page without a next cursor, or right after yielding an
/// error. Calling `paginate` again starts over from the first page.
pub fn paginate<T, E, F, Fut>(fetch: F) -> impl Stream<Item = Result<Vec<T>, E>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    stream::unfold(Some((None, fetch)), |state| async move {
        let (cursor, mut fetch) = state?;
        match fetch(cursor).await {
            Ok(page) if page.items.is_empty() => None,
            Ok(page) => {
                let next = page.next_cursor.map(|cursor| (Some(cursor), fetch));
                Some((Ok(page.items), next))
            }
            Err(error) => Some((Err(error), None)),
        }
    })
}
