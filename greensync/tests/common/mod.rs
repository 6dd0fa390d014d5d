use std::future::{Future, poll_fn};
use std::pin::pin;
use std::task::Poll;

/// Polls `future` once from the calling task, then drops it.
///
/// Returns `true` if the future was still pending when dropped.
pub async fn poll_once_then_drop<F: Future>(future: F) -> bool {
    let mut future = pin!(future);
    poll_fn(|cx| Poll::Ready(future.as_mut().poll(cx).is_pending())).await
}
