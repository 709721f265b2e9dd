//! Concurrent fan-out of tiled requests with first-error cancellation.

use std::future::Future;

use log::debug;
use tokio::task::JoinSet;

use crate::{MapServiceError, RequestContext};

/// Run `call` once per request, concurrently, and return the results in
/// submission order.
///
/// Every task runs under a child of `ctx` shared by the whole group. The
/// first task to fail cancels the group, the remaining tasks are drained,
/// and only that first error is returned; results of tasks that had already
/// succeeded are discarded. Concurrency equals `requests.len()`.
///
/// # Errors
/// Returns the first error produced by any task, or
/// [`MapServiceError::TaskFailed`] if a task panicked.
///
/// # Examples
///
/// ```
/// use waymark_core::{RequestContext, fan_out};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let doubled = fan_out(&RequestContext::new(), vec![1, 2, 3], |_ctx, n| async move {
///     Ok(n * 2)
/// })
/// .await?;
/// assert_eq!(doubled, [2, 4, 6]);
/// # Ok::<(), waymark_core::MapServiceError>(())
/// # }).unwrap();
/// ```
pub async fn fan_out<R, T, F, Fut>(
    ctx: &RequestContext,
    requests: Vec<R>,
    call: F,
) -> Result<Vec<T>, MapServiceError>
where
    F: Fn(RequestContext, R) -> Fut,
    Fut: Future<Output = Result<T, MapServiceError>> + Send + 'static,
    T: Send + 'static,
{
    let group = ctx.child();
    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None)
        .take(requests.len())
        .collect();
    let mut tasks = JoinSet::new();
    for (index, request) in requests.into_iter().enumerate() {
        let task_ctx = group.clone();
        let task = call(group.clone(), request);
        tasks.spawn(async move {
            // Polled first: a task's own context-derived error, such as a
            // throttler timeout, wins over the bare context error.
            let outcome = tokio::select! {
                biased;
                result = task => result,
                reason = task_ctx.ended() => Err(reason.into()),
            };
            (index, outcome)
        });
    }

    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        let err = match joined {
            Ok((index, Ok(value))) => {
                if let Some(slot) = slots.get_mut(index) {
                    *slot = Some(value);
                }
                continue;
            }
            Ok((index, Err(err))) => {
                debug!("fan-out task {index} failed: {err}");
                err
            }
            Err(join_err) => MapServiceError::TaskFailed {
                message: join_err.to_string(),
            },
        };
        if first_error.is_none() {
            group.cancel();
            first_error = Some(err);
        }
    }

    if let Some(err) = first_error {
        return Err(err);
    }
    slots
        .into_iter()
        .collect::<Option<Vec<T>>>()
        .ok_or_else(|| MapServiceError::TaskFailed {
            message: "fan-out task produced no result".to_owned(),
        })
}

#[cfg(test)]
mod tests {
    #![expect(
        clippy::expect_used,
        reason = "tests should fail fast when setup breaks"
    )]

    use super::*;
    use crate::{ContextError, ThrottleDimension, ThrottledResource};
    use rstest::rstest;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn results_follow_submission_order() {
        let delays = vec![30_u64, 10, 20, 0];
        let out = fan_out(&RequestContext::new(), delays, |_ctx, ms| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(ms)
        })
        .await
        .expect("all tasks succeed");
        assert_eq!(out, [30, 10, 20, 0]);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_input_returns_empty_output() {
        let out: Vec<u8> = fan_out(&RequestContext::new(), Vec::<u8>::new(), |_ctx, n| async move {
            Ok(n)
        })
        .await
        .expect("nothing to fail");
        assert!(out.is_empty());
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn first_error_cancels_siblings() {
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&finished);
        let err = fan_out(&RequestContext::new(), vec![0_u8, 1, 2, 3], move |_ctx, i| {
            let counter = Arc::clone(&counter);
            async move {
                if i == 2 {
                    return Err(MapServiceError::Http { status: 503 });
                }
                tokio::time::sleep(Duration::from_secs(3_600)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(i)
            }
        })
        .await
        .expect_err("one tile fails");
        assert_eq!(err, MapServiceError::Http { status: 503 });
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn caller_cancellation_stops_the_group() {
        let ctx = RequestContext::new();
        ctx.cancel();
        let err = fan_out(&ctx, vec![1_u8], |_ctx, n| async move {
            tokio::time::sleep(Duration::from_secs(3_600)).await;
            Ok(n)
        })
        .await
        .expect_err("cancelled");
        assert_eq!(err, MapServiceError::Cancelled);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn task_error_at_the_deadline_is_preserved() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(50));
        let err = fan_out(&ctx, vec![0_u8], |task_ctx, _n| async move {
            let reason = task_ctx.ended().await;
            Err::<u8, _>(MapServiceError::RateLimitExceeded {
                resource: ThrottledResource::Matrix,
                dimension: ThrottleDimension::Elements,
                cause: reason,
            })
        })
        .await
        .expect_err("deadline passes");
        assert_eq!(
            err,
            MapServiceError::RateLimitExceeded {
                resource: ThrottledResource::Matrix,
                dimension: ThrottleDimension::Elements,
                cause: ContextError::DeadlineExceeded,
            }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn parent_context_survives_group_cancellation() {
        let ctx = RequestContext::new();
        let _ = fan_out(&ctx, vec![1_u8], |_ctx, _n| async move {
            Err::<u8, _>(MapServiceError::NoRoutes)
        })
        .await;
        assert!(!ctx.is_cancelled());
    }

    #[rstest]
    #[tokio::test]
    async fn panicking_task_is_reported() {
        let err = fan_out(&RequestContext::new(), vec![0_u8], |_ctx, n| async move {
            if n == 0 {
                panic!("tile exploded");
            }
            Ok(n)
        })
        .await
        .expect_err("task panicked");
        assert!(matches!(err, MapServiceError::TaskFailed { .. }));
    }
}
