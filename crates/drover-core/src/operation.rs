use std::fmt;
use std::future::Future;

use async_trait::async_trait;

use crate::error::OperationError;

/// A zero-argument asynchronous unit of work.
///
/// The queue only observes how it settles (resolved or failed) and how long
/// it takes; the output value is discarded. Any `FnOnce() -> impl Future`
/// whose output is a `Result` with a displayable error is an operation:
///
/// ```ignore
/// queue.push_one(|| async {
///     fetch_report().await?;
///     Ok::<_, std::io::Error>(())
/// });
/// ```
#[async_trait]
pub trait Operation: Send {
    async fn run(self: Box<Self>) -> Result<(), OperationError>;
}

pub type BoxedOperation = Box<dyn Operation>;

/// Box an operation so several different closures can be pushed together.
pub fn boxed<O: Operation + 'static>(operation: O) -> BoxedOperation {
    Box::new(operation)
}

#[async_trait]
impl<F, Fut, T, E> Operation for F
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: fmt::Display + Send + 'static,
{
    async fn run(self: Box<Self>) -> Result<(), OperationError> {
        (*self)().await.map(|_| ()).map_err(OperationError::from_display)
    }
}
