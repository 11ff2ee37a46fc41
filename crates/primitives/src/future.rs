use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by command handlers, state queries and catalogs.
///
/// `Send + 'static` so it can be spawned onto the session runtime.
pub type BoxFutureStatic<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
