use async_trait::async_trait;
use serde::Serialize;
use std::error::Error;
use std::future::Future;

/// Error returned by a fetcher
pub type FetchError = Box<dyn Error + Send + Sync>;

/// Trait for anything that can load the current state of a resource by id.
///
/// The waiter calls `fetch` at most once per tick and never concurrently for
/// the same wait. Implementations should be free of side effects.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Representation returned by the remote API. Serialized to JSON before evaluation.
    type Resource: Serialize + Send;

    /// Fetch the resource with the given id
    async fn fetch(&self, resource_id: &str) -> Result<Self::Resource, FetchError>;
}

/// Fetcher backed by an async closure
pub struct FnFetcher<F> {
    func: F,
}

/// Wrap an async closure taking the resource id as a `Fetcher`
pub fn fetch_fn<F, Fut, R>(func: F) -> FnFetcher<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, FetchError>> + Send + 'static,
    R: Serialize + Send + 'static,
{
    FnFetcher { func }
}

#[async_trait]
impl<F, Fut, R> Fetcher for FnFetcher<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, FetchError>> + Send + 'static,
    R: Serialize + Send + 'static,
{
    type Resource = R;

    async fn fetch(&self, resource_id: &str) -> Result<R, FetchError> {
        (self.func)(resource_id.to_string()).await
    }
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for &T {
    type Resource = T::Resource;

    async fn fetch(&self, resource_id: &str) -> Result<Self::Resource, FetchError> {
        (**self).fetch(resource_id).await
    }
}
