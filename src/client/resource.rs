use std::marker::PhantomData;
use std::sync::Arc;

use reqwest::Method;

use super::HttpBackend;
use crate::error::BackendError;
use crate::models::CrudResource;

/// Uniform `getAll / create / update / delete` over one backend collection
pub struct ResourceClient<T: CrudResource> {
    backend: Arc<HttpBackend>,
    _marker: PhantomData<T>,
}

impl<T: CrudResource> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self::new(self.backend.clone())
    }
}

impl<T: CrudResource> ResourceClient<T> {
    pub fn new(backend: Arc<HttpBackend>) -> Self {
        Self {
            backend,
            _marker: PhantomData,
        }
    }

    pub async fn get_all(&self) -> Result<Vec<T>, BackendError> {
        HttpBackend::send_json(self.backend.request(Method::GET, T::PATH)).await
    }

    pub async fn create(&self, item: &T) -> Result<T, BackendError> {
        let rb = self.backend.request(Method::POST, T::PATH).json(item);
        HttpBackend::send_json(rb).await
    }

    pub async fn update(&self, id: i64, item: &T) -> Result<T, BackendError> {
        let rb = self
            .backend
            .request(Method::PUT, &format!("{}/{}", T::PATH, id))
            .json(item);
        HttpBackend::send_json(rb).await
    }

    /// Cascade of child entities is decided by the backend
    pub async fn delete(&self, id: i64) -> Result<(), BackendError> {
        HttpBackend::send(self.backend.request(Method::DELETE, &format!("{}/{}", T::PATH, id))).await?;
        tracing::info!("Deleted {} {}", T::PATH, id);
        Ok(())
    }
}
