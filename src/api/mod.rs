use std::sync::Arc;

use bevy_ecs::prelude::Resource;

pub mod account;
pub mod backend;
pub mod client;
pub mod envelope;
pub mod quote;
pub mod record;

pub use backend::Backend;
pub use client::HttpBackend;

/// Shared backend handle, cloned into every spawned request task
#[derive(Resource, Clone)]
pub struct Api(pub Arc<dyn Backend>);

impl Api {
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self(Arc::new(backend))
    }
}

impl std::ops::Deref for Api {
    type Target = dyn Backend;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}
