pub mod memory;
pub mod store;
pub mod supabase;
pub mod supabase_store;

use std::sync::Arc;

use tracing::info;

use shared_config::AppConfig;

pub use memory::InMemoryStore;
pub use store::{DoctorStore, ReservationStore, StoreError, StoreResult};
pub use supabase_store::SupabaseStore;

/// Handles to the persistence backends shared by every cell.
#[derive(Clone)]
pub struct Database {
    pub doctors: Arc<dyn DoctorStore>,
    pub reservations: Arc<dyn ReservationStore>,
}

impl Database {
    pub fn new(doctors: Arc<dyn DoctorStore>, reservations: Arc<dyn ReservationStore>) -> Self {
        Self { doctors, reservations }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::new(store.clone(), store)
    }

    pub fn supabase(config: &AppConfig) -> Self {
        let store = Arc::new(SupabaseStore::new(config));
        Self::new(store.clone(), store)
    }

    pub fn from_config(config: &AppConfig) -> Self {
        if config.is_supabase_configured() {
            info!("Using Supabase store at {}", config.supabase_url);
            Self::supabase(config)
        } else {
            info!("Supabase not configured, using in-memory store");
            Self::in_memory()
        }
    }
}
