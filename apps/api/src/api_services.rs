mod database;
mod sessions;
mod state_builder;

pub use database::{apply_migrations, connect_database};
pub use sessions::build_postgres_session_layer;
pub use state_builder::{build_app_state, seed_admin};
