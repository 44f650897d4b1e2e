pub mod profile_service;
pub mod ranking_service;
pub mod ranking_store;
pub mod snapshot_service;
