pub mod export_service;
pub mod projection_service;
pub mod stats_service;
pub mod validation;
