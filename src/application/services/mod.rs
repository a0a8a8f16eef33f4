pub mod competition_service;
pub mod portfolio_service;
