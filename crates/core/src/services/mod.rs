pub mod corporate_action_service;
pub mod position_service;
pub mod ranking_service;
pub mod valuation_service;
