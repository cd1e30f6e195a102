pub mod calendar;
pub mod corporate_event;
pub mod portfolio;
pub mod position;
pub mod price;
pub mod settings;
pub mod transaction;
