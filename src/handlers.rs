pub mod budgets;
pub mod clients;
pub mod crud;
pub mod funnels;
pub mod goals;
pub mod leads;
pub mod orders;
pub mod reports;
pub mod space_desk;
pub mod users;
pub mod webhooks;
pub mod ws;
