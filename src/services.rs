pub mod audit;
pub mod auth;
pub mod fanout;
pub mod ingestion;
pub mod leads;
pub mod reports;
pub mod space_desk;
pub mod whatsapp;
