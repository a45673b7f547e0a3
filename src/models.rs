pub mod auth;
pub mod budget;
pub mod client;
pub mod funnel;
pub mod goal;
pub mod lead;
pub mod order;
pub mod report;
pub mod space_desk;
