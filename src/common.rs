pub mod dates;
pub mod db_utils;
pub mod error;
pub mod i18n;
pub mod listing;
pub mod numeric;
pub mod pricing;
pub mod response;
pub mod update;
