pub mod db;
pub mod jwt;
pub mod sms;
