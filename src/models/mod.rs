pub mod db_config;
pub mod dialect;
