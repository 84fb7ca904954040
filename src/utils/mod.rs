pub mod http_client;
pub mod instance_lock;
