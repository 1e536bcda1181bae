pub mod http_adapter;
