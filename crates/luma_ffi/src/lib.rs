pub mod api;
mod session_registry;
