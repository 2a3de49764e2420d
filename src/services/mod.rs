pub mod window_provider;

pub use window_provider::get_active_window_info;
