//! Window provider service: responsibility and boundaries
//!
//! Each submodule knows how to reach exactly one platform's window manager
//! and normalize its answer into a [`crate::window::WindowInfo`]. Providers
//! hold no state between calls: every query opens its own socket, bus
//! connection or helper process and releases it before returning.

mod gnome;
mod hyprland;
mod macos;
mod sway;
mod r#trait;

pub use self::r#trait::get_active_window_info;
