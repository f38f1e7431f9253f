//! The components module contains all shared components for our app.

mod app;
mod app_view;
mod control_hooks;
mod icons;
mod music_controls;
mod views;

pub use app::*;
pub use app_view::*;
pub use control_hooks::*;
pub use icons::*;
pub use music_controls::*;
pub use views::*;
