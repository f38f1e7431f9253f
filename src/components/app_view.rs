//! Page routes. Every page renders inside the shared shell, so navigating
//! between them swaps content while the music keeps playing.

use crate::components::{About, Home, PageShell};
use dioxus::prelude::*;

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(PageShell)]
    #[route("/")]
    Home {},
    #[route("/about")]
    About {},
}

pub fn route_label(route: &Route) -> &'static str {
    match route {
        Route::Home {} => "Home",
        Route::About {} => "About",
    }
}
