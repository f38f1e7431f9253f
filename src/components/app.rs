use crate::components::{route_label, Route};
use dioxus::prelude::*;

const NAV_ROUTES: [Route; 2] = [Route::Home {}, Route::About {}];

/// Layout shared by every page: navigation on top, the routed page below.
#[component]
pub fn PageShell() -> Element {
    rsx! {
        div { class: "page-shell",
            nav { class: "page-nav",
                for route in NAV_ROUTES {
                    Link {
                        key: "{route_label(&route)}",
                        class: "nav-link",
                        active_class: "active",
                        to: route.clone(),
                        "{route_label(&route)}"
                    }
                }
            }
            main { class: "page-content", Outlet::<Route> {} }
        }
    }
}
