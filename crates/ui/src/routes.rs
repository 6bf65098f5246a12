use dioxus::prelude::*;
use dioxus_router::{Outlet, Routable};

use crate::views::TutorView;

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", TutorView)] Tutor {},
}

#[component]
fn Layout() -> Element {
    rsx! {
        div { class: "app",
            header { class: "app-header",
                h1 { "NextGrades" }
                span { class: "app-header__subtitle", "Mini Tutor" }
            }
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}
