use dioxus::prelude::*;
use dioxus_router::Router;

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{InstallBanner, UpdateToast};

#[component]
pub fn App() -> Element {
    let ctx = use_context::<AppContext>();
    let mut reload_epoch = use_signal(|| 0_u64);

    // A completed update reload remounts the routed tree so the tutor
    // session starts over on the new build.
    use_future(move || {
        let reloads = ctx.reloads();
        async move {
            let Some(mut reloads) = reloads else {
                return;
            };
            while reloads.changed().await.is_ok() {
                let epoch = *reloads.borrow_and_update();
                reload_epoch.set(epoch);
            }
        }
    });

    rsx! {
        document::Stylesheet { href: asset!("/assets/style.css") }

        // Stable OS/window title.
        document::Title { "NextGrades" }

        div { class: "app-root",
            ErrorBoundary {
                handle_error: |errors: ErrorContext| rsx! {
                    div { class: "fatal",
                        h1 { "Something went wrong" }
                        pre { "{errors:?}" }
                    }
                },
                for epoch in std::iter::once(reload_epoch()) {
                    div { key: "{epoch}", class: "app-shell",
                        Router::<Route> {}
                    }
                }
            }
            InstallBanner {}
            UpdateToast {}
        }
    }
}
