use std::rc::Rc;

use dioxus::prelude::*;
use learn_core::update::UpdateNotice;
use services::UpdateHandle;

use crate::context::AppContext;
use crate::vm::{LATER_LABEL, REFRESH_LABEL, map_update_notice};

/// Modal shown when a newer build is waiting to take over.
#[component]
pub fn UpdateToast() -> Element {
    let ctx = use_context::<AppContext>();
    let mut notice = use_signal(|| None::<UpdateNotice>);
    let mut handle = use_signal(|| None::<Rc<UpdateHandle>>);

    use_future(move || {
        let updates = ctx.updates();
        async move {
            let Some(service) = updates else {
                return;
            };
            let started = Rc::new(service.start().await);
            let mut changes = started.subscribe();
            notice.set(Some(changes.borrow_and_update().clone()));
            handle.set(Some(started));
            while changes.changed().await.is_ok() {
                let next = changes.borrow_and_update().clone();
                notice.set(Some(next));
            }
        }
    });

    let Some(vm) = notice.read().as_ref().and_then(map_update_notice) else {
        return rsx! {};
    };

    rsx! {
        div {
            class: vm.overlay_class(),
            role: "dialog",
            aria_modal: "true",
            aria_labelledby: "update-title",
            div { class: "update-card",
                h2 { id: "update-title", "{vm.title}" }
                p { class: "muted", "{vm.body}" }
                div { class: "update-card__actions",
                    button {
                        id: "update-refresh",
                        class: "btn btn-primary",
                        autofocus: true,
                        onclick: move |_| {
                            if let Some(handle) = handle.read().as_ref() {
                                handle.accept();
                            }
                        },
                        "{REFRESH_LABEL}"
                    }
                    if vm.can_dismiss {
                        button {
                            id: "update-later",
                            class: "btn btn-secondary",
                            onclick: move |_| {
                                if let Some(handle) = handle.read().as_ref() {
                                    handle.dismiss();
                                }
                            },
                            "{LATER_LABEL}"
                        }
                    }
                }
            }
        }
    }
}
