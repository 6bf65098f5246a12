use std::rc::Rc;

use dioxus::prelude::*;
use learn_core::install::InstallPrompt;
use services::InstallHandle;

use crate::context::AppContext;
use crate::vm::{GOT_IT_LABEL, INSTALL_LABEL, InstallBody, NOT_NOW_LABEL, map_install_prompt};

#[component]
pub fn InstallBanner() -> Element {
    let ctx = use_context::<AppContext>();
    let mut prompt = use_signal(|| None::<InstallPrompt>);
    let mut handle = use_signal(|| None::<Rc<InstallHandle>>);

    use_future(move || {
        let service = ctx.install();
        async move {
            let started = Rc::new(service.start().await);
            let mut changes = started.subscribe();
            prompt.set(Some(changes.borrow_and_update().clone()));
            handle.set(Some(started));
            while changes.changed().await.is_ok() {
                let next = changes.borrow_and_update().clone();
                prompt.set(Some(next));
            }
        }
    });

    let Some(vm) = prompt.read().as_ref().and_then(map_install_prompt) else {
        return rsx! {};
    };

    let dismiss = move |_: MouseEvent| {
        if let Some(handle) = handle.read().as_ref() {
            handle.dismiss();
        }
    };

    rsx! {
        div { class: "install-banner",
            div { class: vm.card_class(),
                button {
                    class: "install-card__close",
                    aria_label: "Dismiss",
                    onclick: dismiss,
                    "×"
                }
                h3 { "{vm.title}" }
                match vm.body.clone() {
                    InstallBody::Steps { intro, steps } => rsx! {
                        p { class: "muted", "{intro}" }
                        ol { class: "install-card__steps",
                            for step in steps.iter() {
                                li { key: "{step}", "{step}" }
                            }
                        }
                        button {
                            id: "install-got-it",
                            class: "btn btn-secondary btn-block",
                            onclick: dismiss,
                            "{GOT_IT_LABEL}"
                        }
                    },
                    InstallBody::Native { body, can_install } => rsx! {
                        p { class: "muted", "{body}" }
                        div { class: "install-card__actions",
                            if can_install {
                                button {
                                    id: "install-app",
                                    class: "btn btn-primary",
                                    onclick: move |_| {
                                        if let Some(handle) = handle.read().as_ref() {
                                            handle.install();
                                        }
                                    },
                                    "{INSTALL_LABEL}"
                                }
                            }
                            button {
                                id: "install-not-now",
                                class: "btn btn-secondary",
                                onclick: dismiss,
                                "{NOT_NOW_LABEL}"
                            }
                        }
                    },
                }
            }
        }
    }
}
