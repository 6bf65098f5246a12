use std::rc::Rc;

use dioxus::document::eval;
use dioxus::prelude::*;

use crate::context::AppContext;
use crate::vm::{
    DISCLAIMER, ErrorVm, FollowUpErrorVm, LOADING_TITLE, LessonVm, MessageBody, MessageVm,
    QUICK_ACTIONS_LABEL, RETRY_LABEL, StatusPanel, TYPING_TEXT, map_tutor_session,
};
use super::scripts::{FOCUS_INPUT_SCRIPT, SCROLL_TO_END_SCRIPT};

#[component]
pub fn TutorView() -> Element {
    let ctx = use_context::<AppContext>();
    // Dropping the handle on unmount stops polling and discards late replies.
    let handle = use_hook(|| Rc::new(ctx.tutor().start()));
    let mut snapshot = use_signal(|| handle.snapshot());
    let mut draft = use_signal(String::new);
    let mut focused_requests = use_signal(|| 0_u64);

    {
        let handle = Rc::clone(&handle);
        use_future(move || {
            let mut updates = handle.subscribe();
            async move {
                while updates.changed().await.is_ok() {
                    let next = updates.borrow_and_update().clone();
                    snapshot.set(next);
                }
            }
        });
    }

    use_effect(move || {
        let requests = snapshot.read().focus_requests;
        if requests > *focused_requests.peek() {
            focused_requests.set(requests);
            let _ = eval(FOCUS_INPUT_SCRIPT);
        }
    });

    // Keep the newest message in view.
    use_effect(move || {
        let _ = snapshot.read().session.messages().len();
        let _ = eval(SCROLL_TO_END_SCRIPT);
    });

    let submit = {
        let handle = Rc::clone(&handle);
        use_callback(move |text: String| handle.submit(text))
    };
    let retry = {
        let handle = Rc::clone(&handle);
        use_callback(move |()| handle.retry())
    };
    let retry_follow_up = {
        let handle = Rc::clone(&handle);
        use_callback(move |()| handle.retry_follow_up())
    };

    let vm = map_tutor_session(&snapshot.read().session);
    let can_send = vm.can_send(&draft.read());
    let input_disabled = vm.input_disabled;

    rsx! {
        div { class: "page tutor-page", id: "tutor-root",
            div { class: "tutor-thread",
                match vm.status.clone() {
                    StatusPanel::None => rsx! {},
                    StatusPanel::Loading { topic } => rsx! {
                        LoadingPanel { topic }
                    },
                    StatusPanel::Failed(error) => rsx! {
                        ErrorPanel { error, on_retry: move |()| retry.call(()) }
                    },
                }

                for message in vm.messages.iter().cloned() {
                    MessageBubble { key: "{message.id}", message }
                }

                if vm.show_typing {
                    div { class: "chat-row chat-row--tutor",
                        div { class: "chat-bubble chat-bubble--tutor typing",
                            span { class: "typing__dot" }
                            span { class: "typing__dot" }
                            span { class: "typing__dot" }
                            span { class: "typing__label", "{TYPING_TEXT}" }
                        }
                    }
                }

                if let Some(error) = vm.follow_up_error.clone() {
                    FollowUpErrorRow { error, on_retry: move |()| retry_follow_up.call(()) }
                }

                if let Some(nudge) = vm.unlock_nudge.clone() {
                    div { class: "quick-actions",
                        p { class: "unlock-nudge", "{nudge}" }
                        p { class: "muted", "{QUICK_ACTIONS_LABEL}" }
                        div { class: "quick-actions__list",
                            for action in vm.quick_actions.iter().cloned() {
                                button {
                                    key: "{action}",
                                    class: "quick-action",
                                    r#type: "button",
                                    onclick: move |_| submit.call(action.clone()),
                                    "{action}"
                                }
                            }
                        }
                    }
                }

                div { id: "tutor-end" }
            }

            div { class: "composer",
                if let Some(hint) = vm.lock_hint {
                    p { class: "composer__lock-hint", "{hint}" }
                }
                form {
                    class: "composer__form",
                    onsubmit: move |evt: FormEvent| {
                        evt.prevent_default();
                        if can_send {
                            let text = draft();
                            draft.set(String::new());
                            submit.call(text);
                        }
                    },
                    input {
                        id: "tutor-input",
                        class: "composer__input",
                        r#type: "text",
                        placeholder: "{vm.placeholder}",
                        value: "{draft}",
                        disabled: input_disabled,
                        oninput: move |evt: FormEvent| draft.set(evt.value()),
                    }
                    button {
                        id: "tutor-send",
                        class: "btn btn-primary",
                        r#type: "submit",
                        disabled: !can_send,
                        "Send"
                    }
                }
                p { class: "composer__disclaimer", "{DISCLAIMER}" }
            }
        }
    }
}

#[component]
fn LoadingPanel(topic: String) -> Element {
    rsx! {
        div { class: "status-panel status-panel--loading", role: "status",
            div { class: "spinner" }
            h2 { "{LOADING_TITLE}" }
            p { class: "muted", "{topic}" }
        }
    }
}

#[component]
fn ErrorPanel(error: ErrorVm, on_retry: EventHandler<()>) -> Element {
    rsx! {
        div { class: "status-panel status-panel--error", role: "alert",
            h2 { "{error.title}" }
            p { "{error.message}" }
            if let Some(code) = error.code.as_deref() {
                p { class: "muted error-code", "Error code: {code}" }
            }
            button {
                id: "tutor-retry",
                class: "btn btn-primary",
                onclick: move |_| on_retry.call(()),
                "{RETRY_LABEL}"
            }
        }
    }
}

#[component]
fn FollowUpErrorRow(error: FollowUpErrorVm, on_retry: EventHandler<()>) -> Element {
    rsx! {
        div { class: "chat-row chat-row--tutor",
            div { class: "chat-bubble chat-bubble--error", role: "alert",
                p { "{error.message}" }
                button {
                    id: "tutor-retry-follow-up",
                    class: "btn btn-secondary",
                    onclick: move |_| on_retry.call(()),
                    "{RETRY_LABEL}"
                }
            }
        }
    }
}

#[component]
fn MessageBubble(message: MessageVm) -> Element {
    let (row_class, bubble_class) = if message.from_student {
        ("chat-row chat-row--student", "chat-bubble chat-bubble--student")
    } else {
        ("chat-row chat-row--tutor", "chat-bubble chat-bubble--tutor")
    };
    rsx! {
        div { class: row_class,
            div { class: bubble_class,
                match &message.body {
                    MessageBody::Text(text) => rsx! {
                        p { class: "chat-text", "{text}" }
                    },
                    MessageBody::Answer { html } => rsx! {
                        div { class: "chat-text markdown", dangerous_inner_html: "{html}" }
                    },
                    MessageBody::Lesson(lesson) => rsx! {
                        LessonCard { lesson: lesson.as_ref().clone() }
                    },
                }
                span { class: "chat-time", "{message.time_label}" }
            }
        }
    }
}

#[component]
fn LessonCard(lesson: LessonVm) -> Element {
    let worked_examples_title = lesson.worked_examples_title();
    rsx! {
        article { class: "lesson",
            header { class: "lesson__header",
                h2 { "{lesson.heading}" }
                p { class: "lesson__topic", "{lesson.topic}" }
                if let Some(level) = lesson.level_label.as_deref() {
                    span { class: "badge", "{level}" }
                }
            }
            section { class: "lesson__section",
                div { class: "markdown", dangerous_inner_html: "{lesson.explanation_html}" }
            }
            if !lesson.key_concepts_html.is_empty() {
                LessonList { title: "Key Concepts".to_string(), items: lesson.key_concepts_html.clone() }
            }
            if !lesson.worked_examples_html.is_empty() {
                LessonList { title: worked_examples_title, items: lesson.worked_examples_html.clone() }
            }
            if !lesson.practical_applications_html.is_empty() {
                LessonList {
                    title: "Practical Applications".to_string(),
                    items: lesson.practical_applications_html.clone(),
                }
            }
            if lesson.syllabus_reference.is_some() || !lesson.syllabus_coverage.is_empty() {
                footer { class: "lesson__syllabus",
                    if let Some(reference) = lesson.syllabus_reference.as_deref() {
                        p { "Syllabus reference: {reference}" }
                    }
                    if !lesson.syllabus_coverage.is_empty() {
                        ul {
                            for (index, item) in lesson.syllabus_coverage.iter().enumerate() {
                                li { key: "{index}", "{item}" }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn LessonList(title: String, items: Vec<String>) -> Element {
    rsx! {
        section { class: "lesson__section",
            h3 { "{title}" }
            ul {
                for (index, item) in items.iter().enumerate() {
                    li { key: "{index}", dangerous_inner_html: "{item}" }
                }
            }
        }
    }
}
