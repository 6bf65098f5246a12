pub(super) const FOCUS_INPUT_SCRIPT: &str = r#"(function() {
    const input = document.getElementById("tutor-input");
    if (input && !input.disabled) {
        input.focus();
    }
})();"#;

pub(super) const SCROLL_TO_END_SCRIPT: &str = r#"(function() {
    const end = document.getElementById("tutor-end");
    if (end) {
        end.scrollIntoView({ behavior: "smooth" });
    }
})();"#;
