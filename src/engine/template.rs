//! Alert message templating: literal `[Token]` substitution.
//!
//! Each trigger type owns its token table (see the evaluator); this module
//! only performs the replacements. Unresolved placeholders are left
//! verbatim so a template mentioning a token its trigger never supplies
//! still renders instead of erroring.

/// Apply an ordered list of (token, value) replacements to a template
pub fn render_template(template: &str, tokens: &[(&str, String)]) -> String {
    let mut message = template.to_string();
    for (token, value) in tokens {
        message = message.replace(token, value);
    }
    message
}
