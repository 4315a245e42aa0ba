//! HTML for the two gate states. Templates are plain files with `{{...}}`
//! placeholders; every substituted value is escaped.

use super::auth::CurrentUser;

const LOGIN_TEMPLATE: &str = include_str!("../../templates/login.html");
const HOME_TEMPLATE: &str = include_str!("../../templates/home.html");

/// Login form, optionally with an error banner.
#[must_use]
pub fn render_login(error: Option<&str>) -> String {
    let banner = error
        .map(|msg| format!(r#"<p class="error" role="alert">{}</p>"#, escape_html(msg)))
        .unwrap_or_default();
    LOGIN_TEMPLATE.replace("{{ERROR}}", &banner)
}

/// Signed-in view with the logout action.
#[must_use]
pub fn render_home(user: &CurrentUser) -> String {
    HOME_TEMPLATE
        .replace("{{USERNAME}}", &escape_html(&user.username))
        .replace("{{DISPLAY_NAME}}", &escape_html(&user.display_name))
}

#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
