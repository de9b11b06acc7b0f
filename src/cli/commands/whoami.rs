use super::Session;
use crate::error::Result;
use crate::output::DetailPanel;
use serde_json::Value;

const SHOWN: [(&str, &str); 5] = [
    ("displayName", "Name"),
    ("emailAddress", "Email"),
    ("accountId", "Account"),
    ("timeZone", "Time zone"),
    ("active", "Active"),
];

/// # Errors
///
/// Returns an error if the client cannot be built or the request fails.
pub fn execute(session: &Session) -> Result<()> {
    let user = session.client()?.myself()?;
    let out = &session.out;
    if out.is_json() {
        out.json(&user);
        return Ok(());
    }

    let mut panel = DetailPanel::new("Jira account", out.theme());
    if let Some(url) = &session.settings.url {
        panel.add("Site", url.as_str());
    }
    for (key, label) in SHOWN {
        if let Some(value) = user.get(key).and_then(display_value) {
            panel.add(label, value);
        }
    }
    out.details(&panel);
    Ok(())
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
