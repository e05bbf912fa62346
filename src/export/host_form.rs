use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

const USERNAME_IDS: [&str; 6] = [
    "usernameSearch",
    "username",
    "userName",
    "user-name",
    "usernameInput",
    "user",
];
const USERNAME_NAMES: [&str; 4] = ["usernameSearch", "username", "userName", "user"];
const FILTER_CONTAINERS: [&str; 3] = ["filters", "filter-row", "search-controls"];

static USER_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)user").expect("placeholder pattern compiles"));

/// An input captured from a host page we do not control.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostField {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    /// Class names of the enclosing container, space separated.
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub data_value: Option<String>,
}

impl HostField {
    fn resolved_value(&self) -> String {
        [&self.value, &self.text, &self.data_value]
            .into_iter()
            .flatten()
            .find(|v| !v.is_empty())
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocatedUsername {
    pub selector: String,
    pub value: String,
}

/// Compatibility lookup for the username field of an unowned page: known
/// ids, then name attributes, then a placeholder mentioning "user", then
/// any input inside a filter container.
pub fn locate_username(fields: &[HostField]) -> Option<LocatedUsername> {
    for id in USERNAME_IDS {
        if let Some(f) = fields.iter().find(|f| f.id.as_deref() == Some(id)) {
            return Some(located(format!("#{id}"), f));
        }
    }

    for name in USERNAME_NAMES {
        if let Some(f) = fields.iter().find(|f| f.name.as_deref() == Some(name)) {
            return Some(located(format!("input[name=\"{name}\"]"), f));
        }
    }

    if let Some(f) = fields
        .iter()
        .find(|f| matches!(f.placeholder.as_deref(), Some(p) if USER_PLACEHOLDER.is_match(p)))
    {
        return Some(located("input[placeholder*='user']".to_string(), f));
    }

    fields
        .iter()
        .find(|f| {
            f.container
                .as_deref()
                .map(|c| c.split_whitespace().any(|cls| FILTER_CONTAINERS.contains(&cls)))
                .unwrap_or(false)
        })
        .map(|f| located("fallback selector".to_string(), f))
}

fn located(selector: String, field: &HostField) -> LocatedUsername {
    LocatedUsername {
        selector,
        value: field.resolved_value(),
    }
}
