use serde::{Deserialize, Serialize};

use crate::utils;

pub const ALL_DEPARTMENTS_LABEL: &str = "All Departments";
pub const ALL_DEPARTMENTS_VALUE: &str = "all";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Department {
    #[default]
    All,
    Site(String),
}

impl Department {
    /// `all` (any case) and empty values select every department.
    pub fn parse(value: &str) -> Self {
        if utils::is_unset_filter(value) {
            Self::All
        } else {
            Self::Site(value.trim().to_string())
        }
    }

    pub fn as_value(&self) -> &str {
        match self {
            Self::All => ALL_DEPARTMENTS_VALUE,
            Self::Site(short_name) => short_name,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    #[default]
    All,
    Active,
    Inactive,
}

impl UserStatus {
    pub const OPTIONS: [UserStatus; 3] = [Self::All, Self::Active, Self::Inactive];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "all" | "all users" => Some(Self::All),
            "active" | "active users" => Some(Self::Active),
            "inactive" | "inactive users" => Some(Self::Inactive),
            _ => None,
        }
    }

    /// The option value the backend expects.
    pub fn as_value(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All users",
            Self::Active => "Active users",
            Self::Inactive => "Inactive users",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub department: Department,
    pub user_status: UserStatus,
    pub username: String,
    pub from_date: String,
}

impl FilterState {
    /// Query parameters shared by the report and export endpoints, in
    /// wire order. Empty values and the `all` sentinels are left out.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let candidates = [
            ("site", self.department.as_value()),
            ("userStatus", self.user_status.as_value()),
            ("usernameSearch", self.username.as_str()),
            ("fromDate", self.from_date.as_str()),
        ];
        candidates
            .into_iter()
            .filter(|(_, value)| !utils::is_unset_filter(value))
            .map(|(key, value)| (key, value.trim().to_string()))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteEntry {
    pub short_name: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DepartmentOption {
    pub value: String,
    pub label: String,
}

/// Builds the department dropdown: sites ordered by title ignoring case,
/// preceded by the "All Departments" entry.
pub fn department_options(mut sites: Vec<SiteEntry>) -> Vec<DepartmentOption> {
    sites.sort_by_cached_key(|s| s.title.to_lowercase());
    let mut out = Vec::with_capacity(sites.len() + 1);
    out.push(DepartmentOption {
        value: ALL_DEPARTMENTS_VALUE.to_string(),
        label: ALL_DEPARTMENTS_LABEL.to_string(),
    });
    out.extend(sites.into_iter().map(|s| DepartmentOption {
        value: s.short_name,
        label: s.title,
    }));
    out
}
