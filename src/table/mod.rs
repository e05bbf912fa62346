pub mod record;
pub mod sort;

use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::error::ReportError;

pub use record::{PermissionRecord, ReportSummary};
pub use sort::{SortDirection, SortState};

pub const EMPTY_PLACEHOLDER: &str = "No permissions to display.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Column {
    Username,
    GroupName,
    Role,
    Site,
    NodeName,
    NodePath,
    UserStatus,
    FromDate,
    UserLogin,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Self::Username,
        Self::GroupName,
        Self::Role,
        Self::Site,
        Self::NodeName,
        Self::NodePath,
        Self::UserStatus,
        Self::FromDate,
        Self::UserLogin,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::GroupName => "groupName",
            Self::Role => "role",
            Self::Site => "site",
            Self::NodeName => "nodeName",
            Self::NodePath => "nodePath",
            Self::UserStatus => "userStatus",
            Self::FromDate => "fromDate",
            Self::UserLogin => "userLogin",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Username => "Username",
            Self::GroupName => "Group Name",
            Self::Role => "Role",
            Self::Site => "Site",
            Self::NodeName => "Node Name",
            Self::NodePath => "Node Path",
            Self::UserStatus => "User Status",
            Self::FromDate => "From Date",
            Self::UserLogin => "User Login",
        }
    }

    /// Matches a column key or header label, ignoring case, spaces, `-` and `_`.
    pub fn parse(value: &str) -> Option<Self> {
        let wanted = squash(value);
        Self::ALL
            .into_iter()
            .find(|c| squash(c.key()) == wanted || squash(c.label()) == wanted)
    }

    pub fn value(self, record: &PermissionRecord) -> Option<&str> {
        let v = match self {
            Self::Username => &record.username,
            Self::GroupName => &record.group_name,
            Self::Role => &record.role,
            Self::Site => &record.site,
            Self::NodeName => &record.node_name,
            Self::NodePath => &record.node_path,
            Self::UserStatus => &record.user_status,
            Self::FromDate => &record.from_date,
            Self::UserLogin => &record.user_login,
        };
        v.as_deref()
    }
}

fn squash(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Clone, Debug, Default)]
pub struct PermissionsResponse {
    pub records: Vec<PermissionRecord>,
    pub summary: Option<ReportSummary>,
}

/// Accepts `{ "permissions": [...] }` (plus summary counters) or a bare
/// array of records.
pub fn parse_response(body: &str) -> Result<PermissionsResponse, ReportError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ReportError::Parse(e.to_string()))?;
    match value {
        serde_json::Value::Array(_) => Ok(PermissionsResponse {
            records: records_from(value)?,
            summary: None,
        }),
        serde_json::Value::Object(mut map) => {
            let permissions = match map.remove("permissions") {
                Some(p @ serde_json::Value::Array(_)) => p,
                _ => return Err(ReportError::UnexpectedShape),
            };
            let summary = serde_json::from_value(serde_json::Value::Object(map)).ok();
            Ok(PermissionsResponse {
                records: records_from(permissions)?,
                summary,
            })
        }
        _ => Err(ReportError::UnexpectedShape),
    }
}

fn records_from(value: serde_json::Value) -> Result<Vec<PermissionRecord>, ReportError> {
    serde_json::from_value(value).map_err(|e| ReportError::Parse(e.to_string()))
}

/// The result set of the latest submit together with its sort state.
#[derive(Clone, Debug, Default)]
pub struct ResultsTable {
    records: Vec<PermissionRecord>,
    summary: Option<ReportSummary>,
    sort: Option<SortState>,
}

impl ResultsTable {
    /// Replaces the result set. Sort state starts over with new data.
    pub fn replace(&mut self, response: PermissionsResponse) {
        self.records = response.records;
        self.summary = response.summary;
        self.sort = None;
    }

    pub fn records(&self) -> &[PermissionRecord] {
        &self.records
    }

    pub fn summary(&self) -> Option<&ReportSummary> {
        self.summary.as_ref()
    }

    pub fn sort_state(&self) -> Option<SortState> {
        self.sort
    }

    /// Header activation: reorders the whole result set in place.
    pub fn sort_by(&mut self, column: Column) -> SortState {
        let state = SortState::activate(self.sort, column);
        sort_records(&mut self.records, state);
        self.sort = Some(state);
        state
    }

    pub fn node_ref(&self, row: usize) -> Option<&str> {
        self.records
            .get(row)?
            .node_ref
            .as_deref()
            .filter(|r| !r.is_empty())
    }

    pub fn render(&self) -> String {
        render_text(&self.records, self.sort)
    }
}

pub fn sort_records(records: &mut [PermissionRecord], state: SortState) {
    records.sort_by(|a, b| {
        let ord = sort::compare_cells(
            state.column.value(a).unwrap_or(""),
            state.column.value(b).unwrap_or(""),
        );
        match state.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
}

pub fn header_label(column: Column, sort: Option<SortState>) -> String {
    match sort {
        Some(s) if s.column == column => {
            let arrow = match s.direction {
                SortDirection::Ascending => "▲",
                SortDirection::Descending => "▼",
            };
            format!("{} {arrow}", column.label())
        }
        _ => column.label().to_string(),
    }
}

/// Terminal rendering; depends only on the rows and the sort indicator.
pub fn render_text(records: &[PermissionRecord], sort: Option<SortState>) -> String {
    if records.is_empty() {
        return format!("{EMPTY_PLACEHOLDER}\n");
    }
    let mut builder = Builder::default();
    let mut header = vec!["#".to_string()];
    header.extend(Column::ALL.iter().map(|c| header_label(*c, sort)));
    builder.push_record(header);
    for (idx, record) in records.iter().enumerate() {
        let mut row = vec![idx.to_string()];
        row.extend(
            Column::ALL
                .iter()
                .map(|c| c.value(record).unwrap_or("").to_string()),
        );
        builder.push_record(row);
    }
    let mut table = builder.build();
    table.with(Style::modern());
    format!("{table}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(username: &str, role: &str) -> PermissionRecord {
        PermissionRecord {
            username: Some(username.to_string()),
            role: Some(role.to_string()),
            ..Default::default()
        }
    }

    fn usernames(table: &ResultsTable) -> Vec<String> {
        table
            .records()
            .iter()
            .map(|r| r.username.clone().unwrap_or_default())
            .collect()
    }

    #[test]
    fn wrapped_and_bare_shapes_parse_the_same() {
        let wrapped = parse_response(r#"{"permissions":[{"username":"a"}]}"#).unwrap();
        let bare = parse_response(r#"[{"username":"a"}]"#).unwrap();
        assert_eq!(wrapped.records, bare.records);
        assert_eq!(bare.records[0].username.as_deref(), Some("a"));
    }

    #[test]
    fn wrapped_shape_keeps_summary() {
        let parsed = parse_response(
            r#"{"success":true,"site":"hr","totalNodes":4,"permissions":[]}"#,
        )
        .unwrap();
        let summary = parsed.summary.unwrap();
        assert_eq!(summary.site.as_deref(), Some("hr"));
        assert_eq!(summary.total_nodes, Some(4));
        assert!(parsed.records.is_empty());
    }

    #[test]
    fn other_shapes_are_errors_not_panics() {
        assert!(matches!(
            parse_response(r#"{"rows":[]}"#),
            Err(ReportError::UnexpectedShape)
        ));
        assert!(matches!(
            parse_response(r#"{"permissions":"none"}"#),
            Err(ReportError::UnexpectedShape)
        ));
        assert!(matches!(parse_response("42"), Err(ReportError::UnexpectedShape)));
        assert!(matches!(parse_response("<html>"), Err(ReportError::Parse(_))));
    }

    #[test]
    fn numbers_and_extra_fields_are_tolerated() {
        let parsed = parse_response(
            r#"[{"username":"a","userLogin":3,"nodeRef":null,"permissionType":"DIRECT","custom":"x"}]"#,
        )
        .unwrap();
        let r = &parsed.records[0];
        assert_eq!(r.user_login.as_deref(), Some("3"));
        assert_eq!(r.node_ref, None);
        assert_eq!(r.permission_type.as_deref(), Some("DIRECT"));
        assert_eq!(r.extra.get("custom"), Some(&serde_json::json!("x")));
    }

    #[test]
    fn sorting_same_column_twice_reverses() {
        let mut table = ResultsTable::default();
        table.replace(PermissionsResponse {
            records: vec![rec("carol", "c"), rec("alice", "a"), rec("bob", "b")],
            summary: None,
        });
        table.sort_by(Column::Username);
        let first = usernames(&table);
        assert_eq!(first, vec!["alice", "bob", "carol"]);
        let state = table.sort_by(Column::Username);
        assert_eq!(state.direction, SortDirection::Descending);
        let mut reversed = first.clone();
        reversed.reverse();
        assert_eq!(usernames(&table), reversed);
    }

    #[test]
    fn mixed_column_sorted_twice_reverses() {
        let mut table = ResultsTable::default();
        let records = ["-3", "-5", "-4a", "1.5", "1.10", "1.7a"]
            .into_iter()
            .map(|name| PermissionRecord {
                node_name: Some(name.to_string()),
                ..Default::default()
            })
            .collect();
        table.replace(PermissionsResponse {
            records,
            summary: None,
        });
        let names = |t: &ResultsTable| -> Vec<String> {
            t.records()
                .iter()
                .map(|r| r.node_name.clone().unwrap())
                .collect()
        };

        table.sort_by(Column::NodeName);
        let first = names(&table);
        assert_eq!(first, vec!["-5", "-3", "1.10", "1.5", "-4a", "1.7a"]);
        table.sort_by(Column::NodeName);
        let mut reversed = first.clone();
        reversed.reverse();
        assert_eq!(names(&table), reversed);
    }

    #[test]
    fn numeric_column_sorts_arithmetically() {
        let mut table = ResultsTable::default();
        table.replace(PermissionsResponse {
            records: vec![rec("u10", "10"), rec("u2", "2"), rec("u1", "1")],
            summary: None,
        });
        table.sort_by(Column::Role);
        let roles: Vec<_> = table
            .records()
            .iter()
            .map(|r| r.role.clone().unwrap())
            .collect();
        assert_eq!(roles, vec!["1", "2", "10"]);
    }

    #[test]
    fn missing_values_sort_first_ascending() {
        let mut records = vec![rec("b", "x"), PermissionRecord::default(), rec("a", "y")];
        sort_records(
            &mut records,
            SortState {
                column: Column::Username,
                direction: SortDirection::Ascending,
            },
        );
        assert_eq!(records[0].username, None);
        assert_eq!(records[1].username.as_deref(), Some("a"));
    }

    #[test]
    fn render_marks_sorted_column_and_placeholder() {
        assert_eq!(render_text(&[], None), "No permissions to display.\n");
        let out = render_text(
            &[rec("alice", "Consumer")],
            Some(SortState {
                column: Column::Role,
                direction: SortDirection::Descending,
            }),
        );
        assert!(out.contains("Role ▼"));
        assert!(out.contains("Group Name"));
        assert!(out.contains("alice"));
    }

    #[test]
    fn column_parse_accepts_keys_and_labels() {
        assert_eq!(Column::parse("nodePath"), Some(Column::NodePath));
        assert_eq!(Column::parse("node path"), Some(Column::NodePath));
        assert_eq!(Column::parse("user-login"), Some(Column::UserLogin));
        assert_eq!(Column::parse("nodeRef"), None);
    }

    #[test]
    fn node_ref_skips_missing_values() {
        let mut table = ResultsTable::default();
        let mut with_ref = rec("a", "r");
        with_ref.node_ref = Some("workspace://SpacesStore/abc".to_string());
        table.replace(PermissionsResponse {
            records: vec![with_ref, rec("b", "r")],
            summary: None,
        });
        assert_eq!(table.node_ref(0), Some("workspace://SpacesStore/abc"));
        assert_eq!(table.node_ref(1), None);
        assert_eq!(table.node_ref(9), None);
    }
}
