use std::sync::{Arc, Mutex};
use std::time::Duration;

use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::{ClientOptions, Endpoints, HttpBackend, Person, ReportBackend};
use crate::error::ReportError;
use crate::filters::{Department, FilterState, SiteEntry, UserStatus};
use crate::table::Column;
use crate::widget::{ReportWidget, WidgetOptions};

/// In-memory backend that records the queries it receives.
pub(crate) struct FakeBackend {
    endpoints: Endpoints,
    people: Vec<String>,
    permissions: String,
    fail: bool,
    people_queries: Mutex<Vec<String>>,
    permission_queries: Mutex<Vec<Vec<(String, String)>>>,
}

impl FakeBackend {
    fn new() -> Self {
        Self {
            endpoints: Endpoints::from_page_url(
                &reqwest::Url::parse("https://dms.example.com/share/page/report").unwrap(),
            ),
            people: Vec::new(),
            permissions: "[]".to_string(),
            fail: false,
            people_queries: Mutex::new(Vec::new()),
            permission_queries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_people(names: &[&str]) -> Self {
        Self {
            people: names.iter().map(|n| n.to_string()).collect(),
            ..Self::new()
        }
    }

    pub(crate) fn with_permissions(body: &str) -> Self {
        Self {
            permissions: body.to_string(),
            ..Self::new()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub(crate) fn people_queries(&self) -> Vec<String> {
        self.people_queries.lock().unwrap().clone()
    }

    pub(crate) fn permission_queries(&self) -> Vec<Vec<(String, String)>> {
        self.permission_queries.lock().unwrap().clone()
    }

    fn check(&self, url: &str) -> Result<(), ReportError> {
        if self.fail {
            Err(ReportError::status(url, 500))
        } else {
            Ok(())
        }
    }
}

impl ReportBackend for FakeBackend {
    async fn list_sites(&self) -> Result<Vec<SiteEntry>, ReportError> {
        self.check("sites")?;
        Ok(vec![SiteEntry {
            short_name: "fin".to_string(),
            title: "Finance".to_string(),
        }])
    }

    async fn search_people(&self, filter: &str) -> Result<Vec<Person>, ReportError> {
        self.people_queries.lock().unwrap().push(filter.to_string());
        self.check("people")?;
        Ok(self
            .people
            .iter()
            .map(|n| Person {
                user_name: n.clone(),
            })
            .collect())
    }

    async fn fetch_permissions(
        &self,
        query: &[(&'static str, String)],
    ) -> Result<String, ReportError> {
        self.permission_queries
            .lock()
            .unwrap()
            .push(query.iter().map(|(k, v)| (k.to_string(), v.clone())).collect());
        self.check("permissions")?;
        Ok(self.permissions.clone())
    }

    async fn fetch_export(&self, url: &reqwest::Url) -> Result<Vec<u8>, ReportError> {
        self.check(url.as_str())?;
        Ok(b"xlsx".to_vec())
    }

    fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

async fn http_widget(server: &MockServer) -> ReportWidget<HttpBackend> {
    let backend = HttpBackend::new(&ClientOptions {
        page_url: reqwest::Url::parse(&format!("{}/share/page/report", server.uri())).unwrap(),
        username: Some("admin".to_string()),
        password: Some("admin".to_string()),
        header: Some("X-Report-Client: permreport".to_string()),
        proxy: None,
        timeout_seconds: 5,
    })
    .unwrap();
    ReportWidget::new(
        Arc::new(backend),
        WidgetOptions {
            filters: FilterState::default(),
            debounce: Duration::from_millis(10),
        },
    )
}

#[tokio::test]
async fn departments_load_over_http_sorted_with_all_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alfresco/service/api/sites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"shortName": "zeta", "title": "zeta projects"},
            {"shortName": "acc", "title": "Accounts"},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mut widget = http_widget(&server).await;
    let values: Vec<_> = widget
        .load_departments()
        .await
        .unwrap()
        .iter()
        .map(|o| o.value.clone())
        .collect();
    assert_eq!(values, vec!["all", "acc", "zeta"]);
}

#[tokio::test]
async fn sites_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alfresco/service/api/sites"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let mut widget = http_widget(&server).await;
    assert!(widget.load_departments().await.is_err());
    assert!(widget.status().is_error);
    assert_eq!(widget.status().message, "Failed to load sites (403)");
}

#[tokio::test]
async fn submit_sends_credentials_and_omits_sentinels() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alfresco/service/alfresco/tutorials/direct-permissions"))
        .and(query_param("usernameSearch", "alice"))
        .and(query_param("fromDate", "2025-01-15"))
        .and(query_param_is_missing("site"))
        .and(query_param_is_missing("userStatus"))
        .and(header("authorization", "Basic YWRtaW46YWRtaW4="))
        .and(header("x-report-client", "permreport"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "totalPermissions": 2,
            "permissions": [
                {"username": "alice", "role": "Collaborator", "nodeRef": "workspace://SpacesStore/2"},
                {"username": "alice", "role": "Consumer"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut widget = http_widget(&server).await;
    widget.filters = FilterState {
        department: Department::All,
        user_status: UserStatus::All,
        username: "alice".to_string(),
        from_date: "2025-01-15".to_string(),
    };
    assert_eq!(widget.submit().await.unwrap(), 2);
    assert_eq!(widget.status().message, "Loaded 2 permission rows.");
    assert_eq!(
        widget.table().summary().and_then(|s| s.total_permissions),
        Some(2)
    );

    widget.sort_by(Column::Role);
    let roles: Vec<_> = widget
        .table()
        .records()
        .iter()
        .map(|r| r.role.clone().unwrap())
        .collect();
    assert_eq!(roles, vec!["Collaborator", "Consumer"]);
}

#[tokio::test]
async fn non_success_status_is_network_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alfresco/service/alfresco/tutorials/direct-permissions"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"success": false, "error": "Site x not found"})),
        )
        .mount(&server)
        .await;

    let mut widget = http_widget(&server).await;
    widget.filters.department = Department::Site("x".to_string());
    let err = widget.submit().await.unwrap_err();
    assert!(err.is_network());
    assert_eq!(
        widget.status().message,
        "Request failed: Network response was not ok (404)"
    );
    assert!(!widget.export_visible());
}

#[tokio::test]
async fn non_json_body_is_parse_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alfresco/service/alfresco/tutorials/direct-permissions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let mut widget = http_widget(&server).await;
    assert!(widget.submit().await.unwrap_err().is_parse());
    assert_eq!(
        widget.status().message,
        "Request failed: Failed to parse response JSON"
    );
}

#[tokio::test]
async fn download_saves_export_from_origin() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alfresco/service/alfresco/tutorials/direct-permissions-xlsx"))
        .and(query_param("site", "finance"))
        .and(query_param("userStatus", "Inactive"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04sheet".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("perms.xlsx");
    let mut widget = http_widget(&server).await;
    widget.filters.department = Department::Site("finance".to_string());
    widget.filters.user_status = UserStatus::Inactive;

    let written = widget.download(&target).await.unwrap();
    assert_eq!(written, 9);
    assert_eq!(std::fs::read(&target).unwrap(), b"PK\x03\x04sheet");
}

#[tokio::test]
async fn autocomplete_searches_people_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alfresco/service/api/people"))
        .and(query_param("filter", "ali"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "people": [{"userName": "alice"}, {"userName": "Alison"}, {"userName": "malik"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut widget = http_widget(&server).await;
    widget.type_username("al");
    widget.type_username("ali");
    widget.settle_suggestions().await;
    assert_eq!(widget.suggestions(), vec!["alice", "Alison"]);
    assert_eq!(widget.select_suggestion(1), Some("Alison".to_string()));
    assert_eq!(widget.filters.username, "Alison");
    assert!(widget.suggestions().is_empty());
}
