use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{Days, NaiveDate};
use challenge_board::api::views::{ActionsResponse, DashboardResponse};
use challenge_board::api::{create_router, create_router_with_config};
use challenge_board::config::Config;
use challenge_board::db::Database;
use challenge_board::models::*;
use uuid::Uuid;

const ADMIN_EMAIL: &str = "admin@wenov.com";
const ADMIN_PASSWORD: &str = "admin-password";

/// A server with one signed-in admin.
struct TestApp {
    server: TestServer,
    db: Database,
    token: String,
    admin: User,
}

impl TestApp {
    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

async fn setup() -> TestApp {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let admin = db
        .upsert_admin(ADMIN_EMAIL, "Admin", ADMIN_PASSWORD)
        .expect("Failed to create admin");

    let server = TestServer::new(create_router(db.clone())).expect("Failed to create test server");
    let token = login(&server, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    TestApp {
        server,
        db,
        token,
        admin,
    }
}

async fn login(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post("/api/v1/auth/login")
        .json(&LoginInput {
            email: email.to_string(),
            password: password.to_string(),
        })
        .await;
    response.assert_status_ok();
    response.json::<LoginResponse>().token
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn days_from_today(days: i64) -> NaiveDate {
    if days >= 0 {
        today() + Days::new(days as u64)
    } else {
        today() - Days::new(days.unsigned_abs())
    }
}

async fn create_challenge(app: &TestApp, name: &str, entity: &str) -> Challenge {
    let response = app
        .server
        .post("/api/v1/challenges")
        .add_header("Authorization", app.bearer())
        .json(&CreateChallengeInput {
            name: name.to_string(),
            entity: Some(entity.to_string()),
            startup_name: Some(format!("{name} Labs")),
            wenov_responsible: Some("Rim Hachidi".to_string()),
            status: None,
        })
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Challenge>()
}

async fn create_action(
    app: &TestApp,
    challenge_id: Uuid,
    title: &str,
    due_in: i64,
    is_urgent: bool,
) -> Action {
    let response = app
        .server
        .post(&format!("/api/v1/challenges/{}/actions", challenge_id))
        .add_header("Authorization", app.bearer())
        .json(&CreateActionInput {
            title: title.to_string(),
            owner: ActionOwner::Startup,
            due_date: days_from_today(due_in),
            is_urgent,
            assignee_id: None,
        })
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Action>()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn is_public() {
        let app = setup().await;
        app.server.get("/api/v1/health").await.assert_status_ok();
    }
}

mod authentication {
    use super::*;

    #[tokio::test]
    async fn rejects_missing_token() {
        let app = setup().await;

        let response = app.server.get("/api/v1/dashboard").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_unknown_token() {
        let app = setup().await;

        let response = app
            .server
            .get("/api/v1/dashboard")
            .add_header("Authorization", "Bearer not-a-real-token")
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_malformed_header() {
        let app = setup().await;

        let response = app
            .server
            .get("/api/v1/dashboard")
            .add_header("Authorization", "Basic dXNlcjpwYXNz")
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_wrong_password() {
        let app = setup().await;

        let response = app
            .server
            .post("/api/v1/auth/login")
            .json(&LoginInput {
                email: ADMIN_EMAIL.to_string(),
                password: "wrong".to_string(),
            })
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_revokes_the_token() {
        let app = setup().await;

        app.server
            .post("/api/v1/auth/logout")
            .add_header("Authorization", app.bearer())
            .await
            .assert_status(StatusCode::NO_CONTENT);

        app.server
            .get("/api/v1/profile")
            .add_header("Authorization", app.bearer())
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_is_rate_limited() {
        let db = Database::open_memory().expect("Failed to create database");
        db.migrate().expect("Failed to migrate");
        let config = Config {
            login_rate_limit: 2,
            ..Config::default()
        };
        let server = TestServer::new(create_router_with_config(db, config))
            .expect("Failed to create test server");

        let attempt = LoginInput {
            email: "nobody@wenov.com".to_string(),
            password: "x".to_string(),
        };
        for _ in 0..2 {
            server
                .post("/api/v1/auth/login")
                .json(&attempt)
                .await
                .assert_status(StatusCode::UNAUTHORIZED);
        }

        let response = server.post("/api/v1/auth/login").json(&attempt).await;
        response.assert_status(StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().get("retry-after").is_some());
    }

    fn limited_server(trust_proxy: bool) -> TestServer {
        let db = Database::open_memory().expect("Failed to create database");
        db.migrate().expect("Failed to migrate");
        let config = Config {
            login_rate_limit: 1,
            trust_proxy,
            ..Config::default()
        };
        TestServer::new(create_router_with_config(db, config)).expect("Failed to create test server")
    }

    async fn login_from(server: &TestServer, forwarded_for: &str) -> StatusCode {
        server
            .post("/api/v1/auth/login")
            .add_header("X-Forwarded-For", forwarded_for.to_string())
            .json(&LoginInput {
                email: "nobody@wenov.com".to_string(),
                password: "x".to_string(),
            })
            .await
            .status_code()
    }

    #[tokio::test]
    async fn rotating_forwarded_for_does_not_reset_the_limit() {
        let server = limited_server(false);

        assert_eq!(login_from(&server, "203.0.113.1").await, StatusCode::UNAUTHORIZED);
        assert_eq!(login_from(&server, "203.0.113.2").await, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn trusted_proxy_limits_each_forwarded_client() {
        let server = limited_server(true);

        assert_eq!(login_from(&server, "203.0.113.1").await, StatusCode::UNAUTHORIZED);
        assert_eq!(login_from(&server, "203.0.113.2").await, StatusCode::UNAUTHORIZED);
        assert_eq!(login_from(&server, "203.0.113.1").await, StatusCode::TOO_MANY_REQUESTS);
    }
}

mod profile {
    use super::*;

    #[tokio::test]
    async fn returns_the_signed_in_user() {
        let app = setup().await;

        let response = app
            .server
            .get("/api/v1/profile")
            .add_header("Authorization", app.bearer())
            .await;

        response.assert_status_ok();
        let user: User = response.json();
        assert_eq!(user.id, app.admin.id);
        assert!(user.is_admin);
    }

    #[tokio::test]
    async fn password_change_requires_current_password() {
        let app = setup().await;

        let response = app
            .server
            .put("/api/v1/profile")
            .add_header("Authorization", app.bearer())
            .json(&UpdateProfileInput {
                name: None,
                current_password: Some("wrong".to_string()),
                new_password: Some("new-password".to_string()),
            })
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        app.server
            .put("/api/v1/profile")
            .add_header("Authorization", app.bearer())
            .json(&UpdateProfileInput {
                name: None,
                current_password: Some(ADMIN_PASSWORD.to_string()),
                new_password: Some("new-password".to_string()),
            })
            .await
            .assert_status_ok();

        login(&app.server, ADMIN_EMAIL, "new-password").await;
    }
}

mod admin_users {
    use super::*;

    async fn create_member(app: &TestApp, email: &str) -> User {
        let response = app
            .server
            .post("/api/v1/admin/users")
            .add_header("Authorization", app.bearer())
            .json(&CreateUserInput {
                email: email.to_string(),
                password: "member-password".to_string(),
                name: "Member".to_string(),
                entity: UserEntity::Ceed,
                is_admin: false,
            })
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<User>()
    }

    #[tokio::test]
    async fn admin_can_create_and_list_users() {
        let app = setup().await;
        create_member(&app, "member@ceed.ma").await;

        let response = app
            .server
            .get("/api/v1/admin/users")
            .add_header("Authorization", app.bearer())
            .await;

        response.assert_status_ok();
        let users: Vec<User> = response.json();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].email, "member@ceed.ma");
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let app = setup().await;
        create_member(&app, "member@ceed.ma").await;

        let response = app
            .server
            .post("/api/v1/admin/users")
            .add_header("Authorization", app.bearer())
            .json(&CreateUserInput {
                email: "member@ceed.ma".to_string(),
                password: "pw".to_string(),
                name: "Again".to_string(),
                entity: UserEntity::Wenov,
                is_admin: false,
            })
            .await;

        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let app = setup().await;
        create_member(&app, "member@ceed.ma").await;
        let token = login(&app.server, "member@ceed.ma", "member-password").await;

        let response = app
            .server
            .get("/api/v1/admin/users")
            .add_header("Authorization", format!("Bearer {}", token))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_cannot_delete_self() {
        let app = setup().await;

        let response = app
            .server
            .delete(&format!("/api/v1/admin/users/{}", app.admin.id))
            .add_header("Authorization", app.bearer())
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(app.db.get_user(app.admin.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn admin_can_delete_another_user() {
        let app = setup().await;
        let member = create_member(&app, "member@ceed.ma").await;

        app.server
            .delete(&format!("/api/v1/admin/users/{}", member.id))
            .add_header("Authorization", app.bearer())
            .await
            .assert_status(StatusCode::NO_CONTENT);

        app.server
            .delete(&format!("/api/v1/admin/users/{}", member.id))
            .add_header("Authorization", app.bearer())
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

mod challenges {
    use super::*;

    #[tokio::test]
    async fn missing_challenge_is_not_found() {
        let app = setup().await;

        let response = app
            .server
            .get(&format!("/api/v1/challenges/{}", Uuid::new_v4()))
            .add_header("Authorization", app.bearer())
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let app = setup().await;

        let response = app
            .server
            .post("/api/v1/challenges")
            .add_header("Authorization", app.bearer())
            .json(&CreateChallengeInput {
                name: " ".to_string(),
                ..Default::default()
            })
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_cascades_to_actions() {
        let app = setup().await;
        let challenge = create_challenge(&app, "Doomed", "AFM").await;
        let action = create_action(&app, challenge.id, "Gone", 1, false).await;

        app.server
            .delete(&format!("/api/v1/challenges/{}", challenge.id))
            .add_header("Authorization", app.bearer())
            .await
            .assert_status(StatusCode::NO_CONTENT);

        app.server
            .put(&format!("/api/v1/actions/{}", action.id))
            .add_header("Authorization", app.bearer())
            .json(&UpdateActionInput {
                is_done: Some(true),
                ..Default::default()
            })
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reorder_changes_stored_order() {
        let app = setup().await;
        let a = create_challenge(&app, "A", "AFM").await;
        let b = create_challenge(&app, "B", "AFM").await;

        app.server
            .put("/api/v1/challenges/reorder")
            .add_header("Authorization", app.bearer())
            .json(&ReorderChallengesInput {
                ordered_ids: vec![a.id, b.id],
            })
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let ids: Vec<_> = app
            .db
            .get_all_challenges()
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn timeline_and_contacts_round_out_a_challenge() {
        let app = setup().await;
        let challenge = create_challenge(&app, "Bot", "Wafa Cash").await;

        app.server
            .post(&format!("/api/v1/challenges/{}/activities", challenge.id))
            .add_header("Authorization", app.bearer())
            .json(&serde_json::json!({ "type": "meeting", "note": "Workshop" }))
            .await
            .assert_status(StatusCode::CREATED);

        app.server
            .post(&format!("/api/v1/challenges/{}/contacts", challenge.id))
            .add_header("Authorization", app.bearer())
            .json(&serde_json::json!({
                "first_name": "Tom",
                "last_name": "Wilson",
                "function": "CTO",
                "company": "AppNova",
                "email": "tom@appnova.io",
                "group": "Startup"
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let loaded: Challenge = app
            .server
            .get(&format!("/api/v1/challenges/{}", challenge.id))
            .add_header("Authorization", app.bearer())
            .await
            .json();
        assert_eq!(loaded.activities.len(), 1);
        assert_eq!(loaded.activities[0].kind, ActivityType::Meeting);
        assert_eq!(loaded.contacts.len(), 1);
        assert_eq!(loaded.contacts[0].phone, "");
    }
}

mod dashboard {
    use super::*;

    #[tokio::test]
    async fn ranks_challenges_by_alert_score() {
        let app = setup().await;
        let calm = create_challenge(&app, "Calm", "AFM").await;
        create_action(&app, calm.id, "Someday", 10, false).await;
        let hot = create_challenge(&app, "Hot", "AWB IT").await;
        create_action(&app, hot.id, "Late and urgent", -2, true).await;
        create_challenge(&app, "Empty", "AFM").await;

        let response = app
            .server
            .get("/api/v1/dashboard")
            .add_header("Authorization", app.bearer())
            .await;

        response.assert_status_ok();
        let dashboard: DashboardResponse = response.json();
        assert_eq!(dashboard.kpis.challenges_count, 3);
        assert_eq!(dashboard.kpis.alerts_count, 1);
        assert_eq!(dashboard.kpis.actions_startup, 2);

        let names: Vec<_> = dashboard.challenges.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Hot", "Calm", "Empty"]);
        assert_eq!(dashboard.challenges[0].alert_score, 100);
        assert_eq!(dashboard.entities, vec!["AFM", "AWB IT"]);
    }

    #[tokio::test]
    async fn applies_query_filters_but_keeps_kpis_global() {
        let app = setup().await;
        let calm = create_challenge(&app, "Calm", "AFM").await;
        create_action(&app, calm.id, "Someday", 10, false).await;
        let hot = create_challenge(&app, "Hot", "AWB IT").await;
        create_action(&app, hot.id, "Late", -2, false).await;

        let response = app
            .server
            .get("/api/v1/dashboard?category=overdue")
            .add_header("Authorization", app.bearer())
            .await;

        response.assert_status_ok();
        let dashboard: DashboardResponse = response.json();
        assert_eq!(dashboard.kpis.challenges_count, 2);
        assert_eq!(dashboard.challenges.len(), 1);
        assert_eq!(dashboard.challenges[0].name, "Hot");
    }

    #[tokio::test]
    async fn blank_query_values_mean_no_filter() {
        let app = setup().await;
        let challenge = create_challenge(&app, "Payments", "AFM").await;
        create_action(&app, challenge.id, "Someday", 10, false).await;

        let response = app
            .server
            .get("/api/v1/dashboard?category=&search=&entity=&wenov_owner=")
            .add_header("Authorization", app.bearer())
            .await;

        response.assert_status_ok();
        let dashboard: DashboardResponse = response.json();
        assert_eq!(dashboard.challenges.len(), 1);
    }

    #[tokio::test]
    async fn active_category_wins_over_legacy_category() {
        let app = setup().await;
        let calm = create_challenge(&app, "Calm", "AFM").await;
        create_action(&app, calm.id, "Someday", 10, true).await;
        let late = create_challenge(&app, "Late", "AWB IT").await;
        create_action(&app, late.id, "Overdue", -2, false).await;

        let response = app
            .server
            .get("/api/v1/dashboard?category=urgent&active_category=overdue")
            .add_header("Authorization", app.bearer())
            .await;

        response.assert_status_ok();
        let dashboard: DashboardResponse = response.json();
        let names: Vec<_> = dashboard.challenges.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Late"]);
    }

    #[tokio::test]
    async fn completed_actions_drop_out_of_next_actions() {
        let app = setup().await;
        let challenge = create_challenge(&app, "Payments", "AFM").await;
        let action = create_action(&app, challenge.id, "Review", 1, false).await;

        app.server
            .put(&format!("/api/v1/actions/{}", action.id))
            .add_header("Authorization", app.bearer())
            .json(&UpdateActionInput {
                is_done: Some(true),
                ..Default::default()
            })
            .await
            .assert_status_ok();

        let dashboard: DashboardResponse = app
            .server
            .get("/api/v1/dashboard")
            .add_header("Authorization", app.bearer())
            .await
            .json();
        assert!(dashboard.challenges[0].next_actions.actions.is_empty());
        assert_eq!(dashboard.challenges[0].open_actions, 0);
    }
}

mod action_list {
    use super::*;

    #[tokio::test]
    async fn filters_by_status_and_counts_everything() {
        let app = setup().await;
        let challenge = create_challenge(&app, "Payments", "AFM").await;
        create_action(&app, challenge.id, "Late", -3, false).await;
        create_action(&app, challenge.id, "Upcoming", 4, false).await;

        let response = app
            .server
            .get("/api/v1/actions?status=overdue")
            .add_header("Authorization", app.bearer())
            .await;

        response.assert_status_ok();
        let list: ActionsResponse = response.json();
        assert_eq!(list.actions.len(), 1);
        assert_eq!(list.actions[0].action.title, "Late");
        assert_eq!(list.counts.open, 2);
        assert_eq!(list.counts.overdue, 1);
        assert_eq!(list.members.len(), 1);
    }

    #[tokio::test]
    async fn cleared_pickers_are_ignored() {
        let app = setup().await;
        let challenge = create_challenge(&app, "Payments", "AFM").await;
        create_action(&app, challenge.id, "Late", -3, false).await;
        create_action(&app, challenge.id, "Upcoming", 4, false).await;

        let response = app
            .server
            .get("/api/v1/actions?status=all&assignee=")
            .add_header("Authorization", app.bearer())
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<ActionsResponse>().actions.len(), 2);

        let response = app
            .server
            .get("/api/v1/actions?status=&assignee=&entity=&search=")
            .add_header("Authorization", app.bearer())
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<ActionsResponse>().actions.len(), 2);
    }

    #[tokio::test]
    async fn malformed_assignee_is_a_bad_request() {
        let app = setup().await;

        app.server
            .get("/api/v1/actions?assignee=nobody")
            .add_header("Authorization", app.bearer())
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
