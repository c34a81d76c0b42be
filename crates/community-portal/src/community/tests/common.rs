use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use serde_json::{json, Value};

use crate::backend::{InMemoryBackend, Session, Table};
use crate::community::applications::{
    ApplicationData, BasicInfo, RulesUnderstanding, Situation,
};
use crate::community::Portal;
use crate::config::PortalConfig;

/// Portal over an in-memory backend with one user per role.
pub(super) struct Harness {
    pub backend: Arc<InMemoryBackend>,
    pub portal: Portal<InMemoryBackend>,
    pub admin: Session,
    pub moderator: Session,
    pub member: Session,
}

pub(super) fn harness() -> Harness {
    let backend = Arc::new(InMemoryBackend::new());
    let admin = backend.register_user("admin@portal.test");
    let moderator = backend.register_user("mod@portal.test");
    let member = backend.register_user("member@portal.test");

    grant(&backend, &admin, "admin");
    grant(&backend, &moderator, "moderator");

    let portal = Portal::new(Arc::clone(&backend), &PortalConfig::default());
    Harness {
        backend,
        portal,
        admin,
        moderator,
        member,
    }
}

pub(super) fn grant(backend: &InMemoryBackend, session: &Session, role: &str) {
    backend
        .seed(
            Table::AdminUsers,
            json!({ "user_id": session.user_id, "role": role }),
        )
        .expect("seed role");
}

pub(super) fn open_season(backend: &InMemoryBackend, name: &str) -> Value {
    backend
        .seed(
            Table::ApplicationSeasons,
            json!({ "name": name, "is_active": true }),
        )
        .expect("seed season")
}

pub(super) fn answer() -> String {
    "I stay in character and report problems to staff right away.".to_string()
}

pub(super) fn basic_info(age: u8) -> BasicInfo {
    BasicInfo {
        discord_id: "123456789012345678".to_string(),
        roblox_id: "55512345".to_string(),
        roblox_username: "RiverSide_Builder".to_string(),
        age,
        activity_level: 3,
        other_servers: Some("Harbor City RP".to_string()),
    }
}

pub(super) fn rules() -> RulesUnderstanding {
    RulesUnderstanding {
        frp_understanding: answer(),
        vdm_understanding: answer(),
        taschen_rp_understanding: answer(),
        server_age_understanding: answer(),
    }
}

pub(super) fn situation() -> Situation {
    Situation {
        situation_handling: answer(),
        bodycam_understanding: answer(),
        friend_rule_violation: answer(),
        admin_experience: None,
        notes: Some("Available most evenings.".to_string()),
        accept_terms: true,
    }
}

pub(super) fn application_data(age: u8) -> ApplicationData {
    ApplicationData {
        basic: basic_info(age),
        rules: rules(),
        situation: situation(),
        is_under12: false,
    }
}

pub(super) fn request(method: Method, uri: &str, token: Option<&Session>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(session) = token {
        builder = builder.header(
            header::AUTHORIZATION,
            format!("Bearer {}", session.access_token),
        );
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
