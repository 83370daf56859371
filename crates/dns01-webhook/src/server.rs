// Webhook HTTP service
//
// Routes:
// - POST `/apis/{group}/v1alpha1/{solver}`: solve one challenge request
// - GET  `/apis/{group}/v1alpha1`: list the solvers served under the group
// - GET  `/healthz`: liveness

use actix_web::{HttpResponse, web};
use dns01_core::{ChallengeAction, SolverRegistry};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::payload::{API_VERSION, ChallengePayload, ChallengeResponse, PAYLOAD_KIND};

/// Shared handler state
pub struct WebhookState {
    /// API group this webhook answers for
    pub group_name: String,
    pub registry: Arc<SolverRegistry>,
}

/// Register the webhook routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/healthz", web::get().to(healthz))
        .route(
            &format!("/apis/{{group}}/{}", API_VERSION),
            web::get().to(discovery),
        )
        .route(
            &format!("/apis/{{group}}/{}/{{solver}}", API_VERSION),
            web::post().to(solve),
        );
}

fn not_found(message: String) -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "message": message }))
}

async fn healthz() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn discovery(state: web::Data<WebhookState>, group: web::Path<String>) -> HttpResponse {
    let group = group.into_inner();
    if group != state.group_name {
        return not_found(format!("API group '{}' is not served here", group));
    }

    let resources: Vec<_> = state
        .registry
        .list_solvers()
        .into_iter()
        .map(|name| {
            json!({
                "name": name,
                "singularName": name,
                "namespaced": false,
                "kind": PAYLOAD_KIND,
                "verbs": ["create"],
            })
        })
        .collect();

    HttpResponse::Ok().json(json!({
        "kind": "APIResourceList",
        "apiVersion": "v1",
        "groupVersion": format!("{}/{}", group, API_VERSION),
        "resources": resources,
    }))
}

async fn solve(
    state: web::Data<WebhookState>,
    path: web::Path<(String, String)>,
    body: web::Bytes,
) -> HttpResponse {
    let (group, solver_name) = path.into_inner();

    if group != state.group_name {
        return not_found(format!("API group '{}' is not served here", group));
    }

    let Some(solver) = state.registry.get(&solver_name) else {
        return not_found(format!("no solver named '{}'", solver_name));
    };

    let payload: ChallengePayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Rejected malformed challenge payload");
            return HttpResponse::BadRequest()
                .json(json!({ "message": format!("malformed ChallengePayload: {}", e) }));
        }
    };

    let Some(request) = payload.request else {
        return HttpResponse::BadRequest()
            .json(json!({ "message": "ChallengePayload has no request" }));
    };

    debug!(
        uid = %request.uid,
        action = ?request.action,
        fqdn = %request.resolved_fqdn,
        namespace = %request.resource_namespace,
        "Handling challenge request"
    );

    let result = match request.action {
        ChallengeAction::Present => solver.present(&request).await,
        ChallengeAction::CleanUp => solver.clean_up(&request).await,
    };

    let response = match result {
        Ok(()) => {
            info!(uid = %request.uid, action = ?request.action, fqdn = %request.resolved_fqdn, "Challenge request succeeded");
            ChallengeResponse::success(request.uid)
        }
        Err(e) => {
            warn!(
                uid = %request.uid,
                action = ?request.action,
                fqdn = %request.resolved_fqdn,
                retryable = e.is_retryable(),
                error = %e,
                "Challenge request failed"
            );
            ChallengeResponse::failure(request.uid, &e)
        }
    };

    HttpResponse::Ok().json(ChallengePayload::reply(response))
}
