// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn router(app_state: AppState) -> Router {
    let report_v1_routes = Router::new().route("/{report_type}", get(handlers::reports::report_v1));
    let report_v2_routes = Router::new().route("/{report_type}", get(handlers::reports::report_v2));

    let lead_routes = Router::new()
        .route("/"
               ,get(handlers::leads::list_leads)
               .post(handlers::leads::create_lead)
        )
        .route("/{id}"
               ,get(handlers::leads::get_lead)
               .patch(handlers::leads::update_lead)
        );

    let client_routes = Router::new()
        .route("/"
               ,get(handlers::clients::list_clients)
               .post(handlers::clients::create_client)
        )
        .route("/{id}"
               ,get(handlers::clients::get_client)
               .patch(handlers::clients::update_client)
        );

    let budget_routes = Router::new()
        .route("/"
               ,get(handlers::budgets::list_budgets)
               .post(handlers::budgets::create_budget)
        )
        .route("/{id}"
               ,get(handlers::budgets::get_budget)
               .patch(handlers::budgets::update_budget)
        );

    let order_routes = Router::new()
        .route("/"
               ,get(handlers::orders::list_orders)
               .post(handlers::orders::create_order)
        )
        .route("/{id}"
               ,get(handlers::orders::get_order)
               .patch(handlers::orders::update_order)
        );

    let funnel_routes = Router::new()
        .route("/"
               ,get(handlers::funnels::list_funnels)
               .post(handlers::funnels::create_funnel)
        )
        .route("/{id}"
               ,get(handlers::funnels::get_funnel)
               .patch(handlers::funnels::update_funnel)
               .delete(handlers::funnels::delete_funnel)
        )
        .route("/{id}/stages", post(handlers::funnels::add_stage))
        .route("/{id}/stages/{index}", patch(handlers::funnels::update_stage))
        .route("/{id}/placements", post(handlers::funnels::add_placement))
        .route(
            "/{id}/placements/{placement_id}",
            axum::routing::delete(handlers::funnels::delete_placement),
        );

    let goal_routes = Router::new()
        .route("/"
               ,get(handlers::goals::list_goals)
               .post(handlers::goals::create_goal)
        )
        .route("/{id}"
               ,get(handlers::goals::get_goal)
               .patch(handlers::goals::update_goal)
        );

    let user_routes = Router::new().route("/me", get(handlers::users::get_me));

    let space_desk_routes = Router::new()
        .route("/chats", get(handlers::space_desk::list_chats))
        .route("/chats/{id}", axum::routing::delete(handlers::space_desk::delete_chat))
        .route("/chats/{id}/messages"
               ,get(handlers::space_desk::list_messages)
               .post(handlers::space_desk::send_message)
        )
        .route("/groups"
               ,get(handlers::space_desk::list_groups)
               .post(handlers::space_desk::create_group)
        )
        .route("/groups/{id}"
               ,patch(handlers::space_desk::update_group)
               .delete(handlers::space_desk::delete_group)
        )
        .route("/ws", get(handlers::ws::space_desk_socket));

    // Tudo em /v1 e /v2 exige token, menos o webhook do provedor
    let protected = Router::new()
        .nest("/v1/reports", report_v1_routes)
        .nest("/v2/reports", report_v2_routes)
        .nest("/v1/leads", lead_routes)
        .nest("/v1/clients", client_routes)
        .nest("/v1/budgets", budget_routes)
        .nest("/v1/orders", order_routes)
        .nest("/v1/funnels", funnel_routes)
        .nest("/v1/commercial-goals", goal_routes)
        .nest("/v1/users", user_routes)
        .nest("/v1/space-desk", space_desk_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let webhook_routes = Router::new().route(
        "/whatsapp",
        get(handlers::webhooks::verify_whatsapp).post(handlers::webhooks::receive_whatsapp),
    );

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(protected)
        .nest("/v1/webhooks", webhook_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
