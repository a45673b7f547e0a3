// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Relatórios ---
        handlers::reports::report_v1,
        handlers::reports::report_v2,

        // --- Leads ---
        handlers::leads::list_leads,
        handlers::leads::get_lead,
        handlers::leads::create_lead,
        handlers::leads::update_lead,

        // --- Clientes ---
        handlers::clients::list_clients,
        handlers::clients::get_client,
        handlers::clients::create_client,
        handlers::clients::update_client,

        // --- Orçamentos ---
        handlers::budgets::list_budgets,
        handlers::budgets::get_budget,
        handlers::budgets::create_budget,
        handlers::budgets::update_budget,

        // --- Pedidos ---
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::create_order,
        handlers::orders::update_order,

        // --- Funis ---
        handlers::funnels::list_funnels,
        handlers::funnels::get_funnel,
        handlers::funnels::create_funnel,
        handlers::funnels::update_funnel,
        handlers::funnels::delete_funnel,
        handlers::funnels::add_stage,
        handlers::funnels::update_stage,
        handlers::funnels::add_placement,
        handlers::funnels::delete_placement,

        // --- Metas ---
        handlers::goals::list_goals,
        handlers::goals::get_goal,
        handlers::goals::create_goal,
        handlers::goals::update_goal,

        // --- Usuários ---
        handlers::users::get_me,

        // --- Space Desk ---
        handlers::space_desk::list_chats,
        handlers::space_desk::delete_chat,
        handlers::space_desk::list_messages,
        handlers::space_desk::send_message,
        handlers::space_desk::list_groups,
        handlers::space_desk::create_group,
        handlers::space_desk::update_group,
        handlers::space_desk::delete_group,

        // --- Webhooks ---
        handlers::webhooks::verify_whatsapp,
        handlers::webhooks::receive_whatsapp,
    ),
    components(
        schemas(
            models::auth::AuthUser,
            models::lead::CreateLeadPayload,
            models::lead::UpdateLeadPayload,
            models::lead::LeadTier,
            models::client::ClientContact,
            models::client::CreateClientPayload,
            models::client::UpdateClientPayload,
            models::budget::InstallmentPayload,
            models::budget::CreateBudgetPayload,
            models::budget::UpdateBudgetPayload,
            models::order::OrderStatus,
            models::order::OrderStage,
            models::order::OrderType,
            models::order::CreateOrderPayload,
            models::order::UpdateOrderPayload,
            models::funnel::StagePayload,
            models::funnel::CreateFunnelPayload,
            models::funnel::UpdateFunnelPayload,
            models::funnel::UpdateStagePayload,
            models::funnel::CreatePlacementPayload,
            models::goal::GoalType,
            models::goal::GoalTarget,
            models::goal::CreateGoalPayload,
            models::goal::UpdateGoalPayload,
            models::space_desk::SendTextPayload,
            models::space_desk::CreateGroupPayload,
            models::space_desk::UpdateGroupPayload,
        )
    ),
    tags(
        (name = "Relatórios", description = "Métricas comerciais sob demanda"),
        (name = "Leads", description = "Prospecção"),
        (name = "Clientes", description = "Clientes convertidos"),
        (name = "Orçamentos", description = "Orçamentos e parcelas"),
        (name = "Pedidos", description = "Pedidos de produção"),
        (name = "Funis", description = "Funis de venda, etapas e posicionamentos"),
        (name = "Metas", description = "Metas comerciais"),
        (name = "Usuários", description = "Dados do usuário autenticado"),
        (name = "Space Desk", description = "Atendimento por WhatsApp"),
        (name = "Webhooks", description = "Eventos do provedor de WhatsApp")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("bearer", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documento_lista_as_rotas_principais() {
        let doc = ApiDoc::openapi();
        for path in ["/v1/reports/{report_type}", "/v2/reports/{report_type}", "/v1/funnels/{id}/stages/{index}"] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }
    }
}
