// src/db/report_repo.rs

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};

use crate::{
    common::{error::AppError, numeric::round_money, pricing::legacy_budget_value},
    db::{
        report_pipelines::{self as p, DAY_FORMAT, MONTH_FORMAT},
        MongoGateway,
    },
    models::report::{Metric, MetricValue, ReportScope},
    services::reports::MetricSource,
};

const BUDGETS: &str = "budgets";
const ORDERS: &str = "orders";
const CLIENTS: &str = "clients";
const LEADS: &str = "leads";

#[derive(Clone)]
pub struct ReportRepository {
    gateway: MongoGateway,
}

impl ReportRepository {
    pub fn new(gateway: MongoGateway) -> Self {
        Self { gateway }
    }

    async fn count(&self, collection: &str, filter: Document) -> Result<MetricValue, AppError> {
        let coll = self.gateway.collection(collection);
        let total = self.gateway.run(coll.count_documents(filter)).await?;
        Ok(MetricValue::Count(total as i64))
    }

    async fn amount(&self, collection: &str, pipeline: Vec<Document>) -> Result<MetricValue, AppError> {
        let docs = self.gateway.aggregate(collection, pipeline).await?;
        Ok(MetricValue::Amount(p::single_amount(&docs)))
    }

    async fn amounts(&self, collection: &str, pipeline: Vec<Document>) -> Result<MetricValue, AppError> {
        let docs = self.gateway.aggregate(collection, pipeline).await?;
        Ok(MetricValue::Amounts(p::amounts_by_label(&docs)))
    }

    async fn counts(&self, collection: &str, pipeline: Vec<Document>) -> Result<MetricValue, AppError> {
        let docs = self.gateway.aggregate(collection, pipeline).await?;
        Ok(MetricValue::Counts(p::counts_by_label(&docs)))
    }

    /// Ticket médio v1: valor pela lista de produtos legada, com o documento
    /// de entrega como reserva. Orçamentos sem nenhum dos dois ficam de fora.
    async fn ticket_average_v1(&self, scope: &ReportScope) -> Result<MetricValue, AppError> {
        let coll = self.gateway.collection(BUDGETS);
        let filter = p::approved_budgets_filter(scope);

        let budgets: Vec<Document> = self
            .gateway
            .run(async move {
                coll.find(filter)
                    .projection(doc! { "product_list": 1, "delivery": 1 })
                    .await?
                    .try_collect()
                    .await
            })
            .await?;

        let values: Vec<f64> = budgets.iter().filter_map(legacy_budget_value).collect();
        if values.is_empty() {
            return Ok(MetricValue::Amount(0.0));
        }
        let average = values.iter().sum::<f64>() / values.len() as f64;
        Ok(MetricValue::Amount(round_money(average)))
    }

    /// Média mensal de clientes novos: média das contagens de cada mês com cadastro.
    async fn monthly_average_new_clients(&self, scope: &ReportScope) -> Result<MetricValue, AppError> {
        let pipeline = p::count_per_bucket_pipeline(p::created_filter(scope, false), MONTH_FORMAT);
        let docs = self.gateway.aggregate(CLIENTS, pipeline).await?;
        let per_month = p::counts_by_label(&docs);
        if per_month.is_empty() {
            return Ok(MetricValue::Amount(0.0));
        }
        let average = per_month.values().sum::<i64>() as f64 / per_month.len() as f64;
        Ok(MetricValue::Amount(round_money(average)))
    }
}

#[async_trait]
impl MetricSource for ReportRepository {
    async fn compute(&self, metric: Metric, scope: &ReportScope) -> Result<MetricValue, AppError> {
        tracing::debug!(metric = metric.name(), "Calculando métrica");

        match metric {
            // --- Orçamentos / vendas ---
            Metric::BudgetsCount => self.count(BUDGETS, p::created_filter(scope, true)).await,
            Metric::ApprovedBudgetsCount => self.count(BUDGETS, p::approved_budgets_filter(scope)).await,
            Metric::TotalSold => self.amount(BUDGETS, p::installments_total_pipeline(scope, true)).await,
            Metric::LostValue => self.amount(BUDGETS, p::installments_total_pipeline(scope, false)).await,
            Metric::SalesPerDay => self.amounts(BUDGETS, p::sales_per_bucket_pipeline(scope, DAY_FORMAT)).await,
            Metric::SalesPerMonth => {
                self.amounts(BUDGETS, p::sales_per_bucket_pipeline(scope, MONTH_FORMAT)).await
            }
            Metric::SalesByPaymentMethod => {
                self.amounts(BUDGETS, p::sales_by_payment_method_pipeline(scope)).await
            }
            Metric::SalesBySeller => self.amounts(BUDGETS, p::sales_by_seller_pipeline(scope)).await,
            Metric::SalesBySegmentPerMonth => {
                let docs = self
                    .gateway
                    .aggregate(BUDGETS, p::sales_by_segment_per_month_pipeline(scope))
                    .await?;
                Ok(MetricValue::Nested(p::nested_amounts(&docs)))
            }
            Metric::TicketAverageV1 => self.ticket_average_v1(scope).await,
            Metric::TicketAverageV2 => self.amount(BUDGETS, p::ticket_average_v2_pipeline(scope)).await,

            // --- Pedidos ---
            Metric::OrdersCount => self.count(ORDERS, p::created_filter(scope, true)).await,
            Metric::OrdersByStatus => {
                self.counts(ORDERS, p::count_by_field_pipeline(p::created_filter(scope, true), "status")).await
            }
            Metric::OrdersByStage => {
                self.counts(ORDERS, p::count_by_field_pipeline(p::created_filter(scope, true), "stage")).await
            }
            Metric::OrdersByType => {
                self.counts(ORDERS, p::count_by_field_pipeline(p::created_filter(scope, true), "type")).await
            }
            Metric::OrdersPerDay => {
                self.counts(ORDERS, p::count_per_bucket_pipeline(p::created_filter(scope, true), DAY_FORMAT))
                    .await
            }

            // --- Clientes ---
            Metric::ClientsCount => self.count(CLIENTS, p::created_filter(scope, false)).await,
            Metric::NewClientsPerDay => {
                self.counts(CLIENTS, p::count_per_bucket_pipeline(p::created_filter(scope, false), DAY_FORMAT))
                    .await
            }
            Metric::MonthlyAverageNewClients => self.monthly_average_new_clients(scope).await,

            // --- Leads ---
            Metric::LeadsCount => self.count(LEADS, p::created_filter(scope, false)).await,
            Metric::ConvertedLeadsCount => self.count(LEADS, p::converted_leads_filter(scope)).await,
            Metric::LeadsByOrigin => {
                self.counts(LEADS, p::count_by_field_pipeline(p::created_filter(scope, false), "origin")).await
            }

            // Taxas são montadas pelo serviço a partir das contagens
            Metric::ConversionRate | Metric::LeadConversionRate => Err(AppError::InternalServerError(
                anyhow::anyhow!("métrica derivada pedida ao repositório: {}", metric.name()),
            )),
        }
    }
}
