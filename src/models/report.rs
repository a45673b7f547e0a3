// src/models/report.rs

use std::{collections::BTreeMap, str::FromStr};

use mongodb::bson::oid::ObjectId;
use serde::Serialize;

use crate::common::{dates::DateRange, error::AppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Sales,
    Orders,
    Clients,
    Leads,
}

impl FromStr for ReportKind {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "sales" => Ok(ReportKind::Sales),
            "orders" => Ok(ReportKind::Orders),
            "clients" => Ok(ReportKind::Clients),
            "leads" => Ok(ReportKind::Leads),
            other => Err(AppError::UnknownReportType(other.to_string())),
        }
    }
}

impl ReportKind {
    /// Métricas que podem ser pedidas (por flag na query-string) neste relatório.
    pub fn metrics(&self) -> &'static [Metric] {
        use Metric::*;
        match self {
            ReportKind::Sales => &[
                BudgetsCount,
                ApprovedBudgetsCount,
                ConversionRate,
                TotalSold,
                SalesPerDay,
                SalesPerMonth,
                SalesByPaymentMethod,
                SalesBySeller,
                SalesBySegmentPerMonth,
                TicketAverageV1,
                TicketAverageV2,
                LostValue,
            ],
            ReportKind::Orders => &[
                OrdersCount,
                OrdersByStatus,
                OrdersByStage,
                OrdersByType,
                OrdersPerDay,
            ],
            ReportKind::Clients => &[ClientsCount, NewClientsPerDay, MonthlyAverageNewClients],
            ReportKind::Leads => &[LeadsCount, ConvertedLeadsCount, LeadConversionRate, LeadsByOrigin],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    BudgetsCount,
    ApprovedBudgetsCount,
    ConversionRate,
    TotalSold,
    SalesPerDay,
    SalesPerMonth,
    SalesByPaymentMethod,
    SalesBySeller,
    SalesBySegmentPerMonth,
    TicketAverageV1,
    TicketAverageV2,
    LostValue,
    OrdersCount,
    OrdersByStatus,
    OrdersByStage,
    OrdersByType,
    OrdersPerDay,
    ClientsCount,
    NewClientsPerDay,
    MonthlyAverageNewClients,
    LeadsCount,
    ConvertedLeadsCount,
    LeadConversionRate,
    LeadsByOrigin,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::BudgetsCount => "budgets_count",
            Metric::ApprovedBudgetsCount => "approved_budgets_count",
            Metric::ConversionRate => "conversion_rate",
            Metric::TotalSold => "total_sold",
            Metric::SalesPerDay => "sales_per_day",
            Metric::SalesPerMonth => "sales_per_month",
            Metric::SalesByPaymentMethod => "sales_by_payment_method",
            Metric::SalesBySeller => "sales_by_seller",
            Metric::SalesBySegmentPerMonth => "sales_by_segment_per_month",
            Metric::TicketAverageV1 => "ticket_average_v1",
            Metric::TicketAverageV2 => "ticket_average_v2",
            Metric::LostValue => "lost_value",
            Metric::OrdersCount => "orders_count",
            Metric::OrdersByStatus => "orders_by_status",
            Metric::OrdersByStage => "orders_by_stage",
            Metric::OrdersByType => "orders_by_type",
            Metric::OrdersPerDay => "orders_per_day",
            Metric::ClientsCount => "clients_count",
            Metric::NewClientsPerDay => "new_clients_per_day",
            Metric::MonthlyAverageNewClients => "monthly_average_new_clients",
            Metric::LeadsCount => "leads_count",
            Metric::ConvertedLeadsCount => "converted_leads_count",
            Metric::LeadConversionRate => "lead_conversion_rate",
            Metric::LeadsByOrigin => "leads_by_origin",
        }
    }

    /// Taxas calculadas a partir de outras duas métricas: (numerador, denominador).
    pub fn ratio_of(&self) -> Option<(Metric, Metric)> {
        match self {
            Metric::ConversionRate => Some((Metric::ApprovedBudgetsCount, Metric::BudgetsCount)),
            Metric::LeadConversionRate => Some((Metric::ConvertedLeadsCount, Metric::LeadsCount)),
            _ => None,
        }
    }
}

/// Resultado de uma métrica: escalar, mapa rótulo→valor ou mapa aninhado.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(i64),
    Amount(f64),
    Counts(BTreeMap<String, i64>),
    Amounts(BTreeMap<String, f64>),
    Nested(BTreeMap<String, BTreeMap<String, f64>>),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Count(v) => Some(*v as f64),
            MetricValue::Amount(v) => Some(*v),
            _ => None,
        }
    }
}

/// Escopo comum a todas as métricas de uma requisição.
#[derive(Debug, Clone, Default)]
pub struct ReportScope {
    pub range: DateRange,
    pub seller: Option<ObjectId>,
}

pub type ReportResult = BTreeMap<&'static str, MetricValue>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tipo_desconhecido_e_erro_de_validacao() {
        assert!(matches!(
            "finance".parse::<ReportKind>(),
            Err(AppError::UnknownReportType(kind)) if kind == "finance"
        ));
    }

    #[test]
    fn valores_serializam_sem_tag() {
        let mut per_day = BTreeMap::new();
        per_day.insert("2024-01-01".to_string(), 10.5);
        assert_eq!(serde_json::to_value(MetricValue::Amounts(per_day)).unwrap(), json!({"2024-01-01": 10.5}));
        assert_eq!(serde_json::to_value(MetricValue::Count(4)).unwrap(), json!(4));
    }

    #[test]
    fn taxas_dependem_de_metricas_do_mesmo_relatorio() {
        for kind in [ReportKind::Sales, ReportKind::Orders, ReportKind::Clients, ReportKind::Leads] {
            for metric in kind.metrics() {
                if let Some((num, den)) = metric.ratio_of() {
                    assert!(kind.metrics().contains(&num));
                    assert!(kind.metrics().contains(&den));
                }
            }
        }
    }
}
