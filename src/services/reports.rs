// src/services/reports.rs

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

use crate::{
    common::{
        dates::DateRange, db_utils::parse_optional_object_id, error::AppError, numeric::round_money,
    },
    models::report::{Metric, MetricValue, ReportKind, ReportResult, ReportScope},
};

/// Quem sabe calcular uma métrica base (o repositório de relatórios).
#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn compute(&self, metric: Metric, scope: &ReportScope) -> Result<MetricValue, AppError>;
}

/// Geração do endpoint: muda o formato das datas e a obrigatoriedade do intervalo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportVersion {
    /// Datas `YYYY-MM-DD`, intervalo opcional; datas malformadas são ignoradas.
    V1,
    /// RFC 3339 ou data; `from` e `until` obrigatórios.
    V2,
}

#[derive(Clone)]
pub struct ReportService {
    source: Arc<dyn MetricSource>,
}

impl ReportService {
    pub fn new(source: Arc<dyn MetricSource>) -> Self {
        Self { source }
    }

    pub async fn build_report(
        &self,
        report_type: &str,
        params: &HashMap<String, String>,
        version: ReportVersion,
    ) -> Result<ReportResult, AppError> {
        let kind: ReportKind = report_type.parse()?;

        // Flags de presença: `?total_sold&sales_per_day`
        let requested: Vec<Metric> = kind
            .metrics()
            .iter()
            .copied()
            .filter(|m| params.contains_key(m.name()))
            .collect();
        if requested.is_empty() {
            return Err(AppError::NoMetricsRequested);
        }

        let from = params.get("from").map(String::as_str);
        let until = params.get("until").map(String::as_str);
        let range = match version {
            ReportVersion::V1 => DateRange::parse_v1(from, until),
            ReportVersion::V2 => DateRange::parse_v2(from, until).ok_or(AppError::InvalidDateRange)?,
        };
        let seller = parse_optional_object_id("seller", params.get("seller").map(String::as_str))?;
        let scope = ReportScope { range, seller };

        tracing::info!(
            report = report_type,
            metrics = requested.len(),
            ?version,
            "📊 Montando relatório"
        );

        // Qualquer falha derruba o relatório inteiro.
        let mut ctx = ReportContext::new(self.source.as_ref(), &scope);
        let mut result = ReportResult::new();
        for metric in requested {
            let value = ctx.resolve(metric).await?;
            result.insert(metric.name(), value);
        }
        Ok(result)
    }
}

/// Estado de uma requisição: cada métrica base é calculada no máximo uma vez.
struct ReportContext<'a> {
    source: &'a dyn MetricSource,
    scope: &'a ReportScope,
    cache: HashMap<Metric, MetricValue>,
}

impl<'a> ReportContext<'a> {
    fn new(source: &'a dyn MetricSource, scope: &'a ReportScope) -> Self {
        Self {
            source,
            scope,
            cache: HashMap::new(),
        }
    }

    async fn base(&mut self, metric: Metric) -> Result<MetricValue, AppError> {
        if let Some(value) = self.cache.get(&metric) {
            return Ok(value.clone());
        }
        let value = self.source.compute(metric, self.scope).await?;
        self.cache.insert(metric, value.clone());
        Ok(value)
    }

    async fn resolve(&mut self, metric: Metric) -> Result<MetricValue, AppError> {
        let Some((numerator, denominator)) = metric.ratio_of() else {
            return self.base(metric).await;
        };

        let num = self.base(numerator).await?.as_f64().unwrap_or(0.0);
        let den = self.base(denominator).await?.as_f64().unwrap_or(0.0);
        let rate = if den == 0.0 { 0.0 } else { round_money(num / den * 100.0) };
        Ok(MetricValue::Amount(rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Fonte falsa que conta quantas vezes cada métrica foi calculada.
    #[derive(Default)]
    struct CountingSource {
        calls: Mutex<HashMap<Metric, usize>>,
        failing: Option<Metric>,
    }

    impl CountingSource {
        fn calls(&self, metric: Metric) -> usize {
            self.calls.lock().unwrap().get(&metric).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl MetricSource for CountingSource {
        async fn compute(&self, metric: Metric, _scope: &ReportScope) -> Result<MetricValue, AppError> {
            *self.calls.lock().unwrap().entry(metric).or_insert(0) += 1;
            if self.failing == Some(metric) {
                return Err(AppError::DatabaseTimeout);
            }
            Ok(match metric {
                Metric::BudgetsCount => MetricValue::Count(8),
                Metric::ApprovedBudgetsCount => MetricValue::Count(2),
                Metric::LeadsCount => MetricValue::Count(0),
                Metric::ConvertedLeadsCount => MetricValue::Count(0),
                _ => MetricValue::Amount(1.0),
            })
        }
    }

    fn params(keys: &[(&str, &str)]) -> HashMap<String, String> {
        keys.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[tokio::test]
    async fn taxa_reaproveita_as_contagens() {
        let source = Arc::new(CountingSource::default());
        let service = ReportService::new(source.clone());

        let report = service
            .build_report(
                "sales",
                &params(&[("budgets_count", ""), ("approved_budgets_count", "1"), ("conversion_rate", "")]),
                ReportVersion::V1,
            )
            .await
            .unwrap();

        assert_eq!(report["conversion_rate"], MetricValue::Amount(25.0));
        assert_eq!(report["budgets_count"], MetricValue::Count(8));
        assert_eq!(source.calls(Metric::BudgetsCount), 1);
        assert_eq!(source.calls(Metric::ApprovedBudgetsCount), 1);
    }

    #[tokio::test]
    async fn taxa_com_denominador_zero_vale_zero() {
        let service = ReportService::new(Arc::new(CountingSource::default()));
        let report = service
            .build_report("leads", &params(&[("lead_conversion_rate", "")]), ReportVersion::V1)
            .await
            .unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report["lead_conversion_rate"], MetricValue::Amount(0.0));
    }

    #[tokio::test]
    async fn sem_flags_reconhecidas_e_erro() {
        let service = ReportService::new(Arc::new(CountingSource::default()));
        let err = service
            .build_report("orders", &params(&[("from", "2024-01-01"), ("total_sold", "")]), ReportVersion::V1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoMetricsRequested));
    }

    #[tokio::test]
    async fn tipo_desconhecido_e_erro() {
        let service = ReportService::new(Arc::new(CountingSource::default()));
        let err = service
            .build_report("finance", &params(&[("total_sold", "")]), ReportVersion::V1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownReportType(_)));
    }

    #[tokio::test]
    async fn v2_exige_intervalo_e_v1_nao() {
        let source = Arc::new(CountingSource::default());
        let service = ReportService::new(source.clone());

        let err = service
            .build_report("orders", &params(&[("orders_count", ""), ("from", "2024-01-01")]), ReportVersion::V2)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidDateRange));
        assert_eq!(source.calls(Metric::OrdersCount), 0);

        let report = service
            .build_report("orders", &params(&[("orders_count", ""), ("from", "xx")]), ReportVersion::V1)
            .await
            .unwrap();
        assert!(report.contains_key("orders_count"));
    }

    #[tokio::test]
    async fn falha_em_uma_metrica_derruba_tudo() {
        let source = Arc::new(CountingSource {
            failing: Some(Metric::SalesPerDay),
            ..Default::default()
        });
        let service = ReportService::new(source);
        let err = service
            .build_report("sales", &params(&[("total_sold", ""), ("sales_per_day", "")]), ReportVersion::V1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DatabaseTimeout));
    }

    #[tokio::test]
    async fn vendedor_malformado_e_rejeitado() {
        let service = ReportService::new(Arc::new(CountingSource::default()));
        let err = service
            .build_report("sales", &params(&[("total_sold", ""), ("seller", "abc")]), ReportVersion::V1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidId(_)));
    }
}
