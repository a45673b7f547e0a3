// src/common/dates.rs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mongodb::bson::{self, doc, Document};

/// Intervalo fechado `[from, until]`. Lado ausente = sem limite.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Formato v1: datas de calendário (`YYYY-MM-DD`). Strings malformadas
    /// são ignoradas e o lado fica sem limite.
    pub fn parse_v1(from: Option<&str>, until: Option<&str>) -> Self {
        Self {
            from: from.and_then(parse_calendar_date).map(start_of_day),
            until: until.and_then(parse_calendar_date).map(end_of_day),
        }
    }

    /// Formato v2: timestamp RFC 3339 ou data de calendário; os dois lados
    /// são obrigatórios.
    pub fn parse_v2(from: Option<&str>, until: Option<&str>) -> Option<Self> {
        let from = parse_timestamp_or_date(from?, false)?;
        let until = parse_timestamp_or_date(until?, true)?;
        if from > until {
            return None;
        }
        Some(Self {
            from: Some(from),
            until: Some(until),
        })
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.until.is_none()
    }

    /// Predicado `{ $gte, $lte }` para o campo, ou `None` sem limites.
    pub fn bson_condition(&self) -> Option<Document> {
        if self.is_unbounded() {
            return None;
        }
        let mut cond = Document::new();
        if let Some(from) = self.from {
            cond.insert("$gte", to_bson_datetime(from));
        }
        if let Some(until) = self.until {
            cond.insert("$lte", to_bson_datetime(until));
        }
        Some(cond)
    }

    /// Aplica o intervalo ao `filter` no campo indicado.
    pub fn apply(&self, filter: &mut Document, field: &str) {
        if let Some(cond) = self.bson_condition() {
            filter.insert(field, cond);
        }
    }

    pub fn as_filter(&self, field: &str) -> Document {
        let mut filter = doc! {};
        self.apply(&mut filter, field);
        filter
    }
}

pub fn to_bson_datetime(value: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(value.timestamp_millis())
}

pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Instante informado em payloads: RFC 3339 ou data (início do dia).
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    parse_timestamp_or_date(raw, false)
}

fn parse_timestamp_or_date(raw: &str, end_side: bool) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = parse_calendar_date(raw)?;
    Some(if end_side { end_of_day(date) } else { start_of_day(date) })
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    date.and_time(last).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v1_ignora_datas_malformadas() {
        let range = DateRange::parse_v1(Some("2024-13-40"), Some("2024-02-10"));
        assert!(range.from.is_none());
        assert_eq!(
            range.until.map(|d| d.to_rfc3339()),
            Some("2024-02-10T23:59:59.999+00:00".to_string())
        );
    }

    #[test]
    fn v1_sem_parametros_fica_sem_limite() {
        let range = DateRange::parse_v1(None, None);
        assert!(range.is_unbounded());
        assert!(range.bson_condition().is_none());
    }

    #[test]
    fn v2_exige_os_dois_lados() {
        assert!(DateRange::parse_v2(Some("2024-01-01"), None).is_none());
        assert!(DateRange::parse_v2(Some("lixo"), Some("2024-01-31")).is_none());
        assert!(DateRange::parse_v2(Some("2024-02-01"), Some("2024-01-01")).is_none());

        let range = DateRange::parse_v2(Some("2024-01-01T10:00:00-03:00"), Some("2024-01-31"))
            .expect("intervalo válido");
        assert_eq!(
            range.from.map(|d| d.to_rfc3339()),
            Some("2024-01-01T13:00:00+00:00".to_string())
        );
    }

    #[test]
    fn condicao_bson_inclusiva() {
        let range = DateRange::parse_v1(Some("2024-01-01"), Some("2024-01-31"));
        let cond = range.bson_condition().expect("condição");
        assert!(cond.contains_key("$gte"));
        assert!(cond.contains_key("$lte"));
    }
}
