// src/common/i18n.rs

use std::collections::HashMap;

const DEFAULT_LANG: &str = "pt";

// (código, português, inglês). `{}` é substituído pelo detalhe do erro.
const MESSAGES: &[(u16, &str, &str)] = &[
    (1001, "Um ou mais campos são inválidos", "One or more fields are invalid"),
    (1002, "ID inválido no campo '{}'", "Invalid ID in field '{}'"),
    (1003, "Campo obrigatório ausente: {}", "Missing required field: {}"),
    (1004, "Valor inválido para o campo '{}'", "Invalid value for field '{}'"),
    (1005, "Intervalo de datas inválido ou ausente", "Invalid or missing date range"),
    (1006, "Tipo de relatório desconhecido: {}", "Unknown report type: {}"),
    (1007, "Nenhuma métrica reconhecida foi solicitada", "No recognized metric was requested"),
    (1008, "Índice de etapa inválido: {}", "Invalid stage index: {}"),
    (1009, "Payload inválido: {}", "Invalid payload: {}"),
    (2001, "{} não encontrado", "{} not found"),
    (3001, "Token de autenticação inválido ou ausente", "Missing or invalid authentication token"),
    (3002, "Você não tem permissão para realizar esta ação", "You are not allowed to perform this action"),
    (4001, "Falha ao acessar o banco de dados", "Database access failed"),
    (4002, "O banco de dados não respondeu a tempo", "The database did not respond in time"),
    (4003, "Falha ao acessar o banco legado", "Legacy database access failed"),
    (4004, "Falha ao comunicar com o provedor externo", "Failed to reach the external provider"),
    (5000, "Ocorreu um erro inesperado", "An unexpected error occurred"),
    (5001, "Ocorreu um erro inesperado", "An unexpected error occurred"),
];

/// Catálogo de mensagens de erro por idioma.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<(String, u16), String>,
}

impl Default for I18nStore {
    fn default() -> Self {
        let mut messages = HashMap::new();
        for (code, pt, en) in MESSAGES {
            messages.insert(("pt".to_string(), *code), pt.to_string());
            messages.insert(("en".to_string(), *code), en.to_string());
        }
        Self { messages }
    }
}

impl I18nStore {
    pub fn message(&self, lang: &str, code: u16) -> &str {
        self.messages
            .get(&(lang.to_string(), code))
            .or_else(|| self.messages.get(&(DEFAULT_LANG.to_string(), code)))
            .map(String::as_str)
            .unwrap_or("Erro")
    }

    pub fn format(&self, lang: &str, code: u16, detail: &str) -> String {
        self.message(lang, code).replacen("{}", detail, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idioma_desconhecido_cai_no_portugues() {
        let store = I18nStore::default();
        assert_eq!(store.message("de", 4002), "O banco de dados não respondeu a tempo");
    }

    #[test]
    fn format_substitui_o_detalhe() {
        let store = I18nStore::default();
        assert_eq!(store.format("en", 2001, "Funnel"), "Funnel not found");
    }
}
