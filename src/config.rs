// src/config.rs

use std::{env, sync::Arc, time::Duration};

use crate::{
    common::i18n::I18nStore,
    db::{
        EntityRepository, EventRepository, FunnelRepository, GatewayEnvironment, LegacyRepository,
        MongoGateway, ReportRepository, SpaceDeskRepository,
    },
    services::{
        audit::AuditQueue,
        auth::AuthService,
        fanout::FanoutRegistry,
        ingestion::IngestionService,
        leads::LeadService,
        reports::ReportService,
        space_desk::SpaceDeskService,
        whatsapp::{SenderAccount, WhatsAppClient},
    },
};

/// Configuração lida do ambiente (`.env` em desenvolvimento).
#[derive(Debug, Clone)]
pub struct Config {
    pub mongo_uri: String,
    pub environment: GatewayEnvironment,
    /// Sobrescreve o banco escolhido pelo ambiente (testes de integração).
    pub database_override: Option<String>,
    pub db_timeout: Duration,
    pub legacy_database_url: Option<String>,
    pub auth_user_info_url: String,
    pub whatsapp_api_url: String,
    pub whatsapp_primary: SenderAccount,
    pub whatsapp_secondary: Option<SenderAccount>,
    pub whatsapp_verify_token: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let required = |key: &str| {
            env::var(key).map_err(|_| anyhow::anyhow!("{} deve ser definida", key))
        };
        let optional = |key: &str| env::var(key).ok().filter(|v| !v.trim().is_empty());

        let environment = optional("APP_ENV")
            .map(|raw| raw.parse::<GatewayEnvironment>())
            .transpose()?
            .unwrap_or(GatewayEnvironment::Development);

        let db_timeout = optional("DB_TIMEOUT_SECS")
            .map(|raw| raw.parse::<u64>())
            .transpose()?
            .unwrap_or(10);

        let whatsapp_secondary = match (
            optional("WHATSAPP_SECONDARY_PHONE"),
            optional("WHATSAPP_SECONDARY_KEY"),
        ) {
            (Some(phone), Some(api_key)) => Some(SenderAccount { phone, api_key }),
            _ => None,
        };

        Ok(Self {
            mongo_uri: required("MONGO_URI")?,
            environment,
            database_override: optional("MONGO_DATABASE"),
            db_timeout: Duration::from_secs(db_timeout),
            legacy_database_url: optional("LEGACY_DATABASE_URL"),
            auth_user_info_url: required("AUTH_USER_INFO_URL")?,
            whatsapp_api_url: optional("WHATSAPP_API_URL")
                .unwrap_or_else(|| "https://waba-v2.360dialog.io".to_string()),
            whatsapp_primary: SenderAccount {
                phone: required("WHATSAPP_PRIMARY_PHONE")?,
                api_key: required("WHATSAPP_PRIMARY_KEY")?,
            },
            whatsapp_secondary,
            whatsapp_verify_token: required("WHATSAPP_VERIFY_TOKEN")?,
            port: optional("PORT")
                .map(|p| p.parse::<u16>())
                .transpose()?
                .unwrap_or(3000),
        })
    }
}

impl Config {
    pub fn database_name(&self) -> &str {
        self.database_override
            .as_deref()
            .unwrap_or_else(|| self.environment.database_name())
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gateway: MongoGateway,
    pub i18n_store: I18nStore,
    pub auth_service: AuthService,
    pub audit: AuditQueue,
    pub fanout: Arc<FanoutRegistry>,
    pub entity_repo: EntityRepository,
    pub funnel_repo: FunnelRepository,
    pub legacy_repo: LegacyRepository,
    pub lead_service: LeadService,
    pub report_service: ReportService,
    pub ingestion_service: IngestionService,
    pub space_desk_service: SpaceDeskService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;
        Self::from_config(config).await
    }

    // --- Monta o gráfico de dependências ---
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let gateway =
            MongoGateway::connect(&config.mongo_uri, config.database_name(), config.db_timeout).await?;
        tracing::info!("✅ Cliente do MongoDB configurado (banco '{}')", config.database_name());

        let legacy_repo = match &config.legacy_database_url {
            Some(url) => LegacyRepository::connect(url)?,
            None => {
                tracing::warn!("LEGACY_DATABASE_URL ausente: old_data não será preenchido");
                LegacyRepository::disabled()
            }
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        let fanout = Arc::new(FanoutRegistry::new());
        let audit = AuditQueue::spawn(gateway.clone());

        let whatsapp = WhatsAppClient::new(
            http.clone(),
            config.whatsapp_api_url.clone(),
            config.whatsapp_primary.clone(),
            config.whatsapp_secondary.clone(),
        );

        let space_desk_repo = SpaceDeskRepository::new(gateway.clone());
        let events = Arc::new(EventRepository::new(gateway.clone()));

        Ok(Self {
            auth_service: AuthService::new(http, config.auth_user_info_url.clone()),
            report_service: ReportService::new(Arc::new(ReportRepository::new(gateway.clone()))),
            ingestion_service: IngestionService::new(events, fanout.clone()),
            space_desk_service: SpaceDeskService::new(space_desk_repo, whatsapp, fanout.clone()),
            lead_service: LeadService::new(gateway.clone()),
            entity_repo: EntityRepository::new(gateway.clone()),
            funnel_repo: FunnelRepository::new(gateway.clone()),
            i18n_store: I18nStore::default(),
            config: Arc::new(config),
            legacy_repo,
            gateway,
            audit,
            fanout,
        })
    }
}
