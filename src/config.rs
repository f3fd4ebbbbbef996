// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    db::{
        AvailabilityRepository, CatalogRepository, PaymentRepository, PricingRepository,
        SettingsRepository, UserRepository,
    },
    services::{
        auth::AuthService, availability_service::AvailabilityService,
        booking_service::BookingService, document_service::DocumentService,
        matching_service::MatchingService, payout_service::PayoutService,
        pricing_service::PricingService,
    },
};

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,

    pub auth_service: AuthService,
    pub availability_service: AvailabilityService,
    pub matching_service: MatchingService,
    pub pricing_service: PricingService,
    pub booking_service: BookingService,
    pub payout_service: PayoutService,
    pub document_service: DocumentService,

    // Repositórios acessados direto pelos handlers de leitura simples
    pub catalog_repo: CatalogRepository,
    pub payment_repo: PaymentRepository,
    pub settings_repo: SettingsRepository,
}

impl AppState {
    // A assinatura retorna um Result: se a configuração falhar, quem decide
    // o que fazer é o main.
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let availability_repo = AvailabilityRepository::new(db_pool.clone());
        let pricing_repo = PricingRepository::new(db_pool.clone());
        let payment_repo = PaymentRepository::new(db_pool.clone());
        let settings_repo = SettingsRepository::new(db_pool.clone());

        let auth_service =
            AuthService::new(user_repo.clone(), jwt_secret.clone(), db_pool.clone());

        let availability_service = AvailabilityService::new(
            availability_repo.clone(),
            catalog_repo.clone(),
            db_pool.clone(),
        );

        let matching_service = MatchingService::new(
            availability_repo.clone(),
            catalog_repo.clone(),
            db_pool.clone(),
        );

        let pricing_service = PricingService::new(
            pricing_repo.clone(),
            availability_repo.clone(),
            catalog_repo.clone(),
            user_repo.clone(),
            db_pool.clone(),
        );

        let booking_service = BookingService::new(
            availability_repo.clone(),
            payment_repo.clone(),
            pricing_service.clone(),
            db_pool.clone(),
        );

        let payout_service = PayoutService::new(payment_repo.clone(), db_pool.clone());

        let document_service = DocumentService::new(
            payment_repo.clone(),
            availability_repo.clone(),
            user_repo.clone(),
            db_pool.clone(),
        );

        Ok(Self {
            db_pool,
            jwt_secret,
            auth_service,
            availability_service,
            matching_service,
            pricing_service,
            booking_service,
            payout_service,
            document_service,
            catalog_repo,
            payment_repo,
            settings_repo,
        })
    }
}
