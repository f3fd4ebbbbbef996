//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

// Importações principais
use crate::config::AppState;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    // Inicializa o logger
    tracing_subscriber::fmt().with_target(false).compact().init();

    // Lida com o Result retornado por AppState::new()
    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Rotas de usuário (protegidas pelo middleware)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Catálogo (público): países, séries, trilhas, cursos e matérias
    let catalog_routes = Router::new()
        .route("/countries", get(handlers::catalog::list_countries))
        .route("/grades", get(handlers::catalog::list_grades))
        .route("/tracks", get(handlers::catalog::list_tracks))
        .route("/majors", get(handlers::catalog::list_majors))
        .route("/majors/{id}/subjects", get(handlers::catalog::list_major_subjects))
        .route("/subjects", get(handlers::catalog::list_subjects));

    // Horários publicados pelos professores
    let availability_routes = Router::new()
        .route("/", post(handlers::availabilities::create_availability))
        .route("/mine", get(handlers::availabilities::list_my_availabilities))
        .route("/bulk", post(handlers::availabilities::bulk_create_availabilities))
        .route("/bulk-delete", post(handlers::availabilities::bulk_delete_availabilities))
        .route(
            "/{id}",
            put(handlers::availabilities::update_availability)
                .delete(handlers::availabilities::delete_availability),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Preços por hora dos professores
    let price_routes = Router::new()
        .route("/", post(handlers::prices::create_price))
        .route("/mine", get(handlers::prices::list_my_prices))
        .route("/{id}", delete(handlers::prices::delete_price))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Busca de professores compatíveis
    let matching_routes = Router::new()
        .route("/filter", post(handlers::matching::filter_teachers))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Reservas e pagamentos
    let payment_routes = Router::new()
        .route(
            "/",
            post(handlers::payments::create_payment).get(handlers::payments::list_payments),
        )
        .route("/quote", get(handlers::payments::quote_price))
        .route("/my-earnings", get(handlers::payments::my_earnings))
        .route("/{id}/receipt", get(handlers::payments::payment_receipt))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Repasses
    let payout_routes = Router::new()
        .route("/", get(handlers::payouts::list_payouts))
        .route("/{id}/mark-paid", post(handlers::payouts::mark_payout_paid))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Administração: totais da plataforma e configuração
    let admin_routes = Router::new()
        .route("/payments/summary", get(handlers::payments::admin_summary))
        .route("/payments/by-teacher", get(handlers::payments::admin_payouts_by_teacher))
        .route(
            "/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/catalog", catalog_routes)
        .nest("/api/availabilities", availability_routes)
        .nest("/api/prices", price_routes)
        .nest("/api/teachers", matching_routes)
        .nest("/api/payments", payment_routes)
        .nest("/api/payouts", payout_routes)
        .nest("/api/admin", admin_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
