// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Availabilities ---
        handlers::availabilities::create_availability,
        handlers::availabilities::update_availability,
        handlers::availabilities::delete_availability,
        handlers::availabilities::list_my_availabilities,
        handlers::availabilities::bulk_create_availabilities,
        handlers::availabilities::bulk_delete_availabilities,

        // --- Payments ---
        handlers::payments::create_payment,
        handlers::payments::list_payments,
        handlers::payments::quote_price,
        handlers::payments::my_earnings,
        handlers::payments::payment_receipt,
        handlers::payments::admin_summary,
        handlers::payments::admin_payouts_by_teacher,

        // --- Payouts ---
        handlers::payouts::list_payouts,
        handlers::payouts::mark_payout_paid,
    ),
    components(
        schemas(
            // --- Availabilities ---
            models::availability::Availability,
            models::availability::AvailabilityWithTags,
            handlers::availabilities::AvailabilityPayload,
            handlers::availabilities::HourPickPayload,
            handlers::availabilities::BulkCreatePayload,
            handlers::availabilities::BulkDeletePayload,
            services::availability_service::BulkCreateResult,
            services::availability_service::BulkSlotError,
            services::availability_service::BulkDeleteResult,
            services::availability_service::BlockedDeletion,

            // --- Payments ---
            models::payment::PaymentStatus,
            models::payment::PaymentMethod,
            models::payment::Payment,
            models::payment::EarningsSummary,
            models::payment::AdminPaymentsSummary,
            models::payment::PendingPayoutByTeacher,
            models::payment::TeacherPayoutSummary,
            models::pricing::PriceQuote,
            handlers::payments::CreatePaymentPayload,

            // --- Payouts ---
            models::payment::PayoutStatus,
            models::payment::Payout,
            handlers::payouts::MarkPaidPayload,
        )
    ),
    tags(
        (name = "Availabilities", description = "Horários publicados pelos professores"),
        (name = "Payments", description = "Reservas, pagamentos e orçamentos"),
        (name = "Payouts", description = "Repasses aos professores")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
