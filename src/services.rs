pub mod auth;
pub mod availability_service;
pub mod booking_service;
pub mod document_service;
pub mod matching_service;
pub mod payout_service;
pub mod pricing_service;
