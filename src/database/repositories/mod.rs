//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod benefit;
pub mod document;
pub mod partner;
pub mod payment;
pub mod user;

// Re-export repositories
pub use benefit::BenefitRepository;
pub use document::DocumentRepository;
pub use partner::PartnerRepository;
pub use payment::PaymentRepository;
pub use user::UserRepository;
