//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod benefit;
pub mod document;
pub mod pagination;
pub mod partner;
pub mod payment;
pub mod user;

// Re-export commonly used models
pub use benefit::{Benefit, CreateBenefitRequest, UpdateBenefitRequest};
pub use document::{CreateDocumentRequest, Document, DocumentStatus, UpdateDocumentStatusRequest};
pub use pagination::{Page, PageQuery};
pub use partner::{CreatePartnerRequest, Partner, UpdatePartnerRequest};
pub use payment::{CreatePaymentRequest, Payment, PaymentStatus, UpdatePaymentRequest};
pub use user::{
    AuthResponse, CreateUserRequest, LoginRequest, RegisterRequest, UpdateUserRequest, User,
    UserRole, UserStatus,
};
