//! Database integration tests
//!
//! Run the repositories and services against a real PostgreSQL. Each test
//! starts from empty tables and is skipped when no database is available.

mod helpers;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use serial_test::serial;

use ascesa::models::benefit::CreateBenefitRequest;
use ascesa::models::document::DocumentStatus;
use ascesa::models::pagination::PageQuery;
use ascesa::models::partner::CreatePartnerRequest;
use ascesa::models::payment::{CreatePaymentRequest, PaymentStatus, UpdatePaymentRequest};
use ascesa::models::user::{LoginRequest, RegisterRequest, UpdateUserRequest, UserRole, UserStatus};
use ascesa::services::{AuthContext, DocumentUpload};
use ascesa::AscesaError;
use helpers::*;

fn registration(email: &str, cpf: &str) -> RegisterRequest {
    RegisterRequest {
        name: "Maria da Silva".to_string(),
        email: email.to_string(),
        cpf: cpf.to_string(),
        phone: Some("(61) 98765-4321".to_string()),
        password: "s3nha-forte".to_string(),
    }
}

fn pdf(name: &str) -> DocumentUpload {
    DocumentUpload {
        title: Some("Comprovante".to_string()),
        file_name: name.to_string(),
        mime_type: "application/pdf".to_string(),
        bytes: b"%PDF-1.4 test".to_vec(),
    }
}

fn member(user_id: i64) -> AuthContext {
    AuthContext {
        user_id,
        role: UserRole::Member,
    }
}

fn admin() -> AuthContext {
    AuthContext {
        user_id: 0,
        role: UserRole::Admin,
    }
}

fn charge(user_id: i64, due_in_days: i64) -> CreatePaymentRequest {
    CreatePaymentRequest {
        user_id,
        amount_cents: 5000,
        description: Some("Mensalidade".to_string()),
        due_date: (Utc::now() + Duration::days(due_in_days)).date_naive(),
        method: None,
    }
}

#[tokio::test]
#[serial]
async fn test_register_login_and_inactive_account() {
    let Some(db) = TestDatabase::start().await else { return };
    let users = &db.services.user_service;
    let auth = &db.services.auth_service;

    let user = users
        .register(registration(" Maria@ASCESA.org.br ", "529.982.247-25"))
        .await
        .unwrap();
    assert_eq!(user.email, "maria@ascesa.org.br");
    assert_eq!(user.cpf, "52998224725");
    assert_eq!(user.status, UserStatus::Pending);
    assert_eq!(user.role, UserRole::Member);

    let login = |email: &str, password: &str| LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    };

    let response = auth.login(login("MARIA@ascesa.org.br", "s3nha-forte")).await.unwrap();
    assert_eq!(auth.verify_token(&response.access_token).unwrap().sub, user.id);

    assert_matches!(
        auth.login(login("maria@ascesa.org.br", "senha-errada")).await,
        Err(AscesaError::Authentication(_))
    );
    assert_matches!(
        auth.login(login("ninguem@ascesa.org.br", "s3nha-forte")).await,
        Err(AscesaError::Authentication(_))
    );

    let request = UpdateUserRequest {
        status: Some(UserStatus::Inactive),
        ..Default::default()
    };
    users.update_user(user.id, request, true).await.unwrap();
    assert_matches!(
        auth.login(login("maria@ascesa.org.br", "s3nha-forte")).await,
        Err(AscesaError::PermissionDenied(_))
    );
}

#[tokio::test]
#[serial]
async fn test_duplicate_email_and_cpf_conflict() {
    let Some(db) = TestDatabase::start().await else { return };
    let users = &db.services.user_service;

    users
        .register(registration("maria@ascesa.org.br", "529.982.247-25"))
        .await
        .unwrap();

    assert_matches!(
        users.register(registration("MARIA@ascesa.org.br", &valid_cpf(123_456_789))).await,
        Err(AscesaError::Conflict(msg)) if msg == "Email already registered"
    );
    assert_matches!(
        users.register(registration("joao@ascesa.org.br", "52998224725")).await,
        Err(AscesaError::Conflict(msg)) if msg == "CPF already registered"
    );

    // The unique constraint itself surfaces as a conflict too
    let other = db.create_user("joao@ascesa.org.br", 987_654_321).await;
    let request = UpdateUserRequest {
        email: Some("maria@ascesa.org.br".to_string()),
        ..Default::default()
    };
    assert_matches!(
        users.update_user(other.id, request, false).await,
        Err(AscesaError::Conflict(msg)) if msg.contains("users_email_key")
    );
}

#[tokio::test]
#[serial]
async fn test_user_update_only_touches_given_fields() {
    let Some(db) = TestDatabase::start().await else { return };
    let users = &db.services.user_service;
    let user = db.create_user("maria@ascesa.org.br", 529_982_247).await;

    let request = UpdateUserRequest {
        name: Some("  Maria   Souza ".to_string()),
        ..Default::default()
    };
    let updated = users.update_user(user.id, request, false).await.unwrap();
    assert_eq!(updated.name, "Maria Souza");
    assert_eq!(updated.email, user.email);
    assert_eq!(updated.cpf, user.cpf);
    assert_eq!(updated.role, user.role);
    assert_eq!(updated.status, user.status);

    let new_cpf = valid_cpf(111_222_333);
    let request = UpdateUserRequest {
        cpf: Some(ascesa::format_cpf(&new_cpf)),
        ..Default::default()
    };
    let updated = users.update_user(user.id, request, true).await.unwrap();
    assert_eq!(updated.cpf, new_cpf);
    assert_eq!(updated.name, "Maria Souza");

    // Re-saving the user's own CPF is not a conflict
    let request = UpdateUserRequest {
        cpf: Some(new_cpf.clone()),
        ..Default::default()
    };
    assert!(users.update_user(user.id, request, true).await.is_ok());

    let other = db.create_user("joao@ascesa.org.br", 987_654_321).await;
    let request = UpdateUserRequest {
        cpf: Some(new_cpf),
        ..Default::default()
    };
    assert_matches!(
        users.update_user(other.id, request, true).await,
        Err(AscesaError::Conflict(_))
    );

    assert_matches!(
        users.update_user(9999, UpdateUserRequest::default(), true).await,
        Err(AscesaError::NotFound(_))
    );
}

#[tokio::test]
#[serial]
async fn test_documents_are_scoped_to_their_owner() {
    let Some(db) = TestDatabase::start().await else { return };
    let documents = &db.services.document_service;
    let maria = db.create_user("maria@ascesa.org.br", 529_982_247).await;
    let joao = db.create_user("joao@ascesa.org.br", 987_654_321).await;

    let rg = documents.upload(maria.id, pdf("rg.pdf")).await.unwrap();
    documents.upload(maria.id, pdf("cpf.pdf")).await.unwrap();
    documents.upload(joao.id, pdf("rg.pdf")).await.unwrap();
    assert_eq!(db.stored_file_count(), 3);

    let page = documents.list(&PageQuery::default(), &member(maria.id)).await.unwrap();
    assert_eq!(page.total, 2);
    assert!(page.data.iter().all(|d| d.user_id == maria.id));

    let page = documents.list(&PageQuery::default(), &admin()).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.data.len(), 3);

    assert_matches!(
        documents.get(rg.id, &member(joao.id)).await,
        Err(AscesaError::PermissionDenied(_))
    );
    let (_, bytes) = documents.download(rg.id, &member(maria.id)).await.unwrap();
    assert_eq!(bytes, b"%PDF-1.4 test");
}

#[tokio::test]
#[serial]
async fn test_reviewed_document_delete_rules() {
    let Some(db) = TestDatabase::start().await else { return };
    let documents = &db.services.document_service;
    let maria = db.create_user("maria@ascesa.org.br", 529_982_247).await;

    let document = documents.upload(maria.id, pdf("rg.pdf")).await.unwrap();
    let reviewed = documents.set_status(document.id, DocumentStatus::Approved).await.unwrap();
    assert_eq!(reviewed.status, DocumentStatus::Approved);

    assert_matches!(
        documents.delete(document.id, &member(maria.id)).await,
        Err(AscesaError::PermissionDenied(_))
    );
    documents.delete(document.id, &admin()).await.unwrap();
    assert_eq!(db.stored_file_count(), 0);
    assert_matches!(
        documents.delete(document.id, &admin()).await,
        Err(AscesaError::NotFound(_))
    );
}

#[tokio::test]
#[serial]
async fn test_document_delete_succeeds_when_file_cannot_be_removed() {
    let Some(db) = TestDatabase::start().await else { return };
    let documents = &db.services.document_service;
    let maria = db.create_user("maria@ascesa.org.br", 529_982_247).await;

    let document = documents.upload(maria.id, pdf("rg.pdf")).await.unwrap();

    // Put a non-empty directory where the file was so removal fails
    let path = db.upload_dir.path().join(&document.stored_name);
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();
    std::fs::write(path.join("keep"), b"x").unwrap();

    documents.delete(document.id, &member(maria.id)).await.unwrap();
    assert_eq!(db.count_records("documents").await, 0);
}

#[tokio::test]
#[serial]
async fn test_deleting_user_removes_their_files() {
    let Some(db) = TestDatabase::start().await else { return };
    let maria = db.create_user("maria@ascesa.org.br", 529_982_247).await;
    let joao = db.create_user("joao@ascesa.org.br", 987_654_321).await;

    let documents = &db.services.document_service;
    documents.upload(maria.id, pdf("rg.pdf")).await.unwrap();
    documents.upload(maria.id, pdf("cpf.pdf")).await.unwrap();
    let kept = documents.upload(joao.id, pdf("rg.pdf")).await.unwrap();
    db.services.payment_service.create(charge(maria.id, 10)).await.unwrap();
    db.services.payment_service.create(charge(joao.id, 10)).await.unwrap();

    db.services.user_service.delete_user(maria.id).await.unwrap();

    assert_eq!(db.stored_file_count(), 1);
    assert!(db.upload_dir.path().join(&kept.stored_name).exists());
    assert_eq!(db.count_records("documents").await, 1);
    assert_eq!(db.count_records("payments").await, 1);
    assert_matches!(
        db.services.user_service.delete_user(maria.id).await,
        Err(AscesaError::NotFound(_))
    );
}

#[tokio::test]
#[serial]
async fn test_payment_updates_and_overdue_sweep() {
    let Some(db) = TestDatabase::start().await else { return };
    let payments = &db.services.payment_service;
    let maria = db.create_user("maria@ascesa.org.br", 529_982_247).await;
    let joao = db.create_user("joao@ascesa.org.br", 987_654_321).await;

    let late = payments.create(charge(maria.id, -2)).await.unwrap();
    let upcoming = payments.create(charge(maria.id, 2)).await.unwrap();
    let settled = payments.create(charge(joao.id, -2)).await.unwrap();

    let paid = payments
        .update(
            settled.id,
            UpdatePaymentRequest {
                status: Some(PaymentStatus::Paid),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(paid.status, PaymentStatus::Paid);
    assert!(paid.paid_at.is_some());
    assert_eq!(paid.amount_cents, settled.amount_cents);
    assert_eq!(paid.description, settled.description);

    assert_eq!(payments.mark_overdue().await.unwrap(), 1);
    assert_eq!(payments.get(late.id, &admin()).await.unwrap().status, PaymentStatus::Overdue);
    assert_eq!(payments.get(upcoming.id, &admin()).await.unwrap().status, PaymentStatus::Pending);
    assert_eq!(payments.get(settled.id, &admin()).await.unwrap().status, PaymentStatus::Paid);
    assert_eq!(payments.mark_overdue().await.unwrap(), 0);

    let page = payments.list(&PageQuery::default(), &member(maria.id)).await.unwrap();
    assert_eq!(page.total, 2);
    assert_matches!(
        payments.get(settled.id, &member(maria.id)).await,
        Err(AscesaError::PermissionDenied(_))
    );

    assert_matches!(
        payments.create(charge(9999, 5)).await,
        Err(AscesaError::InvalidInput(_))
    );
}

#[tokio::test]
#[serial]
async fn test_catalog_active_filter_and_partner_removal() {
    let Some(db) = TestDatabase::start().await else { return };
    let partners = &db.database.partners;
    let benefits = &db.database.benefits;

    let clinic = partners
        .create(CreatePartnerRequest {
            name: "Clínica Vida".to_string(),
            description: None,
            category: Some("Saúde".to_string()),
            website: None,
            logo_url: None,
            is_active: None,
        })
        .await
        .unwrap();

    let benefit = |title: &str, partner_id: Option<i64>, is_active: bool| CreateBenefitRequest {
        partner_id,
        title: title.to_string(),
        description: None,
        category: None,
        discount: Some("10%".to_string()),
        is_active: Some(is_active),
    };
    let consult = benefits.create(benefit("Consulta", Some(clinic.id), true)).await.unwrap();
    benefits.create(benefit("Exames", Some(clinic.id), false)).await.unwrap();

    assert_eq!(benefits.count(false).await.unwrap(), 1);
    assert_eq!(benefits.count(true).await.unwrap(), 2);
    let active = benefits.list(false, 10, 0).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, consult.id);
    assert_eq!(benefits.find_by_partner(clinic.id).await.unwrap().len(), 1);

    assert!(partners.delete(clinic.id).await.unwrap());
    let orphan = benefits.find_by_id(consult.id).await.unwrap().unwrap();
    assert_eq!(orphan.partner_id, None);
}
