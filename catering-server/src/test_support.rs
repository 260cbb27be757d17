//! Shared fixtures for unit tests

use chrono::NaiveDate;
use shared::models::{Application, ApplicationStatus, ClientAccount, ClientCategory, StaffUser, StaffRole, Order};
use shared::order::{DeliveryType, LineItem, LineItemInput, OrderStatus, PaymentStatus};

pub fn sample_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

pub fn sample_order(id: &str, status: OrderStatus) -> Order {
    Order {
        id: id.to_string(),
        client_id: "client-1".to_string(),
        coordinator_id: Some("staff-1".to_string()),
        application_id: None,
        menu_items: vec![LineItem {
            id: "item-1".to_string(),
            name: "Paella".to_string(),
            unit_price: 15.50,
            quantity: 2,
            line_total: 31.00,
        }],
        items_total: 31.00,
        discount_fixed: 0.0,
        discount_percent: 0.0,
        discount_amount: 0.0,
        delivery_cost: 3.0,
        final_amount: 34.00,
        delivery_date: sample_date(),
        delivery_time: Some("12:30".to_string()),
        delivery_type: DeliveryType::Delivery,
        delivery_address: Some("Calle Mayor 1".to_string()),
        status,
        payment_status: PaymentStatus::None,
        payment_attempts: 0,
        gateway_order_id: None,
        payment_url: None,
        payment_created_at: None,
        payment_completed_at: None,
        status_comment: None,
        created_at: 1_700_000_000_000,
        updated_at: 1_700_000_000_000,
    }
}

pub fn sample_client(id: &str, email: &str, corporate: bool) -> ClientAccount {
    ClientAccount {
        id: id.to_string(),
        name: "Eva Ruiz".to_string(),
        email: email.trim().to_lowercase(),
        phone: Some("+34600111222".to_string()),
        category: if corporate {
            ClientCategory::Corporate
        } else {
            ClientCategory::Individual
        },
        password_hash: "$argon2id$test-hash".to_string(),
        temporary_password: false,
        created_at: 1_700_000_000_000,
    }
}

pub fn sample_staff(id: &str) -> StaffUser {
    StaffUser {
        id: id.to_string(),
        name: "Ana Coordinator".to_string(),
        role: StaffRole::Coordinator,
    }
}

pub fn sample_application(id: &str) -> Application {
    Application {
        id: id.to_string(),
        contact_name: "Eva Ruiz".to_string(),
        contact_email: "eva@example.com".to_string(),
        contact_phone: Some("+34600111222".to_string()),
        cart_items: vec![LineItemInput {
            id: "item-1".to_string(),
            name: "Canapes".to_string(),
            unit_price: 10.0,
            quantity: 2,
        }],
        event_date: sample_date(),
        event_time: Some("14:00".to_string()),
        event_address: Some("Calle Mayor 1".to_string()),
        status: ApplicationStatus::New,
        client_id: None,
        coordinator_id: None,
        processed_at: None,
        order_id: None,
        created_at: 1_700_000_000_000,
    }
}
