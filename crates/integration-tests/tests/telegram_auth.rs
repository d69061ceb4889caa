//! Mini-app authentication as both servers see it.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use chrono::Utc;
use snacklane_integration_tests::auth_header;
use snacklane_telegram::{InitDataError, init_data_from_header, verify_init_data};

const TOKEN: &str = "7000000001:AAF-integration-token";
const MAX_AGE: Duration = Duration::from_secs(86_400);

#[test]
fn test_signed_header_verifies() {
    let header = auth_header(7_123_456_789, "shop_owner", TOKEN);

    let init_data = verify_init_data(init_data_from_header(&header), TOKEN, MAX_AGE, Utc::now())
        .unwrap();

    assert_eq!(init_data.user.id.as_i64(), 7_123_456_789);
    assert_eq!(init_data.user.username.as_deref(), Some("shop_owner"));
}

#[test]
fn test_header_signed_by_another_bot_is_rejected() {
    let header = auth_header(42, "intruder", "7000000002:AAF-other-token");

    let err = verify_init_data(init_data_from_header(&header), TOKEN, MAX_AGE, Utc::now())
        .unwrap_err();
    assert!(matches!(err, InitDataError::InvalidSignature));
}

#[test]
fn test_stale_header_is_rejected() {
    let header = auth_header(42, "late", TOKEN);
    let later = Utc::now() + chrono::Duration::days(2);

    let err = verify_init_data(init_data_from_header(&header), TOKEN, MAX_AGE, later).unwrap_err();
    assert!(matches!(err, InitDataError::Expired { .. }));
}

#[test]
fn test_tampered_user_is_rejected() {
    let header = auth_header(42, "client", TOKEN);
    let tampered = header.replace("42", "43");

    assert!(
        verify_init_data(init_data_from_header(&tampered), TOKEN, MAX_AGE, Utc::now()).is_err()
    );
}
