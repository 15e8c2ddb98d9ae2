use super::*;

#[test]
fn not_found_profile_error_shape() {
    let api = ApiError::not_found("User not found!");
    assert_eq!(api.status, axum::http::StatusCode::NOT_FOUND);
    assert_eq!(api.message, "User not found!");
}

#[test]
fn notification_count_serializes_as_bare_integer() {
    // The client expects a plain number body, not an object.
    let body = serde_json::to_string(&7i64).unwrap();
    assert_eq!(body, "7");
}
