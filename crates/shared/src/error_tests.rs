use super::*;
use rstest::rstest;

#[rstest]
#[case(AppError::Validation("test".into()), 400, "VALIDATION_ERROR")]
#[case(AppError::Conflict("test".into()), 409, "CONFLICT")]
#[case(AppError::Concurrency("test".into()), 409, "CONCURRENCY_CONFLICT")]
#[case(AppError::State("test".into()), 422, "INVALID_STATE")]
#[case(AppError::NotFound("test".into()), 404, "NOT_FOUND")]
#[case(AppError::Cancelled("test".into()), 503, "CANCELLED")]
#[case(AppError::Internal("test".into()), 500, "INTERNAL_ERROR")]
fn test_app_error_codes(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
    assert_eq!(err.status_code(), status);
    assert_eq!(err.error_code(), code);
}

#[test]
fn test_app_error_display() {
    assert_eq!(
        format!("{}", AppError::Validation("msg".into())),
        "Validation error: msg"
    );
    assert_eq!(format!("{}", AppError::Conflict("msg".into())), "Conflict: msg");
    assert_eq!(
        format!("{}", AppError::Concurrency("msg".into())),
        "Concurrent modification: msg"
    );
    assert_eq!(
        format!("{}", AppError::State("msg".into())),
        "Invalid state: msg"
    );
    assert_eq!(
        format!("{}", AppError::Internal("msg".into())),
        "Internal error: msg"
    );
}

#[test]
fn test_from_kind_round_trips_kind() {
    for kind in [
        ErrorKind::Validation,
        ErrorKind::Conflict,
        ErrorKind::Concurrency,
        ErrorKind::State,
        ErrorKind::NotFound,
        ErrorKind::Cancelled,
    ] {
        let err = AppError::from_kind(kind, "x");
        assert_eq!(err.kind(), Some(kind));
    }
    assert_eq!(AppError::Internal("x".into()).kind(), None);
}

#[test]
fn test_kind_display() {
    assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
    assert_eq!(ErrorKind::Concurrency.to_string(), "concurrency");
}
