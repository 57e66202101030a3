/// User-facing text for an HTTP status returned by the optimization service.
///
/// Codes outside the table get no message.
pub fn error_message(status: u16) -> Option<&'static str> {
    let message = match status {
        400 => "The request was rejected as invalid. Check the selected options and try again.",
        401 => "You are not signed in. Please sign in and try again.",
        403 => "You do not have permission to octomize this model.",
        404 => "The requested action is not available for this model.",
        408 => "The request timed out. Please try again.",
        422 => "Some of the selected options are not supported for this hardware target.",
        429 => "Too many requests. Please wait a moment before trying again.",
        500 => "Something went wrong on our side. Please try again later.",
        502 => "The optimization service is unreachable. Please try again later.",
        503 => "The optimization service is temporarily unavailable. Please try again later.",
        504 => "The optimization service took too long to respond. Please try again later.",
        _ => return None,
    };
    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_have_messages() {
        for status in [400, 401, 403, 404, 408, 422, 429, 500, 502, 503, 504] {
            assert!(error_message(status).is_some(), "missing message for {status}");
        }
    }

    #[test]
    fn test_unknown_codes_have_no_message() {
        assert_eq!(error_message(200), None);
        assert_eq!(error_message(418), None);
        assert_eq!(error_message(599), None);
    }
}
