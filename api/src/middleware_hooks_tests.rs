//! Tests for the helpers the middleware uses to build a gate request
//!
//! These cover how Principal, Action and resource are extracted from a
//! request.

#[cfg(test)]
mod tests {
    use super::super::auth::*;
    use super::super::error::ApiError;
    use super::super::middleware_hooks::*;
    use authz::{Action, Role, Tier};
    use axum::http::{HeaderMap, HeaderValue, Method};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn test_extract_principal_full_headers() {
        let map = headers(&[
            (PRINCIPAL_ID_HEADER, "7"),
            (PRINCIPAL_ROLE_HEADER, "Teacher"),
            (PRINCIPAL_TIER_HEADER, "enterprise"),
            (PRINCIPAL_SCHOOL_HEADER, "5"),
        ]);

        let principal = extract_principal(&map).unwrap().unwrap();
        assert_eq!(principal.id, 7);
        assert_eq!(principal.role, Role::Teacher);
        assert_eq!(principal.tier, Tier::Enterprise);
        assert_eq!(principal.school_id, Some(5));
    }

    #[test]
    fn test_extract_principal_defaults_to_free_tier() {
        let map = headers(&[(PRINCIPAL_ID_HEADER, "40"), (PRINCIPAL_ROLE_HEADER, "student")]);
        let principal = extract_principal(&map).unwrap().unwrap();
        assert_eq!(principal.tier, Tier::Free);
        assert_eq!(principal.school_id, None);
    }

    #[test]
    fn test_extract_principal_anonymous() {
        assert!(extract_principal(&HeaderMap::new()).unwrap().is_none());
    }

    #[test]
    fn test_extract_principal_rejects_malformed_headers() {
        let cases = [
            headers(&[(PRINCIPAL_ID_HEADER, "abc"), (PRINCIPAL_ROLE_HEADER, "admin")]),
            headers(&[(PRINCIPAL_ID_HEADER, "1")]),
            headers(&[(PRINCIPAL_ID_HEADER, "1"), (PRINCIPAL_ROLE_HEADER, "owner")]),
            headers(&[
                (PRINCIPAL_ID_HEADER, "1"),
                (PRINCIPAL_ROLE_HEADER, "admin"),
                (PRINCIPAL_TIER_HEADER, "gold"),
            ]),
        ];
        for map in cases {
            assert!(matches!(
                extract_principal(&map),
                Err(ApiError::InvalidPrincipal(_))
            ));
        }
    }

    #[test]
    fn test_extract_action_from_method() {
        assert_eq!(extract_action_from_method(&Method::GET), Some(Action::Read));
        assert_eq!(extract_action_from_method(&Method::HEAD), Some(Action::Read));
        assert_eq!(extract_action_from_method(&Method::POST), None);
        assert_eq!(extract_action_from_method(&Method::DELETE), None);
        assert_eq!(extract_action_from_method(&Method::OPTIONS), None);
    }

    #[test]
    fn test_extract_resource_from_path() {
        assert_eq!(
            extract_resource_from_path("/api/v1/resources/team-members/60"),
            Some(("team-members".to_string(), "60".to_string()))
        );
        // Raw id is not validated here
        assert_eq!(
            extract_resource_from_path("/api/v1/resources/projects/abc"),
            Some(("projects".to_string(), "abc".to_string()))
        );
        assert_eq!(extract_resource_from_path("/api/v1/resources/projects"), None);
        assert_eq!(extract_resource_from_path("/api/v1/health"), None);
    }
}
