//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use safepoint_core::authorization::RequesterClaim;

/// Header carrying the asserted account id.
pub const REQUESTER_ID_HEADER: &str = "x-requester-id";
/// Header carrying the asserted identity class.
pub const REQUESTER_ROLE_HEADER: &str = "x-requester-role";

/// Requester identity extractor.
///
/// Reads the asserted `{id, role}` pair from the request headers. The pair
/// is an unverified assertion; every service exchanges it for a live record
/// before acting on it. Missing or malformed headers reject with 401.
#[derive(Debug, Clone)]
pub struct Requester(pub RequesterClaim);

impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(REQUESTER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or((StatusCode::UNAUTHORIZED, "Missing requester id"))?;

        let role = parts
            .headers
            .get(REQUESTER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "Missing requester role"))?
            .parse()
            .map_err(|_| (StatusCode::UNAUTHORIZED, "Unknown requester role"))?;

        Ok(Self(RequesterClaim {
            id: id.to_string(),
            role,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;
    use safepoint_core::authorization::Role;

    async fn extract(req: Request<()>) -> Result<Requester, (StatusCode, &'static str)> {
        let (mut parts, ()) = req.into_parts();
        Requester::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_extracts_valid_headers() {
        let req = Request::builder()
            .header(REQUESTER_ID_HEADER, "rep1")
            .header(REQUESTER_ROLE_HEADER, "reporter")
            .body(())
            .unwrap();

        let Requester(claim) = extract(req).await.unwrap();
        assert_eq!(claim.id, "rep1");
        assert_eq!(claim.role, Role::Reporter);
    }

    #[tokio::test]
    async fn test_missing_id_is_unauthorized() {
        let req = Request::builder()
            .header(REQUESTER_ROLE_HEADER, "admin")
            .body(())
            .unwrap();

        let err = extract(req).await.unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_role_is_unauthorized() {
        let req = Request::builder()
            .header(REQUESTER_ID_HEADER, "rep1")
            .header(REQUESTER_ROLE_HEADER, "overlord")
            .body(())
            .unwrap();

        let err = extract(req).await.unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);
    }
}
