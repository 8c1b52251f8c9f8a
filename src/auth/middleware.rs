use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::models::{Claims, TokenType};
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::{Value, json};

/// Claims of a valid bearer access token, or the 401 body explaining why
/// there are none.
fn access_claims(req: &ServiceRequest, secret: &str) -> Result<Claims, Value> {
    let header_value = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| json!({"error": "Missing Authorization header"}))?
        .to_str()
        .map_err(|_| json!({"error": "Invalid Authorization header encoding"}))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| json!({"error": "Authorization header must start with Bearer"}))?;

    let claims = verify_token(token, secret)
        .map_err(|e| json!({"error": "Invalid or expired token", "details": e}))?;

    if claims.token_type != TokenType::Access {
        return Err(json!({"error": "Access token required"}));
    }
    Ok(claims)
}

/// Requires a valid access token and stores the caller as [`AuthUser`] in
/// the request extensions.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let secret = req
        .app_data::<Data<Config>>()
        .map(|config| config.jwt_secret.clone())
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    match access_claims(&req, &secret) {
        Ok(claims) => {
            req.extensions_mut().insert(AuthUser::from(claims));
            next.call(req).await
        }
        Err(body) => {
            let resp = HttpResponse::Unauthorized().json(body);
            Ok(req.into_response(resp.map_into_boxed_body()))
        }
    }
}
