use crate::{
    auth::{
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::verify_password,
    },
    config::Config,
    models::{Claims, LoginReqDto, TokenPair, TokenType},
    repo::user::UserRepo,
};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde_json::json;
use sqlx::{MySqlConnection, MySqlPool};
use tracing::{debug, error, info, instrument, warn};

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Signs a fresh access/refresh pair and records the refresh `jti`.
async fn issue_tokens(
    conn: &mut MySqlConnection,
    config: &Config,
    user_id: u64,
    username: &str,
    employee_id: Option<u64>,
) -> Result<TokenPair, HttpResponse> {
    let access_token = generate_access_token(
        user_id,
        username.to_owned(),
        employee_id,
        &config.jwt_secret,
        config.access_token_ttl,
    );
    let refresh = generate_refresh_token(
        user_id,
        username.to_owned(),
        employee_id,
        &config.jwt_secret,
        config.refresh_token_ttl,
    );
    let (access_token, (refresh_token, refresh_claims)) = match (access_token, refresh) {
        (Ok(a), Ok(r)) => (a, r),
        (Err(e), _) | (_, Err(e)) => {
            error!(error = %e, user_id, "Failed to sign tokens");
            return Err(HttpResponse::InternalServerError().finish());
        }
    };

    debug!(user_id, jti = %refresh_claims.jti, "Storing refresh token");
    if let Err(e) =
        UserRepo::store_refresh_token(conn, user_id, &refresh_claims.jti, refresh_claims.exp).await
    {
        error!(error = %e, "Failed to store refresh token");
        return Err(HttpResponse::InternalServerError().finish());
    }

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Exchange credentials for an access/refresh token pair
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Authenticated", body = TokenPair),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many requests")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return HttpResponse::BadRequest().json(json!({"error": "Username or password required"}));
    }

    let mut conn = match pool.acquire().await {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Could not acquire connection");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let db_user = match UserRepo::find_by_username(&mut conn, user.username.trim()).await {
        Ok(Some(u)) if u.is_active => {
            debug!(user_id = u.id, "User found");
            u
        }
        Ok(_) => {
            info!("Invalid credentials: unknown or inactive user");
            return HttpResponse::Unauthorized().json(json!({"error": "Invalid credentials"}));
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().json(json!({"error": "Invalid credentials"}));
    }

    let tokens = match issue_tokens(
        &mut conn,
        &config,
        db_user.id,
        &db_user.username,
        db_user.employee_id,
    )
    .await
    {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    if let Err(e) = UserRepo::touch_last_login(&mut conn, db_user.id).await {
        // not fatal for the login itself
        error!(error = %e, "Failed to update last_login_at");
    }

    info!(user_id = db_user.id, "Login successful");
    HttpResponse::Ok().json(tokens)
}

/// Rotate a refresh token: the presented one is revoked and a new pair issued
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Missing, invalid, revoked or non-refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let claims: Claims = match bearer(&req).map(|t| verify_token(t, &config.jwt_secret)) {
        Some(Ok(c)) if c.token_type == TokenType::Refresh => c,
        _ => return HttpResponse::Unauthorized().json(json!({"error": "Invalid refresh token"})),
    };

    let mut tx = match pool.begin().await {
        Ok(tx) => tx,
        Err(e) => {
            error!(error = %e, "Could not start transaction");
            return HttpResponse::InternalServerError().finish();
        }
    };

    match UserRepo::find_refresh_token_for_update(&mut tx, &claims.jti).await {
        Ok(Some(row)) if !row.revoked && row.user_id == claims.user_id => {}
        Ok(_) => {
            warn!(user_id = claims.user_id, jti = %claims.jti, "Refresh with unknown or revoked token");
            return HttpResponse::Unauthorized().json(json!({"error": "Invalid refresh token"}));
        }
        Err(e) => {
            error!(error = %e, "Database error while reading refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    }

    // Deactivated accounts cannot extend their session.
    match UserRepo::find_by_id(&mut tx, claims.user_id).await {
        Ok(Some(u)) if u.is_active => {}
        Ok(_) => return HttpResponse::Unauthorized().json(json!({"error": "Account disabled"})),
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return HttpResponse::InternalServerError().finish();
        }
    }

    if let Err(e) = UserRepo::revoke_refresh_token(&mut tx, &claims.jti).await {
        error!(error = %e, "Failed to revoke refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    let tokens = match issue_tokens(
        &mut tx,
        &config,
        claims.user_id,
        &claims.sub,
        claims.employee_id,
    )
    .await
    {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    if let Err(e) = tx.commit().await {
        error!(error = %e, "Failed to commit token rotation");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok().json(tokens)
}

/// Revoke a refresh token. Always answers 204.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Logged out")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let claims = match bearer(&req).map(|t| verify_token(t, &config.jwt_secret)) {
        Some(Ok(c)) if c.token_type == TokenType::Refresh => c,
        _ => return HttpResponse::NoContent().finish(),
    };

    let revoked = match pool.acquire().await {
        Ok(mut conn) => UserRepo::revoke_refresh_token(&mut conn, &claims.jti).await,
        Err(e) => Err(e),
    };
    if let Err(e) = revoked {
        error!(error = %e, "Failed to revoke refresh token on logout");
    }

    HttpResponse::NoContent().finish()
}
