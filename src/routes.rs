use crate::{
    api::{approval, attendance, policy},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

/// Per-route limiter allowing `requests_per_min` with an equal burst.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond((60_000 / u64::from(requests_per_min)).max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst are both non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .configure(protected),
    );
}

/// Routes behind the bearer-token middleware, relative to the API prefix.
pub fn protected(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/attendance")
            .service(web::resource("/clock-in").route(web::post().to(attendance::clock_in)))
            .service(web::resource("/clock-out").route(web::post().to(attendance::clock_out)))
            .service(web::resource("/manual").route(web::put().to(attendance::manual_entry)))
            .service(web::resource("/status").route(web::get().to(attendance::status)))
            .service(
                web::resource("/mark-present").route(web::post().to(attendance::mark_present)),
            ),
    )
    .service(
        web::scope("/approvals")
            // /approvals
            .service(
                web::resource("")
                    .route(web::post().to(approval::create_request))
                    .route(web::get().to(approval::list_requests)),
            )
            // registered before /{id} so "summary" is not read as an id
            .service(web::resource("/summary").route(web::get().to(approval::summary)))
            .service(web::resource("/{id}").route(web::get().to(approval::get_request)))
            .service(
                web::resource("/{id}/capabilities").route(web::get().to(approval::capabilities)),
            )
            .service(
                web::resource("/{id}/supervisor/approve")
                    .route(web::put().to(approval::supervisor_approve)),
            )
            .service(
                web::resource("/{id}/supervisor/reject")
                    .route(web::put().to(approval::supervisor_reject)),
            )
            .service(
                web::resource("/{id}/hr/approve").route(web::put().to(approval::hr_approve)),
            )
            .service(web::resource("/{id}/hr/reject").route(web::put().to(approval::hr_reject))),
    )
    .service(
        web::scope("/policy")
            .service(
                web::resource("")
                    .route(web::get().to(policy::current_policy))
                    .route(web::post().to(policy::create_policy)),
            )
            .service(
                web::resource("/{id}/activate").route(web::put().to(policy::activate_policy)),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns new access_token + rotated refresh_token
