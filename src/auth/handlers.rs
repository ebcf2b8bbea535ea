use crate::{
    auth::{
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
    },
    config::Config,
    model::role::Role,
    models::{LoginReqDto, RegisterReq, TokenType, UserSql},
};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::utils::email_cache;
use crate::utils::email_filter;

// auth end points

/// Very light shape check; real deliverability is not this service's problem.
fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}

/// Inserts a new user row and keeps the email filter/cache in sync.
async fn insert_user(
    id: &str,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
    pool: &SqlitePool,
) -> Result<(), HttpResponse> {
    let hashed = match hash_password(password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Password hashing failed");
            return Err(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to register user"
            })));
        }
    };

    let result = sqlx::query(
        r#"INSERT INTO users (id, name, email, password, role) VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .bind(&hashed)
    .bind(role.as_str())
    .execute(pool)
    .await;

    match result {
        Ok(_) => {
            // keep the fast-path structures consistent with the table
            email_filter::insert(email);
            email_cache::mark_taken(email).await;
            Ok(())
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                // 2067 = SQLITE_CONSTRAINT_UNIQUE
                if db_err.code() == Some("2067".into()) {
                    return Err(HttpResponse::Conflict().json(json!({
                        "error": "Email already taken"
                    })));
                }
            }

            error!(error = %e, "Failed to insert user");
            Err(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to register user"
            })))
        }
    }
}

/// true  => email AVAILABLE
/// false => email TAKEN
pub async fn is_email_available(email: &str, pool: &SqlitePool) -> bool {
    let email = email.to_lowercase();

    // 1️⃣ Cuckoo filter — fast negative
    if !email_filter::might_exist(&email) {
        return true;
    }

    // 2️⃣ Moka cache — fast positive
    if email_cache::is_taken(&email).await {
        return false;
    }

    // 3️⃣ Database fallback
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)",
    )
    .bind(&email)
    .fetch_one(pool)
    .await
    .unwrap_or(true); // fail-safe

    !exists
}

/// User registration handler
pub async fn register(user: web::Json<RegisterReq>, pool: web::Data<SqlitePool>) -> impl Responder {
    let name = user.name.trim();
    let email = user.email.trim().to_lowercase();

    if name.chars().count() < 2 {
        return HttpResponse::BadRequest().json(json!({
            "error": "Name is too short"
        }));
    }

    if !looks_like_email(&email) {
        return HttpResponse::BadRequest().json(json!({
            "error": "Invalid email address"
        }));
    }

    if user.password.chars().count() < 8 {
        return HttpResponse::BadRequest().json(json!({
            "error": "Password must be at least 8 characters long"
        }));
    }

    let role = match user.role.as_deref() {
        None => Role::Staff,
        Some(role_name) => match Role::from_name(role_name) {
            Some(r) => r,
            None => {
                return HttpResponse::BadRequest().json(json!({
                    "error": "Role must be Admin or Staff"
                }));
            }
        },
    };

    if !is_email_available(&email, pool.get_ref()).await {
        return HttpResponse::Conflict().json(json!({
            "error": "Email already taken"
        }));
    }

    let id = format!("u_{}", Uuid::new_v4().to_simple());

    // Safe to insert after DB check
    match insert_user(&id, name, &email, &user.password, role, pool.get_ref()).await {
        Ok(_) => HttpResponse::Created().json(json!({
            "id": id,
            "name": name,
            "email": email,
            "role": role.as_str()
        })),
        Err(err_resp) => err_resp,
    }
}

#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    if user.email.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty email or password");
        return HttpResponse::BadRequest().body("Email or password required");
    }

    debug!("Fetching user from database");

    let db_user = match sqlx::query_as::<_, UserSql>(
        r#"
        SELECT id, name, email, password, role
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(user.email.trim().to_lowercase())
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(Some(user)) => {
            debug!(user_id = %user.id, "User found");
            user
        }
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return HttpResponse::Unauthorized().body("Invalid credentials");
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().body("Invalid credentials");
    }

    debug!("Password verified");

    let access_token = generate_access_token(
        &db_user.id,
        &db_user.email,
        &db_user.role,
        &config.jwt_secret,
        config.access_token_ttl,
    );

    let (refresh_token, refresh_claims) = generate_refresh_token(
        &db_user.id,
        &db_user.email,
        &db_user.role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    );

    debug!(
        user_id = %db_user.id,
        jti = %refresh_claims.jti,
        "Storing refresh token"
    );

    if let Err(e) = store_refresh_token(pool.get_ref(), &db_user.id, &refresh_claims).await {
        error!(error = %e, "Failed to store refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    // last_login_at feeds the email cache warmup; failing it must not fail login
    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = datetime('now') WHERE id = ?")
        .bind(&db_user.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!("Login successful");

    HttpResponse::Ok().json(json!({
        "access_token": access_token,
        "refresh_token": refresh_token,
        "user": {
            "id": db_user.id,
            "name": db_user.name,
            "role": db_user.role
        }
    }))
}

async fn store_refresh_token(
    pool: &SqlitePool,
    user_id: &str,
    claims: &crate::models::Claims,
) -> Result<(), sqlx::Error> {
    let expires_at = chrono::DateTime::from_timestamp(claims.exp as i64, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(&claims.jti)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> impl Responder {
    let header = match req.headers().get("Authorization") {
        Some(h) => h.to_str().unwrap_or(""),
        None => return HttpResponse::Unauthorized().body("No token"),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return HttpResponse::Unauthorized().body("Invalid token"),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::Unauthorized().finish(),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::Unauthorized().finish();
    }

    let record = match sqlx::query_as::<_, (i64, String, bool)>(
        r#"
        SELECT id, user_id, revoked
        FROM refresh_tokens
        WHERE jti = ?
        "#,
    )
    .bind(&claims.jti)
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "Failed to look up refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let (record_id, user_id) = match record {
        Some((id, user_id, revoked)) if !revoked => (id, user_id),
        _ => return HttpResponse::Unauthorized().finish(),
    };

    // rotate: revoke the old refresh token before issuing a new one
    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE id = ?")
        .bind(record_id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    let (new_refresh_token, new_claims) = generate_refresh_token(
        &claims.user_id,
        &claims.sub,
        &claims.role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    );

    if let Err(e) = store_refresh_token(pool.get_ref(), &user_id, &new_claims).await {
        error!(error = %e, "Failed to store rotated refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    let access_token = generate_access_token(
        &claims.user_id,
        &claims.sub,
        &claims.role,
        &config.jwt_secret,
        config.access_token_ttl,
    );

    HttpResponse::Ok().json(json!({
        "access_token": access_token,
        "refresh_token": new_refresh_token
    }))
}

pub async fn logout(
    req: HttpRequest,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> impl Responder {
    let header = match req.headers().get("Authorization") {
        Some(h) => h.to_str().unwrap_or(""),
        None => return HttpResponse::NoContent().finish(),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return HttpResponse::NoContent().finish(),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::NoContent().finish(),
    };

    // only refresh tokens can logout
    if claims.token_type != TokenType::Refresh {
        return HttpResponse::NoContent().finish();
    }

    // revoke refresh token (idempotent)
    let _ = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = 1
        WHERE jti = ?
        "#,
    )
    .bind(&claims.jti)
    .execute(pool.get_ref())
    .await;

    // success (even if token didn't exist)
    HttpResponse::NoContent().finish()
}
