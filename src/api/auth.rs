use super::helper;
use crate::auth::{self, JwtKeys};
use crate::errors::AppError;
use crate::model::user::{AuthResponse, NewUser, User, UserInfo};
use crate::payloads::auth::{LoginPayload, SignupPayload};
use crate::response::ApiResponse;
use crate::schema::users::dsl as users_dsl;
use axum::extract::State;
use axum::response::Json;
use chrono::Utc;
use deadpool_diesel::sqlite::Pool;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{info, instrument, warn};

/// Registers a new account and returns a session token for it.
///
/// Returns (wrapped in `ApiResponse`)
/// * `AuthResponse`: token plus the public user record (200 OK).
/// * `400 Bad Request`: If name, email or password is empty.
/// * `409 Conflict`: If the email is already registered.
#[instrument(skip(pool, jwt, payload))]
pub async fn signup(
    State(pool): State<Pool>,
    State(jwt): State<JwtKeys>,
    Json(payload): Json<SignupPayload>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(AppError::BadRequest(
            "Name, email, and password are required".to_string(),
        ));
    }

    let password_hash = auth::hash_password(&payload.password)?;
    let new_user = NewUser {
        name: payload.name.clone(),
        email: payload.email.clone(),
        password_hash,
        created_at: Utc::now().naive_utc(),
    };

    let insert_result = helper::run_query(&pool, move |conn_sync| {
        diesel::insert_into(users_dsl::users)
            .values(&new_user)
            .returning(crate::schema::users::id)
            .get_result::<i32>(conn_sync)
    })
    .await;

    let user_id = match insert_result {
        Ok(user_id) => user_id,
        Err(AppError::InternalServerError(err)) => {
            if let Some(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) =
                err.downcast_ref::<DieselError>()
            {
                warn!("Signup rejected, email already registered: {}", payload.email);
                return Err(AppError::Conflict("User already exists".to_string()));
            }
            return Err(AppError::InternalServerError(err));
        }
        Err(e) => return Err(e),
    };

    info!("Created user {} ({})", user_id, payload.email);
    let token = jwt.mint(user_id, &payload.email)?;
    Ok(ApiResponse::ok(AuthResponse {
        token,
        user: UserInfo {
            id: user_id,
            name: payload.name,
            email: payload.email,
        },
    }))
}

/// Exchanges credentials for a session token.
///
/// Returns (wrapped in `ApiResponse`)
/// * `AuthResponse`: token plus the public user record (200 OK).
/// * `401 Unauthorized`: For unknown email or wrong password; the message is
///   identical in both cases.
#[instrument(skip(pool, jwt, payload))]
pub async fn login(
    State(pool): State<Pool>,
    State(jwt): State<JwtKeys>,
    Json(payload): Json<LoginPayload>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let email = payload.email.clone();
    let user = helper::run_query(&pool, move |conn_sync| {
        users_dsl::users
            .filter(users_dsl::email.eq(email))
            .first::<User>(conn_sync)
            .optional()
    })
    .await?;

    let Some(user) = user else {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };

    if !auth::verify_password(&payload.password, &user.password_hash) {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    info!("User {} logged in", user.id);
    let token = jwt.mint(user.id, &user.email)?;
    let user_info = UserInfo::from(&user);
    Ok(ApiResponse::ok(AuthResponse {
        token,
        user: user_info,
    }))
}
