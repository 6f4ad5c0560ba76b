use crate::{
    auth::{LoginRequest, LoginResponse, RegisterRequest},
    error::AppError,
    models::PublicUser,
    services::AuthService,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Register a new user
///
/// Creates a non-admin account and returns its public fields.
/// A second registration with the same email is rejected with 400.
#[post("/register")]
pub async fn register(
    service: web::Data<AuthService>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let user = service.create_user(register_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(PublicUser::from(user)))
}

/// Login user
///
/// Checks the credentials and returns a signed bearer token.
#[post("/login")]
pub async fn login(
    service: web::Data<AuthService>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    match service
        .login_user(&login_data.email, &login_data.password)
        .await?
    {
        Some(token) => Ok(HttpResponse::Ok().json(LoginResponse {
            message: "user logged in successfully".into(),
            token,
        })),
        None => Err(AppError::Unauthorized("Invalid email or password".into())),
    }
}
