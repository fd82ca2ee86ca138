use thiserror::Error;

/// Errors from ticket verification, password hashing, and refresh-token
/// handling. Deliberately coarse: the Auth Gate (§4.2) only needs to know
/// whether to answer `UNAUTHORIZED`.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("ticket signature invalid or malformed")]
    InvalidTicket,
    #[error("ticket expired")]
    TicketExpired,
    #[error("user is not active")]
    UserInactive,
    #[error("password hash error: {0}")]
    Hash(String),
    #[error("refresh token invalid or expired")]
    InvalidRefreshToken,
}
