//! Password hashing using Argon2id
//!
//! Hashes are stored in PHC string format, so the cost parameters travel with
//! each hash and verification never depends on the current configuration.
//!
//! # Security
//!
//! - **Algorithm**: Argon2id, version 0x13
//! - **Default cost**: 64 MB memory, 3 passes, 4 lanes
//! - **Output**: 32-byte hash with a 16-byte random salt
//!
//! # Example
//!
//! ```
//! use taskvault_shared::auth::password::{hash_password_with, verify_password, HashParams};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let params = HashParams { memory_kib: 4096, iterations: 1, parallelism: 1 };
//! let hash = hash_password_with("Aa1!aaaa", &params)?;
//!
//! assert!(verify_password("Aa1!aaaa", &hash)?);
//! assert!(!verify_password("Aa1!aaab", &hash)?);
//! # Ok(())
//! # }
//! ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Characters accepted as the "special" class in [`validate_password_strength`]
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*";

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Number of passes
    pub iterations: u32,

    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

/// Hashes a password with the default cost parameters
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with(password, &HashParams::default())
}

/// Hashes a password with explicit cost parameters
///
/// Returns a PHC string such as:
///
/// ```text
/// $argon2id$v=19$m=65536,t=3,p=4$c2FsdHNhbHRzYWx0$hash...
/// ```
///
/// # Errors
///
/// Returns `PasswordError::HashError` if the parameters are out of range or
/// hashing fails.
pub fn hash_password_with(password: &str, params: &HashParams) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let argon_params = ParamsBuilder::new()
        .m_cost(params.memory_kib)
        .t_cost(params.iterations)
        .p_cost(params.parallelism)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, argon_params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored PHC hash
///
/// Returns `Ok(false)` for a wrong password. Only a malformed hash or an
/// internal failure is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    // Parameters are read from the hash itself
    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Validates password strength
///
/// A password must be at least 8 characters long and contain a lowercase
/// letter, an uppercase letter, a digit and one of `!@#$%^&*`.
///
/// # Example
///
/// ```
/// use taskvault_shared::auth::password::validate_password_strength;
///
/// assert!(validate_password_strength("Aa1!aaaa").is_ok());
/// assert!(validate_password_strength("Sh0rt!").is_err());
/// assert!(validate_password_strength("Password123").is_err());
/// ```
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit".to_string());
    }

    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        return Err(format!(
            "Password must contain at least one special character ({})",
            SPECIAL_CHARACTERS
        ));
    }

    Ok(())
}
