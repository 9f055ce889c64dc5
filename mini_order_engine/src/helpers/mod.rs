mod ip_area;
mod password;
mod validation;
mod verification_code;

pub use ip_area::locate_ip;
pub use password::{hash_password, verify_password, PasswordError};
pub use validation::{normalize_email, validate_email, validate_password, MIN_PASSWORD_LENGTH};
pub use verification_code::{new_verification_code, CODE_LIFETIME_MINUTES};
