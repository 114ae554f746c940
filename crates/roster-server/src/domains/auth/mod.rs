pub mod passwords;

pub use passwords::Argon2CredentialHasher;
