//! Secret stores for trigger environments.
//!
//! Every backend keeps values sealed with AES-256-GCM. The cipher is shared
//! with the Postgres store in `hookrun-db`.

pub mod cipher;
pub mod file;
pub mod native;

pub use cipher::SecretCipher;
pub use file::FileSecretStore;
pub use native::NativeSecretStore;
