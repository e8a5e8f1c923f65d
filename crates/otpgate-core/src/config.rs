/// Trait for loading service configuration from environment variables.
///
/// Implementors derive `serde::Deserialize` and call `Config::from_env()`
/// once at startup. A `.env` file in the working directory, if present, is
/// loaded first; variables already set in the process environment win.
pub trait Config: Sized + serde::de::DeserializeOwned {
    /// Like [`Config::from_env`] but returns the error instead of panicking.
    fn try_from_env() -> Result<Self, envy::Error> {
        let _ = dotenvy::dotenv();
        envy::from_env()
    }

    /// # Panics
    ///
    /// Panics if any required env var is missing or cannot be deserialized.
    fn from_env() -> Self {
        Self::try_from_env().expect("failed to load config from environment")
    }
}
