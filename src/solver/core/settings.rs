use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Error type returned by settings validation
pub enum SettingsError {
    /// A field holds a value outside its legal range
    #[error("Bad value for field \"{0}\"")]
    BadFieldValue(&'static str),
    /// A field was changed that can only be set before the first solve
    #[error("Setting \"{0}\" cannot be changed after solver initialization")]
    ImmutableSetting(&'static str),
}
