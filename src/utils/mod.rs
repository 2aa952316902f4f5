pub mod feature_flags;
pub mod redact;
pub mod suggest;
pub mod text;
