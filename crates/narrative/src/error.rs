use foundation::ids::ChapterId;

/// A map renderer call failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    NotFound(String),
    Rejected(String),
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::NotFound(what) => write!(f, "map object not found: {what}"),
            MapError::Rejected(msg) => write!(f, "map rejected call: {msg}"),
        }
    }
}

impl std::error::Error for MapError {}

/// A visual-effect controller could not be built or could not run a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    MissingFactory(ChapterId),
    UnknownTrigger(String),
    Map(MapError),
    Script(String),
}

impl std::fmt::Display for EffectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EffectError::MissingFactory(family) => {
                write!(f, "no controller factory registered for {family}")
            }
            EffectError::UnknownTrigger(name) => write!(f, "controller has no trigger {name:?}"),
            EffectError::Map(err) => write!(f, "{err}"),
            EffectError::Script(msg) => write!(f, "effect script failed: {msg}"),
        }
    }
}

impl std::error::Error for EffectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EffectError::Map(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MapError> for EffectError {
    fn from(err: MapError) -> Self {
        EffectError::Map(err)
    }
}
