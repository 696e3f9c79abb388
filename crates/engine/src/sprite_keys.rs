use thiserror::Error;

/// Sprite keys are `/`-separated lowercase segments such as `zombie/walk`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("sprite key must not be empty")]
    Empty,
    #[error("sprite key has an empty segment")]
    EmptySegment,
    #[error("sprite key segment '{0}' is reserved")]
    ReservedSegment(String),
    #[error("sprite key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

pub(crate) fn validate_sprite_key(key: &str) -> Result<(), SpriteKeyError> {
    if key.is_empty() {
        return Err(SpriteKeyError::Empty);
    }
    for segment in key.split('/') {
        if segment.is_empty() {
            return Err(SpriteKeyError::EmptySegment);
        }
        if segment == "." || segment == ".." {
            return Err(SpriteKeyError::ReservedSegment(segment.to_string()));
        }
        if let Some(character) = segment.chars().find(|ch| !is_key_char(*ch)) {
            return Err(SpriteKeyError::InvalidCharacter { character });
        }
    }
    Ok(())
}

fn is_key_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '-')
}

/// Key of one animation set of a sprite family, e.g. `armoured/attack`.
pub fn animation_key(family: &str, animation: &str) -> String {
    format!("{family}/{animation}")
}
