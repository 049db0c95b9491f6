use crate::core::bounds::Quadrant;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quadtree address of a tile: one digit `0..=3` per level, root first.
///
/// The length of the key is the node's level, which is also what the
/// Bing Maps tile system calls a quadkey.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuadKey(String);

impl QuadKey {
    /// Key of one of the four level-1 roots.
    pub fn root(quadrant: Quadrant) -> Self {
        Self(quadrant.digit().to_string())
    }

    pub fn parse(key: &str) -> Result<Self> {
        if key.is_empty() {
            return Err(MapError::InvalidQuadKey(key.to_string()));
        }
        if key.chars().any(|c| Quadrant::from_digit(c).is_none()) {
            return Err(MapError::InvalidQuadKey(key.to_string()));
        }
        Ok(Self(key.to_string()))
    }

    /// Key of the child lying in `quadrant`.
    pub fn child(&self, quadrant: Quadrant) -> Self {
        let mut key = String::with_capacity(self.0.len() + 1);
        key.push_str(&self.0);
        key.push(quadrant.digit());
        Self(key)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.len() <= 1 {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_string()))
        }
    }

    /// Quadrant of this key within its parent.
    pub fn quadrant(&self) -> Option<Quadrant> {
        self.0.chars().last().and_then(Quadrant::from_digit)
    }

    pub fn level(&self) -> u8 {
        self.0.len() as u8
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for QuadKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_appends_digit() {
        let root = QuadKey::root(Quadrant::SouthWest);
        assert_eq!(root.as_str(), "2");
        assert_eq!(root.level(), 1);

        let child = root.child(Quadrant::NorthEast);
        assert_eq!(child.as_str(), "21");
        assert_eq!(child.level(), 2);
        assert_eq!(child.quadrant(), Some(Quadrant::NorthEast));
        assert_eq!(child.parent(), Some(root));
    }

    #[test]
    fn test_root_has_no_parent() {
        assert_eq!(QuadKey::root(Quadrant::NorthWest).parent(), None);
    }

    #[test]
    fn test_parse_rejects_bad_digits() {
        assert!(QuadKey::parse("0123").is_ok());
        assert!(matches!(QuadKey::parse("014"), Err(MapError::InvalidQuadKey(_))));
        assert!(QuadKey::parse("").is_err());
        assert!(QuadKey::parse("a1").is_err());
    }
}
