use crate::browser;
use anyhow::{anyhow, ensure, Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;

const BACKGROUNDS_DIR: &str = "images/backgrounds";
pub const SLINGSHOT_PATH: &str = "images/slingshot.png";
pub const SLINGSHOT_FRONT_PATH: &str = "images/slingshot-front.png";

/// Image pair drawn behind the slingshot, names are file stems under
/// `images/backgrounds/`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LevelDescriptor {
    pub foreground: String,
    pub background: String,
}

impl LevelDescriptor {
    pub fn new(foreground: &str, background: &str) -> Self {
        LevelDescriptor {
            foreground: foreground.to_string(),
            background: background.to_string(),
        }
    }

    pub fn background_path(&self) -> String {
        format!("{}/{}.png", BACKGROUNDS_DIR, self.background)
    }

    pub fn foreground_path(&self) -> String {
        format!("{}/{}.png", BACKGROUNDS_DIR, self.foreground)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Levels {
    data: Vec<LevelDescriptor>,
}

static BUILTIN: Lazy<Levels> = Lazy::new(|| Levels {
    data: vec![
        LevelDescriptor::new("desert-foreground", "clouds-background"),
        LevelDescriptor::new("desert-foreground", "clouds-background"),
    ],
});

impl Levels {
    pub fn builtin() -> &'static Levels {
        &BUILTIN
    }

    /// Registry in the same `{"data": [...]}` shape as the built-in one
    pub async fn fetch(path: &str) -> Result<Levels> {
        let levels = browser::fetch_json::<Levels>(path)
            .await
            .with_context(|| format!("Failed to load levels from : {}", path))?;
        ensure!(!levels.is_empty(), "Level registry at {} is empty", path);
        Ok(levels)
    }

    /// `number` is zero based
    pub fn get(&self, number: usize) -> Result<&LevelDescriptor> {
        self.data
            .get(number)
            .ok_or_else(|| anyhow!("No level {} (only {} available)", number, self.len()))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelDescriptor> {
        self.data.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_has_two_desert_levels() {
        let levels = Levels::builtin();
        assert_eq!(levels.len(), 2);
        assert!(levels
            .iter()
            .all(|level| level.foreground == "desert-foreground"
                && level.background == "clouds-background"));
    }

    #[test]
    fn descriptor_builds_background_paths() {
        let level = Levels::builtin().get(0).unwrap();
        assert_eq!(
            level.background_path(),
            "images/backgrounds/clouds-background.png"
        );
        assert_eq!(
            level.foreground_path(),
            "images/backgrounds/desert-foreground.png"
        );
    }

    #[test]
    fn out_of_range_level_is_an_error() {
        let err = Levels::builtin().get(2).unwrap_err();
        assert!(err.to_string().contains("No level 2"));
    }
}
