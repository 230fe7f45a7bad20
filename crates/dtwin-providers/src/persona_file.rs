//! File-backed persona resolver.
//!
//! Personas live in a single `personas.json` file mapping persona id to
//! configuration. When the file is absent the resolver ships the
//! default persona so a fresh checkout works without setup.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tracing::{info, warn};

use dtwin_models::Persona;

use crate::error::{ProviderError, ProviderResult};
use crate::traits::PersonaResolver;

const PERSONAS_FILE: &str = "personas.json";
const DEFAULT_PERSONA_ID: &str = "chad_goldstein";

fn default_persona() -> Persona {
    Persona {
        name: "Chad Goldstein".into(),
        bio: "A flamboyant, self-congratulatory venture capitalist and General Partner \
              at Bling Capital Partners who delivers pitch critiques with ruthless candor"
            .into(),
        prompt: "You are \"Chad Goldstein, General Partner at Bling Capital Partners\" - a \
                 flamboyant, self-congratulatory, and unreasonably confident venture \
                 capitalist who delivers pitch critiques with ruthless candor, misguided \
                 self-comparisons to Warren Buffett, and unfiltered tech-bro energy. \
                 Format your response like an investor-style commentary: opening quip, \
                 highlights, roast, and closing verdict. Stay in character the entire time."
            .into(),
        elevenlabs_voice_id: None,
        heygen_voice_id: Some("82025eb9625b4c09aec78f89528cc33a".into()),
        heygen_avatar_id: Some("0ccb7cd7f5fe49f09ae90df50f2e9140".into()),
        description: Some(
            "The original hot take commentator with a distinctive voice and style".into(),
        ),
    }
}

/// Persona resolver backed by a `personas.json` file.
pub struct FilePersonaResolver {
    personas: HashMap<String, Persona>,
}

impl FilePersonaResolver {
    /// Load personas from `dir/personas.json`.
    pub fn load(dir: &Path) -> ProviderResult<Self> {
        let config_path = dir.join(PERSONAS_FILE);

        if !config_path.exists() {
            warn!(
                path = %config_path.display(),
                "No personas configuration found, using default persona"
            );
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&config_path)?;
        let personas: HashMap<String, Persona> = serde_json::from_str(&raw)?;

        info!(count = personas.len(), "Loaded personas");
        Ok(Self { personas })
    }

    /// Resolver holding exactly the given personas (tests).
    pub fn from_personas(personas: HashMap<String, Persona>) -> Self {
        Self { personas }
    }

    /// List available persona ids.
    pub fn persona_ids(&self) -> Vec<&str> {
        self.personas.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for FilePersonaResolver {
    fn default() -> Self {
        let mut personas = HashMap::new();
        personas.insert(DEFAULT_PERSONA_ID.to_string(), default_persona());
        Self { personas }
    }
}

#[async_trait]
impl PersonaResolver for FilePersonaResolver {
    async fn resolve(&self, persona_id: &str) -> ProviderResult<Persona> {
        self.personas
            .get(persona_id)
            .cloned()
            .ok_or_else(|| ProviderError::not_found(format!("persona '{}'", persona_id)))
    }
}
