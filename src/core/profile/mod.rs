// ─── Game Profile ───
// Session server profile payloads and skin URL extraction.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

use crate::core::error::SkinResult;

const TEXTURES_PROPERTY: &str = "textures";

/// Profile returned by the session server for a UUID.
#[derive(Debug, Clone, Deserialize)]
pub struct GameProfile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: Vec<ProfileProperty>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileProperty {
    pub name: String,
    /// Base64 encoded JSON.
    pub value: String,
    #[serde(default)]
    pub signature: Option<String>,
}

/// Decoded `textures` property value.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureDescriptor {
    #[serde(default)]
    pub timestamp: Option<u64>,
    #[serde(default)]
    pub profile_id: Option<String>,
    #[serde(default)]
    pub profile_name: Option<String>,
    #[serde(default)]
    pub textures: Option<Textures>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Textures {
    #[serde(rename = "SKIN", default)]
    pub skin: Option<Texture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Texture {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub metadata: Option<TextureMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextureMetadata {
    /// `"slim"` for Alex-style arms; absent for the classic model.
    #[serde(default)]
    pub model: Option<String>,
}

impl GameProfile {
    /// Parse a session server response body. A literal `null` body is an
    /// empty profile.
    pub fn from_json(body: &str) -> SkinResult<Self> {
        let profile: Option<GameProfile> = serde_json::from_str(body)?;
        Ok(profile.unwrap_or(GameProfile {
            id: None,
            name: None,
            properties: Vec::new(),
        }))
    }

    /// The last `textures` property, if any.
    ///
    /// Mojang only ever sends one; should several appear, the last one wins.
    pub fn textures_property(&self) -> Option<&ProfileProperty> {
        self.properties
            .iter()
            .rev()
            .find(|prop| prop.name == TEXTURES_PROPERTY)
    }

    pub fn texture_descriptor(&self) -> SkinResult<Option<TextureDescriptor>> {
        match self.textures_property() {
            Some(prop) => prop.decode(),
            None => Ok(None),
        }
    }

    /// Skin texture URL at `textures.SKIN.url`. `Ok(None)` means the player
    /// has no skin set; an empty URL counts as none.
    pub fn skin_url(&self) -> SkinResult<Option<String>> {
        Ok(self
            .texture_descriptor()?
            .and_then(|descriptor| descriptor.skin())
            .and_then(|skin| skin.url)
            .filter(|url| !url.is_empty()))
    }
}

impl ProfileProperty {
    pub fn decode(&self) -> SkinResult<Option<TextureDescriptor>> {
        let raw = STANDARD.decode(self.value.trim())?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

impl TextureDescriptor {
    pub fn skin(self) -> Option<Texture> {
        self.textures.and_then(|t| t.skin)
    }
}
