//! Material document (.material)
//!
//! A material references its textures by resolved file path. The texture
//! files themselves are plain image files in the asset directory.

use serde::{Deserialize, Serialize};

use super::AssetDocument;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialAsset {
    pub name: String,
    /// Resolved path of the diffuse texture, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diffuse_texture: Option<String>,
}

impl MaterialAsset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            diffuse_texture: None,
        }
    }
}

impl AssetDocument for MaterialAsset {
    const KIND: &'static str = "material";
}
