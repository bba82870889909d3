//! Shared helpers for library integration tests.

use std::path::Path;

use assetgraph_lib::session_file::{LoadedSession, SessionDocument};

/// A game package depending on a core package.
///
/// `Scene1` consumes `Texture1` as compiled content and `Material1` only as an
/// asset. Textures and scenes have compilers, materials do not. `Music1` is a
/// runtime reference of the scene whose compilation reports an error.
pub const GAME_SESSION: &str = r#"{
  "asset_types": [
    { "kind": "Scene" },
    { "kind": "Texture" },
    { "kind": "Material" },
    { "kind": "Music" },
    { "kind": "GameSettings", "always_root": true }
  ],
  "packages": [
    {
      "name": "Game",
      "dependencies": ["Core"],
      "roots": ["Scenes/Scene1"],
      "assets": [
        {
          "id": "scene1", "location": "Scenes/Scene1", "kind": "Scene",
          "references": ["texture1", "material1", "music1"]
        },
        { "id": "settings", "location": "GameSettings", "kind": "GameSettings" }
      ]
    },
    {
      "name": "Core",
      "assets": [
        { "id": "texture1", "location": "Textures/Texture1", "kind": "Texture", "properties": { "source": "art/t1.png" } },
        { "id": "material1", "location": "Materials/Material1", "kind": "Material" },
        { "id": "music1", "location": "Audio/Music1", "kind": "Music", "properties": { "errors": ["unsupported codec"] } }
      ]
    }
  ],
  "compilers": [
    {
      "kind": "Scene", "command": "compile-scene",
      "inputs": [
        { "kind": "Texture", "dependency": ["compile_content"] },
        { "kind": "Material", "dependency": ["compile_asset"] }
      ],
      "runtime_types": ["Music"]
    },
    { "kind": "Texture", "command": "compile-texture" },
    { "kind": "Music", "command": "compile-music" },
    { "kind": "GameSettings", "command": "compile-settings" }
  ]
}"#;

pub fn load(document: &str) -> LoadedSession {
  SessionDocument::from_json(document)
    .unwrap()
    .into_session(Path::new("/project"))
}
