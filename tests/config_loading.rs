//! Integration tests for loading engine configuration from disk.

use dungeon_sim::{DungeonError, DungeonResult, Engine, EngineConfig};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_config() -> DungeonResult<()> {
    let file = write_config(r#"{"seed": 42, "fixed_seed": true, "width": 18, "height": 15}"#);
    let config = EngineConfig::from_json_file(file.path())?;
    assert_eq!(config, EngineConfig::seeded(42));

    let from_file = Engine::new(config)?;
    let direct = Engine::new(EngineConfig::seeded(42))?;
    assert_eq!(from_file.render_grid(), direct.render_grid());
    Ok(())
}

#[test]
fn test_larger_grid_from_config() -> DungeonResult<()> {
    let file = write_config(r#"{"seed": 3, "fixed_seed": true, "width": 30, "height": 20}"#);
    let engine = Engine::new(EngineConfig::from_json_file(file.path())?)?;
    assert_eq!(engine.render_grid().len(), 20);
    assert!(engine.render_grid().iter().all(|row| row.len() == 30));
    Ok(())
}

#[test]
fn test_malformed_json_is_reported() {
    let file = write_config("{ seed: ");
    let result = EngineConfig::from_json_file(file.path());
    assert!(matches!(result, Err(DungeonError::Serde(_))));
}

#[test]
fn test_missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let result = EngineConfig::from_json_file(dir.path().join("absent.json"));
    assert!(matches!(result, Err(DungeonError::Io(_))));
}

#[test]
fn test_grid_too_small_for_rooms_is_rejected() {
    let file = write_config(r#"{"seed": 1, "fixed_seed": true, "width": 4, "height": 15}"#);
    let config = EngineConfig::from_json_file(file.path()).unwrap();
    assert!(matches!(Engine::new(config), Err(DungeonError::InvalidConfig(_))));
}

#[test]
fn test_oversized_grid_is_rejected() {
    let file = write_config(r#"{"seed": 1, "fixed_seed": true, "width": 4000000000, "height": 4000000000}"#);
    let config = EngineConfig::from_json_file(file.path()).unwrap();
    assert!(matches!(Engine::new(config), Err(DungeonError::InvalidConfig(_))));
}
