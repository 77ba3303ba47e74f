// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Technology file and path tests: load/save, base path handling and
//! directory loading.

use std::fs;

use lytech_core::application::TechnologyRegistry;
use lytech_core::domain::repository::CollisionPolicy;
use lytech_core::domain::technology::{Technology, TechnologyError};

const SKY130: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<technology>
  <name>sky130</name>
  <description>SkyWater 130nm</description>
  <dbu>0.005</dbu>
  <layer-properties-file>sky130.lyp</layer-properties-file>
  <default-grids>0.005!,0.01</default-grids>
</technology>
"#;

#[test]
fn test_load_sets_base_path_and_file_path() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("sky130.lyt");
    fs::write(&file, SKY130).unwrap();

    let mut tech = Technology::default();
    tech.load(&file).unwrap();

    let dir_str = dir.path().to_string_lossy().into_owned();
    assert_eq!(tech.name(), "sky130");
    assert_eq!(tech.default_base_path(), dir_str);
    assert_eq!(tech.base_path(), dir_str);
    assert_eq!(tech.tech_file_path(), file.to_string_lossy());
    assert_eq!(
        tech.eff_layer_properties_file(),
        dir.path().join("sky130.lyp").to_string_lossy()
    );
    assert_eq!(tech.default_grid(), Some(0.005));
}

#[test]
fn test_explicit_base_path_wins_over_file_location() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("t.lyt");
    fs::write(
        &file,
        "<technology><name>t</name><explicit-base-path>/pdk</explicit-base-path>\
         <layer-properties-file>l.lyp</layer-properties-file></technology>",
    )
    .unwrap();

    let mut tech = Technology::default();
    tech.load(&file).unwrap();
    assert_eq!(tech.base_path(), "/pdk");
    assert_eq!(tech.eff_layer_properties_file(), "/pdk/l.lyp");
}

#[test]
fn test_save_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("out.lyt");

    let mut tech = Technology::new("roundtrip");
    tech.set_description("Saved & loaded");
    tech.set_dbu(0.00025);
    tech.set_default_grids(vec![0.1, 0.2, 0.5], 0.2);
    tech.set_default_base_path(dir.path().to_string_lossy());
    tech.save(&file).unwrap();

    let saved = fs::read_to_string(&file).unwrap();
    assert!(saved.contains("\n  <name>roundtrip</name>"));
    assert!(saved.contains("<default-grids>0.1,0.2!,0.5</default-grids>"));

    let mut loaded = Technology::default();
    loaded.load(&file).unwrap();
    assert_eq!(loaded, tech);
}

#[test]
fn test_load_missing_file_is_path_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut tech = Technology::new("unchanged");
    let err = tech.load(dir.path().join("missing.lyt")).unwrap_err();

    assert!(matches!(err, TechnologyError::Path { .. }));
    assert_eq!(tech.name(), "unchanged");
}

#[test]
fn test_path_roundtrip_and_non_escape() {
    let mut tech = Technology::new("paths");
    tech.set_default_base_path("/base/tech");

    for path in ["/base/tech/layers.lyp", "/base/tech/sub/dir/x.lym", "/base/tech"] {
        let relative = tech.correct_path(path);
        assert!(!relative.starts_with('/'), "{} -> {}", path, relative);
        assert_eq!(tech.build_effective_path(&relative), path);
    }
    assert_eq!(tech.correct_path("/base/tech"), ".");

    for path in ["/base/technology/x", "/other/x", "relative/x", "/base"] {
        assert_eq!(tech.correct_path(path), path);
    }
}

#[test]
fn test_load_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("b")).unwrap();
    fs::write(dir.path().join("a.lyt"), SKY130).unwrap();
    fs::write(
        dir.path().join("b/gf180.lyt"),
        "<technology><name>gf180</name></technology>",
    )
    .unwrap();
    fs::write(dir.path().join("b/broken.lyt"), "<technology><name>x</name>").unwrap();
    fs::write(
        dir.path().join("b/sky-copy.lyt"),
        "<technology><name>sky130</name><description>copy</description></technology>",
    )
    .unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let registry = TechnologyRegistry::new();
    let report = registry.load_directory(dir.path()).unwrap();

    assert_eq!(registry.names(), vec!["sky130", "gf180"]);
    assert_eq!(report.accepted(), 2);
    assert_eq!(report.rejected.len(), 2);
    assert_eq!(registry.lookup("sky130").unwrap().read().description(), "SkyWater 130nm");

    let gf180 = registry.lookup("gf180").unwrap();
    assert_eq!(
        gf180.read().default_base_path(),
        dir.path().join("b").to_string_lossy()
    );
}

#[test]
fn test_load_directory_replace_policy() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.lyt"), SKY130).unwrap();

    let registry = TechnologyRegistry::new().with_collision_policy(CollisionPolicy::Replace);
    registry.create("sky130").unwrap();
    let report = registry.load_directory(dir.path()).unwrap();

    assert_eq!(report.replaced, vec!["sky130"]);
    assert_eq!(registry.lookup("sky130").unwrap().read().dbu(), 0.005);
}

#[test]
fn test_load_directory_missing_root() {
    let dir = tempfile::tempdir().unwrap();
    let registry = TechnologyRegistry::new();
    assert!(registry.load_directory(dir.path().join("absent")).is_err());
}

#[test]
fn test_load_paths_reports_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let present = dir.path().join("present");
    fs::create_dir_all(&present).unwrap();
    fs::write(present.join("sky130.lyt"), SKY130).unwrap();
    let missing = dir.path().join("missing");

    let registry = TechnologyRegistry::new();
    let report = registry.load_paths(&[missing.clone(), present]);

    assert_eq!(report.imported, vec!["sky130"]);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].source, missing.display().to_string());
    assert!(matches!(report.rejected[0].error, TechnologyError::Path { .. }));
    assert_eq!(registry.names(), vec!["sky130"]);
}

#[test]
fn test_load_paths_all_missing_leaves_registry_empty() {
    let dir = tempfile::tempdir().unwrap();
    let registry = TechnologyRegistry::new();
    let report = registry.load_paths(&[dir.path().join("a"), dir.path().join("b")]);

    assert_eq!(report.accepted(), 0);
    assert_eq!(report.rejected.len(), 2);
    assert!(registry.is_empty());
}
