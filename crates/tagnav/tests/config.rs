use std::io::Write;

use tagnav::{PipelineError, TagNavConfig};

#[test]
fn load_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"{{ "tag_size": 0.05, "decimation": 4, "width": 1280, "height": 960, "parallel_solve": false }}"#
    )?;

    let config = TagNavConfig::from_json_file(file.path())?;
    assert_eq!(config.tag_size, 0.05);
    assert_eq!(config.decimation, 4);
    assert_eq!(config.image_size().width, 1280);
    assert!(!config.parallel_solve);
    assert_eq!(config.log_throttle_secs, 1.0);
    Ok(())
}

#[test]
fn written_config_loads_back() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tagnav.json");

    let config = TagNavConfig {
        tag_size: 0.2,
        edge_epsilon: 1e-3,
        ..Default::default()
    };
    std::fs::write(&path, config.to_json_string()?)?;

    assert_eq!(TagNavConfig::from_json_file(&path)?, config);
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    let res = TagNavConfig::from_json_file("/definitely/not/here/tagnav.json");
    assert!(matches!(res, Err(PipelineError::Io(_))));
}

#[test]
fn invalid_file_contents_propagate() -> Result<(), Box<dyn std::error::Error>> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(file, r#"{{ "tag_size": -0.16 }}"#)?;

    let res = TagNavConfig::from_json_file(file.path());
    assert!(matches!(res, Err(PipelineError::InvalidConfig(_))));
    Ok(())
}
