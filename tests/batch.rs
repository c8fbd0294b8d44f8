use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use colorshift::cli::{CliArgs, resolve_inputs, run_with_settings};
use colorshift::io::{IoError, SaveFormat, load_raster, save_raster};
use colorshift::settings::Settings;
use colorshift::{Color, Raster, Session, TransformParameters};

fn write_sample(path: &Path) {
    let r = Raster::from_rgb(3, 2, &[0, 0, 0, 255, 0, 0, 10, 10, 10, 90, 90, 90, 0, 255, 0, 5, 6, 7])
        .unwrap();
    save_raster(&r, path, SaveFormat::Png, 90).unwrap();
}

#[test]
fn png_keeps_pixels_and_layout() {
    let dir = tempfile::tempdir().unwrap();
    let rgb = dir.path().join("rgb.png");
    write_sample(&rgb);
    let back = load_raster(&rgb).unwrap();
    assert!(!back.has_alpha());
    assert_eq!(back.rgb(1, 0), Color::new(255, 0, 0));

    let rgba_path = dir.path().join("rgba.png");
    let rgba = Raster::from_rgba(1, 1, &[1, 2, 3, 4]).unwrap();
    save_raster(&rgba, &rgba_path, SaveFormat::Png, 90).unwrap();
    assert_eq!(load_raster(&rgba_path).unwrap().pixel(0, 0), [1, 2, 3, 4]);
}

#[test]
fn every_format_writes_a_loadable_file() {
    let dir = tempfile::tempdir().unwrap();
    let src = Raster::solid(4, 4, Color::new(120, 60, 30));
    for format in [SaveFormat::Png, SaveFormat::Jpeg, SaveFormat::Bmp, SaveFormat::Tga, SaveFormat::Tiff]
    {
        let path = dir.path().join(format!("out.{}", format.extension()));
        save_raster(&src, &path, format, 95).unwrap();
        let back = load_raster(&path).unwrap();
        assert_eq!(back.dimensions(), (4, 4), "{:?}", format);
    }
}

#[test]
fn garbage_file_is_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"not an image").unwrap();
    assert!(matches!(load_raster(&path), Err(IoError::Decode(_))));
}

#[test]
fn directory_inputs_are_filtered_and_sorted() {
    let dir = tempfile::tempdir().unwrap();
    write_sample(&dir.path().join("b.png"));
    write_sample(&dir.path().join("a.png"));
    std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
    let arg = dir.path().to_string_lossy().into_owned();
    let inputs = resolve_inputs(&[arg.clone(), arg]);
    let names: Vec<_> = inputs
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.png", "b.png"]);
}

#[test]
fn batch_writes_into_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = dir.path().join("in");
    let outputs = dir.path().join("out");
    std::fs::create_dir_all(&inputs).unwrap();
    write_sample(&inputs.join("one.png"));
    write_sample(&inputs.join("two.png"));

    let args = CliArgs::try_parse_from([
        "colorshift".to_string(),
        "background".to_string(),
        "--color".to_string(),
        "(255, 255, 255)".to_string(),
        "-i".to_string(),
        inputs.to_string_lossy().into_owned(),
        "--output-dir".to_string(),
        outputs.to_string_lossy().into_owned(),
    ])
    .unwrap();
    assert_eq!(run_with_settings(args, &Settings::default()), ExitCode::SUCCESS);

    for name in ["one.png", "two.png"] {
        let out = load_raster(&outputs.join(name)).unwrap();
        assert_eq!(out.rgb(0, 0), Color::new(255, 255, 255));
        assert_eq!(out.rgb(2, 0), Color::new(255, 255, 255));
        assert_eq!(out.rgb(0, 1), Color::new(90, 90, 90));
    }
}

#[test]
fn default_output_sits_next_to_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.png");
    write_sample(&input);
    let settings = Settings { output_suffix: "_bw".to_string(), ..Settings::default() };
    let args = CliArgs::try_parse_from([
        "colorshift".to_string(),
        "grayscale".to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
    ])
    .unwrap();
    assert_eq!(run_with_settings(args, &settings), ExitCode::SUCCESS);
    let out = load_raster(&dir.path().join("photo_bw.png")).unwrap();
    let px = out.rgb(1, 0);
    assert!(px.r == px.g && px.g == px.b);
}

#[test]
fn missing_input_fails_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.png");
    write_sample(&good);
    let bad = dir.path().join("bad.png");
    std::fs::write(&bad, b"junk").unwrap();
    let args = CliArgs::try_parse_from([
        "colorshift".to_string(),
        "blur".to_string(),
        "-i".to_string(),
        good.to_string_lossy().into_owned(),
        bad.to_string_lossy().into_owned(),
        "--output-dir".to_string(),
        dir.path().join("out").to_string_lossy().into_owned(),
    ])
    .unwrap();
    assert_eq!(run_with_settings(args, &Settings::default()), ExitCode::FAILURE);
    // The good file is still processed.
    assert!(dir.path().join("out").join("good.png").exists());
}

#[test]
fn session_saves_with_configured_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("pic.png");
    write_sample(&input);
    let mut session = Session::open(&input).unwrap();
    session.apply(&TransformParameters::Transparency { level: 99 }).unwrap();
    let saved = session.save_default(&Settings::default()).unwrap();
    assert_eq!(saved, dir.path().join("pic-Modified.png"));
    let back = load_raster(&saved).unwrap();
    assert!(back.has_alpha());
    assert_eq!(back.pixel(0, 0)[3], 99);
}

#[test]
fn menu_applies_and_saves() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("menu.png");
    write_sample(&input);
    let script = format!("{}\n4\n(9, 9, 9)\n\n1\nu\ns\n", input.display());
    let mut reader = std::io::Cursor::new(script.into_bytes());
    let mut out = Vec::new();
    let saved = colorshift::menu::run(&mut reader, &mut out, &Settings::default())
        .unwrap()
        .unwrap();
    let back = load_raster(&saved).unwrap();
    // Mask applied, grayscale undone.
    assert_eq!(back.rgb(0, 0), Color::new(9, 9, 9));
    assert_eq!(back.rgb(1, 0), Color::new(255, 0, 0));
    let text = String::from_utf8_lossy(&out);
    assert!(text.contains("Image changed successfully"));
    assert!(text.contains("Image saved successfully"));
}

fn background_args(input: &Path, extra: &[String]) -> CliArgs {
    let mut argv = vec![
        "colorshift".to_string(),
        "background".to_string(),
        "--color".to_string(),
        "(255, 0, 0)".to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
    ];
    argv.extend_from_slice(extra);
    CliArgs::try_parse_from(argv).unwrap()
}

#[test]
fn output_dir_matching_input_dir_keeps_sources() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.png");
    write_sample(&input);
    let args = background_args(
        dir.path(),
        &["--output-dir".to_string(), dir.path().to_string_lossy().into_owned()],
    );
    assert_eq!(run_with_settings(args, &Settings::default()), ExitCode::SUCCESS);

    assert_eq!(load_raster(&input).unwrap().rgb(0, 0), Color::new(0, 0, 0));
    let out = load_raster(&dir.path().join("photo_out.png")).unwrap();
    assert_eq!(out.rgb(0, 0), Color::new(255, 0, 0));
}

#[test]
fn empty_suffix_keeps_sources() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.png");
    write_sample(&input);
    let settings = Settings::parse("output_suffix=\n");
    assert_eq!(settings.output_suffix, "");
    assert_eq!(run_with_settings(background_args(&input, &[]), &settings), ExitCode::SUCCESS);

    assert_eq!(load_raster(&input).unwrap().rgb(0, 0), Color::new(0, 0, 0));
    let out = load_raster(&dir.path().join("photo_out.png")).unwrap();
    assert_eq!(out.rgb(0, 0), Color::new(255, 0, 0));
}

#[test]
fn single_output_file_refuses_many_inputs() {
    let dir = tempfile::tempdir().unwrap();
    write_sample(&dir.path().join("a.png"));
    write_sample(&dir.path().join("b.png"));
    let single = dir.path().join("single.png");
    let out_dir = dir.path().join("od");

    let both = CliArgs::try_parse_from([
        "colorshift".to_string(),
        "grayscale".to_string(),
        "-i".to_string(),
        dir.path().to_string_lossy().into_owned(),
        "-o".to_string(),
        single.to_string_lossy().into_owned(),
        "--output-dir".to_string(),
        out_dir.to_string_lossy().into_owned(),
    ]);
    assert!(both.is_err());

    let args = CliArgs::try_parse_from([
        "colorshift".to_string(),
        "grayscale".to_string(),
        "-i".to_string(),
        dir.path().to_string_lossy().into_owned(),
        "-o".to_string(),
        single.to_string_lossy().into_owned(),
    ])
    .unwrap();
    assert_eq!(run_with_settings(args, &Settings::default()), ExitCode::FAILURE);
    assert!(!single.exists());
}

#[test]
fn session_keeps_the_source_format() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("shot.jpg");
    save_raster(&Raster::solid(4, 4, Color::new(200, 40, 40)), &input, SaveFormat::Jpeg, 95)
        .unwrap();
    let mut session = Session::open(&input).unwrap();
    session.apply(&TransformParameters::Grayscale).unwrap();
    let saved = session.save_default(&Settings::default()).unwrap();
    assert_eq!(saved, dir.path().join("shot-Modified.jpg"));
    assert_eq!(load_raster(&saved).unwrap().dimensions(), (4, 4));
}

#[test]
fn menu_survives_a_failed_save() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("menu.png");
    write_sample(&input);
    // The suffix points into a directory that does not exist.
    let settings = Settings {
        output_suffix: "-Modified/missing/x".to_string(),
        ..Settings::default()
    };
    let script = format!("{}\n1\ns\nq\n", input.display());
    let mut reader = std::io::Cursor::new(script.into_bytes());
    let mut out = Vec::new();
    let result = colorshift::menu::run(&mut reader, &mut out, &settings).unwrap();
    assert_eq!(result, None);
    let text = String::from_utf8_lossy(&out);
    assert!(text.contains("An error occurred while saving the image"));
    assert!(text.contains("Quit without saving."));
}
