//! Drives the loader and engine against shell scripts standing in for `sd`.
//!
//! Everything runs in one test so no other test thread forks while a
//! script file is still open for writing.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbImage};
use tempfile::tempdir;
use zimage_core::domain::{Device, ResolvedParameters};
use zimage_core::ports::{EngineLoader, EngineSpec, InferenceError};
use zimage_runtime::SdCppLoader;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn params(seed: Option<i64>) -> ResolvedParameters {
    ResolvedParameters {
        prompt: "a paper boat".into(),
        height: 256,
        width: 256,
        num_inference_steps: 4,
        guidance_scale: 0.0,
        seed,
    }
}

#[tokio::test]
async fn test_engine_runs_sd_and_decodes_output() {
    let dir = tempdir().unwrap();
    let scratch = dir.path().join("scratch");
    let model = dir.path().join("z-image-turbo.gguf");
    fs::write(&model, b"GGUF\x03\x00\x00\x00").unwrap();

    let fixture = dir.path().join("fixture.png");
    DynamicImage::ImageRgb8(RgbImage::from_pixel(256, 256, image::Rgb([10, 20, 30])))
        .save(&fixture)
        .unwrap();
    let args_log = dir.path().join("args.txt");

    let ok_sd = write_script(
        dir.path(),
        "sd-ok",
        &format!(
            r#"out=""
echo "$@" >> "{log}"
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
if [ -n "$out" ]; then cp "{fixture}" "$out"; fi
exit 0"#,
            log = args_log.display(),
            fixture = fixture.display()
        ),
    );
    let oom_sd = write_script(
        dir.path(),
        "sd-oom",
        r#"case "$1" in --help) exit 0 ;; esac
echo "CUDA error: out of memory" >&2
exit 1"#,
    );
    let empty_sd = write_script(dir.path(), "sd-empty", "exit 0");

    // Successful run: image decoded, scratch file removed, args passed through.
    let engine = SdCppLoader::new(Some(ok_sd))
        .with_extra_args(vec!["--vae-tiling".into()])
        .with_scratch_dir(&scratch)
        .load(&EngineSpec::new(&model, Device::Cpu))
        .await
        .unwrap();
    let image = engine.generate(&params(Some(42))).await.unwrap();
    assert_eq!((image.width(), image.height()), (256, 256));
    assert_eq!(fs::read_dir(&scratch).unwrap().count(), 0);

    let logged = fs::read_to_string(&args_log).unwrap();
    let invocation = logged.lines().last().unwrap();
    assert!(invocation.contains("-p a paper boat"));
    assert!(invocation.contains("-s 42"));
    assert!(invocation.contains("--clip-on-cpu"));
    assert!(invocation.ends_with("--vae-tiling"));

    // Out-of-memory on stderr is classified as such and keeps the engine usable.
    let engine = SdCppLoader::new(Some(oom_sd))
        .with_scratch_dir(&scratch)
        .load(&EngineSpec::new(&model, Device::Cpu))
        .await
        .unwrap();
    let err = engine.generate(&params(None)).await.unwrap_err();
    assert!(matches!(err, InferenceError::OutOfMemory(_)));
    assert!(engine.is_usable());

    // Exit 0 without writing the output file.
    let engine = SdCppLoader::new(Some(empty_sd.clone()))
        .with_scratch_dir(&scratch)
        .load(&EngineSpec::new(&model, Device::Cpu))
        .await
        .unwrap();
    let err = engine.generate(&params(None)).await.unwrap_err();
    assert!(matches!(err, InferenceError::InvalidOutput(_)));

    // Binary removed after load: the engine reports itself unusable.
    fs::remove_file(&empty_sd).unwrap();
    let err = engine.generate(&params(None)).await.unwrap_err();
    assert!(matches!(err, InferenceError::EngineUnavailable(_)));
    assert!(!engine.is_usable());
}
