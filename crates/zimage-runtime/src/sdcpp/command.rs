//! `sd` command-line assembly.

use std::path::PathBuf;
use std::process::Command;

use zimage_core::domain::{Device, ResolvedParameters};

/// Builder for one `sd` text-to-image invocation.
///
/// # Example
///
/// ```rust,ignore
/// let cmd = SdCommandBuilder::new("/usr/local/bin/sd", "/models/z-image-turbo.gguf")
///     .params(&resolved)
///     .output("/tmp/zimage/render.png")
///     .device(Device::Cpu)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct SdCommandBuilder {
    binary_path: PathBuf,
    model_path: PathBuf,
    params: Option<ResolvedParameters>,
    output: Option<PathBuf>,
    device: Device,
    extra_args: Vec<String>,
}

impl SdCommandBuilder {
    pub fn new(binary_path: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
            model_path: model_path.into(),
            params: None,
            output: None,
            device: Device::Auto,
            extra_args: Vec::new(),
        }
    }

    #[must_use]
    pub fn params(mut self, params: &ResolvedParameters) -> Self {
        self.params = Some(params.clone());
        self
    }

    #[must_use]
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    #[must_use]
    pub const fn device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Arguments appended after everything else, in order.
    #[must_use]
    pub fn extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Build the command.
    ///
    /// Order: mode and model, generation parameters, output, device hints,
    /// extra arguments.
    pub fn build(self) -> Command {
        let mut cmd = Command::new(&self.binary_path);
        cmd.arg("-M").arg("img_gen").arg("-m").arg(&self.model_path);

        if let Some(params) = &self.params {
            cmd.arg("-p")
                .arg(&params.prompt)
                .arg("-H")
                .arg(params.height.to_string())
                .arg("-W")
                .arg(params.width.to_string())
                .arg("--steps")
                .arg(params.num_inference_steps.to_string())
                .arg("--cfg-scale")
                .arg(params.guidance_scale.to_string())
                .arg("-s")
                .arg(seed_arg(params.seed));
        }

        if let Some(output) = &self.output {
            cmd.arg("-o").arg(output);
        }

        if self.device == Device::Cpu {
            cmd.arg("--clip-on-cpu").arg("--vae-on-cpu");
        }

        cmd.args(&self.extra_args);
        cmd
    }
}

/// `sd -s` treats any negative seed as "pick one at random", so a pinned
/// negative seed has its sign bit cleared to stay reproducible.
fn seed_arg(seed: Option<i64>) -> String {
    seed.map_or_else(|| "-1".to_string(), |s| (s & i64::MAX).to_string())
}

/// Render a command for log lines.
pub fn describe(cmd: &Command) -> String {
    let mut line = cmd.get_program().to_string_lossy().into_owned();
    for arg in cmd.get_args() {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(seed: Option<i64>) -> ResolvedParameters {
        ResolvedParameters {
            prompt: "a lighthouse at dusk".into(),
            height: 512,
            width: 768,
            num_inference_steps: 9,
            guidance_scale: 0.0,
            seed,
        }
    }

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn builder_constructs_full_invocation() {
        let cmd = SdCommandBuilder::new("/usr/bin/sd", "/models/z.gguf")
            .params(&resolved(Some(42)))
            .output("/tmp/out.png")
            .build();

        assert_eq!(cmd.get_program(), "/usr/bin/sd");
        assert_eq!(
            args(&cmd),
            [
                "-M",
                "img_gen",
                "-m",
                "/models/z.gguf",
                "-p",
                "a lighthouse at dusk",
                "-H",
                "512",
                "-W",
                "768",
                "--steps",
                "9",
                "--cfg-scale",
                "0",
                "-s",
                "42",
                "-o",
                "/tmp/out.png",
            ]
        );
    }

    #[test]
    fn builder_uses_random_seed_when_unset() {
        let cmd = SdCommandBuilder::new("sd", "m.gguf")
            .params(&resolved(None))
            .build();
        let args = args(&cmd);
        let pos = args.iter().position(|a| a == "-s").unwrap();
        assert_eq!(args[pos + 1], "-1");
    }

    #[test]
    fn builder_maps_negative_seeds_to_fixed_non_negative_values() {
        assert_eq!(seed_arg(Some(-1)), i64::MAX.to_string());
        assert_eq!(seed_arg(Some(-5)), (i64::MAX - 4).to_string());
        assert_eq!(seed_arg(Some(i64::MIN)), "0");
        assert_eq!(seed_arg(Some(7)), "7");
    }

    #[test]
    fn builder_adds_cpu_hints_and_extra_args_last() {
        let cmd = SdCommandBuilder::new("sd", "m.gguf")
            .device(Device::Cpu)
            .extra_args(["--vae", "/models/ae.safetensors"])
            .build();
        let args = args(&cmd);
        assert_eq!(
            &args[args.len() - 4..],
            ["--clip-on-cpu", "--vae-on-cpu", "--vae", "/models/ae.safetensors"]
        );
    }

    #[test]
    fn builder_omits_cpu_hints_for_gpu() {
        let cmd = SdCommandBuilder::new("sd", "m.gguf").device(Device::Gpu).build();
        assert!(!args(&cmd).contains(&"--clip-on-cpu".to_string()));
    }

    #[test]
    fn describe_joins_program_and_args() {
        let cmd = SdCommandBuilder::new("sd", "m.gguf").build();
        assert_eq!(describe(&cmd), "sd -M img_gen -m m.gguf");
    }
}
